//! Device status indicator: a colored dot per link freshness.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use melo_core::LinkStatus;

use crate::theme;

pub fn status_color(status: LinkStatus) -> Color {
    match status {
        LinkStatus::Fresh => theme::SUCCESS_GREEN,
        LinkStatus::Stale => theme::ELECTRIC_YELLOW,
        LinkStatus::Lost => theme::ERROR_RED,
    }
}

/// Styled dot for `status`.
pub fn status_span(status: LinkStatus) -> Span<'static> {
    Span::styled("●", Style::default().fg(status_color(status)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_freshness() {
        assert_eq!(status_color(LinkStatus::Fresh), theme::SUCCESS_GREEN);
        assert_eq!(status_color(LinkStatus::Stale), theme::ELECTRIC_YELLOW);
        assert_eq!(status_span(LinkStatus::Lost).style.fg, Some(theme::ERROR_RED));
    }
}
