//! Discover screen: detected devices with their interfaces nested below.
//!
//! Devices and interfaces are flattened into one selectable list. A device
//! row carries the status dot, icon, name, description and a delete glyph;
//! an interface row carries its kind, name and `ipv4 - ipv6`, and opens the
//! interface's web UI when activated.

use std::cell::{Cell, RefCell};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph,
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tracing::warn;

use melo_core::{Device, StatusThresholds, UrlStyle, ViewState, age_label, interface_url};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{icons, status_indicator};

const HIGHLIGHT_SYMBOL: &str = "▸ ";
/// Columns at the right edge of a device row that count as the delete glyph.
const DELETE_HIT_WIDTH: u16 = 3;

/// One line of the flattened list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Device(usize),
    Interface { device: usize, iface: usize },
}

fn flatten(devices: &[Device]) -> Vec<Row> {
    devices
        .iter()
        .enumerate()
        .flat_map(|(d, device)| {
            std::iter::once(Row::Device(d)).chain(
                (0..device.interfaces.len()).map(move |i| Row::Interface {
                    device: d,
                    iface: i,
                }),
            )
        })
        .collect()
}

pub struct DiscoverScreen {
    focused: bool,
    state: ViewState,
    thresholds: StatusThresholds,
    url_style: UrlStyle,
    /// Epoch seconds used for status colors, advanced on every tick.
    now: i64,
    list_state: RefCell<ListState>,
    /// Where the header and list were last drawn, for mouse hit tests.
    header_area: Cell<Rect>,
    list_area: Cell<Rect>,
    throbber_state: ThrobberState,
}

impl DiscoverScreen {
    pub fn new(thresholds: StatusThresholds, url_style: UrlStyle) -> Self {
        Self {
            focused: false,
            state: ViewState::Idle,
            thresholds,
            url_style,
            now: chrono::Utc::now().timestamp(),
            list_state: RefCell::new(ListState::default()),
            header_area: Cell::new(Rect::default()),
            list_area: Cell::new(Rect::default()),
            throbber_state: ThrobberState::default(),
        }
    }

    fn devices(&self) -> &[Device] {
        self.state.devices().unwrap_or_default()
    }

    fn rows(&self) -> Vec<Row> {
        flatten(self.devices())
    }

    fn selected_row(&self) -> Option<Row> {
        let selected = self.list_state.borrow().selected()?;
        self.rows().get(selected).copied()
    }

    fn select(&self, idx: usize) {
        let len = self.rows().len();
        let mut state = self.list_state.borrow_mut();
        if len == 0 {
            state.select(None);
        } else {
            state.select(Some(idx.min(len - 1)));
        }
    }

    fn move_selection(&self, delta: isize) {
        let current = self.list_state.borrow().selected().unwrap_or(0);
        self.select(current.saturating_add_signed(delta));
    }

    /// Keep the selection inside a freshly loaded list.
    fn clamp_selection(&self) {
        if self.state.devices().is_none() {
            return;
        }
        let current = self.list_state.borrow().selected().unwrap_or(0);
        self.select(current);
    }

    fn device_of(&self, row: Row) -> Option<&Device> {
        match row {
            Row::Device(d) | Row::Interface { device: d, .. } => self.devices().get(d),
        }
    }

    fn delete(&self, row: Row) -> Option<Action> {
        self.device_of(row)
            .map(|d| Action::RequestDelete(d.serial.clone()))
    }

    /// Activate a row. Only interface rows with an address navigate.
    fn activate(&self, row: Row) -> Option<Action> {
        let Row::Interface { device, iface } = row else {
            return None;
        };
        let device = self.devices().get(device)?;
        let iface = device.interfaces.get(iface)?;
        match interface_url(device, iface, self.url_style) {
            Some(url) => Some(Action::OpenUrl(url)),
            None => {
                warn!(serial = %device.serial, interface = %iface.name, "interface has no address");
                None
            }
        }
    }

    /// List index under a terminal cell, if any.
    fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area.get();
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let idx = self.list_state.borrow().offset() + usize::from(row - area.y);
        (idx < self.rows().len()).then_some(idx)
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn device_line(&self, device: &Device, width: usize) -> Line<'static> {
        let status = device.status_at(self.now, self.thresholds);
        let mut spans = vec![
            status_indicator::status_span(status),
            Span::raw(" "),
            Span::styled(icons::device_glyph(device.icon), theme::device_name()),
            Span::raw(" "),
            Span::styled(
                device.name.clone(),
                theme::device_name().add_modifier(Modifier::BOLD),
            ),
        ];
        if !device.description.is_empty() {
            spans.push(Span::styled(format!("  {}", device.description), theme::list_row()));
        }

        let used = Line::from(spans.clone()).width();
        let pad = width.saturating_sub(used + 1);
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled("✕", theme::danger()));
        Line::from(spans)
    }

    fn interface_line(&self, device: &Device, iface: usize) -> Line<'static> {
        let Some(iface) = device.interfaces.get(iface) else {
            return Line::default();
        };
        let mut spans = vec![
            Span::raw("    "),
            Span::styled(icons::interface_glyph(iface.kind), theme::list_row()),
            Span::raw(" "),
            Span::styled(iface.name.clone(), theme::list_row()),
            Span::raw("  "),
            Span::styled(iface.address_label(), theme::address()),
        ];
        if interface_url(device, iface, self.url_style).is_none() {
            spans.push(Span::styled("  (no address)", theme::key_hint()));
        }
        Line::from(spans)
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        self.header_area.set(area);
        let header = Line::from(vec![
            Span::styled("Detected devices:", theme::title_style()),
            Span::raw("  "),
            Span::styled("⟳ ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, devices: &[Device]) {
        self.list_area.set(area);
        let width = usize::from(area.width).saturating_sub(HIGHLIGHT_SYMBOL.chars().count());

        let items: Vec<ListItem> = flatten(devices)
            .into_iter()
            .filter_map(|row| match row {
                Row::Device(d) => devices.get(d).map(|dev| self.device_line(dev, width)),
                Row::Interface { device, iface } => devices
                    .get(device)
                    .map(|dev| self.interface_line(dev, iface)),
            })
            .map(ListItem::new)
            .collect();

        let list = List::new(items)
            .highlight_style(theme::list_selected())
            .highlight_symbol(HIGHLIGHT_SYMBOL)
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(list, area, &mut *self.list_state.borrow_mut());
    }

    fn render_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" j/k ", theme::key_hint_key()),
            Span::styled("move  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("open  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ];
        if let Some(device) = self.selected_row().and_then(|row| self.device_of(row)) {
            spans.push(Span::styled(
                format!("   last update {}", age_label(device.last_update, self.now)),
                theme::list_row(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Component for DiscoverScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('r') => Ok(Some(Action::Refresh)),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.select(0);
                Ok(None)
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.select(usize::MAX);
                Ok(None)
            }
            KeyCode::Enter => Ok(self.selected_row().and_then(|row| self.activate(row))),
            KeyCode::Char('d') | KeyCode::Delete => {
                Ok(self.selected_row().and_then(|row| self.delete(row)))
            }
            _ => Ok(None),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.move_selection(1);
                Ok(None)
            }
            MouseEventKind::ScrollUp => {
                self.move_selection(-1);
                Ok(None)
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let header = self.header_area.get();
                if mouse.row == header.y
                    && mouse.column >= header.x
                    && mouse.column < header.x + header.width
                {
                    return Ok(Some(Action::Refresh));
                }

                let Some(idx) = self.row_at(mouse.column, mouse.row) else {
                    return Ok(None);
                };
                self.select(idx);
                let Some(row) = self.rows().get(idx).copied() else {
                    return Ok(None);
                };

                let area = self.list_area.get();
                let on_delete = mouse.column + DELETE_HIT_WIDTH >= area.x + area.width;
                match row {
                    Row::Device(_) if on_delete => Ok(self.delete(row)),
                    Row::Device(_) => Ok(None),
                    Row::Interface { .. } => Ok(self.activate(row)),
                }
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateChanged(state) => {
                self.state = state.clone();
                self.clamp_selection();
            }
            Action::Tick => {
                self.now = chrono::Utc::now().timestamp();
                if matches!(self.state, ViewState::Idle | ViewState::Loading) {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Discover ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // header
            Constraint::Min(1),    // list
            Constraint::Length(1), // hints
        ])
        .split(inner);

        self.render_header(frame, layout[0]);

        match &self.state {
            ViewState::Idle | ViewState::Loading => {
                self.list_area.set(Rect::default());
                let throbber = Throbber::default()
                    .label("  Loading devices...")
                    .style(Style::default().fg(theme::NEON_CYAN))
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());
            }
            ViewState::Failed(message) => {
                self.list_area.set(Rect::default());
                Self::render_message(
                    frame,
                    layout[1],
                    vec![
                        Line::from(Span::styled(
                            "Could not load devices",
                            Style::default()
                                .fg(theme::ERROR_RED)
                                .add_modifier(Modifier::BOLD),
                        )),
                        Line::from(Span::styled(message.clone(), theme::list_row())),
                        Line::from(vec![
                            Span::styled("press ", theme::key_hint()),
                            Span::styled("r", theme::key_hint_key()),
                            Span::styled(" to retry", theme::key_hint()),
                        ]),
                    ],
                );
            }
            ViewState::Loaded(devices) if devices.is_empty() => {
                self.list_area.set(Rect::default());
                Self::render_message(
                    frame,
                    layout[1],
                    vec![Line::from(Span::styled("No devices!", theme::list_row()))],
                );
            }
            ViewState::Loaded(devices) => self.render_list(frame, layout[1], devices),
        }

        self.render_hints(frame, layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
