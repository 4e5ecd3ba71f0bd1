//! What the app loop needs from a screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};

use crate::action::Action;

/// A screen turns input into [`Action`]s, reacts to dispatched actions, and
/// draws itself. Input handlers may change local state such as the
/// selection; anything with side effects goes back out as an action.
pub trait Component: Send {
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn handle_mouse_event(&mut self, _mouse: MouseEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// React to a dispatched action, optionally emitting a follow-up.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Draw into `area`. Takes `&self`; hit-test bookkeeping uses interior
    /// mutability.
    fn render(&self, frame: &mut Frame, area: Rect);

    fn set_focused(&mut self, _focused: bool) {}
}
