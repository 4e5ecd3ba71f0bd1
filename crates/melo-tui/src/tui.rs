//! The terminal the UI draws on, held for the lifetime of the event loop.
//!
//! [`Tui::start`] takes over stdout: raw mode, alternate screen, mouse
//! capture. Dropping the value hands the terminal back, and the panic hook
//! from [`install_hooks`] does the same when the loop unwinds.

use std::io::{Stdout, stdout};

use color_eyre::eyre::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::{Frame, Terminal};

pub struct Tui<B: Backend = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    /// Whether stdout was taken over and must be handed back on drop.
    owns_stdout: bool,
}

impl Tui {
    /// Take over stdout. Anything that fails halfway is rolled back.
    pub fn start() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide) {
            hand_back();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => terminal,
            Err(err) => {
                hand_back();
                return Err(err.into());
            }
        };
        let mut tui = Self {
            terminal,
            owns_stdout: true,
        };
        tui.terminal.clear()?;
        Ok(tui)
    }
}

impl<B> Tui<B>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    /// Draw on an arbitrary backend without touching stdout.
    #[cfg(test)]
    pub fn with_backend(backend: B) -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            owns_stdout: false,
        })
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// (cols, rows).
    pub fn size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> Drop for Tui<B> {
    fn drop(&mut self) {
        if self.owns_stdout {
            hand_back();
        }
    }
}

/// Undo [`Tui::start`]. Safe to call more than once; errors are ignored.
fn hand_back() {
    let _ = execute!(stdout(), Show, DisableMouseCapture, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// color-eyre reports without the env section, plus a panic hook that
/// hands the terminal back before the report is printed.
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    let print_panic = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |info| {
        hand_back();
        print_panic(info);
    }));
    Ok(())
}
