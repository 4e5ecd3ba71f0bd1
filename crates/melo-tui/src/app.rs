//! Application core: event loop, action dispatch, overlays.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use melo_core::{DeviceSource, Discover, Navigator};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::discover::DiscoverScreen;
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

const HELP_KEYS: &[(&str, &str)] = &[
    ("r", "refresh the device list"),
    ("↑/↓ j/k", "move selection"),
    ("g/G", "first / last row"),
    ("Enter", "open the selected interface"),
    ("d/Del", "delete the selected device"),
    ("click", "open an interface, ✕ deletes"),
    ("Esc", "dismiss the status message"),
    ("?", "toggle this help"),
    ("q/Ctrl-C", "quit"),
];

/// Top-level application state and event loop.
pub struct App<S: DeviceSource> {
    discover: Discover<S>,
    navigator: Arc<dyn Navigator>,
    screen: DiscoverScreen,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Cancels the data bridge task.
    data_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
}

impl<S: DeviceSource> App<S> {
    pub fn new(discover: Discover<S>, navigator: Arc<dyn Navigator>, screen: DiscoverScreen) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Self {
            discover,
            navigator,
            screen,
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            notification: None,
        }
    }

    /// Mount the screen, start the data bridge and the first fetch.
    fn mount(&mut self) -> Result<()> {
        self.screen.set_focused(true);

        let state = self.discover.subscribe();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(state, tx, cancel).await;
        });

        self.action_tx.send(Action::Refresh)?;
        Ok(())
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::start()?;
        let (width, height) = tui.size().unwrap_or((80, 24));
        debug!(width, height, "terminal ready");
        self.mount()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        // Unmount: stop forwarding and abort any fetch still in flight.
        self.data_cancel.cancel();
        self.discover.shutdown();
        events.stop();
        drop(tui);
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first, then the screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                    Ok(Some(Action::Quit))
                }
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Esc) if self.notification.is_some() => {
                Ok(Some(Action::DismissNotification))
            }
            _ => self.screen.handle_key_event(key),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(None);
        }
        self.screen.handle_mouse_event(mouse)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(w, h) => {
                debug!(w, h, "terminal resized");
            }

            Action::Render => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.forward(action)?;
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Notify(n) => self.notify(n.clone()),

            Action::DismissNotification => {
                self.notification = None;
            }

            Action::Refresh => {
                debug!("refresh requested");
                // The outcome arrives through the data bridge.
                drop(self.discover.refresh());
            }

            Action::RequestDelete(serial) => self.delete(serial.clone()),

            Action::OpenUrl(url) => self.open(url),

            Action::StateChanged(_) => self.forward(action)?,
        }
        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Delete in the background. Failures are logged by the controller and
    /// leave the list as it was.
    fn delete(&self, serial: String) {
        let discover = self.discover.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if discover.delete(&serial).await.is_ok() {
                let _ = tx.send(Action::Notify(Notification::success(format!(
                    "Deleted {serial}"
                ))));
            }
        });
    }

    fn open(&mut self, url: &str) {
        match self.navigator.navigate(url) {
            Ok(()) => {
                info!(url, "opened interface");
                self.notify(Notification::success(format!("Opening {url}")));
            }
            Err(e) => {
                warn!(url, error = %e, "navigation failed");
                self.notify(Notification::error(e.to_string()));
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let [body, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

        self.screen.render(frame, body);
        self.render_status_bar(frame, status);

        if self.help_visible {
            Self::render_help(frame, body);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.notification {
            Some((n, _)) => {
                let color = match n.level {
                    NotificationLevel::Success => theme::SUCCESS_GREEN,
                    NotificationLevel::Error => theme::ERROR_RED,
                };
                Line::from(Span::styled(format!(" {}", n.message), Style::default().fg(color)))
            }
            None => Line::from(vec![
                Span::styled(" ? ", theme::key_hint_key()),
                Span::styled("help  ", theme::key_hint()),
                Span::styled("q ", theme::key_hint_key()),
                Span::styled("quit", theme::key_hint()),
            ]),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help(frame: &mut Frame, area: Rect) {
        let height = u16::try_from(HELP_KEYS.len()).unwrap_or(u16::MAX).saturating_add(2);
        let [popup] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::horizontal([Constraint::Length(46)])
            .flex(Flex::Center)
            .areas(popup);

        let lines: Vec<Line> = HELP_KEYS
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(format!(" {key:<9}"), theme::key_hint_key()),
                    Span::styled((*what).to_string(), theme::list_row()),
                ])
            })
            .collect();

        let block = Block::default()
            .title(" Keys ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use crossterm::event::{KeyEventKind, KeyEventState};
    use melo_core::{
        CoreError, Device, DeviceIcon, StatusThresholds, UrlStyle, ViewState,
    };
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::test_util::buffer_lines;

    struct StaticSource(Vec<Device>);

    impl DeviceSource for StaticSource {
        async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
            Ok(self.0.clone())
        }

        async fn delete_device(&self, serial: &str) -> Result<(), CoreError> {
            if serial == "MELO-0001" {
                Ok(())
            } else {
                Err(CoreError::Api {
                    message: "Forbidden".into(),
                    status: Some(403),
                })
            }
        }
    }

    fn device(serial: &str, last_update: i64) -> Device {
        Device {
            serial: serial.into(),
            name: serial.to_lowercase(),
            description: String::new(),
            icon: DeviceIcon::Kitchen,
            online: true,
            last_update,
            http_port: Some(80),
            https_port: None,
            interfaces: Vec::new(),
        }
    }

    type Opened = Arc<Mutex<Vec<String>>>;

    fn app_with(navigator: Arc<dyn Navigator>) -> App<StaticSource> {
        let discover = Discover::with_source(StaticSource(vec![
            device("MELO-0001", 20),
            device("MELO-0002", 10),
        ]));
        let screen = DiscoverScreen::new(StatusThresholds::default(), UrlStyle::WithPort);
        App::new(discover, navigator, screen)
    }

    fn recording_app() -> (App<StaticSource>, Opened) {
        let opened: Opened = Arc::default();
        let sink = Arc::clone(&opened);
        let navigator: Arc<dyn Navigator> = Arc::new(move |url: &str| -> Result<(), CoreError> {
            sink.lock().unwrap().push(url.to_owned());
            Ok(())
        });
        (app_with(navigator), opened)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn serials(state: &ViewState) -> Vec<String> {
        state
            .devices()
            .unwrap_or_default()
            .iter()
            .map(|d| d.serial.clone())
            .collect()
    }

    #[test]
    fn global_keys() {
        let (mut app, _) = recording_app();
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('q'), KeyModifiers::NONE)).unwrap(),
            Some(Action::Quit)
        );
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap(),
            Some(Action::Quit)
        );
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('r'), KeyModifiers::NONE)).unwrap(),
            Some(Action::Refresh)
        );
    }

    #[test]
    fn help_overlay_captures_keys() {
        let (mut app, _) = recording_app();
        app.process_action(&Action::ToggleHelp).unwrap();

        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('r'), KeyModifiers::NONE)).unwrap(),
            None
        );
        assert_eq!(
            app.handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE)).unwrap(),
            Some(Action::ToggleHelp)
        );

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text = buffer_lines(terminal.backend().buffer()).join("\n");
        assert!(text.contains("Keys"));
        assert!(text.contains("open the selected interface"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let (mut app, _) = recording_app();
        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }

    #[test]
    fn open_url_goes_through_navigator() {
        let (mut app, opened) = recording_app();
        app.process_action(&Action::OpenUrl("http://10.0.0.5:443".into())).unwrap();

        assert_eq!(*opened.lock().unwrap(), vec!["http://10.0.0.5:443".to_owned()]);
        let (note, _) = app.notification.clone().unwrap();
        assert_eq!(note, Notification::success("Opening http://10.0.0.5:443"));

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(buffer_lines(terminal.backend().buffer())[9].contains("Opening http://10.0.0.5:443"));
    }

    #[test]
    fn navigation_failure_is_reported() {
        let navigator: Arc<dyn Navigator> = Arc::new(|url: &str| -> Result<(), CoreError> {
            Err(CoreError::Navigation {
                url: url.to_owned(),
                reason: "no opener".into(),
            })
        });
        let mut app = app_with(navigator);
        app.process_action(&Action::OpenUrl("http://fe80::1:8080".into())).unwrap();

        let (note, _) = app.notification.clone().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn refresh_loads_into_state() {
        let (mut app, _) = recording_app();
        let mut state = app.discover.subscribe();

        app.process_action(&Action::Refresh).unwrap();
        let loaded = state
            .wait_for(|s| matches!(s, ViewState::Loaded(_)))
            .await
            .unwrap()
            .clone();

        assert_eq!(serials(&loaded), vec!["MELO-0001", "MELO-0002"]);
    }

    #[tokio::test]
    async fn delete_removes_only_that_device() {
        let (mut app, _) = recording_app();
        app.discover.load().await.unwrap();

        app.process_action(&Action::RequestDelete("MELO-0001".into())).unwrap();
        assert_eq!(
            app.action_rx.recv().await,
            Some(Action::Notify(Notification::success("Deleted MELO-0001")))
        );
        assert_eq!(serials(&app.discover.state()), vec!["MELO-0002"]);
    }

    #[tokio::test]
    async fn rejected_delete_leaves_list_alone() {
        let (mut app, _) = recording_app();
        app.discover.load().await.unwrap();

        app.process_action(&Action::RequestDelete("MELO-0002".into())).unwrap();
        let next = tokio::time::timeout(Duration::from_millis(100), app.action_rx.recv()).await;
        assert!(next.is_err(), "no notification expected, got {next:?}");
        assert_eq!(serials(&app.discover.state()), vec!["MELO-0001", "MELO-0002"]);
    }

    #[tokio::test]
    async fn state_changes_reach_the_screen() {
        let (mut app, _) = recording_app();
        let devices = app.discover.load().await.unwrap();
        app.process_action(&Action::StateChanged(ViewState::Loaded(devices)))
            .unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text = buffer_lines(terminal.backend().buffer()).join("\n");
        assert!(text.contains("melo-0001"));
        assert!(text.contains("melo-0002"));
    }
}
