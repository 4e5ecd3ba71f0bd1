//! Terminal input and clock pulses, merged into one channel.
//!
//! A background task reads crossterm's `EventStream` and two intervals; the
//! app loop pulls from [`EventReader::next`].

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// New terminal size as (cols, rows).
    Resize(u16, u16),
    /// Clock pulse for status ageing and the loading spinner.
    Tick,
    /// Time to draw a frame.
    Render,
}

impl Event {
    /// Keep key presses, mouse and resize; drop releases, repeats, focus
    /// and paste events.
    fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            CrosstermEvent::Mouse(mouse) => Some(Self::Mouse(mouse)),
            CrosstermEvent::Resize(w, h) => Some(Self::Resize(w, h)),
            _ => None,
        }
    }
}

/// Paced interval that skips missed pulses instead of bursting.
fn pulse(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the reader. `tick_rate` paces [`Event::Tick`], `render_rate`
    /// paces [`Event::Render`].
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_events(tx, cancel.clone(), tick_rate, render_rate));
        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_events(
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
    render_rate: Duration,
) {
    let mut terminal = EventStream::new();
    let mut ticks = pulse(tick_rate);
    let mut frames = pulse(render_rate);

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticks.tick() => Event::Tick,
            _ = frames.tick() => Event::Render,
            Some(Ok(raw)) = terminal.next() => match Event::from_terminal(raw) {
                Some(event) => event,
                None => continue,
            },
        };

        // Receiver gone: the app loop has ended.
        if tx.send(event).is_err() {
            return;
        }
    }
}
