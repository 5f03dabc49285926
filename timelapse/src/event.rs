//! Event bus for the timelapse viewer.
//!
//! Terminal input and the two timers are folded into one `AppEvent` stream on
//! a tokio unbounded channel. Fetch results do not travel on this bus: they
//! sit in the `Timelapse` completion queue until the next `Render` event calls
//! `Timelapse::update`.
//!
//! - **Render interval** (33 ms, about 30 FPS): drain fetch results, draw.
//! - **Tick interval** (250 ms): housekeeping such as expiring status messages.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

#[derive(Debug)]
pub enum AppEvent {
    /// Key press (`KeyEventKind::Press` only; release/repeat are filtered).
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
}

pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task feeding `tx` with input and timer events.
///
/// The task stops once the receiver is dropped. `reader.next().fuse()` keeps
/// `select!` from polling a finished crossterm stream.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let event = tokio::select! {
                _ = tick_interval.tick() => AppEvent::Tick,
                _ = render_interval.tick() => AppEvent::Render,
                maybe_event = reader.next().fuse() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                    Some(Ok(Event::Resize(w, h))) => AppEvent::Resize(w, h),
                    Some(Ok(Event::Mouse(mouse))) => AppEvent::Mouse(mouse),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "terminal input error");
                        continue;
                    }
                    None => break,
                },
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}
