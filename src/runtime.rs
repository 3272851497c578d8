//! Event loop plumbing. The loop blocks on terminal input only until the
//! spin's next timer is due, so highlight changes land on time without a
//! fixed-rate poll.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Longest wait when no spin timer is pending
pub const IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Clone, Debug)]
pub enum SpinEvent {
    Key(KeyEvent),
    Resize,
    /// The wait ran out; time to advance the spin
    Tick,
}

/// Source of terminal input
pub trait SpinEventSource {
    /// Waits up to `timeout` for input. `Ok(None)` means the wait ran out
    /// or the event was of no interest.
    fn wait(&mut self, timeout: Duration) -> io::Result<Option<SpinEvent>>;
}

/// Reads the terminal directly through crossterm's poll/read
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermEventSource;

impl SpinEventSource for CrosstermEventSource {
    fn wait(&mut self, timeout: Duration) -> io::Result<Option<SpinEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let evt = match event::read()? {
            // Windows reports releases too; only presses drive the app
            CtEvent::Key(key) if key.kind != KeyEventKind::Release => Some(SpinEvent::Key(key)),
            CtEvent::Resize(_, _) => Some(SpinEvent::Resize),
            _ => None,
        };
        Ok(evt)
    }
}

/// Channel-fed source for headless runs and tests
pub struct ChannelEventSource {
    rx: Receiver<SpinEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<SpinEvent>) -> Self {
        Self { rx }
    }
}

impl SpinEventSource for ChannelEventSource {
    fn wait(&mut self, timeout: Duration) -> io::Result<Option<SpinEvent>> {
        match self.rx.recv_timeout(timeout) {
            Ok(evt) => Ok(Some(evt)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

/// Decides how long the loop may block before it has to tick
pub trait WakePolicy {
    fn wait_for(&self, next_due_in: Option<Duration>) -> Duration;
}

/// Wakes exactly when the next spin timer is due, capped at `idle`
#[derive(Clone, Copy, Debug)]
pub struct DeadlineWake {
    idle: Duration,
}

impl DeadlineWake {
    pub fn new(idle: Duration) -> Self {
        Self { idle }
    }
}

impl Default for DeadlineWake {
    fn default() -> Self {
        Self::new(IDLE_WAIT)
    }
}

impl WakePolicy for DeadlineWake {
    fn wait_for(&self, next_due_in: Option<Duration>) -> Duration {
        next_due_in.map_or(self.idle, |due| due.min(self.idle))
    }
}

/// Turns waits on the event source into a stream of app events
pub struct Runner<E: SpinEventSource, W: WakePolicy> {
    event_source: E,
    wake: W,
}

impl<E: SpinEventSource, W: WakePolicy> Runner<E, W> {
    pub fn new(event_source: E, wake: W) -> Self {
        Self { event_source, wake }
    }

    /// Blocks until input arrives or the next timer is due, whichever is
    /// first. A timeout yields `Tick`.
    pub fn step(&mut self, next_due_in: Option<Duration>) -> io::Result<SpinEvent> {
        let timeout = self.wake.wait_for(next_due_in);
        Ok(self.event_source.wait(timeout)?.unwrap_or(SpinEvent::Tick))
    }
}
