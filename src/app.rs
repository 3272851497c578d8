use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::options::OptionStore;
use crate::spinner::{SpinScheduler, MIN_OPTIONS};

/// Application state shared by the event loop and the renderer
#[derive(Debug)]
pub struct App<C: Clock = SystemClock> {
    pub store: OptionStore,
    pub spinner: SpinScheduler,
    pub input: String,
    /// Cursor into the option list, used for removal
    pub selected: Option<usize>,
    pub status: Option<String>,
    pub should_quit: bool,
    clock: C,
}

impl<C: Clock> App<C> {
    pub fn new(store: OptionStore, spinner: SpinScheduler, clock: C) -> Self {
        let selected = if store.is_empty() { None } else { Some(0) };
        Self {
            store,
            spinner,
            input: String::new(),
            selected,
            status: None,
            should_quit: false,
            clock,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn progress(&self) -> Option<f64> {
        self.spinner.progress(self.now_ms())
    }

    /// Time left until the spin needs another tick; zero when overdue
    pub fn next_due_in(&self) -> Option<Duration> {
        let now = self.now_ms();
        self.spinner
            .next_due_ms()
            .map(|due| Duration::from_millis(due.saturating_sub(now)))
    }

    pub fn type_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Enter: add the typed option, or spin when nothing is typed
    pub fn submit(&mut self) {
        if self.input.trim().is_empty() {
            self.input.clear();
            self.spin();
        } else {
            self.add_option();
        }
    }

    pub fn add_option(&mut self) {
        match self.store.add(&self.input) {
            Ok(index) => {
                self.input.clear();
                self.selected = Some(index);
                self.status = None;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Starts a spin over the current options. Returns whether one began.
    pub fn spin(&mut self) -> bool {
        let now = self.now_ms();
        if self.spinner.start(self.store.labels(), now) {
            self.store.freeze();
            self.status = None;
            true
        } else {
            if !self.spinner.is_spinning() && self.store.count() < MIN_OPTIONS {
                self.status = Some(format!("add at least {} options to spin", MIN_OPTIONS));
            }
            false
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        match self.store.remove(index) {
            Ok(label) => {
                debug!("removed option {:?}", label);
                self.selected = match self.store.count() {
                    0 => None,
                    n => Some(index.min(n - 1)),
                };
                self.status = None;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn clear_options(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.selected = None;
                self.status = None;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn select_next(&mut self) {
        let n = self.store.count();
        if n > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(n - 1)));
        }
    }

    pub fn select_prev(&mut self) {
        if self.store.count() > 0 {
            self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
        }
    }

    /// Advances the spin to the current time. Returns the final selection
    /// when the spin finished during this tick.
    pub fn on_tick(&mut self) -> Option<String> {
        let now = self.now_ms();
        let finished = self.spinner.advance(now).map(str::to_string);
        if !self.spinner.is_spinning() && self.store.is_frozen() {
            self.store.thaw();
        }
        finished
    }

    /// Host teardown: drop any running spin and its timers
    pub fn shutdown(&mut self) {
        self.spinner.teardown();
        self.store.thaw();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('s') if ctrl => {
                self.spin();
            }
            KeyCode::Char('l') if ctrl => self.clear_options(),
            KeyCode::Tab => {
                self.spin();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.remove_selected(),
            KeyCode::Up => self.select_prev(),
            KeyCode::Down => self.select_next(),
            KeyCode::Char(c) if !ctrl => self.type_char(c),
            _ => {}
        }
    }
}
