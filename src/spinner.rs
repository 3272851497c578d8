//! The spin scheduler: a timed state machine cycling a highlight over a
//! frozen list of options, slowing down at fixed checkpoints, and finally
//! committing to an independently drawn random option.

use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerHandle, TimerQueue};

pub const BASE_INTERVAL_MS: u64 = 90;
pub const SLOWDOWN_STEP_MS: u64 = 80;
pub const CHECKPOINT_RATIOS: [f64; 3] = [0.5, 0.75, 0.9];
pub const MIN_DURATION_MS: u64 = 2000;
/// Exclusive upper bound of the sampled spin duration
pub const MAX_DURATION_MS: u64 = 3200;
pub const MIN_OPTIONS: usize = 2;

/// Upper bounds accepted from configuration
pub const MAX_INTERVAL_MS: u64 = 60_000;
pub const MAX_SPIN_MS: u64 = 600_000;
pub const MAX_CHECKPOINTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinTiming {
    pub base_interval_ms: u64,
    pub slowdown_step_ms: u64,
    pub checkpoint_ratios: Vec<f64>,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            base_interval_ms: BASE_INTERVAL_MS,
            slowdown_step_ms: SLOWDOWN_STEP_MS,
            checkpoint_ratios: CHECKPOINT_RATIOS.to_vec(),
            min_duration_ms: MIN_DURATION_MS,
            max_duration_ms: MAX_DURATION_MS,
        }
    }
}

impl SpinTiming {
    pub fn is_valid(&self) -> bool {
        let ratios_ok = self.checkpoint_ratios.len() <= MAX_CHECKPOINTS
            && self.checkpoint_ratios.iter().all(|r| *r > 0.0 && *r < 1.0)
            && self.checkpoint_ratios.windows(2).all(|w| w[0] < w[1]);

        (1..=MAX_INTERVAL_MS).contains(&self.base_interval_ms)
            && self.slowdown_step_ms <= MAX_INTERVAL_MS
            && self.min_duration_ms < self.max_duration_ms
            && self.max_duration_ms <= MAX_SPIN_MS
            && ratios_ok
    }

    /// Returns self when valid, otherwise the default timing
    pub fn validated(self) -> Self {
        if self.is_valid() {
            self
        } else {
            warn!("invalid spin timing {:?}, falling back to defaults", self);
            Self::default()
        }
    }

    /// Tick period applied when checkpoint `index` fires
    pub fn period_after_checkpoint(&self, index: usize) -> u64 {
        let steps = (index as u64).saturating_add(1);
        self.base_interval_ms
            .saturating_add(steps.saturating_mul(self.slowdown_step_ms))
    }

    pub fn checkpoint_offset(&self, total_duration_ms: u64, index: usize) -> u64 {
        (total_duration_ms as f64 * self.checkpoint_ratios[index]) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
}

/// Payload of the scheduler's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinTimer {
    Tick,
    Checkpoint(usize),
    Complete,
}

/// One run of the scheduler, alive only while spinning
#[derive(Debug, Clone)]
pub struct SpinSession {
    pub total_duration_ms: u64,
    pub started_at_ms: u64,
    pub tick_interval_ms: u64,
    pub labels: Vec<String>,
    pub ticks: u64,
    /// Every tick period used this session, in application order
    pub applied_periods: Vec<u64>,
    tick_timer: TimerHandle,
    checkpoint_timers: Vec<TimerHandle>,
    completion_timer: TimerHandle,
}

impl SpinSession {
    pub fn option_count(&self) -> usize {
        self.labels.len()
    }

    pub fn ends_at_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.total_duration_ms)
    }
}

#[derive(Debug)]
pub struct SpinScheduler<R = StdRng> {
    timing: SpinTiming,
    rng: R,
    timers: TimerQueue<SpinTimer>,
    session: Option<SpinSession>,
    highlight_index: Option<usize>,
    final_index: Option<usize>,
    final_selection: Option<String>,
}

impl SpinScheduler<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SpinScheduler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SpinScheduler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            timing: SpinTiming::default(),
            rng,
            timers: TimerQueue::new(),
            session: None,
            highlight_index: None,
            final_index: None,
            final_selection: None,
        }
    }

    pub fn with_timing(mut self, timing: SpinTiming) -> Self {
        self.timing = timing.validated();
        self
    }

    pub fn timing(&self) -> &SpinTiming {
        &self.timing
    }

    pub fn phase(&self) -> Phase {
        if self.session.is_some() {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.session.is_some()
    }

    pub fn highlight_index(&self) -> Option<usize> {
        self.highlight_index
    }

    pub fn final_index(&self) -> Option<usize> {
        self.final_index
    }

    pub fn final_selection(&self) -> Option<&str> {
        self.final_selection.as_deref()
    }

    pub fn session(&self) -> Option<&SpinSession> {
        self.session.as_ref()
    }

    pub fn tick_interval_ms(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.tick_interval_ms)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn pending_tick_timers(&self) -> usize {
        self.timers.periodic_count()
    }

    /// When the next timer is due, if a session is running
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Fraction of the session elapsed at `now_ms`, in `[0, 1]`
    pub fn progress(&self, now_ms: u64) -> Option<f64> {
        self.session.as_ref().map(|s| {
            let elapsed = now_ms.saturating_sub(s.started_at_ms) as f64;
            (elapsed / s.total_duration_ms as f64).min(1.0)
        })
    }

    /// Begins a session over `labels`. Returns false, changing nothing, when
    /// a session is already running or there are fewer than two options.
    pub fn start(&mut self, labels: &[String], now_ms: u64) -> bool {
        if self.session.is_some() {
            debug!("start ignored: spin already in progress");
            return false;
        }
        if labels.len() < MIN_OPTIONS {
            debug!("start ignored: {} option(s), need {}", labels.len(), MIN_OPTIONS);
            return false;
        }

        // Nothing from an earlier session may outlive it.
        self.timers.clear();

        let total_duration_ms = self
            .rng
            .gen_range(self.timing.min_duration_ms..self.timing.max_duration_ms);

        let checkpoint_timers = (0..self.timing.checkpoint_ratios.len())
            .map(|i| {
                let offset = self.timing.checkpoint_offset(total_duration_ms, i);
                self.timers
                    .schedule_once(now_ms, offset, SpinTimer::Checkpoint(i))
            })
            .collect();
        let completion_timer = self
            .timers
            .schedule_once(now_ms, total_duration_ms, SpinTimer::Complete);
        let base = self.timing.base_interval_ms;
        let tick_timer = self.timers.schedule_periodic(now_ms, base, SpinTimer::Tick);

        self.final_index = None;
        self.final_selection = None;
        self.highlight_index = None;
        self.session = Some(SpinSession {
            total_duration_ms,
            started_at_ms: now_ms,
            tick_interval_ms: base,
            labels: labels.to_vec(),
            ticks: 0,
            applied_periods: vec![base],
            tick_timer,
            checkpoint_timers,
            completion_timer,
        });

        info!(
            "spin started over {} options for {}ms",
            labels.len(),
            total_duration_ms
        );

        // The highlight lands on the first option right away.
        self.on_tick();
        true
    }

    /// Runs every timer due at or before `now_ms`, one at a time in due
    /// order. Returns the final selection if the session completed here.
    pub fn advance(&mut self, now_ms: u64) -> Option<&str> {
        let mut completed = false;

        while let Some(fired) = self.timers.pop_due(now_ms) {
            match fired.payload {
                SpinTimer::Tick => self.on_tick(),
                SpinTimer::Checkpoint(i) => self.on_checkpoint(i, fired.due_ms),
                SpinTimer::Complete => {
                    self.on_complete();
                    completed = true;
                }
            }
        }

        if completed {
            self.final_selection.as_deref()
        } else {
            None
        }
    }

    fn on_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let n = session.option_count();
        let next = self.highlight_index.map_or(0, |i| (i + 1) % n);
        self.highlight_index = Some(next);
        session.ticks += 1;
    }

    fn on_checkpoint(&mut self, index: usize, due_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let period = self.timing.period_after_checkpoint(index);

        // Replace the periodic timer; never adjust it in place.
        self.timers.cancel(session.tick_timer);
        session.tick_timer = self.timers.schedule_periodic(due_ms, period, SpinTimer::Tick);
        session.tick_interval_ms = period;
        session.applied_periods.push(period);

        debug!("checkpoint {} reached, tick period now {}ms", index, period);
    }

    fn on_complete(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.cancel_session_timers(&session);

        let index = self.rng.gen_range(0..session.option_count());
        self.final_index = Some(index);
        self.highlight_index = Some(index);
        self.final_selection = session.labels.get(index).cloned();

        info!(
            "spin finished after {} ticks: {:?}",
            session.ticks, self.final_selection
        );
    }

    fn cancel_session_timers(&mut self, session: &SpinSession) {
        self.timers.cancel(session.tick_timer);
        for handle in &session.checkpoint_timers {
            self.timers.cancel(*handle);
        }
        self.timers.cancel(session.completion_timer);
        debug_assert!(self.timers.is_empty());
    }

    /// Abandons the running session, if any, leaving no scheduled work.
    /// No selection is made. Safe to call at any time.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.cancel_session_timers(&session);
            self.highlight_index = None;
            debug!("spin torn down after {} ticks", session.ticks);
        }
        self.timers.clear();
    }
}
