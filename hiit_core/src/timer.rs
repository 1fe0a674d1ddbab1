//! Interval timer state machine.
//!
//! A workout runs through four phases:
//!
//! ```text
//! GetReady(3) -> Working -> Resting -> GetReady(3) -> Working -> ... -> Finished
//! ```
//!
//! The engine is driven from outside: the host delivers one tick per second
//! and forwards pause/resume/skip from the user. Natural expiry and skip go
//! through the same transition function, so skipping can never leave the
//! round/exercise bookkeeping in a state that ticking would not.
//!
//! Every phase start opens a new countdown with a fresh [`CountdownId`].
//! Only the active countdown is honoured; a tick carrying an older id is
//! dropped. Entering `Finished` flips the commit latch before the completion
//! record is handed out, so the record is produced at most once per engine.

use crate::{Exercise, Result, WorkoutLog, WorkoutPlan};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Length of the get-ready countdown before every exercise
pub const GET_READY_SECONDS: u32 = 3;

/// Phase of a running workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    GetReady,
    Working,
    Resting,
    Finished,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::GetReady => "GET READY",
            Phase::Working => "WORK",
            Phase::Resting => "REST",
            Phase::Finished => "DONE",
        }
    }
}

/// Identifies one countdown. A new id is issued at every phase start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CountdownId(u64);

/// Mutable state of one timer session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimerState {
    pub phase: Phase,
    pub current_round: u32,
    pub current_exercise_index: usize,
    pub remaining_seconds: u32,
    pub total_phase_seconds: u32,
    pub is_paused: bool,
    pub has_committed: bool,
}

/// Something the host should render, play or persist
#[derive(Clone, Debug, PartialEq)]
pub enum TimerEvent {
    /// A phase began. Round and exercise are 0-indexed.
    PhaseStarted {
        phase: Phase,
        round: u32,
        exercise_index: usize,
        seconds: u32,
    },
    /// Get-ready count to announce (3, 2, 1)
    Cue(u32),
    /// The active countdown moved to this many seconds
    Tick(u32),
    Paused,
    Resumed,
    /// Workout finished; persist this record. Emitted at most once.
    Completed(WorkoutLog),
}

/// Timer engine for one workout plan
#[derive(Clone, Debug)]
pub struct TimerEngine {
    plan: WorkoutPlan,
    user_id: Uuid,
    state: TimerState,
    countdown: Option<CountdownId>,
    next_countdown: u64,
    started: bool,
    elapsed_seconds: u32,
}

impl TimerEngine {
    /// Build an engine for a plan. Refuses plans it could not run.
    pub fn new(plan: WorkoutPlan, user_id: Uuid) -> Result<Self> {
        plan.validate()?;

        let state = TimerState {
            phase: Phase::GetReady,
            current_round: 0,
            current_exercise_index: 0,
            remaining_seconds: GET_READY_SECONDS,
            total_phase_seconds: GET_READY_SECONDS,
            is_paused: false,
            has_committed: false,
        };

        Ok(Self {
            plan,
            user_id,
            state,
            countdown: None,
            next_countdown: 0,
            started: false,
            elapsed_seconds: 0,
        })
    }

    /// Open the first get-ready countdown. Calling twice does nothing.
    pub fn start(&mut self) -> Vec<TimerEvent> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        tracing::info!(
            "Starting workout {}: {} exercises x {} rounds",
            self.plan.id,
            self.plan.exercises.len(),
            self.plan.settings.rounds
        );

        let mut events = Vec::new();
        self.enter_get_ready(&mut events);
        events
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    /// Id of the countdown currently allowed to tick, if any
    pub fn active_countdown(&self) -> Option<CountdownId> {
        self.countdown
    }

    /// Seconds of countdown consumed so far (pauses excluded)
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Exercise being performed, or coming up during get-ready
    pub fn current_exercise(&self) -> Option<&Exercise> {
        if self.is_finished() {
            return None;
        }
        self.plan.exercises.get(self.state.current_exercise_index)
    }

    /// Exercise that follows the current one, across rounds
    pub fn next_exercise(&self) -> Option<&Exercise> {
        if self.is_finished() {
            return None;
        }
        let count = self.plan.exercises.len();
        let next = self.state.current_exercise_index + 1;
        if next < count {
            self.plan.exercises.get(next)
        } else if self.state.current_round + 1 < self.plan.settings.rounds {
            self.plan.exercises.first()
        } else {
            None
        }
    }

    /// Share of the current phase still left, 100 at phase start
    pub fn progress_percent(&self) -> f64 {
        if self.state.total_phase_seconds == 0 {
            return 0.0;
        }
        self.state.remaining_seconds as f64 / self.state.total_phase_seconds as f64 * 100.0
    }

    /// Advance the active countdown by one second
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        match self.countdown {
            Some(id) => self.on_tick(id),
            None => Vec::new(),
        }
    }

    /// Advance the countdown `id` by one second.
    ///
    /// Ignored when `id` is no longer the active countdown, while paused,
    /// and after the workout finished.
    pub fn on_tick(&mut self, id: CountdownId) -> Vec<TimerEvent> {
        if self.countdown != Some(id) {
            tracing::trace!("Dropping tick for stale countdown {:?}", id);
            return Vec::new();
        }
        if self.state.is_paused || self.is_finished() {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        self.elapsed_seconds += 1;
        events.push(TimerEvent::Tick(self.state.remaining_seconds));

        if self.state.remaining_seconds == 0 {
            self.expire(&mut events);
        } else if self.state.phase == Phase::GetReady {
            events.push(TimerEvent::Cue(self.state.remaining_seconds));
        }
        events
    }

    /// End the current phase now, exactly as if its countdown ran out
    pub fn skip(&mut self) -> Vec<TimerEvent> {
        if self.state.has_committed || self.is_finished() || !self.started {
            return Vec::new();
        }
        tracing::debug!(
            "Skipping {:?} (round {}, exercise {})",
            self.state.phase,
            self.state.current_round,
            self.state.current_exercise_index
        );

        let mut events = Vec::new();
        self.state.remaining_seconds = 0;
        self.expire(&mut events);
        events
    }

    /// Freeze the active countdown
    pub fn pause(&mut self) -> Vec<TimerEvent> {
        if self.state.is_paused || self.is_finished() {
            return Vec::new();
        }
        self.state.is_paused = true;
        vec![TimerEvent::Paused]
    }

    /// Continue the countdown from where it was frozen
    pub fn resume(&mut self) -> Vec<TimerEvent> {
        if !self.state.is_paused || self.is_finished() {
            return Vec::new();
        }
        self.state.is_paused = false;
        vec![TimerEvent::Resumed]
    }

    /// Phase transition table, shared by natural expiry and skip
    fn expire(&mut self, events: &mut Vec<TimerEvent>) {
        let exercise_count = self.plan.exercises.len();
        let rounds = self.plan.settings.rounds;
        let last_exercise = self.state.current_exercise_index + 1 >= exercise_count;
        let last_round = self.state.current_round + 1 >= rounds;

        match self.state.phase {
            Phase::GetReady => self.enter_working(events),
            Phase::Working => {
                if last_exercise && last_round {
                    self.finish(events);
                } else if self.plan.settings.rest_time_seconds == 0 {
                    // No zero-length countdowns: move on as if rest expired
                    self.advance_after_rest(events);
                } else {
                    self.enter_resting(events);
                }
            }
            Phase::Resting => self.advance_after_rest(events),
            Phase::Finished => {}
        }
    }

    fn advance_after_rest(&mut self, events: &mut Vec<TimerEvent>) {
        let exercise_count = self.plan.exercises.len();
        let rounds = self.plan.settings.rounds;

        if self.state.current_exercise_index + 1 < exercise_count {
            self.state.current_exercise_index += 1;
            self.enter_get_ready(events);
        } else if self.state.current_round + 1 < rounds {
            self.state.current_round += 1;
            self.state.current_exercise_index = 0;
            tracing::info!("Starting round {} of {}", self.state.current_round + 1, rounds);
            self.enter_get_ready(events);
        } else {
            // Working already finishes on the last exercise of the last round
            tracing::warn!("Rest expired after the final exercise; finishing workout");
            self.finish(events);
        }
    }

    fn enter_get_ready(&mut self, events: &mut Vec<TimerEvent>) {
        self.begin_phase(Phase::GetReady, GET_READY_SECONDS, events);
        events.push(TimerEvent::Cue(GET_READY_SECONDS));
    }

    fn enter_working(&mut self, events: &mut Vec<TimerEvent>) {
        self.begin_phase(
            Phase::Working,
            self.plan.settings.exercise_time_seconds,
            events,
        );
    }

    fn enter_resting(&mut self, events: &mut Vec<TimerEvent>) {
        self.begin_phase(Phase::Resting, self.plan.settings.rest_time_seconds, events);
    }

    fn begin_phase(&mut self, phase: Phase, seconds: u32, events: &mut Vec<TimerEvent>) {
        // Replace the countdown before anything else can tick
        self.countdown = Some(CountdownId(self.next_countdown));
        self.next_countdown += 1;

        self.state.phase = phase;
        self.state.remaining_seconds = seconds;
        self.state.total_phase_seconds = seconds;

        tracing::debug!(
            "Entered {:?} for {}s (round {}, exercise {})",
            phase,
            seconds,
            self.state.current_round,
            self.state.current_exercise_index
        );
        events.push(TimerEvent::PhaseStarted {
            phase,
            round: self.state.current_round,
            exercise_index: self.state.current_exercise_index,
            seconds,
        });
    }

    fn finish(&mut self, events: &mut Vec<TimerEvent>) {
        if self.state.has_committed {
            return;
        }
        // Latch first: nothing after this point can produce a second record
        self.state.has_committed = true;
        self.countdown = None;
        self.state.phase = Phase::Finished;
        self.state.remaining_seconds = 0;

        let record = WorkoutLog::new(
            self.user_id,
            duration_minutes(self.plan.total_duration_seconds),
            Utc::now(),
        );
        tracing::info!(
            "Workout {} finished after {}s; recording {} minutes",
            self.plan.id,
            self.elapsed_seconds,
            record.duration_minutes
        );

        events.push(TimerEvent::PhaseStarted {
            phase: Phase::Finished,
            round: self.state.current_round,
            exercise_index: self.state.current_exercise_index,
            seconds: 0,
        });
        events.push(TimerEvent::Completed(record));
    }
}

/// Whole minutes credited for a workout, rounded up
pub fn duration_minutes(total_duration_seconds: u32) -> u32 {
    total_duration_seconds.div_ceil(60)
}

/// `m:ss` display, e.g. `125` -> `"2:05"`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
