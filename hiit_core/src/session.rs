//! Running a timer session against a real (or fast-forwarded) clock.
//!
//! The session owns one [`TimerEngine`] and processes one [`Control`] at a
//! time, so transitions never overlap. Clock ticks are generated here from a
//! single deadline; whenever the engine opens a new countdown the deadline is
//! reset, which means a stale second can never land on the next phase.
//!
//! When the engine reports completion the record is handed to the stats
//! store on a background thread. The session keeps going (the host can show
//! the completion screen right away) and the commit result is collected at
//! the end.

use crate::store::{spawn_commit, CommitOutcome, StatsStore};
use crate::timer::{CountdownId, TimerEngine, TimerEvent};
use crate::{Result, WorkoutLog, WorkoutPlan};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Input to a running session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// One second elapsed on the given countdown
    Tick(CountdownId),
    Skip,
    Pause,
    Resume,
    /// Leave the workout early; nothing is recorded
    Quit,
}

/// What happened to the completion record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitStatus {
    Saved,
    DuplicateSuppressed,
    /// The workout still counts as finished; only the stats write failed
    Failed(String),
}

/// How a session ended
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    Completed {
        log: WorkoutLog,
        commit: CommitStatus,
    },
    Abandoned {
        elapsed_seconds: u32,
    },
}

/// One workout in progress
pub struct WorkoutSession {
    engine: TimerEngine,
    store: Arc<dyn StatsStore + Send + Sync>,
    completed: Option<WorkoutLog>,
    pending_commit: Option<JoinHandle<Result<CommitOutcome>>>,
    spawn_error: Option<String>,
    quit: bool,
}

impl WorkoutSession {
    /// Validate the plan and open the first get-ready countdown
    pub fn start(
        plan: WorkoutPlan,
        user_id: Uuid,
        store: Arc<dyn StatsStore + Send + Sync>,
    ) -> Result<(Self, Vec<TimerEvent>)> {
        let mut engine = TimerEngine::new(plan, user_id)?;
        let events = engine.start();
        let session = Self {
            engine,
            store,
            completed: None,
            pending_commit: None,
            spawn_error: None,
            quit: false,
        };
        Ok((session, events))
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    /// Finished or quit
    pub fn is_done(&self) -> bool {
        self.quit || self.engine.is_finished()
    }

    /// Apply one control and submit the completion record if it appeared
    pub fn handle(&mut self, control: Control) -> Vec<TimerEvent> {
        if self.quit {
            return Vec::new();
        }

        let events = match control {
            Control::Tick(id) => self.engine.on_tick(id),
            Control::Skip => self.engine.skip(),
            Control::Pause => self.engine.pause(),
            Control::Resume => self.engine.resume(),
            Control::Quit => {
                if !self.engine.is_finished() {
                    tracing::info!(
                        "Workout abandoned after {}s",
                        self.engine.elapsed_seconds()
                    );
                    self.quit = true;
                }
                Vec::new()
            }
        };

        for event in &events {
            if let TimerEvent::Completed(log) = event {
                self.submit(log.clone());
            }
        }
        events
    }

    fn submit(&mut self, log: WorkoutLog) {
        if self.completed.is_some() {
            return;
        }
        self.completed = Some(log.clone());

        match spawn_commit(Arc::clone(&self.store), log) {
            Ok(handle) => self.pending_commit = Some(handle),
            Err(e) => {
                tracing::warn!("Could not submit workout stats: {}", e);
                self.spawn_error = Some(e.to_string());
            }
        }
    }

    /// Drive the session until it finishes or is abandoned.
    ///
    /// Ticks every `interval`; `Duration::ZERO` fast-forwards without
    /// sleeping. A disconnected control channel counts as quitting.
    pub fn run<F>(mut self, controls: &Receiver<Control>, interval: Duration, mut on_event: F) -> SessionOutcome
    where
        F: FnMut(&TimerEngine, &TimerEvent),
    {
        let mut countdown = self.engine.active_countdown();
        let mut next_tick = Instant::now() + interval;

        while !self.is_done() {
            let wait = next_tick.saturating_duration_since(Instant::now());
            let control = match controls.recv_timeout(wait) {
                Ok(Control::Resume) => {
                    next_tick = Instant::now() + interval;
                    Control::Resume
                }
                Ok(control) => control,
                Err(RecvTimeoutError::Timeout) => {
                    next_tick += interval;
                    match self.engine.active_countdown() {
                        Some(id) => Control::Tick(id),
                        None => continue,
                    }
                }
                Err(RecvTimeoutError::Disconnected) => Control::Quit,
            };

            for event in self.handle(control) {
                on_event(&self.engine, &event);
            }

            // A new phase gets a full first second
            if self.engine.active_countdown() != countdown {
                countdown = self.engine.active_countdown();
                next_tick = Instant::now() + interval;
            }
        }

        self.finish()
    }

    /// Wait for the background commit and report how the session ended
    pub fn finish(mut self) -> SessionOutcome {
        let log = match self.completed.take() {
            Some(log) => log,
            None => {
                return SessionOutcome::Abandoned {
                    elapsed_seconds: self.engine.elapsed_seconds(),
                }
            }
        };

        let commit = match (self.pending_commit.take(), self.spawn_error.take()) {
            (Some(handle), _) => match handle.join() {
                Ok(Ok(CommitOutcome::Saved)) => CommitStatus::Saved,
                Ok(Ok(CommitOutcome::DuplicateSuppressed)) => CommitStatus::DuplicateSuppressed,
                Ok(Err(e)) => {
                    tracing::warn!("Workout completed but stats couldn't be saved: {}", e);
                    CommitStatus::Failed(e.to_string())
                }
                Err(_) => {
                    tracing::warn!("Stats commit thread panicked");
                    CommitStatus::Failed("commit thread panicked".into())
                }
            },
            (None, Some(reason)) => CommitStatus::Failed(reason),
            (None, None) => CommitStatus::Failed("commit was never submitted".into()),
        };

        SessionOutcome::Completed { log, commit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;
    use crate::timer::Phase;
    use crate::{Equipment, Exercise, ExerciseCategory, WorkoutSettings};
    use std::sync::mpsc::channel;

    fn plan(names: &[&str], rounds: u32, work: u32, rest: u32) -> WorkoutPlan {
        WorkoutPlan::new(
            names
                .iter()
                .map(|n| Exercise::new(n, Equipment::None, ExerciseCategory::Cardio, "none/x.mp4"))
                .collect(),
            WorkoutSettings {
                rounds,
                exercise_time_seconds: work,
                rest_time_seconds: rest,
                round_rest_time_seconds: 0,
            },
            90,
        )
    }

    fn memory_store() -> (Arc<MemoryStore>, Arc<dyn StatsStore + Send + Sync>) {
        let store = Arc::new(MemoryStore::default());
        let shared: Arc<dyn StatsStore + Send + Sync> = store.clone();
        (store, shared)
    }

    #[test]
    fn test_fast_forward_completes_and_commits_once() {
        crate::logging::init_test();
        let (store, shared) = memory_store();
        let (session, _) = WorkoutSession::start(plan(&["A", "B"], 1, 30, 15), Uuid::new_v4(), shared).unwrap();

        let (_tx, rx) = channel();
        let mut phases = Vec::new();
        let outcome = session.run(&rx, Duration::ZERO, |_, event| {
            if let TimerEvent::PhaseStarted { phase, .. } = event {
                phases.push(*phase);
            }
        });

        assert_eq!(
            phases,
            vec![
                Phase::Working,
                Phase::Resting,
                Phase::GetReady,
                Phase::Working,
                Phase::Finished
            ]
        );
        match outcome {
            SessionOutcome::Completed { log, commit } => {
                assert_eq!(commit, CommitStatus::Saved);
                assert_eq!(log.duration_minutes, 2);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_skip_burst_commits_once() {
        let (store, shared) = memory_store();
        let (session, _) = WorkoutSession::start(plan(&["A", "B", "C"], 2, 30, 10), Uuid::new_v4(), shared).unwrap();

        let (tx, rx) = channel();
        for _ in 0..100 {
            tx.send(Control::Skip).unwrap();
        }

        let mut completions = 0;
        let outcome = session.run(&rx, Duration::ZERO, |_, event| {
            if matches!(event, TimerEvent::Completed(_)) {
                completions += 1;
            }
        });

        assert!(matches!(outcome, SessionOutcome::Completed { .. }));
        assert_eq!(completions, 1);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_quit_records_nothing() {
        let (store, shared) = memory_store();
        let (session, _) = WorkoutSession::start(plan(&["A"], 1, 30, 10), Uuid::new_v4(), shared).unwrap();

        let (tx, rx) = channel();
        tx.send(Control::Skip).unwrap();
        tx.send(Control::Quit).unwrap();

        let outcome = session.run(&rx, Duration::from_secs(60), |_, _| {});
        assert_eq!(outcome, SessionOutcome::Abandoned { elapsed_seconds: 0 });
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_disconnected_controls_abandon() {
        let (store, shared) = memory_store();
        let (session, _) = WorkoutSession::start(plan(&["A"], 1, 30, 10), Uuid::new_v4(), shared).unwrap();

        let (tx, rx) = channel::<Control>();
        drop(tx);

        let outcome = session.run(&rx, Duration::from_secs(60), |_, _| {});
        assert!(matches!(outcome, SessionOutcome::Abandoned { .. }));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_failed_commit_still_completes() {
        let shared: Arc<dyn StatsStore + Send + Sync> = Arc::new(MemoryStore::failing());
        let (session, _) = WorkoutSession::start(plan(&["A"], 1, 5, 0), Uuid::new_v4(), shared).unwrap();

        let (_tx, rx) = channel();
        let mut saw_completion = false;
        let outcome = session.run(&rx, Duration::ZERO, |_, event| {
            if matches!(event, TimerEvent::Completed(_)) {
                saw_completion = true;
            }
        });

        assert!(saw_completion);
        match outcome {
            SessionOutcome::Completed { commit, .. } => {
                assert!(matches!(commit, CommitStatus::Failed(_)));
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_pause_holds_while_paused() {
        let (store, shared) = memory_store();
        let (mut session, _) = WorkoutSession::start(plan(&["A"], 1, 5, 0), Uuid::new_v4(), shared).unwrap();

        session.handle(Control::Pause);
        let id = session.engine().active_countdown().unwrap();
        for _ in 0..10 {
            assert!(session.handle(Control::Tick(id)).is_empty());
        }
        assert_eq!(session.engine().state().remaining_seconds, 3);

        session.handle(Control::Resume);
        session.handle(Control::Tick(id));
        assert_eq!(session.engine().state().remaining_seconds, 2);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_invalid_plan_fails_to_start() {
        let (_, shared) = memory_store();
        let result = WorkoutSession::start(plan(&[], 1, 5, 0), Uuid::new_v4(), shared);
        assert!(matches!(result, Err(crate::Error::InvalidPlan(_))));
    }

    #[test]
    fn test_duplicate_window_across_sessions() {
        let (store, shared) = memory_store();
        let user = Uuid::new_v4();

        for expected in [CommitStatus::Saved, CommitStatus::DuplicateSuppressed] {
            let (session, _) = WorkoutSession::start(plan(&["A"], 1, 2, 0), user, Arc::clone(&shared)).unwrap();
            let (_tx, rx) = channel();
            match session.run(&rx, Duration::ZERO, |_, _| {}) {
                SessionOutcome::Completed { commit, .. } => assert_eq!(commit, expected),
                other => panic!("expected completion, got {:?}", other),
            }
        }
        assert_eq!(store.count(), 1);
    }
}
