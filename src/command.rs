//! Two-stage command composition.
//!
//! A mode gesture picks a functional domain, a later action gesture picks an
//! operation inside it. The classifier runs on every frame, so commits are
//! gated by a debounce interval: a held gesture fires once per interval, not
//! once per frame. The reset gesture is the one transition that skips the gate.

use std::time::{Duration, Instant};

use crate::classifier::Label;
use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingMode,
    AwaitingAction,
}

/// Session state threaded through every step. Created per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandState {
    stage: Stage,
    mode: Option<String>,
    last_commit: Instant,
}

impl CommandState {
    pub fn new(now: Instant) -> Self {
        Self {
            stage: Stage::AwaitingMode,
            mode: None,
            last_commit: now,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn last_commit(&self) -> Instant {
        self.last_commit
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_commit)
    }
}

/// What a step did, for the caller to report or dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Debounce interval still running while waiting for a mode; informational only
    Pending { label: Label },
    /// Unrecognized gesture where a mode was expected; timer restarted
    ModeRejected,
    ModeSelected { mode: String },
    /// Action seen before the debounce interval elapsed; echoed, not dispatched
    Held { action: String },
    Dispatch { mode: String, action: String },
    Reset,
    /// Unrecognized gesture where an action was expected
    RepeatGesture,
}

#[derive(Debug, Clone)]
pub struct CommandMachine {
    debounce: Duration,
    reset_label: String,
}

impl CommandMachine {
    pub fn new(debounce: Duration, reset_label: impl Into<String>) -> Self {
        Self {
            debounce,
            reset_label: reset_label.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.debounce(), config.reset_label.clone())
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Advance the session by one classified frame observed at `now`.
    pub fn step(&self, mut state: CommandState, label: &Label, now: Instant) -> (CommandState, Outcome) {
        let gate_open = state.elapsed(now) > self.debounce;

        match state.stage {
            Stage::AwaitingMode => {
                if !gate_open {
                    return (state, Outcome::Pending { label: label.clone() });
                }
                state.last_commit = now;
                match label {
                    Label::Unknown => {
                        state.mode = None;
                        (state, Outcome::ModeRejected)
                    }
                    Label::Known(name) => {
                        state.mode.get_or_insert_with(String::new).push_str(name);
                        state.stage = Stage::AwaitingAction;
                        let mode = state.mode.clone().unwrap_or_default();
                        (state, Outcome::ModeSelected { mode })
                    }
                }
            }
            Stage::AwaitingAction => match label {
                Label::Unknown => (state, Outcome::RepeatGesture),
                Label::Known(name) if *name == self.reset_label => {
                    state.stage = Stage::AwaitingMode;
                    state.mode = None;
                    (state, Outcome::Reset)
                }
                Label::Known(name) => {
                    if !gate_open {
                        return (state, Outcome::Held { action: name.clone() });
                    }
                    state.last_commit = now;
                    let mode = state.mode.clone().unwrap_or_default();
                    (
                        state,
                        Outcome::Dispatch {
                            mode,
                            action: name.clone(),
                        },
                    )
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(s: &str) -> Label {
        Label::Known(s.to_string())
    }

    fn machine() -> CommandMachine {
        CommandMachine::new(Duration::from_secs(4), "Stop")
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn mode_then_action_dispatches_pair() {
        let m = machine();
        let t0 = Instant::now();
        let state = CommandState::new(t0);

        let (state, out) = m.step(state, &known("One"), t0 + secs(4.5));
        assert_eq!(out, Outcome::ModeSelected { mode: "One".into() });
        assert_eq!(state.stage(), Stage::AwaitingAction);

        let (state, out) = m.step(state, &known("Thumb-up"), t0 + secs(9.0));
        assert_eq!(
            out,
            Outcome::Dispatch {
                mode: "One".into(),
                action: "Thumb-up".into()
            }
        );
        // Dispatching does not leave the mode.
        assert_eq!(state.stage(), Stage::AwaitingAction);
        assert_eq!(state.mode(), Some("One"));

        let (state, out) = m.step(state, &known("Stop"), t0 + secs(9.1));
        assert_eq!(out, Outcome::Reset);
        assert_eq!(state.stage(), Stage::AwaitingMode);
        assert_eq!(state.mode(), None);
    }

    #[test]
    fn reset_bypasses_debounce() {
        let m = machine();
        let t0 = Instant::now();
        let (state, _) = m.step(CommandState::new(t0), &known("Two"), t0 + secs(5.0));
        let committed = state.last_commit();

        let (state, out) = m.step(state, &known("Stop"), committed + Duration::from_millis(1));
        assert_eq!(out, Outcome::Reset);
        assert_eq!(state.stage(), Stage::AwaitingMode);
        assert_eq!(state.mode(), None);
        // The reset does not restart the timer.
        assert_eq!(state.last_commit(), committed);
    }

    #[test]
    fn nothing_commits_before_debounce() {
        let m = machine();
        let t0 = Instant::now();
        let state = CommandState::new(t0);

        let (state, out) = m.step(state, &known("One"), t0 + secs(1.0));
        assert_eq!(out, Outcome::Pending { label: known("One") });
        assert_eq!(state.stage(), Stage::AwaitingMode);

        // Exactly at the interval is not past it.
        let (state, out) = m.step(state, &known("One"), t0 + secs(4.0));
        assert!(matches!(out, Outcome::Pending { .. }));
        assert_eq!(state.last_commit(), t0);
    }

    #[test]
    fn unknown_mode_restarts_timer() {
        let m = machine();
        let t0 = Instant::now();
        let (state, out) = m.step(CommandState::new(t0), &Label::Unknown, t0 + secs(5.0));
        assert_eq!(out, Outcome::ModeRejected);
        assert_eq!(state.stage(), Stage::AwaitingMode);
        assert_eq!(state.last_commit(), t0 + secs(5.0));

        let (_, out) = m.step(state, &known("One"), t0 + secs(7.0));
        assert!(matches!(out, Outcome::Pending { .. }));
    }

    #[test]
    fn held_action_fires_once_per_interval() {
        let m = machine();
        let t0 = Instant::now();
        let (mut state, _) = m.step(CommandState::new(t0), &known("Two"), t0 + secs(5.0));

        let mut dispatched = 0;
        let mut held = 0;
        // 30 fps for 10 seconds of holding the same gesture
        for frame in 1..=300 {
            let now = t0 + secs(5.0) + Duration::from_millis(frame * 33);
            let (next, out) = m.step(state, &known("Thumb-up"), now);
            state = next;
            match out {
                Outcome::Dispatch { .. } => dispatched += 1,
                Outcome::Held { .. } => held += 1,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(dispatched, 2);
        assert_eq!(held, 298);
    }

    #[test]
    fn unknown_action_asks_for_repeat() {
        let m = machine();
        let t0 = Instant::now();
        let (state, _) = m.step(CommandState::new(t0), &known("Three"), t0 + secs(5.0));
        let before = state.clone();
        let (state, out) = m.step(state, &Label::Unknown, t0 + secs(20.0));
        assert_eq!(out, Outcome::RepeatGesture);
        assert_eq!(state, before);
    }

    #[test]
    fn custom_reset_label() {
        let m = CommandMachine::new(Duration::from_secs(1), "Halt");
        let t0 = Instant::now();
        let (state, _) = m.step(CommandState::new(t0), &known("One"), t0 + secs(2.0));
        let (state, out) = m.step(state, &known("Stop"), t0 + secs(2.1));
        assert_eq!(out, Outcome::Held { action: "Stop".into() });
        let (state, out) = m.step(state, &known("Halt"), t0 + secs(2.2));
        assert_eq!(out, Outcome::Reset);
        assert_eq!(state.stage(), Stage::AwaitingMode);
    }
}
