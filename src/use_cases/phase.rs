// Match phase state machine.
//
// Transitions come from authority messages (or, in solo, from the session
// acting as its own authority) plus the one local timer the authority armed:
// the countdown. Illegal edges are dropped; the authority wins every tie.

use crate::domain::state::{MatchOutcome, MatchPhase};
use crate::use_cases::types::PhaseEvent;
use tracing::{debug, warn};

/// Side effect the session must apply after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseChange {
    EnterWaiting,
    EnterCountdown {
        seconds: f32,
        start_position: Option<(f32, f32)>,
    },
    EnterRunning,
    Ended(MatchOutcome),
}

pub struct PhaseMachine {
    phase: MatchPhase,
    countdown_remaining: f32,
    outcome: Option<MatchOutcome>,
    /// Whether revive-style reverts out of Running are legal (co-op only).
    allow_revert: bool,
    /// The local countdown elapsed before the authority said Running; a late
    /// authority assertion is then a confirmation, not a second transition.
    locally_promoted: bool,
}

impl PhaseMachine {
    pub fn new(allow_revert: bool) -> Self {
        Self {
            phase: MatchPhase::Waiting,
            countdown_remaining: 0.0,
            outcome: None,
            allow_revert,
            locally_promoted: false,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn countdown_remaining(&self) -> f32 {
        self.countdown_remaining
    }

    /// Local movement/fire/cast input is only live while running.
    pub fn input_enabled(&self) -> bool {
        matches!(self.phase, MatchPhase::Running)
    }

    /// Applies an authority-announced transition. Illegal edges are no-ops.
    pub fn apply_authority(&mut self, event: &PhaseEvent) -> Option<PhaseChange> {
        use MatchPhase::*;
        match (self.phase, event) {
            (Waiting, PhaseEvent::Countdown { seconds, start_position }) => {
                self.enter_countdown(*seconds);
                Some(PhaseChange::EnterCountdown {
                    seconds: *seconds,
                    start_position: *start_position,
                })
            }
            (Countdown, PhaseEvent::Running) => {
                self.enter_running();
                Some(PhaseChange::EnterRunning)
            }
            // Already running: either the local timer got there first or the
            // authority is re-announcing. Neither is a new transition.
            (Running, PhaseEvent::Running) => {
                self.locally_promoted = false;
                None
            }
            (Waiting, PhaseEvent::Waiting) => None,
            (Countdown, PhaseEvent::Countdown { seconds, .. }) => {
                // Same state: refresh the timer the authority re-announced.
                self.countdown_remaining = seconds.max(0.0);
                None
            }
            (Running, PhaseEvent::Ended { winner_id, reason }) => {
                let outcome = MatchOutcome {
                    winner_id: *winner_id,
                    reason: *reason,
                };
                self.enter_ended(outcome);
                Some(PhaseChange::Ended(outcome))
            }
            (Running, PhaseEvent::Countdown { seconds, start_position }) if self.allow_revert => {
                self.enter_countdown(*seconds);
                Some(PhaseChange::EnterCountdown {
                    seconds: *seconds,
                    start_position: *start_position,
                })
            }
            (Running, PhaseEvent::Waiting) if self.allow_revert => {
                self.phase = Waiting;
                Some(PhaseChange::EnterWaiting)
            }
            (Ended, _) => {
                debug!(?event, "phase event after match end ignored");
                None
            }
            (from, event) => {
                warn!(?from, ?event, "illegal phase transition dropped");
                None
            }
        }
    }

    /// Advances the local countdown timer; expiry promotes to Running unless
    /// the authority already did.
    pub fn tick(&mut self, dt: f32) -> Option<PhaseChange> {
        if self.phase != MatchPhase::Countdown {
            return None;
        }
        self.countdown_remaining -= dt;
        if self.countdown_remaining > 0.0 {
            return None;
        }
        self.enter_running();
        self.locally_promoted = true;
        Some(PhaseChange::EnterRunning)
    }

    /// Local teardown path (connection loss). Not part of the authority
    /// protocol, so it may end the match from any live phase.
    pub fn force_end(&mut self, outcome: MatchOutcome) -> Option<PhaseChange> {
        if self.phase == MatchPhase::Ended {
            return None;
        }
        self.enter_ended(outcome);
        Some(PhaseChange::Ended(outcome))
    }

    fn enter_countdown(&mut self, seconds: f32) {
        self.phase = MatchPhase::Countdown;
        self.countdown_remaining = seconds.max(0.0);
        self.locally_promoted = false;
    }

    fn enter_running(&mut self) {
        self.phase = MatchPhase::Running;
        self.countdown_remaining = 0.0;
        self.locally_promoted = false;
    }

    fn enter_ended(&mut self, outcome: MatchOutcome) {
        self.phase = MatchPhase::Ended;
        self.outcome = Some(outcome);
    }
}
