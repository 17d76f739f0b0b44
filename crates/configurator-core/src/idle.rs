//! Idle detection driving the viewer's auto-rotate.
//!
//! Two states, `Active` (initial) and `Idle`. Only direct user input counts
//! as interaction; programmatic camera moves must not call
//! [`IdleTracker::record_interaction`].

use crate::constants::IDLE_THRESHOLD_MS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleState {
    Active,
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleTransition {
    BecameIdle,
    BecameActive,
}

impl IdleTransition {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, IdleTransition::BecameIdle)
    }
}

#[derive(Clone, Debug)]
pub struct IdleTracker {
    state: IdleState,
    last_interaction_ms: f64,
    threshold_ms: f64,
}

impl IdleTracker {
    pub fn new(now_ms: f64) -> Self {
        Self::with_threshold(now_ms, IDLE_THRESHOLD_MS)
    }

    pub fn with_threshold(now_ms: f64, threshold_ms: f64) -> Self {
        Self {
            state: IdleState::Active,
            last_interaction_ms: now_ms,
            threshold_ms,
        }
    }

    #[inline]
    pub fn state(&self) -> IdleState {
        self.state
    }

    /// Pointer, touch or wheel input.
    pub fn record_interaction(&mut self, now_ms: f64) -> Option<IdleTransition> {
        self.last_interaction_ms = now_ms;
        match self.state {
            IdleState::Idle => {
                self.state = IdleState::Active;
                Some(IdleTransition::BecameActive)
            }
            IdleState::Active => None,
        }
    }

    /// Periodic check; flips to `Idle` once the threshold has elapsed.
    pub fn check(&mut self, now_ms: f64) -> Option<IdleTransition> {
        if self.state == IdleState::Active && now_ms - self.last_interaction_ms >= self.threshold_ms
        {
            self.state = IdleState::Idle;
            return Some(IdleTransition::BecameIdle);
        }
        None
    }
}
