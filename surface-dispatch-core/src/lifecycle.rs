//! Surface lifecycle state machine

use crate::error::LifecycleError;

/// Phase of a mounted surface.
///
/// Phases only move forward, one step at a time:
/// `Uninitialized -> Rehydrating -> Ready -> Unmounting -> Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    /// Reading the durable blob into a fresh tree.
    Rehydrating,
    /// The only phase in which user intent is accepted.
    Ready,
    /// Releasing subscriptions and in-flight requests.
    Unmounting,
    Terminated,
}

impl Phase {
    /// The phase that must follow this one, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Uninitialized => Some(Phase::Rehydrating),
            Phase::Rehydrating => Some(Phase::Ready),
            Phase::Ready => Some(Phase::Unmounting),
            Phase::Unmounting => Some(Phase::Terminated),
            Phase::Terminated => None,
        }
    }
}

/// Tracks the current [`Phase`] and rejects illegal transitions.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Whether the surface has started tearing down.
    pub fn is_unmounted(&self) -> bool {
        self.phase >= Phase::Unmounting
    }

    /// Move to `to`, which must be the direct successor of the current phase.
    pub fn advance(&mut self, to: Phase) -> Result<(), LifecycleError> {
        if self.phase.next() != Some(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(from = ?self.phase, to = ?to, "Lifecycle transition");
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_forward_sequence() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Uninitialized);

        for phase in [
            Phase::Rehydrating,
            Phase::Ready,
            Phase::Unmounting,
            Phase::Terminated,
        ] {
            lifecycle.advance(phase).unwrap();
            assert_eq!(lifecycle.phase(), phase);
        }
        assert!(lifecycle.is_unmounted());
    }

    #[test]
    fn test_skip_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(Phase::Ready).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: Phase::Uninitialized,
                to: Phase::Ready,
            }
        );
        assert_eq!(lifecycle.phase(), Phase::Uninitialized);
    }

    #[test]
    fn test_backwards_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Rehydrating).unwrap();
        lifecycle.advance(Phase::Ready).unwrap();
        assert!(lifecycle.is_ready());

        assert!(lifecycle.advance(Phase::Rehydrating).is_err());
        assert!(lifecycle.advance(Phase::Ready).is_err());
        assert!(lifecycle.is_ready());
    }

    #[test]
    fn test_terminated_is_final() {
        assert_eq!(Phase::Terminated.next(), None);
    }
}
