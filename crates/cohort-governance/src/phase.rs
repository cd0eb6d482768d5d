use crate::types::Phase;
use crate::{GovernanceError, Result};

/// Strict forward-only gate over the round lifecycle.
///
/// Every state-changing operation checks `require` first; transitions go
/// through `advance`, which refuses anything but the single legal forward
/// edge. No transition can be taken twice.
#[derive(Debug, Clone)]
pub struct PhaseController {
    current: Phase,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            current: Phase::Idle,
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    /// Fail with the phase that was required unless the round is in it.
    pub fn require(&self, required: Phase) -> Result<()> {
        if self.current != required {
            return Err(GovernanceError::WrongPhase {
                required,
                actual: self.current,
            });
        }
        Ok(())
    }

    /// Move to `next`, returning the `(from, to)` pair for event emission.
    pub fn advance(&mut self, next: Phase) -> Result<(Phase, Phase)> {
        if !self.current.can_transition_to(&next) {
            return Err(GovernanceError::WrongPhase {
                required: next,
                actual: self.current,
            });
        }
        let from = self.current;
        self.current = next;
        Ok((from, next))
    }
}
