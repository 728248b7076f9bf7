//! # Swap State Machine
//!
//! Forward-only progression of one swap:
//!
//! ```text
//! Init → AllowanceChecked → (WrapPending →) Approved → PoolResolved → Quoted → ParamsBuilt → Executed
//!   └──────────────────────────── any non-terminal state ─────────────────────────→ Failed(stage)
//! ```
//!
//! When the allowance already covers the amount, `AllowanceChecked → Approved`
//! happens without a transaction. Nothing is re-entered; a failed swap is retried
//! by starting a new one from `Init`.

use serde::Serialize;
use std::fmt;

use crate::error::{AppError, SwapStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "stage")]
pub enum SwapState {
    Init,
    AllowanceChecked,
    WrapPending,
    Approved,
    PoolResolved,
    Quoted,
    ParamsBuilt,
    Executed,
    Failed(SwapStage),
}

impl SwapState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::Executed | SwapState::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: SwapState) -> bool {
        use SwapState::*;
        match (self, next) {
            (current, Failed(_)) => !current.is_terminal(),
            (Init, AllowanceChecked)
            | (AllowanceChecked, WrapPending)
            | (AllowanceChecked, Approved)
            | (WrapPending, Approved)
            | (Approved, PoolResolved)
            | (PoolResolved, Quoted)
            | (Quoted, ParamsBuilt)
            | (ParamsBuilt, Executed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapState::Failed(stage) => write!(f, "Failed({})", stage),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Tracks the state of one swap and every state it passed through.
#[derive(Debug, Clone)]
pub struct SwapProgress {
    state: SwapState,
    history: Vec<SwapState>,
}

impl Default for SwapProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapProgress {
    pub fn new() -> Self {
        Self {
            state: SwapState::Init,
            history: vec![SwapState::Init],
        }
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn history(&self) -> &[SwapState] {
        &self.history
    }

    /// Move to `next`, rejecting backward or skipping transitions.
    pub fn advance(&mut self, next: SwapState) -> Result<(), AppError> {
        if !self.state.can_advance_to(next) {
            return Err(AppError::Internal(format!(
                "illegal swap transition {} -> {}",
                self.state, next
            )));
        }
        tracing::debug!(from = %self.state, to = %next, "swap state transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Record a failure at `stage` and hand back `err` for propagation.
    pub fn fail(&mut self, err: AppError) -> AppError {
        let stage = err.stage().unwrap_or(SwapStage::Validation);
        if !self.state.is_terminal() {
            tracing::debug!(from = %self.state, %stage, "swap failed");
            self.state = SwapState::Failed(stage);
            self.history.push(self.state);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_with_wrap() {
        let mut progress = SwapProgress::new();
        for next in [
            SwapState::AllowanceChecked,
            SwapState::WrapPending,
            SwapState::Approved,
            SwapState::PoolResolved,
            SwapState::Quoted,
            SwapState::ParamsBuilt,
            SwapState::Executed,
        ] {
            progress.advance(next).unwrap();
        }
        assert_eq!(progress.state(), SwapState::Executed);
        assert_eq!(progress.history().len(), 8);
    }

    #[test]
    fn test_fast_path_skips_wrap() {
        let mut progress = SwapProgress::new();
        progress.advance(SwapState::AllowanceChecked).unwrap();
        progress.advance(SwapState::Approved).unwrap();
        assert_eq!(progress.state(), SwapState::Approved);
    }

    #[test]
    fn test_rejects_backward_and_skipping_transitions() {
        let mut progress = SwapProgress::new();
        assert!(progress.advance(SwapState::Quoted).is_err());

        progress.advance(SwapState::AllowanceChecked).unwrap();
        progress.advance(SwapState::Approved).unwrap();
        assert!(progress.advance(SwapState::AllowanceChecked).is_err());
        assert!(progress.advance(SwapState::Executed).is_err());
    }

    #[test]
    fn test_failure_is_terminal_and_tagged() {
        let mut progress = SwapProgress::new();
        progress.advance(SwapState::AllowanceChecked).unwrap();
        progress.advance(SwapState::Approved).unwrap();

        let err = progress.fail(AppError::PoolNotFound("no pool".into()));
        assert!(matches!(err, AppError::PoolNotFound(_)));
        assert_eq!(progress.state(), SwapState::Failed(SwapStage::PoolResolution));
        assert!(progress.advance(SwapState::PoolResolved).is_err());
    }
}
