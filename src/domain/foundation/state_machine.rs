//! Declared-transition checking for Copy lifecycle enums.
//!
//! The dialogue's `StageKind` is the main implementor: each stage lists the
//! stages it may move to, and `Session::advance` goes through
//! `transition_to` so an undeclared jump surfaces as an error instead of a
//! silently corrupted conversation.

use super::{DomainError, ErrorCode};

pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Outgoing edges of `self`.
    fn valid_transitions(&self) -> Vec<Self>;

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Returns `target` if the edge is declared.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition`, with `from` and `to` recorded as details.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if !self.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move from {:?} to {:?}", self, target),
            )
            .with_detail("from", format!("{:?}", self))
            .with_detail("to", format!("{:?}", target)));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
