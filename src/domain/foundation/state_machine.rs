//! Forward-only lifecycle trait for status enums.

use super::ValidationError;

/// A status enum with a fixed set of allowed transitions.
///
/// Implementors list the transitions; `transition_to` checks them.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if moving from `self` to `target` is allowed.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// All states reachable in one step from `self`.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Moves to `target`, or fails with an `InvalidFormat` on the `status` field.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// True when no further transition exists.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
