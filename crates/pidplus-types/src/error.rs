//! [`PidError`] – the error type shared by every crate in the workspace.
//!
//! Usage errors (missing time step, invalid modifier parameters, duplicate
//! attachment) surface immediately to the caller.  Handler failures are
//! wrapped in a [`Failure`][crate::event::Failure] event, delivered to the
//! remaining modifiers of the chain, and then returned to the caller – which
//! is why the type is `Clone`: the same error value travels in the event and
//! in the `Result`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type spanning controller usage errors and modifier failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PidError {
    /// `pid()` was called without a `dt` and no default was configured.
    #[error("no dt supplied and no default dt configured")]
    MissingTimeStep,

    /// A constructor or mutator was handed a value it cannot accept.
    #[error("invalid parameter {name}: {details}")]
    InvalidParameter { name: String, details: String },

    /// A single-attachment modifier was attached to a second controller.
    #[error("modifier '{modifier}' is already attached to controller {owner}")]
    AlreadyAttached { modifier: String, owner: Uuid },

    /// A modifier hook failed while handling an event.
    #[error("modifier '{modifier}' failed: {details}")]
    ModifierFailure { modifier: String, details: String },

    /// Recorded data could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PidError {
    /// Convenience constructor for [`PidError::InvalidParameter`].
    pub fn invalid_parameter(name: &str, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            details: details.into(),
        }
    }

    /// Convenience constructor for [`PidError::ModifierFailure`].
    pub fn modifier_failure(modifier: &str, details: impl Into<String>) -> Self {
        Self::ModifierFailure {
            modifier: modifier.to_string(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_time_step_display() {
        let err = PidError::MissingTimeStep;
        assert!(err.to_string().contains("no dt supplied"));
    }

    #[test]
    fn invalid_parameter_display_names_the_parameter() {
        let err = PidError::invalid_parameter("secs", "must not be negative");
        assert!(err.to_string().contains("secs"));
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn already_attached_display_names_modifier_and_owner() {
        let owner = Uuid::new_v4();
        let err = PidError::AlreadyAttached {
            modifier: "setpoint_ramp".to_string(),
            owner,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("setpoint_ramp"));
        assert!(rendered.contains(&owner.to_string()));
    }

    #[test]
    fn error_serialization_roundtrip() {
        let err = PidError::modifier_failure("dead_band", "sensor offline");
        let json = serde_json::to_string(&err).unwrap();
        let back: PidError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
