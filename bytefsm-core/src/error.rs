//! Core error types.

use crate::config::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Result codes reported by an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Success,
    FailedTransition,
    GeneralError,
    InvalidConfiguration,
}

impl ErrorCode {
    /// Returns the code for the outcome of a run.
    pub fn of<T>(result: &Result<T, FsmError>) -> Self {
        match result {
            Ok(_) => ErrorCode::Success,
            Err(e) => e.code(),
        }
    }
}

/// Coarse classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected while building a machine; nothing was changed.
    Construction,
    /// The input could not be driven to completion.
    Transition,
    /// The machine is not ready to be invoked.
    Configuration,
}

/// Errors from the state machine engine.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("name '{name}' is {len} bytes (max {max})")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("name must not be empty")]
    EmptyName,

    #[error("transition key is {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("state arena is full ({max} states)")]
    TooManyStates { max: usize },

    #[error("transition table of state '{state}' is full ({capacity} entries)")]
    TableFull { state: String, capacity: usize },

    #[error("entry {index} of state '{state}' already has {max} predicates")]
    PredicateLimit {
        state: String,
        index: usize,
        max: usize,
    },

    #[error("entry {index} of state '{state}' is a wildcard and takes no predicates")]
    WildcardPredicate { state: String, index: usize },

    #[error("unknown state id {0}")]
    UnknownState(u32),

    #[error("state '{state}' has no entry {index}")]
    UnknownEntry { state: String, index: usize },

    #[error("machine '{machine}' already has an initial state")]
    InitialStateAlreadySet { machine: String },

    #[error("machine '{machine}' has no initial state")]
    NoInitialState { machine: String },

    #[error("input is {len} bytes (max {max})")]
    InputTooLarge { len: usize, max: usize },

    #[error("no transition from state '{state}' at input offset {cursor}")]
    FailedTransition { state: String, cursor: usize },

    #[error("repeated zero-length match in state '{state}' at input offset {cursor}")]
    ZeroProgress { state: String, cursor: usize },

    #[error("matcher consumed {consumed} bytes but only {remaining} remain")]
    MatcherOverrun { consumed: usize, remaining: usize },

    #[error("output buffer of {capacity} bytes cannot hold {reserved} reserved bytes")]
    OutputLayout { reserved: usize, capacity: usize },

    #[error("output needs {needed} bytes but only {remaining} remain")]
    OutputFull { needed: usize, remaining: usize },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FsmError {
    /// Maps the error onto the code reported to callers of `invoke`.
    pub fn code(&self) -> ErrorCode {
        match self {
            FsmError::FailedTransition { .. } | FsmError::ZeroProgress { .. } => {
                ErrorCode::FailedTransition
            }
            FsmError::NoInitialState { .. } | FsmError::Config(_) => {
                ErrorCode::InvalidConfiguration
            }
            _ => ErrorCode::GeneralError,
        }
    }

    /// Returns the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsmError::FailedTransition { .. }
            | FsmError::ZeroProgress { .. }
            | FsmError::MatcherOverrun { .. }
            | FsmError::InputTooLarge { .. }
            | FsmError::OutputFull { .. } => ErrorKind::Transition,
            FsmError::NoInitialState { .. } | FsmError::Config(_) => ErrorKind::Configuration,
            _ => ErrorKind::Construction,
        }
    }

    /// Returns a stable error code suitable for display and JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            FsmError::NameTooLong { .. } => "NAME_TOO_LONG",
            FsmError::EmptyName => "EMPTY_NAME",
            FsmError::KeyTooLong { .. } => "KEY_TOO_LONG",
            FsmError::TooManyStates { .. } => "TOO_MANY_STATES",
            FsmError::TableFull { .. } => "TABLE_FULL",
            FsmError::PredicateLimit { .. } => "PREDICATE_LIMIT",
            FsmError::WildcardPredicate { .. } => "BAD_REQUEST",
            FsmError::UnknownState(_) => "UNKNOWN_STATE",
            FsmError::UnknownEntry { .. } => "UNKNOWN_ENTRY",
            FsmError::InitialStateAlreadySet { .. } => "CONFLICT",
            FsmError::NoInitialState { .. } => "INVALID_CONFIGURATION",
            FsmError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            FsmError::FailedTransition { .. } => "FAILED_TRANSITION",
            FsmError::ZeroProgress { .. } => "FAILED_TRANSITION",
            FsmError::MatcherOverrun { .. } => "MATCHER_OVERRUN",
            FsmError::OutputLayout { .. } => "OUTPUT_LAYOUT",
            FsmError::OutputFull { .. } => "OUTPUT_FULL",
            FsmError::Config(_) => "INVALID_CONFIGURATION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_errors_map_to_failed_transition() {
        let err = FsmError::FailedTransition {
            state: "q0".to_string(),
            cursor: 3,
        };
        assert_eq!(err.code(), ErrorCode::FailedTransition);
        assert_eq!(err.kind(), ErrorKind::Transition);

        let err = FsmError::ZeroProgress {
            state: "q0".to_string(),
            cursor: 0,
        };
        assert_eq!(err.code(), ErrorCode::FailedTransition);
        assert_eq!(err.error_code(), "FAILED_TRANSITION");
    }

    #[test]
    fn test_missing_initial_state_is_configuration_error() {
        let err = FsmError::NoInitialState {
            machine: "m".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_construction_errors_are_general() {
        let err = FsmError::KeyTooLong { len: 65, max: 64 };
        assert_eq!(err.code(), ErrorCode::GeneralError);
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(err.to_string(), "transition key is 65 bytes (max 64)");
    }

    #[test]
    fn test_output_errors_are_classified_by_phase() {
        let err = FsmError::OutputLayout {
            reserved: 8,
            capacity: 4,
        };
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(err.code(), ErrorCode::GeneralError);

        let err = FsmError::OutputFull {
            needed: 3,
            remaining: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Transition);
    }

    #[test]
    fn test_error_code_of_result() {
        let ok: Result<(), FsmError> = Ok(());
        assert_eq!(ErrorCode::of(&ok), ErrorCode::Success);

        let err: Result<(), FsmError> = Err(FsmError::InputTooLarge { len: 200, max: 128 });
        assert_eq!(ErrorCode::of(&err), ErrorCode::GeneralError);
    }
}
