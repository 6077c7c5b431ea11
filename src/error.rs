//! Error types.
//!
//! Only malformed input is an error. A model whose constraints cannot be
//! satisfied is a legitimate solve outcome and is reported through
//! [`crate::roster::ScheduleOutcome`], not through these types.

use thiserror::Error;

/// Structural problems in a [`crate::cp::CpModel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A constraint or objective refers to a variable the model never created.
    #[error("undefined variable #{index} (model has {count} variables)")]
    UndefinedVariable {
        /// Index of the offending variable.
        index: usize,
        /// Number of variables in the model.
        count: usize,
    },

    /// The same variable appears twice inside one exactly-one / at-most-one group.
    #[error("variable #{index} appears more than once in constraint #{constraint}")]
    DuplicateVariable {
        /// Index of the repeated variable.
        index: usize,
        /// Position of the constraint in the model.
        constraint: usize,
    },
}

/// Errors surfaced by the rostering layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// A count that must be at least one was zero.
    #[error("invalid dimension '{name}': must be at least 1, got {value}")]
    InvalidDimension {
        /// Name of the dimension (`num_workers`, `num_shifts_per_day`).
        name: &'static str,
        /// Supplied value.
        value: usize,
    },

    /// The supplied preference data does not match the declared dimensions.
    #[error("preference data shape mismatch at {axis}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which axis disagreed, e.g. `workers` or `worker 2 / day Tue`.
        axis: String,
        /// Declared length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// An index outside the matrix dimensions.
    #[error("{name} index {index} out of range (limit {limit})")]
    OutOfRange {
        /// Which index (`worker`, `shift`).
        name: &'static str,
        /// Supplied index.
        index: usize,
        /// Exclusive upper bound.
        limit: usize,
    },

    /// Solver configuration rejected by [`crate::cp::SolverConfig::validate`].
    #[error("invalid solver configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// The constraint model handed to the solver was malformed.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelError),
}

/// Result alias for the rostering layer.
pub type RosterResult<T> = Result<T, RosterError>;
