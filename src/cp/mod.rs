//! Constraint Programming (CP) layer over boolean variables.
//!
//! # Key Components
//!
//! - **Variables**: [`BoolVar`] handles and [`LinearExpr`] combinations
//! - **Constraints**: [`Constraint`] — ExactlyOne, AtMostOne, Linear
//! - **Model**: [`CpModel`] — container for variables, constraints, objective
//! - **Solver**: [`CpSolver`] trait, returning a tagged [`SolveResult`]
//! - **Backends**: [`MilpSolver`] — binary MILP via `good_lp`;
//!   [`BranchAndBoundSolver`] — exact depth-first branch-and-bound with
//!   time/branch limits and cancellation
//!
//! # Design
//!
//! The modeling layer knows nothing about rosters. Any engine that can
//! honor the [`CpSolver`] contract can replace either backend
//! without changes to model construction or solution extraction.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod milp;
mod model;
mod search;
mod solver;
mod variables;

pub use milp::MilpSolver;
pub use model::{Constraint, CpModel, Objective};
pub use search::BranchAndBoundSolver;
pub use solver::{
    Assignment, CpSolution, CpSolver, SearchStats, SolveResult, SolverConfig, SolverStatus,
};
pub use variables::{BoolVar, LinearExpr};
