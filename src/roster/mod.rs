//! Weekly shift rostering.
//!
//! Assigns workers to recurring daily shift slots over a seven-day week:
//!
//! - **Coverage**: every `(day, shift)` slot has exactly one worker.
//! - **Exclusivity**: nobody works two shifts on the same day.
//! - **Fairness**: every worker's weekly total lies in one shared
//!   [`FairnessBounds`] band.
//! - **Objective**: maximize the number of honored shift requests.
//!
//! # Pipeline
//!
//! [`PreferenceMatrix`] → [`FairnessBounds`] → [`AssignmentModelBuilder`] →
//! [`crate::cp::CpSolver`] → [`ScheduleExtractor`] → [`ScheduleOutcome`].
//! [`ShiftScheduler`] wires the steps for one request.

mod builder;
mod day;
mod extract;
mod fairness;
mod preferences;
mod scheduler;
mod table;

pub use builder::{AssignmentModel, AssignmentModelBuilder};
pub use day::{Day, DAYS_PER_WEEK};
pub use extract::{RequestSummary, Schedule, ScheduleExtractor, ScheduleOutcome, ShiftAssignment};
pub use fairness::FairnessBounds;
pub use preferences::PreferenceMatrix;
pub use scheduler::ShiftScheduler;
pub use table::{worker_label, RosterRow, RosterTable};
