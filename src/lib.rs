//! Weekly shift rostering over a boolean constraint model.
//!
//! - **CP (Constraint Programming)**: a small modeling layer for boolean
//!   variables with exactly-one, at-most-one and linear-bound constraints
//!   and a linear objective, solved behind the [`cp::CpSolver`] trait by a
//!   MILP backend ([`cp::MilpSolver`]) or an exact branch-and-bound search
//!   with limits ([`cp::BranchAndBoundSolver`]).
//! - **Roster**: builds the weekly assignment model from worker shift
//!   requests, solves it, and reads the answer back as a day-by-shift
//!   roster with request and search diagnostics.
//!
//! # Example
//!
//! ```
//! use u_roster::roster::{Day, PreferenceMatrix, ScheduleOutcome, ShiftScheduler};
//!
//! let mut prefs = PreferenceMatrix::empty(3, 1).unwrap();
//! prefs.request(0, Day::Mon, 0).unwrap();
//! prefs.request(2, Day::Sun, 0).unwrap();
//!
//! match ShiftScheduler::new().schedule(&prefs).unwrap() {
//!     ScheduleOutcome::Scheduled(schedule) => {
//!         assert_eq!(schedule.objective_value(), 2);
//!         println!("{}", schedule.table());
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

pub mod cp;
pub mod error;
pub mod roster;

pub use error::{ModelError, RosterError, RosterResult};
