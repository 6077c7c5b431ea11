//! End-to-end scheduling pipeline.

use super::builder::AssignmentModelBuilder;
use super::extract::{ScheduleExtractor, ScheduleOutcome};
use super::fairness::FairnessBounds;
use super::preferences::PreferenceMatrix;
use crate::cp::{CpSolver, MilpSolver, SolverConfig};
use crate::error::RosterResult;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs one scheduling request: bounds → model → solve → extract.
///
/// Requests are independent; a scheduler holds no per-request state and
/// can be shared across threads when its solver can.
///
/// # Examples
///
/// ```
/// use u_roster::roster::{Day, PreferenceMatrix, ShiftScheduler};
///
/// let mut prefs = PreferenceMatrix::empty(2, 1).unwrap();
/// prefs.request(0, Day::Mon, 0).unwrap();
/// prefs.request(1, Day::Tue, 0).unwrap();
///
/// let outcome = ShiftScheduler::new().schedule(&prefs).unwrap();
/// let schedule = outcome.schedule().unwrap();
/// assert_eq!(schedule.objective_value(), 2);
/// assert_eq!(schedule.worker_at(Day::Mon, 0), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct ShiftScheduler<S = MilpSolver> {
    solver: S,
    config: SolverConfig,
}

impl ShiftScheduler<MilpSolver> {
    /// Scheduler backed by [`MilpSolver`].
    pub fn new() -> Self {
        Self::with_solver(MilpSolver::new())
    }
}

impl Default for ShiftScheduler<MilpSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CpSolver> ShiftScheduler<S> {
    /// Scheduler backed by any [`CpSolver`], e.g.
    /// [`BranchAndBoundSolver`](crate::cp::BranchAndBoundSolver) when the
    /// search must honor time or branch limits.
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Schedules one week.
    ///
    /// # Errors
    ///
    /// Only invalid configuration or a malformed model. Infeasible and
    /// inconclusive searches are `Ok` outcomes.
    pub fn schedule(&self, prefs: &PreferenceMatrix) -> RosterResult<ScheduleOutcome> {
        self.schedule_with_cancel(prefs, None)
    }

    /// Schedules one week with an optional cancellation flag.
    pub fn schedule_with_cancel(
        &self,
        prefs: &PreferenceMatrix,
        cancel: Option<Arc<AtomicBool>>,
    ) -> RosterResult<ScheduleOutcome> {
        self.config.validate()?;

        let bounds = FairnessBounds::for_matrix(prefs);
        let model = AssignmentModelBuilder::new(prefs, bounds).build();
        let result = self
            .solver
            .solve_with_cancel(model.model(), &self.config, cancel)?;
        let outcome = ScheduleExtractor::extract(&result, &model, prefs);

        let stats = outcome.stats();
        match &outcome {
            ScheduleOutcome::Scheduled(schedule) => info!(
                status = %schedule.status(),
                objective = schedule.objective_value(),
                met = schedule.requests().met,
                requested = schedule.requests().total_requested,
                branches = stats.branches,
                conflicts = stats.conflicts,
                wall_time = ?stats.wall_time,
                "roster scheduled"
            ),
            ScheduleOutcome::Infeasible(_) => warn!(
                workers = prefs.num_workers(),
                shifts_per_day = prefs.num_shifts_per_day(),
                min_shifts = bounds.min_shifts,
                max_shifts = bounds.max_shifts,
                conflicts = stats.conflicts,
                "no roster satisfies coverage, exclusivity and fairness"
            ),
            ScheduleOutcome::Inconclusive(_) => warn!(
                branches = stats.branches,
                wall_time = ?stats.wall_time,
                "search stopped before a roster was found"
            ),
        }
        Ok(outcome)
    }

    /// Schedules independent weeks in parallel.
    #[cfg(feature = "parallel")]
    pub fn schedule_batch(&self, requests: &[PreferenceMatrix]) -> Vec<RosterResult<ScheduleOutcome>>
    where
        S: Sync,
    {
        requests.par_iter().map(|prefs| self.schedule(prefs)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BranchAndBoundSolver, SolveResult, SolverStatus};
    use crate::error::{ModelError, RosterError};
    use crate::roster::Day;
    use std::time::Duration;

    struct GiveUp;

    impl CpSolver for GiveUp {
        fn solve_with_cancel(
            &self,
            _model: &crate::cp::CpModel,
            _config: &SolverConfig,
            _cancel: Option<Arc<AtomicBool>>,
        ) -> Result<SolveResult, ModelError> {
            Ok(SolveResult::Unknown(Default::default()))
        }
    }

    #[test]
    fn test_schedule_distinct_requests() {
        let mut prefs = PreferenceMatrix::empty(7, 1).unwrap();
        for (worker, day) in Day::ALL.into_iter().enumerate() {
            prefs.request(worker, day, 0).unwrap();
        }

        let outcome = ShiftScheduler::new().schedule(&prefs).unwrap();
        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.status(), SolverStatus::Optimal);
        assert_eq!(schedule.objective_value(), 7);
        for (worker, day) in Day::ALL.into_iter().enumerate() {
            assert_eq!(schedule.worker_at(day, 0), Some(worker));
        }
    }

    #[test]
    fn test_infeasible_is_ok_outcome() {
        let prefs = PreferenceMatrix::empty(2, 10).unwrap();
        let outcome = ShiftScheduler::new().schedule(&prefs).unwrap();
        assert!(matches!(outcome, ScheduleOutcome::Infeasible(_)));
    }

    #[test]
    fn test_custom_solver_inconclusive() {
        let prefs = PreferenceMatrix::empty(2, 1).unwrap();
        let outcome = ShiftScheduler::with_solver(GiveUp).schedule(&prefs).unwrap();
        assert_eq!(outcome.status(), SolverStatus::Unknown);
        assert!(outcome.schedule().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let prefs = PreferenceMatrix::empty(2, 1).unwrap();
        let scheduler =
            ShiftScheduler::new().with_config(SolverConfig::default().with_time_limit(Duration::ZERO));
        assert!(matches!(
            scheduler.schedule(&prefs),
            Err(RosterError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_cancelled_request_is_inconclusive() {
        let prefs = PreferenceMatrix::empty(3, 2).unwrap();
        let cancel = Arc::new(AtomicBool::new(true));
        let outcome = ShiftScheduler::new()
            .schedule_with_cancel(&prefs, Some(cancel))
            .unwrap();
        assert!(matches!(outcome, ScheduleOutcome::Inconclusive(_)));
    }

    #[test]
    fn test_branch_and_bound_balances_empty_weeks() {
        let scheduler = ShiftScheduler::with_solver(BranchAndBoundSolver::new())
            .with_config(SolverConfig::default().with_time_limit(Duration::from_secs(60)));
        for (workers, shifts) in [(10, 3), (15, 3), (9, 2)] {
            let prefs = PreferenceMatrix::empty(workers, shifts).unwrap();
            let outcome = scheduler.schedule(&prefs).unwrap();
            assert_eq!(outcome.status(), SolverStatus::Optimal, "{workers}x{shifts}");

            let schedule = outcome.schedule().unwrap();
            let bounds = schedule.bounds();
            assert!((0..workers).all(|w| bounds.contains(schedule.shifts_worked(w))));
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_schedule_batch() {
        let requests = vec![
            PreferenceMatrix::empty(2, 1).unwrap(),
            PreferenceMatrix::empty(2, 10).unwrap(),
            PreferenceMatrix::empty(3, 1).unwrap(),
        ];
        let outcomes = ShiftScheduler::new().schedule_batch(&requests);
        let statuses: Vec<SolverStatus> = outcomes
            .into_iter()
            .map(|o| o.unwrap().status())
            .collect();
        assert_eq!(
            statuses,
            vec![
                SolverStatus::Optimal,
                SolverStatus::Infeasible,
                SolverStatus::Optimal
            ]
        );
    }
}
