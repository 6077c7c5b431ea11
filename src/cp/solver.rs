//! CP solver interface, results, and configuration.

use super::model::CpModel;
use super::variables::BoolVar;
use crate::error::{ModelError, RosterError, RosterResult};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not proven optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Search stopped before feasibility was decided.
    Unknown,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Feasible => "feasible",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Search diagnostics, passed through to callers verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Branching decisions taken.
    pub branches: u64,
    /// Dead ends hit during propagation.
    pub conflicts: u64,
    /// Improving solutions found.
    pub solutions: u64,
    /// Wall-clock time spent in the solve call.
    pub wall_time: Duration,
}

/// A complete value for every variable of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    /// Wraps one value per model variable, indexed by [`BoolVar::index`].
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Value of `var`. Variables outside the model read as `false`.
    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    /// Variables assigned `true`.
    pub fn true_vars(&self) -> impl Iterator<Item = BoolVar> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v)
            .map(|(i, _)| BoolVar(i))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the assignment covers no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Payload of a successful solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpSolution {
    /// Variable values.
    pub assignment: Assignment,
    /// Objective value in the model's own sense (0 when no objective is set).
    pub objective_value: i64,
    /// Search diagnostics.
    pub stats: SearchStats,
}

/// Outcome of a solve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    /// Global optimum found and proven.
    Optimal(CpSolution),
    /// Valid assignment found, optimality not proven.
    Feasible(CpSolution),
    /// No assignment satisfies all constraints.
    Infeasible(SearchStats),
    /// Search stopped before feasibility was decided.
    Unknown(SearchStats),
}

impl SolveResult {
    /// Status tag of this result.
    pub fn status(&self) -> SolverStatus {
        match self {
            SolveResult::Optimal(_) => SolverStatus::Optimal,
            SolveResult::Feasible(_) => SolverStatus::Feasible,
            SolveResult::Infeasible(_) => SolverStatus::Infeasible,
            SolveResult::Unknown(_) => SolverStatus::Unknown,
        }
    }

    /// The solution, for `Optimal` and `Feasible`.
    pub fn solution(&self) -> Option<&CpSolution> {
        match self {
            SolveResult::Optimal(solution) | SolveResult::Feasible(solution) => Some(solution),
            SolveResult::Infeasible(_) | SolveResult::Unknown(_) => None,
        }
    }

    /// Search diagnostics, whatever the status.
    pub fn stats(&self) -> &SearchStats {
        match self {
            SolveResult::Optimal(solution) | SolveResult::Feasible(solution) => &solution.stats,
            SolveResult::Infeasible(stats) | SolveResult::Unknown(stats) => stats,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.solution().is_some()
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.solution() {
            Some(solution) => write!(f, "{}(objective={})", self.status(), solution.objective_value),
            None => write!(f, "{}", self.status()),
        }
    }
}

/// Solver configuration.
///
/// The default runs the search to completion.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_roster::cp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit(Duration::from_secs(5))
///     .with_branch_limit(100_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Wall-clock budget for one solve.
    pub time_limit: Option<Duration>,
    /// Maximum number of branching decisions.
    pub branch_limit: Option<u64>,
    /// Stop after the first feasible solution.
    pub stop_after_first: bool,
}

impl SolverConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_branch_limit(mut self, limit: u64) -> Self {
        self.branch_limit = Some(limit);
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RosterResult<()> {
        if self.time_limit == Some(Duration::ZERO) {
            return Err(RosterError::InvalidConfig {
                message: "time_limit must be positive".into(),
            });
        }
        if self.branch_limit == Some(0) {
            return Err(RosterError::InvalidConfig {
                message: "branch_limit must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual search. This can wrap an external
/// engine or a custom search such as [`crate::cp::BranchAndBoundSolver`].
pub trait CpSolver {
    /// Solves the model with an optional cancellation flag.
    ///
    /// When the flag is raised the search stops and reports
    /// [`SolveResult::Feasible`] or [`SolveResult::Unknown`].
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult, ModelError>;

    /// Solves the model.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<SolveResult, ModelError> {
        self.solve_with_cancel(model, config, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(objective_value: i64) -> CpSolution {
        CpSolution {
            assignment: Assignment::new(vec![true, false, true]),
            objective_value,
            stats: SearchStats {
                branches: 4,
                ..SearchStats::default()
            },
        }
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, None);
        assert_eq!(config.branch_limit, None);
        assert!(!config.stop_after_first);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_solver_config_rejects_zero_limits() {
        assert!(SolverConfig::default()
            .with_time_limit(Duration::ZERO)
            .validate()
            .is_err());
        assert!(SolverConfig::default()
            .with_branch_limit(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_assignment_true_vars() {
        let assignment = Assignment::new(vec![true, false, true]);
        let trues: Vec<usize> = assignment.true_vars().map(BoolVar::index).collect();
        assert_eq!(trues, vec![0, 2]);
        assert!(!assignment.value(BoolVar(1)));
        assert!(!assignment.value(BoolVar(99)));
    }

    #[test]
    fn test_result_accessors() {
        let optimal = SolveResult::Optimal(solution(3));
        assert_eq!(optimal.status(), SolverStatus::Optimal);
        assert!(optimal.is_solution_found());
        assert_eq!(optimal.stats().branches, 4);
        assert_eq!(optimal.to_string(), "optimal(objective=3)");

        let infeasible = SolveResult::Infeasible(SearchStats::default());
        assert_eq!(infeasible.status(), SolverStatus::Infeasible);
        assert!(infeasible.solution().is_none());
        assert_eq!(infeasible.to_string(), "infeasible");
    }
}
