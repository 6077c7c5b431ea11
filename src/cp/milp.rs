//! Mixed-integer LP backend for boolean models.
//!
//! Every [`BoolVar`](super::BoolVar) becomes a binary LP variable:
//!
//! - `ExactlyOne` → `Σ x = 1`
//! - `AtMostOne` → `Σ x <= 1`
//! - `Linear` → `min <= Σ c·x <= max`
//!
//! The problem goes to `good_lp`'s default solver (pure-Rust `microlp`).
//! Roster models are coverage / exclusivity / workload rows over the same
//! variables; their constraint matrix is totally unimodular, so the LP
//! relaxation is already integral and the solve does not branch.

use super::model::{Constraint, CpModel, Objective};
use super::solver::{Assignment, CpSolution, CpSolver, SearchStats, SolveResult, SolverConfig};
use super::variables::LinearExpr;
use crate::error::ModelError;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Exact solver that hands the model to an LP engine with integer support.
///
/// The LP engine runs in one blocking call. The cancellation flag is read
/// before the call starts; once running, the call cannot be interrupted.
/// `time_limit` and `branch_limit` do not apply, and `stop_after_first` has
/// no effect because the only solution reported is already optimal. Use
/// [`BranchAndBoundSolver`](super::BranchAndBoundSolver) when a search must
/// stop on a budget.
///
/// # Examples
///
/// ```
/// use u_roster::cp::{CpModel, CpSolver, LinearExpr, MilpSolver, SolverConfig, SolverStatus};
///
/// let mut model = CpModel::new("pick");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_exactly_one(vec![a, b]);
/// model.maximize(LinearExpr::weighted([(a, 1), (b, 3)]));
///
/// let result = MilpSolver::new().solve(&model, &SolverConfig::default()).unwrap();
/// assert_eq!(result.status(), SolverStatus::Optimal);
/// assert_eq!(result.solution().unwrap().objective_value, 3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    expr.terms
        .iter()
        .map(|&(var, coefficient)| vars[var.index()] * coefficient as f64)
        .sum()
}

/// Outcome of translating one constraint.
enum Row {
    Add(Vec<good_lp::Constraint>),
    Trivial,
    Unsatisfiable,
}

fn translate(constraint: &Constraint, vars: &[Variable]) -> Row {
    match constraint {
        Constraint::ExactlyOne { vars: group } if group.is_empty() => Row::Unsatisfiable,
        Constraint::AtMostOne { vars: group } if group.len() <= 1 => Row::Trivial,
        Constraint::ExactlyOne { vars: group } => {
            let sum: Expression = group.iter().map(|v| Expression::from(vars[v.index()])).sum();
            Row::Add(vec![constraint!(sum == 1.0)])
        }
        Constraint::AtMostOne { vars: group } => {
            let sum: Expression = group.iter().map(|v| Expression::from(vars[v.index()])).sum();
            Row::Add(vec![constraint!(sum <= 1.0)])
        }
        Constraint::Linear { min, max, .. } if min > max => Row::Unsatisfiable,
        Constraint::Linear { expr, min, max } => {
            let expr = expr.normalized();
            if expr.is_empty() {
                return if *min <= 0 && 0 <= *max {
                    Row::Trivial
                } else {
                    Row::Unsatisfiable
                };
            }
            let lower = to_expression(&expr, vars);
            let upper = lower.clone();
            let (min, max) = (*min as f64, *max as f64);
            if min == max {
                Row::Add(vec![constraint!(lower == min)])
            } else {
                Row::Add(vec![constraint!(lower >= min), constraint!(upper <= max)])
            }
        }
    }
}

impl CpSolver for MilpSolver {
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult, ModelError> {
        model.validate()?;
        let start = Instant::now();
        let finish = |mut stats: SearchStats| {
            stats.wall_time = start.elapsed();
            stats
        };

        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Ok(SolveResult::Unknown(finish(SearchStats::default())));
        }

        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = (0..model.var_count())
            .map(|_| problem.add(variable().binary()))
            .collect();

        let mut rows = Vec::with_capacity(model.constraint_count());
        for constraint in model.constraints() {
            match translate(constraint, &vars) {
                Row::Add(mut added) => rows.append(&mut added),
                Row::Trivial => {}
                Row::Unsatisfiable => {
                    let stats = SearchStats {
                        conflicts: 1,
                        ..SearchStats::default()
                    };
                    return Ok(SolveResult::Infeasible(finish(stats)));
                }
            }
        }

        let objective = model.objective().map(Objective::expr).cloned().unwrap_or_default();
        let target = to_expression(&objective.normalized(), &vars);
        let unsolved = match model.objective() {
            Some(Objective::Minimize(_)) => problem.minimise(target),
            Some(Objective::Maximize(_)) | None => problem.maximise(target),
        };

        debug!(
            model = %model.name,
            vars = vars.len(),
            rows = rows.len(),
            time_limit = ?config.time_limit,
            "solving with milp backend"
        );

        let mut lp = unsolved.using(default_solver);
        for row in rows {
            lp = lp.with(row);
        }

        match lp.solve() {
            Ok(solution) => {
                let values: Vec<bool> = vars.iter().map(|&v| solution.value(v) > 0.5).collect();
                let assignment = Assignment::new(values);
                let objective_value = objective.evaluate(|v| assignment.value(v));
                let stats = SearchStats {
                    solutions: 1,
                    ..SearchStats::default()
                };
                Ok(SolveResult::Optimal(CpSolution {
                    assignment,
                    objective_value,
                    stats: finish(stats),
                }))
            }
            Err(ResolutionError::Infeasible) => {
                let stats = SearchStats {
                    conflicts: 1,
                    ..SearchStats::default()
                };
                Ok(SolveResult::Infeasible(finish(stats)))
            }
            Err(err) => {
                warn!(model = %model.name, error = %err, "milp backend gave no answer");
                Ok(SolveResult::Unknown(finish(SearchStats::default())))
            }
        }
    }
}
