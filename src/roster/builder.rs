//! Constraint model for one weekly roster.

use super::day::{Day, DAYS_PER_WEEK};
use super::fairness::FairnessBounds;
use super::preferences::PreferenceMatrix;
use crate::cp::{BoolVar, CpModel, LinearExpr};
use tracing::debug;

/// A built roster model: the [`CpModel`] plus the variable index.
///
/// Variable `x[w][d][s]` is true iff worker `w` works shift `s` on day `d`.
#[derive(Debug, Clone)]
pub struct AssignmentModel {
    model: CpModel,
    vars: Vec<BoolVar>,
    num_workers: usize,
    num_shifts_per_day: usize,
    bounds: FairnessBounds,
}

impl AssignmentModel {
    /// The underlying constraint model.
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// Variable for `(worker, day, shift)`, if within the model's dimensions.
    pub fn var(&self, worker: usize, day: Day, shift: usize) -> Option<BoolVar> {
        (worker < self.num_workers && shift < self.num_shifts_per_day)
            .then(|| self.var_at(worker, day, shift))
    }

    pub(crate) fn var_at(&self, worker: usize, day: Day, shift: usize) -> BoolVar {
        self.vars[(worker * DAYS_PER_WEEK + day.index()) * self.num_shifts_per_day + shift]
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn num_shifts_per_day(&self) -> usize {
        self.num_shifts_per_day
    }

    /// Workload band the model enforces.
    pub fn bounds(&self) -> FairnessBounds {
        self.bounds
    }
}

/// Builds the assignment model from a preference matrix.
///
/// Constraints, in insertion order:
/// 1. coverage: every `(day, shift)` slot has exactly one worker;
/// 2. exclusivity: every worker holds at most one shift per day;
/// 3. fairness: every worker's weekly total lies in the [`FairnessBounds`].
///
/// The objective maximizes the number of assigned slots that were requested.
/// Unrequested assignments cost nothing. A band that exclusivity makes
/// unreachable (e.g. `min_shifts > 7`) still builds; the solver reports it
/// as infeasible.
///
/// # Examples
///
/// ```
/// use u_roster::roster::{AssignmentModelBuilder, FairnessBounds, PreferenceMatrix};
///
/// let prefs = PreferenceMatrix::empty(3, 2).unwrap();
/// let model = AssignmentModelBuilder::new(&prefs, FairnessBounds::for_matrix(&prefs)).build();
/// assert_eq!(model.model().var_count(), 3 * 7 * 2);
/// // 14 coverage + 21 exclusivity + 3 fairness
/// assert_eq!(model.model().constraint_count(), 38);
/// ```
pub struct AssignmentModelBuilder<'a> {
    prefs: &'a PreferenceMatrix,
    bounds: FairnessBounds,
}

impl<'a> AssignmentModelBuilder<'a> {
    pub fn new(prefs: &'a PreferenceMatrix, bounds: FairnessBounds) -> Self {
        Self { prefs, bounds }
    }

    /// Builds the model.
    pub fn build(&self) -> AssignmentModel {
        let num_workers = self.prefs.num_workers();
        let num_shifts = self.prefs.num_shifts_per_day();
        let mut model = CpModel::new(format!("roster_{num_workers}w_{num_shifts}s"));

        let mut vars = Vec::with_capacity(num_workers * DAYS_PER_WEEK * num_shifts);
        for n in 0..num_workers {
            for day in Day::ALL {
                for s in 0..num_shifts {
                    vars.push(model.new_bool_var(format!("shift_n{n}_d{}_s{s}", day.index())));
                }
            }
        }
        let x = |n: usize, day: Day, s: usize| {
            vars[(n * DAYS_PER_WEEK + day.index()) * num_shifts + s]
        };

        for day in Day::ALL {
            for s in 0..num_shifts {
                model.add_exactly_one((0..num_workers).map(|n| x(n, day, s)).collect());
            }
        }

        for n in 0..num_workers {
            for day in Day::ALL {
                model.add_at_most_one((0..num_shifts).map(|s| x(n, day, s)).collect());
            }
        }

        for n in 0..num_workers {
            let week = Day::ALL
                .into_iter()
                .flat_map(|day| (0..num_shifts).map(move |s| (day, s)))
                .map(|(day, s)| x(n, day, s));
            model.add_linear(
                LinearExpr::sum(week),
                self.bounds.min_shifts as i64,
                self.bounds.max_shifts as i64,
            );
        }

        let mut requested = LinearExpr::new();
        for n in 0..num_workers {
            for day in Day::ALL {
                for s in 0..num_shifts {
                    if self.prefs.is_requested(n, day, s) {
                        requested.add_term(x(n, day, s), 1);
                    }
                }
            }
        }
        let requested_terms = requested.len();
        model.maximize(requested);

        debug!(
            workers = num_workers,
            shifts_per_day = num_shifts,
            vars = model.var_count(),
            constraints = model.constraint_count(),
            requested = requested_terms,
            min_shifts = self.bounds.min_shifts,
            max_shifts = self.bounds.max_shifts,
            "built assignment model"
        );

        AssignmentModel {
            model,
            vars,
            num_workers,
            num_shifts_per_day: num_shifts,
            bounds: self.bounds,
        }
    }
}
