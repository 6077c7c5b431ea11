//! Exact branch-and-bound search over boolean models.
//!
//! # Algorithm
//!
//! 1. Compile the model into index-based groups (exactly-one / at-most-one)
//!    and linear rows, and turn the objective into maximization form.
//! 2. Propagate to a fixpoint after every decision:
//!    - a group with one true member forces the others false;
//!    - an exactly-one group with one open member forces it true;
//!    - a linear row fails when its bounds are out of reach, forces false
//!      any positive term that would overshoot its maximum, and forces true
//!      the last open term of a bucket the row cannot reach its minimum
//!      without.
//! 3. Branch on the open exactly-one group with the fewest candidates
//!    (first-fail), trying candidates by decreasing objective weight, then
//!    by how far their rows still sit below their minimum.
//!    Models without open groups branch on single variables.
//! 4. Prune a node when its objective bound cannot beat the incumbent.
//!
//! # Bounds
//!
//! Linear rows and the objective are bounded by partitioning their terms
//! into buckets that each lie inside one group: at most one member of a
//! bucket can be true, so a bucket contributes at most its best open
//! coefficient. The objective is bucketed twice: once over all groups and
//! once over exactly-one groups only, which caps it by the number of
//! slots those groups fill. The objective bound additionally caps the terms
//! owned by each all-positive linear row by the room left under that row's
//! maximum.

use super::model::{Constraint, CpModel, Objective};
use super::solver::{Assignment, CpSolution, CpSolver, SearchStats, SolveResult, SolverConfig};
use crate::error::ModelError;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

type Bucket = Vec<(usize, i64)>;

struct Group {
    vars: Vec<usize>,
    exact: bool,
}

struct LinearRow {
    terms: Vec<(usize, i64)>,
    buckets: Vec<Bucket>,
    min: i64,
    max: i64,
    /// Smallest coefficient, when every coefficient is positive.
    min_coefficient: Option<i64>,
}

impl LinearRow {
    fn lower(&self, values: &[Option<bool>]) -> i64 {
        self.terms
            .iter()
            .map(|&(v, c)| match values[v] {
                Some(true) => c,
                None if c < 0 => c,
                _ => 0,
            })
            .sum()
    }
}

/// Objective terms owned by one all-positive linear row.
struct CappedPart {
    row: usize,
    buckets: Vec<Bucket>,
}

struct Compiled {
    groups: Vec<Group>,
    rows: Vec<LinearRow>,
    var_groups: Vec<Vec<usize>>,
    var_rows: Vec<Vec<usize>>,
    /// Per-variable objective weight, in maximization sense.
    weights: Vec<i64>,
    /// 1 for maximize, -1 for minimize.
    sense: i64,
    objective_buckets: Vec<Bucket>,
    /// Objective terms bucketed by exactly-one groups only.
    objective_exact_buckets: Vec<Bucket>,
    objective_parts: Vec<CappedPart>,
    objective_rest: Vec<Bucket>,
}

impl Compiled {
    fn new(model: &CpModel) -> Self {
        let num_vars = model.var_count();
        let mut groups = Vec::new();
        let mut linear = Vec::new();
        for constraint in model.constraints() {
            match constraint {
                Constraint::ExactlyOne { vars } => groups.push(Group {
                    vars: vars.iter().map(|v| v.index()).collect(),
                    exact: true,
                }),
                Constraint::AtMostOne { vars } => groups.push(Group {
                    vars: vars.iter().map(|v| v.index()).collect(),
                    exact: false,
                }),
                Constraint::Linear { expr, min, max } => {
                    let terms: Vec<(usize, i64)> = expr
                        .normalized()
                        .terms
                        .into_iter()
                        .map(|(v, c)| (v.index(), c))
                        .collect();
                    linear.push((terms, *min, *max));
                }
            }
        }

        let mut var_groups = vec![Vec::new(); num_vars];
        for (g, group) in groups.iter().enumerate() {
            for &v in &group.vars {
                var_groups[v].push(g);
            }
        }

        let rows: Vec<LinearRow> = linear
            .into_iter()
            .map(|(terms, min, max)| {
                let min_coefficient = if terms.iter().all(|&(_, c)| c > 0) {
                    terms.iter().map(|&(_, c)| c).min()
                } else {
                    None
                };
                LinearRow {
                    buckets: partition(&terms, &var_groups),
                    terms,
                    min,
                    max,
                    min_coefficient,
                }
            })
            .collect();

        let mut var_rows = vec![Vec::new(); num_vars];
        for (r, row) in rows.iter().enumerate() {
            for &(v, _) in &row.terms {
                var_rows[v].push(r);
            }
        }

        let (sense, objective_terms) = match model.objective() {
            Some(Objective::Maximize(expr)) => (1, expr.normalized()),
            Some(Objective::Minimize(expr)) => (-1, expr.normalized()),
            None => (1, Default::default()),
        };
        let objective_terms: Vec<(usize, i64)> = objective_terms
            .terms
            .into_iter()
            .map(|(v, c)| (v.index(), sense * c))
            .collect();

        let mut weights = vec![0; num_vars];
        for &(v, c) in &objective_terms {
            weights[v] = c;
        }

        // Hand each objective term to the eligible row covering the most terms.
        let mut row_hits: HashMap<usize, usize> = HashMap::new();
        for &(v, _) in &objective_terms {
            for &r in &var_rows[v] {
                if rows[r].min_coefficient.is_some() {
                    *row_hits.entry(r).or_default() += 1;
                }
            }
        }
        let mut owned: HashMap<usize, Vec<(usize, i64)>> = HashMap::new();
        let mut rest = Vec::new();
        for &(v, c) in &objective_terms {
            let owner = var_rows[v]
                .iter()
                .copied()
                .filter(|r| row_hits.contains_key(r))
                .max_by_key(|r| (row_hits[r], Reverse(*r)));
            match owner {
                Some(r) => owned.entry(r).or_default().push((v, c)),
                None => rest.push((v, c)),
            }
        }
        let mut objective_parts: Vec<CappedPart> = owned
            .into_iter()
            .map(|(row, terms)| CappedPart {
                row,
                buckets: partition(&terms, &var_groups),
            })
            .collect();
        objective_parts.sort_by_key(|part| part.row);

        let exact_groups: Vec<Vec<usize>> = var_groups
            .iter()
            .map(|gs| gs.iter().copied().filter(|&g| groups[g].exact).collect())
            .collect();

        Self {
            objective_buckets: partition(&objective_terms, &var_groups),
            objective_exact_buckets: partition(&objective_terms, &exact_groups),
            objective_rest: partition(&rest, &var_groups),
            objective_parts,
            groups,
            rows,
            var_groups,
            var_rows,
            weights,
            sense,
        }
    }

    fn objective_bound(&self, values: &[Option<bool>]) -> i64 {
        let global = bucket_upper(&self.objective_buckets, values)
            .min(bucket_upper(&self.objective_exact_buckets, values));

        let mut split = bucket_upper(&self.objective_rest, values);
        for part in &self.objective_parts {
            let row = &self.rows[part.row];
            let upper = bucket_upper(&part.buckets, values);
            let (fixed, best_open) = part.buckets.iter().flatten().fold(
                (0i64, 0i64),
                |(fixed, best), &(v, c)| match values[v] {
                    Some(true) => (fixed + c, best),
                    Some(false) => (fixed, best),
                    None => (fixed, best.max(c)),
                },
            );
            let room = match row.min_coefficient {
                Some(step) => (row.max - row.lower(values)).max(0) / step,
                None => i64::MAX,
            };
            split += upper.min(fixed.saturating_add(room.saturating_mul(best_open)));
        }
        global.min(split)
    }
}

/// Splits `terms` into buckets that each sit inside one group.
///
/// Each term goes to the group holding the most terms of this expression;
/// terms outside every group get a bucket of their own.
fn partition(terms: &[(usize, i64)], var_groups: &[Vec<usize>]) -> Vec<Bucket> {
    let mut hits: HashMap<usize, usize> = HashMap::new();
    for &(v, _) in terms {
        for &g in &var_groups[v] {
            *hits.entry(g).or_default() += 1;
        }
    }

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut slot_of: HashMap<usize, usize> = HashMap::new();
    for &(v, c) in terms {
        let home = var_groups[v]
            .iter()
            .copied()
            .max_by_key(|g| (hits[g], Reverse(*g)));
        match home {
            Some(g) => {
                let slot = *slot_of.entry(g).or_insert_with(|| {
                    buckets.push(Vec::new());
                    buckets.len() - 1
                });
                buckets[slot].push((v, c));
            }
            None => buckets.push(vec![(v, c)]),
        }
    }
    buckets
}

fn bucket_upper(buckets: &[Bucket], values: &[Option<bool>]) -> i64 {
    buckets
        .iter()
        .map(|bucket| {
            let mut fixed = 0;
            let mut best_open = 0;
            for &(v, c) in bucket {
                match values[v] {
                    Some(true) => fixed += c,
                    Some(false) => {}
                    None => best_open = best_open.max(c),
                }
            }
            fixed + best_open
        })
        .sum()
}

enum Branch {
    Group(usize),
    Var(usize),
}

enum Flow {
    Continue,
    Stop,
}

struct Search<'a> {
    compiled: &'a Compiled,
    config: &'a SolverConfig,
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    values: Vec<Option<bool>>,
    trail: Vec<usize>,
    queue: Vec<usize>,
    incumbent: Option<(i64, Vec<bool>)>,
    stats: SearchStats,
}

impl Search<'_> {
    fn assign(&mut self, var: usize, value: bool) -> bool {
        match self.values[var] {
            Some(current) => current == value,
            None => {
                self.values[var] = Some(value);
                self.trail.push(var);
                self.queue.push(var);
                true
            }
        }
    }

    fn undo(&mut self, level: usize) {
        while self.trail.len() > level {
            if let Some(var) = self.trail.pop() {
                self.values[var] = None;
            }
        }
        self.queue.clear();
    }

    fn propagate_all(&mut self) -> bool {
        for g in 0..self.compiled.groups.len() {
            if !self.propagate_group(g) {
                return false;
            }
        }
        for r in 0..self.compiled.rows.len() {
            if !self.propagate_row(r) {
                return false;
            }
        }
        self.propagate()
    }

    fn propagate(&mut self) -> bool {
        let compiled = self.compiled;
        while let Some(var) = self.queue.pop() {
            let consistent = compiled.var_groups[var]
                .iter()
                .all(|&g| self.propagate_group(g))
                && compiled.var_rows[var]
                    .iter()
                    .all(|&r| self.propagate_row(r));
            if !consistent {
                self.queue.clear();
                return false;
            }
        }
        true
    }

    fn propagate_group(&mut self, g: usize) -> bool {
        let compiled = self.compiled;
        let group = &compiled.groups[g];
        let mut trues = 0;
        let mut open = 0;
        let mut last_open = None;
        for &v in &group.vars {
            match self.values[v] {
                Some(true) => trues += 1,
                Some(false) => {}
                None => {
                    open += 1;
                    last_open = Some(v);
                }
            }
        }

        match trues {
            0 if group.exact => match (open, last_open) {
                (0, _) => false,
                (1, Some(v)) => self.assign(v, true),
                _ => true,
            },
            0 => true,
            1 => group.vars.iter().all(|&v| self.assign_if_open(v, false)),
            _ => false,
        }
    }

    fn propagate_row(&mut self, r: usize) -> bool {
        let compiled = self.compiled;
        let row = &compiled.rows[r];
        if row.min > row.max {
            return false;
        }
        let lower = row.lower(&self.values);
        let upper = bucket_upper(&row.buckets, &self.values);
        if lower > row.max || upper < row.min {
            return false;
        }
        for &(v, c) in &row.terms {
            if self.values[v].is_some() {
                continue;
            }
            if c > 0 && lower + c > row.max {
                self.assign(v, false);
            } else if c < 0 && lower - c > row.max {
                self.assign(v, true);
            }
        }

        // A bucket down to one open term, with nothing true, must supply it
        // when the rest of the row cannot reach the minimum.
        for bucket in &row.buckets {
            let mut open = None;
            let mut open_count = 0;
            let mut settled = false;
            for &(v, c) in bucket {
                match self.values[v] {
                    Some(true) => settled = true,
                    Some(false) => {}
                    None => {
                        open_count += 1;
                        open = Some((v, c));
                    }
                }
            }
            if let (false, 1, Some((v, c))) = (settled, open_count, open) {
                if c > 0 && upper - c < row.min {
                    self.assign(v, true);
                }
            }
        }
        true
    }

    /// How far the furthest-behind row containing `var` is below its minimum.
    fn deficit(&self, var: usize) -> i64 {
        self.compiled.var_rows[var]
            .iter()
            .map(|&r| {
                let row = &self.compiled.rows[r];
                row.min - row.lower(&self.values)
            })
            .max()
            .unwrap_or(0)
    }

    fn assign_if_open(&mut self, var: usize, value: bool) -> bool {
        self.values[var].is_some() || self.assign(var, value)
    }

    fn should_stop(&self) -> bool {
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        let timed_out = self.deadline.is_some_and(|d| Instant::now() >= d);
        let exhausted = self
            .config
            .branch_limit
            .is_some_and(|limit| self.stats.branches >= limit);
        cancelled || timed_out || exhausted
    }

    fn select_branch(&self) -> Option<Branch> {
        let mut tightest: Option<(usize, usize)> = None;
        for (g, group) in self.compiled.groups.iter().enumerate() {
            if !group.exact {
                continue;
            }
            let mut open = 0;
            let mut settled = false;
            for &v in &group.vars {
                match self.values[v] {
                    Some(true) => settled = true,
                    Some(false) => {}
                    None => open += 1,
                }
            }
            if settled || open == 0 {
                continue;
            }
            if tightest.map_or(true, |(fewest, _)| open < fewest) {
                tightest = Some((open, g));
            }
        }
        if let Some((_, g)) = tightest {
            return Some(Branch::Group(g));
        }

        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_none())
            .max_by_key(|&(v, _)| (self.compiled.weights[v], Reverse(v)))
            .map(|(v, _)| Branch::Var(v))
    }

    fn record_solution(&mut self) {
        let value: i64 = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(true))
            .map(|(i, _)| self.compiled.weights[i])
            .sum();
        if self.incumbent.as_ref().is_some_and(|(best, _)| value <= *best) {
            return;
        }
        trace!(objective = value * self.compiled.sense, "new incumbent");
        self.stats.solutions += 1;
        let assignment = self.values.iter().map(|v| *v == Some(true)).collect();
        self.incumbent = Some((value, assignment));
    }

    fn search(&mut self) -> Flow {
        if self.should_stop() {
            return Flow::Stop;
        }
        if let Some((best, _)) = &self.incumbent {
            if self.compiled.objective_bound(&self.values) <= *best {
                return Flow::Continue;
            }
        }

        match self.select_branch() {
            None => {
                self.record_solution();
                if self.config.stop_after_first {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
            Some(Branch::Group(g)) => self.branch_on_group(g),
            Some(Branch::Var(v)) => self.branch_on_var(v),
        }
    }

    fn branch_on_group(&mut self, g: usize) -> Flow {
        let compiled = self.compiled;
        let node = self.trail.len();

        let mut candidates: Vec<usize> = compiled.groups[g]
            .vars
            .iter()
            .copied()
            .filter(|&v| self.values[v].is_none())
            .collect();
        candidates.sort_by_cached_key(|&v| (Reverse(compiled.weights[v]), Reverse(self.deficit(v)), v));

        for v in candidates {
            match self.values[v] {
                Some(false) => continue,
                Some(true) => {
                    // Forced by excluding the earlier siblings: this state is the last child.
                    self.stats.branches += 1;
                    if let Flow::Stop = self.search() {
                        self.undo(node);
                        return Flow::Stop;
                    }
                    break;
                }
                None => {}
            }
            let child = self.trail.len();
            self.stats.branches += 1;
            if self.assign(v, true) && self.propagate() {
                if let Flow::Stop = self.search() {
                    self.undo(node);
                    return Flow::Stop;
                }
            } else {
                self.stats.conflicts += 1;
            }
            self.undo(child);

            if !(self.assign(v, false) && self.propagate()) {
                self.stats.conflicts += 1;
                break;
            }
        }
        self.undo(node);
        Flow::Continue
    }

    fn branch_on_var(&mut self, v: usize) -> Flow {
        let node = self.trail.len();
        let first = self.compiled.weights[v] > 0;
        for value in [first, !first] {
            self.stats.branches += 1;
            if self.assign(v, value) && self.propagate() {
                if let Flow::Stop = self.search() {
                    self.undo(node);
                    return Flow::Stop;
                }
            } else {
                self.stats.conflicts += 1;
            }
            self.undo(node);
        }
        Flow::Continue
    }
}

/// Exact depth-first branch-and-bound solver for boolean models.
///
/// Supports [`Constraint::ExactlyOne`], [`Constraint::AtMostOne`] and
/// [`Constraint::Linear`] with a linear objective. Without limits in the
/// [`SolverConfig`] the search runs to completion and reports either
/// [`SolveResult::Optimal`] or [`SolveResult::Infeasible`].
///
/// # Examples
///
/// ```
/// use u_roster::cp::{BranchAndBoundSolver, CpModel, CpSolver, LinearExpr, SolverConfig};
///
/// let mut model = CpModel::new("pick");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_exactly_one(vec![a, b]);
/// model.maximize(LinearExpr::weighted([(a, 1), (b, 3)]));
///
/// let result = BranchAndBoundSolver::new()
///     .solve(&model, &SolverConfig::default())
///     .unwrap();
/// let solution = result.solution().unwrap();
/// assert_eq!(solution.objective_value, 3);
/// assert!(solution.assignment.value(b));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult, ModelError> {
        model.validate()?;
        let start = Instant::now();
        let compiled = Compiled::new(model);

        let mut search = Search {
            compiled: &compiled,
            config,
            cancel,
            deadline: config.time_limit.map(|limit| start + limit),
            values: vec![None; model.var_count()],
            trail: Vec::new(),
            queue: Vec::new(),
            incumbent: None,
            stats: SearchStats::default(),
        };

        let (exhausted, root_bound) = if search.propagate_all() {
            let root_bound = compiled.objective_bound(&search.values);
            debug!(
                model = %model.name,
                vars = model.var_count(),
                constraints = model.constraint_count(),
                root_bound = root_bound * compiled.sense,
                "starting branch-and-bound"
            );
            (matches!(search.search(), Flow::Continue), Some(root_bound))
        } else {
            search.stats.conflicts += 1;
            (true, None)
        };

        let mut stats = search.stats;
        stats.wall_time = start.elapsed();

        let result = match search.incumbent {
            Some((value, values)) => {
                let solution = CpSolution {
                    assignment: Assignment::new(values),
                    objective_value: value * compiled.sense,
                    stats,
                };
                if exhausted || root_bound.is_some_and(|bound| value >= bound) {
                    SolveResult::Optimal(solution)
                } else {
                    SolveResult::Feasible(solution)
                }
            }
            None if exhausted => SolveResult::Infeasible(stats),
            None => SolveResult::Unknown(stats),
        };
        Ok(result)
    }
}
