//! Turning a raw solver assignment into a roster.

use super::builder::AssignmentModel;
use super::day::{Day, DAYS_PER_WEEK};
use super::fairness::FairnessBounds;
use super::preferences::PreferenceMatrix;
use super::table::{worker_label, RosterRow, RosterTable};
use crate::cp::{CpSolution, SearchStats, SolveResult, SolverStatus};
use tracing::warn;

/// The worker staffing one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftAssignment {
    /// 0-based worker index.
    pub worker: usize,
    /// Whether the worker asked for this slot.
    pub requested: bool,
}

impl ShiftAssignment {
    /// Display label, e.g. `"Worker 3"`.
    pub fn label(&self) -> String {
        worker_label(self.worker)
    }
}

/// How the roster relates to the submitted requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestSummary {
    /// Assigned slots that were requested.
    pub met: usize,
    /// Requested cells in the preference matrix.
    pub total_requested: usize,
    /// Assigned slots nobody asked for.
    pub unrequested_assignments: usize,
    /// `num_workers × min_shifts`: the guaranteed share of the week.
    pub fair_share_target: usize,
}

/// A staffed week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    status: SolverStatus,
    objective_value: i64,
    /// Day-major: `slots[day * shifts + shift]`.
    slots: Vec<Option<ShiftAssignment>>,
    num_workers: usize,
    num_shifts_per_day: usize,
    bounds: FairnessBounds,
    requests: RequestSummary,
    stats: SearchStats,
}

impl Schedule {
    /// [`SolverStatus::Optimal`] or [`SolverStatus::Feasible`].
    pub fn status(&self) -> SolverStatus {
        self.status
    }

    /// Number of satisfied requests, as reported by the solver.
    pub fn objective_value(&self) -> i64 {
        self.objective_value
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn bounds(&self) -> FairnessBounds {
        self.bounds
    }

    pub fn requests(&self) -> &RequestSummary {
        &self.requests
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn num_shifts_per_day(&self) -> usize {
        self.num_shifts_per_day
    }

    /// Who staffs `shift` on `day`.
    pub fn assignment(&self, day: Day, shift: usize) -> Option<ShiftAssignment> {
        if shift >= self.num_shifts_per_day {
            return None;
        }
        self.slots[day.index() * self.num_shifts_per_day + shift]
    }

    /// Worker index staffing `shift` on `day`.
    pub fn worker_at(&self, day: Day, shift: usize) -> Option<usize> {
        self.assignment(day, shift).map(|a| a.worker)
    }

    /// Every staffed slot in calendar order, then by shift.
    pub fn assignments(&self) -> impl Iterator<Item = (Day, usize, ShiftAssignment)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let day = Day::from_index(i / self.num_shifts_per_day)?;
            slot.map(|a| (day, i % self.num_shifts_per_day, a))
        })
    }

    /// Staffed slots that were not requested.
    pub fn unrequested_assignments(
        &self,
    ) -> impl Iterator<Item = (Day, usize, ShiftAssignment)> + '_ {
        self.assignments().filter(|(_, _, a)| !a.requested)
    }

    /// Slots held by `worker`.
    pub fn worker_shifts(&self, worker: usize) -> Vec<(Day, usize)> {
        self.assignments()
            .filter(|(_, _, a)| a.worker == worker)
            .map(|(day, shift, _)| (day, shift))
            .collect()
    }

    /// Weekly total for `worker`.
    pub fn shifts_worked(&self, worker: usize) -> usize {
        self.assignments().filter(|(_, _, a)| a.worker == worker).count()
    }

    /// Row-major table view: rows by shift ascending, columns Mon…Sun.
    pub fn table(&self) -> RosterTable {
        let rows = (0..self.num_shifts_per_day)
            .map(|shift| RosterRow {
                shift: shift + 1,
                cells: Day::ALL
                    .iter()
                    .map(|&day| {
                        self.assignment(day, shift)
                            .map(|a| a.label())
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect();
        RosterTable::new(rows)
    }
}

/// Result of one scheduling request.
///
/// Only [`ScheduleOutcome::Scheduled`] carries a roster; the other variants
/// carry the search diagnostics and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A complete roster (optimal or best found within limits).
    Scheduled(Schedule),
    /// The constraints cannot all hold.
    Infeasible(SearchStats),
    /// The search stopped before feasibility was decided.
    Inconclusive(SearchStats),
}

impl ScheduleOutcome {
    pub fn status(&self) -> SolverStatus {
        match self {
            ScheduleOutcome::Scheduled(schedule) => schedule.status(),
            ScheduleOutcome::Infeasible(_) => SolverStatus::Infeasible,
            ScheduleOutcome::Inconclusive(_) => SolverStatus::Unknown,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        match self {
            ScheduleOutcome::Scheduled(schedule) => schedule.stats(),
            ScheduleOutcome::Infeasible(stats) | ScheduleOutcome::Inconclusive(stats) => stats,
        }
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            ScheduleOutcome::Scheduled(schedule) => Some(schedule),
            _ => None,
        }
    }

    pub fn into_schedule(self) -> Option<Schedule> {
        match self {
            ScheduleOutcome::Scheduled(schedule) => Some(schedule),
            _ => None,
        }
    }
}

/// Reads a [`SolveResult`] back into roster terms.
pub struct ScheduleExtractor;

impl ScheduleExtractor {
    /// Converts `result` for `model` into a [`ScheduleOutcome`].
    pub fn extract(
        result: &SolveResult,
        model: &AssignmentModel,
        prefs: &PreferenceMatrix,
    ) -> ScheduleOutcome {
        match result {
            SolveResult::Optimal(solution) | SolveResult::Feasible(solution) => {
                ScheduleOutcome::Scheduled(Self::schedule(result.status(), solution, model, prefs))
            }
            SolveResult::Infeasible(stats) => ScheduleOutcome::Infeasible(*stats),
            SolveResult::Unknown(stats) => ScheduleOutcome::Inconclusive(*stats),
        }
    }

    fn schedule(
        status: SolverStatus,
        solution: &CpSolution,
        model: &AssignmentModel,
        prefs: &PreferenceMatrix,
    ) -> Schedule {
        let num_workers = model.num_workers();
        let num_shifts = model.num_shifts_per_day();
        let mut slots = Vec::with_capacity(DAYS_PER_WEEK * num_shifts);

        for day in Day::ALL {
            for shift in 0..num_shifts {
                let mut staffed = (0..num_workers)
                    .filter(|&n| solution.assignment.value(model.var_at(n, day, shift)));
                let slot = staffed.next().map(|worker| ShiftAssignment {
                    worker,
                    requested: prefs.is_requested(worker, day, shift),
                });
                match (slot, staffed.count()) {
                    (None, _) => warn!(%day, shift, "slot left unstaffed"),
                    (Some(_), extra) if extra > 0 => {
                        warn!(%day, shift, extra, "slot staffed more than once")
                    }
                    _ => {}
                }
                slots.push(slot);
            }
        }

        let met = slots.iter().flatten().filter(|a| a.requested).count();
        let staffed = slots.iter().flatten().count();
        let bounds = model.bounds();
        let requests = RequestSummary {
            met,
            total_requested: prefs.total_requests(),
            unrequested_assignments: staffed - met,
            fair_share_target: num_workers * bounds.min_shifts,
        };

        Schedule {
            status,
            objective_value: solution.objective_value,
            slots,
            num_workers,
            num_shifts_per_day: num_shifts,
            bounds,
            requests,
            stats: solution.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Assignment;
    use crate::roster::AssignmentModelBuilder;

    fn model_for(prefs: &PreferenceMatrix) -> AssignmentModel {
        AssignmentModelBuilder::new(prefs, FairnessBounds::for_matrix(prefs)).build()
    }

    /// Worker `(day + shift) % workers` on every slot.
    fn rotation(model: &AssignmentModel) -> Assignment {
        let mut values = vec![false; model.model().var_count()];
        for day in Day::ALL {
            for shift in 0..model.num_shifts_per_day() {
                let worker = (day.index() + shift) % model.num_workers();
                values[model.var_at(worker, day, shift).index()] = true;
            }
        }
        Assignment::new(values)
    }

    #[test]
    fn test_extract_optimal() {
        let mut prefs = PreferenceMatrix::empty(2, 1).unwrap();
        prefs.request(0, Day::Mon, 0).unwrap();
        prefs.request(0, Day::Tue, 0).unwrap();
        let model = model_for(&prefs);
        let result = SolveResult::Optimal(CpSolution {
            assignment: rotation(&model),
            objective_value: 1,
            stats: SearchStats::default(),
        });

        let outcome = ScheduleExtractor::extract(&result, &model, &prefs);
        let schedule = outcome.schedule().unwrap();
        assert_eq!(schedule.status(), SolverStatus::Optimal);
        assert_eq!(schedule.worker_at(Day::Mon, 0), Some(0));
        assert_eq!(schedule.worker_at(Day::Tue, 0), Some(1));
        assert_eq!(schedule.shifts_worked(0), 4);
        assert_eq!(schedule.shifts_worked(1), 3);
        assert_eq!(
            schedule.requests(),
            &RequestSummary {
                met: 1,
                total_requested: 2,
                unrequested_assignments: 6,
                fair_share_target: 6,
            }
        );
        assert_eq!(schedule.unrequested_assignments().count(), 6);
        assert_eq!(
            schedule.worker_shifts(1),
            vec![(Day::Tue, 0), (Day::Thu, 0), (Day::Sat, 0)]
        );
    }

    #[test]
    fn test_table_layout() {
        let prefs = PreferenceMatrix::empty(3, 2).unwrap();
        let model = model_for(&prefs);
        let result = SolveResult::Feasible(CpSolution {
            assignment: rotation(&model),
            objective_value: 0,
            stats: SearchStats::default(),
        });

        let schedule = ScheduleExtractor::extract(&result, &model, &prefs)
            .into_schedule()
            .unwrap();
        assert_eq!(schedule.status(), SolverStatus::Feasible);

        let table = schedule.table();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].shift, 1);
        assert_eq!(table.rows()[1].shift, 2);
        assert_eq!(table.cell(0, Day::Mon), Some("Worker 1"));
        assert_eq!(table.cell(1, Day::Mon), Some("Worker 2"));
        assert_eq!(table.cell(1, Day::Wed), Some("Worker 1"));
    }

    #[test]
    fn test_unstaffed_slot_renders_blank() {
        let prefs = PreferenceMatrix::empty(2, 1).unwrap();
        let model = model_for(&prefs);
        let result = SolveResult::Feasible(CpSolution {
            assignment: Assignment::new(vec![false; model.model().var_count()]),
            objective_value: 0,
            stats: SearchStats::default(),
        });

        let schedule = ScheduleExtractor::extract(&result, &model, &prefs)
            .into_schedule()
            .unwrap();
        assert_eq!(schedule.assignments().count(), 0);
        assert_eq!(schedule.table().cell(0, Day::Fri), Some(""));
    }

    #[test]
    fn test_failures_carry_no_schedule() {
        let prefs = PreferenceMatrix::empty(2, 10).unwrap();
        let model = model_for(&prefs);
        let stats = SearchStats {
            conflicts: 1,
            ..SearchStats::default()
        };

        let infeasible = ScheduleExtractor::extract(&SolveResult::Infeasible(stats), &model, &prefs);
        assert_eq!(infeasible.status(), SolverStatus::Infeasible);
        assert_eq!(infeasible.stats().conflicts, 1);
        assert!(infeasible.schedule().is_none());

        let unknown = ScheduleExtractor::extract(&SolveResult::Unknown(stats), &model, &prefs);
        assert_eq!(unknown.status(), SolverStatus::Unknown);
        assert!(unknown.into_schedule().is_none());
    }
}
