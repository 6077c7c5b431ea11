//! Property tests for roster invariants.

mod common;

use common::{assert_valid_roster, brute_force_best};
use proptest::prelude::*;
use u_roster::cp::SolverStatus;
use u_roster::roster::{Day, FairnessBounds, PreferenceMatrix, ShiftScheduler};

/// Preference matrices up to `max_workers x max_shifts`.
fn matrix_up_to(max_workers: usize, max_shifts: usize) -> impl Strategy<Value = PreferenceMatrix> {
    (1..=max_workers, 1..=max_shifts).prop_flat_map(|(workers, shifts)| {
        proptest::collection::vec(proptest::bool::weighted(0.3), workers * 7 * shifts)
            .prop_map(move |cells| PreferenceMatrix::from_flat(workers, shifts, cells).unwrap())
    })
}

/// Matrices whose exhaustive search stays cheap.
fn enumerable_matrix() -> impl Strategy<Value = PreferenceMatrix> {
    prop_oneof![
        (1usize..=4).prop_map(|w| (w, 1usize)),
        Just((2usize, 2usize)),
    ]
    .prop_flat_map(|(workers, shifts)| {
        proptest::collection::vec(any::<bool>(), workers * 7 * shifts)
            .prop_map(move |cells| PreferenceMatrix::from_flat(workers, shifts, cells).unwrap())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn fairness_band_brackets_even_share(workers in 1usize..=40, shifts in 1usize..=12) {
        let bounds = FairnessBounds::compute(workers, shifts).unwrap();
        let total = shifts * 7;
        prop_assert!(bounds.min_shifts * workers <= total);
        prop_assert!(bounds.max_shifts * workers >= total);
        prop_assert!(bounds.max_shifts - bounds.min_shifts <= 1);
        prop_assert_eq!(bounds.min_shifts == bounds.max_shifts, total % workers == 0);
    }

    #[test]
    fn solved_rosters_satisfy_every_constraint(prefs in matrix_up_to(15, 3)) {
        let outcome = ShiftScheduler::new().schedule(&prefs).unwrap();
        let bounds = FairnessBounds::for_matrix(&prefs);
        let feasible = prefs.num_shifts_per_day() <= prefs.num_workers() && bounds.min_shifts <= 7;

        match outcome.schedule() {
            Some(schedule) => {
                prop_assert!(feasible);
                prop_assert_eq!(schedule.status(), SolverStatus::Optimal);
                assert_valid_roster(schedule, &prefs);
                prop_assert!(schedule.requests().met <= prefs.total_requests());
            }
            None => {
                prop_assert!(!feasible);
                prop_assert_eq!(outcome.status(), SolverStatus::Infeasible);
            }
        }
    }

    #[test]
    fn objective_is_optimal(prefs in enumerable_matrix()) {
        let outcome = ShiftScheduler::new().schedule(&prefs).unwrap();
        match brute_force_best(&prefs) {
            Some(best) => {
                let schedule = outcome.schedule().unwrap();
                prop_assert_eq!(schedule.objective_value(), best as i64);
            }
            None => prop_assert_eq!(outcome.status(), SolverStatus::Infeasible),
        }
    }

    #[test]
    fn adding_a_request_never_lowers_the_objective(
        prefs in matrix_up_to(15, 3),
        pick in any::<prop::sample::Index>(),
    ) {
        let scheduler = ShiftScheduler::new();
        let before = scheduler.schedule(&prefs).unwrap();

        let workers = prefs.num_workers();
        let shifts = prefs.num_shifts_per_day();
        let cell = pick.index(workers * 7 * shifts);
        let (worker, rest) = (cell / (7 * shifts), cell % (7 * shifts));
        let day = Day::from_index(rest / shifts).unwrap();
        let mut more = prefs.clone();
        more.request(worker, day, rest % shifts).unwrap();
        let after = scheduler.schedule(&more).unwrap();

        prop_assert_eq!(before.status(), after.status());
        if let (Some(b), Some(a)) = (before.schedule(), after.schedule()) {
            prop_assert!(a.objective_value() >= b.objective_value());
            prop_assert!(a.objective_value() <= b.objective_value() + 1);
        }
    }
}
