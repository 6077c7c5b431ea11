//! Shared checks for roster integration tests.

#![allow(dead_code)]

use u_roster::roster::{Day, FairnessBounds, PreferenceMatrix, Schedule};

/// Asserts coverage, exclusivity, fairness and the objective count.
pub fn assert_valid_roster(schedule: &Schedule, prefs: &PreferenceMatrix) {
    let workers = prefs.num_workers();
    let shifts = prefs.num_shifts_per_day();

    for day in Day::ALL {
        for shift in 0..shifts {
            assert!(
                schedule.worker_at(day, shift).is_some(),
                "{day} shift {shift} is unstaffed"
            );
        }
    }

    for worker in 0..workers {
        for day in Day::ALL {
            let held = (0..shifts)
                .filter(|&s| schedule.worker_at(day, s) == Some(worker))
                .count();
            assert!(held <= 1, "worker {worker} holds {held} shifts on {day}");
        }
    }

    let bounds = FairnessBounds::compute(workers, shifts).unwrap();
    for worker in 0..workers {
        let worked = schedule.shifts_worked(worker);
        assert!(
            bounds.contains(worked),
            "worker {worker} works {worked}, outside [{}, {}]",
            bounds.min_shifts,
            bounds.max_shifts
        );
    }

    let met = schedule
        .assignments()
        .filter(|&(day, shift, a)| prefs.is_requested(a.worker, day, shift))
        .count();
    assert_eq!(schedule.objective_value(), met as i64);
    assert_eq!(schedule.requests().met, met);
}

/// Best achievable request count by exhaustive enumeration, `None` if infeasible.
///
/// Only practical for `workers^(7 × shifts)` up to a few tens of thousands.
pub fn brute_force_best(prefs: &PreferenceMatrix) -> Option<usize> {
    let workers = prefs.num_workers();
    let shifts = prefs.num_shifts_per_day();
    let bounds = FairnessBounds::compute(workers, shifts).unwrap();
    let slots: Vec<(Day, usize)> = Day::ALL
        .into_iter()
        .flat_map(|day| (0..shifts).map(move |s| (day, s)))
        .collect();

    fn walk(
        at: usize,
        slots: &[(Day, usize)],
        prefs: &PreferenceMatrix,
        bounds: FairnessBounds,
        chosen: &mut Vec<usize>,
        best: &mut Option<usize>,
    ) {
        let workers = prefs.num_workers();
        if at == slots.len() {
            let fair = (0..workers)
                .all(|w| bounds.contains(chosen.iter().filter(|&&c| c == w).count()));
            if fair {
                let met = slots
                    .iter()
                    .zip(chosen.iter())
                    .filter(|&(&(day, s), &w)| prefs.is_requested(w, day, s))
                    .count();
                *best = Some(best.map_or(met, |b| b.max(met)));
            }
            return;
        }
        // Same-day slots sit directly before this one.
        let same_day_start = at - slots[at].1;
        for w in 0..workers {
            if chosen[same_day_start..at].contains(&w) {
                continue;
            }
            if chosen.iter().filter(|&&c| c == w).count() >= bounds.max_shifts {
                continue;
            }
            chosen.push(w);
            walk(at + 1, slots, prefs, bounds, chosen, best);
            chosen.pop();
        }
    }

    let mut best = None;
    walk(0, &slots, prefs, bounds, &mut Vec::new(), &mut best);
    best
}
