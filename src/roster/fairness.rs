//! Per-worker workload band.

use super::day::DAYS_PER_WEEK;
use super::preferences::{check_dimensions, PreferenceMatrix};
use crate::error::RosterResult;

/// Inclusive `[min_shifts, max_shifts]` band applied to every worker's weekly total.
///
/// `min_shifts` is the floor of `slots / workers`; `max_shifts` equals it
/// when the division is exact and is one more otherwise. When there are
/// more workers than slots the band is `[0, 1]` and some workers stay idle.
///
/// # Examples
///
/// ```
/// use u_roster::roster::FairnessBounds;
///
/// let bounds = FairnessBounds::compute(2, 1).unwrap();
/// assert_eq!((bounds.min_shifts, bounds.max_shifts), (3, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FairnessBounds {
    /// Fewest shifts any worker may work in the week.
    pub min_shifts: usize,
    /// Most shifts any worker may work in the week.
    pub max_shifts: usize,
}

impl FairnessBounds {
    /// Computes the band for `num_workers` sharing `num_shifts_per_day × 7` slots.
    pub fn compute(num_workers: usize, num_shifts_per_day: usize) -> RosterResult<Self> {
        check_dimensions(num_workers, num_shifts_per_day)?;
        Ok(Self::split(num_workers, num_shifts_per_day))
    }

    /// Band for the dimensions of an already validated matrix.
    pub fn for_matrix(prefs: &PreferenceMatrix) -> Self {
        Self::split(prefs.num_workers(), prefs.num_shifts_per_day())
    }

    /// Floor/ceil split of the week's slots. `num_workers` must be non-zero.
    fn split(num_workers: usize, num_shifts_per_day: usize) -> Self {
        let total_slots = num_shifts_per_day * DAYS_PER_WEEK;
        let min_shifts = total_slots / num_workers;
        Self {
            min_shifts,
            max_shifts: min_shifts + usize::from(total_slots % num_workers != 0),
        }
    }

    /// Whether a weekly total lies inside the band.
    pub fn contains(&self, shifts: usize) -> bool {
        (self.min_shifts..=self.max_shifts).contains(&shifts)
    }
}
