//! Worker shift requests.

use super::day::{Day, DAYS_PER_WEEK};
use crate::error::{RosterError, RosterResult};
use rand::Rng;

/// Dense request cube indexed `[worker][day][shift]`.
///
/// Every cell is present; an absent request is `false`. The matrix is
/// filled in before it is handed to the model builder and only read
/// afterwards.
///
/// # Examples
///
/// ```
/// use u_roster::roster::{Day, PreferenceMatrix};
///
/// let mut prefs = PreferenceMatrix::empty(2, 3).unwrap();
/// prefs.request(1, Day::Wed, 2).unwrap();
/// assert!(prefs.is_requested(1, Day::Wed, 2));
/// assert_eq!(prefs.total_requests(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPreferenceMatrix"))]
pub struct PreferenceMatrix {
    num_workers: usize,
    num_shifts_per_day: usize,
    cells: Vec<bool>,
}

/// Unchecked wire form; deserialization goes through [`PreferenceMatrix::from_flat`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPreferenceMatrix {
    num_workers: usize,
    num_shifts_per_day: usize,
    cells: Vec<bool>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPreferenceMatrix> for PreferenceMatrix {
    type Error = RosterError;

    fn try_from(raw: RawPreferenceMatrix) -> RosterResult<Self> {
        Self::from_flat(raw.num_workers, raw.num_shifts_per_day, raw.cells)
    }
}

impl PreferenceMatrix {
    /// Builds a matrix from a nested `[worker][day][shift]` cube.
    ///
    /// # Errors
    ///
    /// [`RosterError::InvalidDimension`] when a count is zero,
    /// [`RosterError::ShapeMismatch`] when any axis length disagrees with
    /// the declared dimensions.
    pub fn new(
        num_workers: usize,
        num_shifts_per_day: usize,
        cube: Vec<Vec<Vec<bool>>>,
    ) -> RosterResult<Self> {
        check_dimensions(num_workers, num_shifts_per_day)?;
        if cube.len() != num_workers {
            return Err(RosterError::ShapeMismatch {
                axis: "workers".into(),
                expected: num_workers,
                actual: cube.len(),
            });
        }

        let mut cells = Vec::with_capacity(num_workers * DAYS_PER_WEEK * num_shifts_per_day);
        for (worker, days) in cube.into_iter().enumerate() {
            if days.len() != DAYS_PER_WEEK {
                return Err(RosterError::ShapeMismatch {
                    axis: format!("worker {worker} days"),
                    expected: DAYS_PER_WEEK,
                    actual: days.len(),
                });
            }
            for (day, shifts) in Day::ALL.iter().zip(days) {
                if shifts.len() != num_shifts_per_day {
                    return Err(RosterError::ShapeMismatch {
                        axis: format!("worker {worker} / day {day}"),
                        expected: num_shifts_per_day,
                        actual: shifts.len(),
                    });
                }
                cells.extend(shifts);
            }
        }

        Ok(Self {
            num_workers,
            num_shifts_per_day,
            cells,
        })
    }

    /// Builds a matrix from row-major `[worker][day][shift]` cells.
    pub fn from_flat(
        num_workers: usize,
        num_shifts_per_day: usize,
        cells: Vec<bool>,
    ) -> RosterResult<Self> {
        check_dimensions(num_workers, num_shifts_per_day)?;
        let expected = num_workers * DAYS_PER_WEEK * num_shifts_per_day;
        if cells.len() != expected {
            return Err(RosterError::ShapeMismatch {
                axis: "cells".into(),
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            num_workers,
            num_shifts_per_day,
            cells,
        })
    }

    /// A matrix with no requests.
    pub fn empty(num_workers: usize, num_shifts_per_day: usize) -> RosterResult<Self> {
        check_dimensions(num_workers, num_shifts_per_day)?;
        Ok(Self {
            num_workers,
            num_shifts_per_day,
            cells: vec![false; num_workers * DAYS_PER_WEEK * num_shifts_per_day],
        })
    }

    /// A matrix where each cell is requested independently with `probability`.
    pub fn random<R: Rng + ?Sized>(
        num_workers: usize,
        num_shifts_per_day: usize,
        probability: f64,
        rng: &mut R,
    ) -> RosterResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(RosterError::InvalidConfig {
                message: format!("request probability must be in [0, 1], got {probability}"),
            });
        }
        let mut matrix = Self::empty(num_workers, num_shifts_per_day)?;
        for cell in &mut matrix.cells {
            *cell = rng.random_bool(probability);
        }
        Ok(matrix)
    }

    /// Marks `(worker, day, shift)` as requested.
    pub fn request(&mut self, worker: usize, day: Day, shift: usize) -> RosterResult<()> {
        if worker >= self.num_workers {
            return Err(RosterError::OutOfRange {
                name: "worker",
                index: worker,
                limit: self.num_workers,
            });
        }
        if shift >= self.num_shifts_per_day {
            return Err(RosterError::OutOfRange {
                name: "shift",
                index: shift,
                limit: self.num_shifts_per_day,
            });
        }
        let at = self.offset(worker, day, shift);
        self.cells[at] = true;
        Ok(())
    }

    /// Whether `worker` asked for `shift` on `day`. Out-of-range cells read as `false`.
    pub fn is_requested(&self, worker: usize, day: Day, shift: usize) -> bool {
        worker < self.num_workers
            && shift < self.num_shifts_per_day
            && self.cells[self.offset(worker, day, shift)]
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn num_shifts_per_day(&self) -> usize {
        self.num_shifts_per_day
    }

    /// Number of requested cells.
    pub fn total_requests(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of cells requested by `worker`.
    pub fn requests_of(&self, worker: usize) -> usize {
        if worker >= self.num_workers {
            return 0;
        }
        let width = DAYS_PER_WEEK * self.num_shifts_per_day;
        self.cells[worker * width..(worker + 1) * width]
            .iter()
            .filter(|&&c| c)
            .count()
    }

    fn offset(&self, worker: usize, day: Day, shift: usize) -> usize {
        (worker * DAYS_PER_WEEK + day.index()) * self.num_shifts_per_day + shift
    }
}

pub(crate) fn check_dimensions(num_workers: usize, num_shifts_per_day: usize) -> RosterResult<()> {
    if num_workers == 0 {
        return Err(RosterError::InvalidDimension {
            name: "num_workers",
            value: num_workers,
        });
    }
    if num_shifts_per_day == 0 {
        return Err(RosterError::InvalidDimension {
            name: "num_shifts_per_day",
            value: num_shifts_per_day,
        });
    }
    Ok(())
}
