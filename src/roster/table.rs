//! Day-by-shift roster table.

use super::day::Day;
use std::fmt;

/// Display label for a 0-based worker index.
pub fn worker_label(worker: usize) -> String {
    format!("Worker {}", worker + 1)
}

/// One table row: a shift across the week.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterRow {
    /// 1-based shift number.
    pub shift: usize,
    /// Worker label per day, Monday first. Empty when unstaffed.
    pub cells: Vec<String>,
}

/// Row-major roster view: one row per shift, one column per day.
///
/// Columns are `["Shift", "Mon", ..., "Sun"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterTable {
    header: Vec<String>,
    rows: Vec<RosterRow>,
}

impl RosterTable {
    pub(crate) fn new(rows: Vec<RosterRow>) -> Self {
        let header = std::iter::once("Shift")
            .chain(Day::ALL.iter().map(|d| d.label()))
            .map(String::from)
            .collect();
        Self { header, rows }
    }

    /// Column headers.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows ordered by shift.
    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    /// Cell for 0-based `shift` on `day`.
    pub fn cell(&self, shift: usize, day: Day) -> Option<&str> {
        self.rows
            .get(shift)
            .and_then(|row| row.cells.get(day.index()))
            .map(String::as_str)
    }
}

impl fmt::Display for RosterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<Vec<String>> = std::iter::once(self.header.clone())
            .chain(self.rows.iter().map(|row| {
                std::iter::once(row.shift.to_string())
                    .chain(row.cells.iter().cloned())
                    .collect()
            }))
            .collect();

        let mut widths = vec![0; self.header.len()];
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.len());
            }
        }

        for line in &lines {
            let padded: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            writeln!(f, "{}", padded.join("  ").trim_end())?;
        }
        Ok(())
    }
}
