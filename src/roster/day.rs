//! The fixed weekly horizon.

use std::fmt;

/// Length of the planning horizon in days.
pub const DAYS_PER_WEEK: usize = 7;

/// A day of the rostered week, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    /// All days, Monday first.
    pub const ALL: [Day; DAYS_PER_WEEK] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Position in the week, `0` for Monday.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Day at position `index`, if within the week.
    pub fn from_index(index: usize) -> Option<Day> {
        Self::ALL.get(index).copied()
    }

    /// Three-letter column label.
    pub fn label(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, day) in Day::ALL.iter().enumerate() {
            assert_eq!(day.index(), i);
            assert_eq!(Day::from_index(i), Some(*day));
        }
        assert_eq!(Day::from_index(DAYS_PER_WEEK), None);
    }

    #[test]
    fn test_labels_in_calendar_order() {
        let labels: Vec<&str> = Day::ALL.iter().map(|d| d.label()).collect();
        assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
        assert_eq!(Day::Sun.to_string(), "Sun");
    }
}
