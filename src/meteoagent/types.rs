// K-index value types.
// Defines the validated index, the forecast day selector, and a fetched reading pair.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Which of the two forecast values to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Today,
    Tomorrow,
}

impl Day {
    pub const ALL: [Day; 2] = [Day::Today, Day::Tomorrow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Today => "today",
            Day::Tomorrow => "tomorrow",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Day::Today => "Today",
            Day::Tomorrow => "Tomorrow",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geomagnetic K-index in the accepted range 1 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct KIndex(u8);

impl KIndex {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    /// Returns `None` for values outside 1..=9. Never clamps.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for KIndex {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(KIndex::new)
            .ok_or(value)
    }
}

impl From<KIndex> for u8 {
    fn from(index: KIndex) -> Self {
        index.0
    }
}

impl fmt::Display for KIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Both forecast values from a single successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readings {
    pub today: KIndex,
    pub tomorrow: KIndex,
    /// Wall-clock time the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// Monotonic time the fetch completed, used for staleness.
    #[serde(skip)]
    pub received: Instant,
}

impl Readings {
    pub fn new(today: KIndex, tomorrow: KIndex) -> Self {
        Self {
            today,
            tomorrow,
            fetched_at: Utc::now(),
            received: Instant::now(),
        }
    }

    pub fn get(&self, day: Day) -> KIndex {
        match day {
            Day::Today => self.today,
            Day::Tomorrow => self.tomorrow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kindex_accepts_full_range() {
        for value in 1..=9u8 {
            assert_eq!(KIndex::new(value).map(KIndex::value), Some(value));
        }
    }

    #[test]
    fn test_kindex_rejects_out_of_range() {
        assert!(KIndex::new(0).is_none());
        assert!(KIndex::new(10).is_none());
        assert_eq!(KIndex::try_from(-1i64), Err(-1));
        assert_eq!(KIndex::try_from(300i64), Err(300));
    }

    #[test]
    fn test_readings_get_by_day() {
        let readings = Readings::new(KIndex::new(3).unwrap(), KIndex::new(5).unwrap());
        assert_eq!(readings.get(Day::Today).value(), 3);
        assert_eq!(readings.get(Day::Tomorrow).value(), 5);
    }

    #[test]
    fn test_kindex_serializes_as_number() {
        let json = serde_json::to_string(&KIndex::new(7).unwrap()).unwrap();
        assert_eq!(json, "7");
    }
}
