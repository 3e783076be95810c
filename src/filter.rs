use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::models::{DailyRecord, HourlyRecord, Season, Weather, YearIndex};

/// Categorical constraints chosen by the caller. An unset or empty
/// constraint leaves that dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub season: Option<Season>,
    pub years: BTreeSet<YearIndex>,
    pub weathers: BTreeSet<Weather>,
}

/// Result of filtering: either the matching rows or an explicit empty marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filtered<T> {
    Rows(Vec<T>),
    Empty,
}

impl<T> Filtered<T> {
    pub fn rows(&self) -> Option<&[T]> {
        match self {
            Filtered::Rows(rows) => Some(rows),
            Filtered::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Filtered::Empty)
    }
}

/// The categorical columns shared by both tables.
pub trait Categorized {
    fn season(&self) -> Season;
    fn year(&self) -> YearIndex;
    fn weather(&self) -> Weather;
}

impl Categorized for DailyRecord {
    fn season(&self) -> Season {
        self.season
    }

    fn year(&self) -> YearIndex {
        self.year
    }

    fn weather(&self) -> Weather {
        self.weather
    }
}

impl Categorized for HourlyRecord {
    fn season(&self) -> Season {
        self.season
    }

    fn year(&self) -> YearIndex {
        self.year
    }

    fn weather(&self) -> Weather {
        self.weather
    }
}

impl FilterSpec {
    pub fn is_unrestricted(&self) -> bool {
        self.season.is_none() && self.years.is_empty() && self.weathers.is_empty()
    }

    pub fn matches<R: Categorized>(&self, row: &R) -> bool {
        self.season.map_or(true, |season| row.season() == season)
            && (self.years.is_empty() || self.years.contains(&row.year()))
            && (self.weathers.is_empty() || self.weathers.contains(&row.weather()))
    }

    /// Returns a new table; the input is left untouched.
    pub fn apply<R: Categorized + Clone>(&self, rows: &[R]) -> Filtered<R> {
        let matched: Vec<R> = rows.iter().filter(|row| self.matches(*row)).cloned().collect();
        if matched.is_empty() {
            info!(filter = ?self, input_rows = rows.len(), "filter matched no rows");
            return Filtered::Empty;
        }
        Filtered::Rows(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::daily;

    fn table() -> Vec<DailyRecord> {
        vec![
            daily(1, 1, 100, 200),
            DailyRecord {
                season: Season::Summer,
                weather: Weather::LightRain,
                ..daily(5, 2, 50, 60)
            },
            DailyRecord {
                year: YearIndex::Second,
                ..daily(7, 3, 10, 20)
            },
        ]
    }

    #[test]
    fn unrestricted_filter_keeps_everything() {
        let rows = table();
        let filtered = FilterSpec::default().apply(&rows);
        assert_eq!(filtered.rows().map(<[_]>::len), Some(3));
    }

    #[test]
    fn constraints_are_conjunctive() {
        let rows = table();
        let spec = FilterSpec {
            season: Some(Season::Spring),
            years: BTreeSet::from([YearIndex::First]),
            weathers: BTreeSet::new(),
        };
        let filtered = spec.apply(&rows);
        let kept = filtered.rows().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].month, 1);
    }

    #[test]
    fn no_match_yields_explicit_empty() {
        let rows = vec![
            DailyRecord {
                weather: Weather::LightRain,
                ..daily(1, 1, 1, 1)
            },
            DailyRecord {
                weather: Weather::HeavyRain,
                ..daily(1, 2, 1, 1)
            },
        ];
        let spec = FilterSpec {
            weathers: BTreeSet::from([Weather::Clear]),
            ..FilterSpec::default()
        };
        assert_eq!(spec.apply(&rows), Filtered::Empty);
    }

    #[test]
    fn filtering_is_idempotent() {
        let rows = table();
        let spec = FilterSpec {
            weathers: BTreeSet::from([Weather::Clear, Weather::Mist]),
            ..FilterSpec::default()
        };
        let once = spec.apply(&rows);
        let twice = spec.apply(once.rows().unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn source_table_is_not_mutated() {
        let rows = table();
        let before = rows.clone();
        let _ = FilterSpec {
            season: Some(Season::Winter),
            ..FilterSpec::default()
        }
        .apply(&rows);
        assert_eq!(rows, before);
    }
}
