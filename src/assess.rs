use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::models::{DailyRecord, HourlyRecord};

/// Shape and consistency report for a freshly loaded pair of tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetAssessment {
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub duplicate_dates: Vec<NaiveDate>,
    pub duplicate_hours: Vec<(NaiveDate, u8)>,
    pub missing_dates: Vec<NaiveDate>,
    /// Days with fewer than 24 hourly rows.
    pub incomplete_days: usize,
    /// Days whose hourly counts add up to more than the daily total.
    pub hourly_exceeds_daily: Vec<NaiveDate>,
}

impl DatasetAssessment {
    pub fn is_clean(&self) -> bool {
        self.duplicate_dates.is_empty()
            && self.duplicate_hours.is_empty()
            && self.missing_dates.is_empty()
            && self.hourly_exceeds_daily.is_empty()
    }
}

pub fn assess(daily: &[DailyRecord], hourly: &[HourlyRecord]) -> DatasetAssessment {
    let mut seen = BTreeSet::new();
    let mut duplicate_dates = Vec::new();
    let mut daily_totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in daily {
        if !seen.insert(row.date) {
            duplicate_dates.push(row.date);
        }
        *daily_totals.entry(row.date).or_default() += u64::from(row.total);
    }

    let first_date = seen.first().copied();
    let last_date = seen.last().copied();
    let missing_dates = match (first_date, last_date) {
        (Some(first), Some(last)) => first
            .iter_days()
            .take_while(|day| *day <= last)
            .filter(|day| !seen.contains(day))
            .collect(),
        _ => Vec::new(),
    };

    let mut seen_hours = BTreeSet::new();
    let mut duplicate_hours = Vec::new();
    let mut hourly_totals: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();
    for row in hourly {
        if !seen_hours.insert((row.date, row.hour)) {
            duplicate_hours.push((row.date, row.hour));
        }
        let entry = hourly_totals.entry(row.date).or_default();
        entry.0 += u64::from(row.total);
        entry.1 += 1;
    }

    let incomplete_days = hourly_totals
        .values()
        .filter(|(_, rows)| *rows < 24)
        .count();
    let hourly_exceeds_daily = hourly_totals
        .iter()
        .filter(|(date, (sum, _))| daily_totals.get(*date).is_some_and(|total| sum > total))
        .map(|(date, _)| *date)
        .collect();

    let assessment = DatasetAssessment {
        daily_rows: daily.len(),
        hourly_rows: hourly.len(),
        first_date,
        last_date,
        duplicate_dates,
        duplicate_hours,
        missing_dates,
        incomplete_days,
        hourly_exceeds_daily,
    };

    if !assessment.is_clean() {
        warn!(
            duplicate_dates = assessment.duplicate_dates.len(),
            duplicate_hours = assessment.duplicate_hours.len(),
            missing_dates = assessment.missing_dates.len(),
            hourly_exceeds_daily = assessment.hourly_exceeds_daily.len(),
            "dataset inconsistencies found"
        );
    }

    assessment
}
