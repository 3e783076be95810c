use std::ops::RangeInclusive;

use serde::Serialize;

use crate::aggregate::monthly_series;
use crate::models::{HourGroup, HourGroupProfile, HourProfile, MonthlyAggregate, UserSeries};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthValue {
    pub month: u32,
    pub value: f64,
}

/// Month with the largest value; the earliest month wins ties.
pub fn argmax_month(series: &[(u32, f64)]) -> Option<MonthValue> {
    extreme(series, |candidate, best| candidate > best)
}

/// Month with the smallest value; the earliest month wins ties.
pub fn argmin_month(series: &[(u32, f64)]) -> Option<MonthValue> {
    extreme(series, |candidate, best| candidate < best)
}

fn extreme(series: &[(u32, f64)], better: impl Fn(f64, f64) -> bool) -> Option<MonthValue> {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|(month, _)| *month);

    let mut best: Option<MonthValue> = None;
    for (month, value) in sorted {
        match best {
            Some(current) if !better(value, current.value) => {}
            _ => best = Some(MonthValue { month, value }),
        }
    }
    best
}

/// Highest mean in an inclusive hour window, `None` if no hour there has data.
pub fn peak_hour_value(profile: &[HourProfile], hours: RangeInclusive<u8>) -> Option<HourProfile> {
    profile
        .iter()
        .filter(|entry| hours.contains(&entry.hour))
        .fold(None, |best: Option<&HourProfile>, entry| match best {
            Some(current) if entry.mean_total <= current.mean_total => Some(current),
            _ => Some(entry),
        })
        .cloned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareBasis {
    MeanCount,
    TotalCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupShare {
    pub group: HourGroup,
    pub percent: f64,
}

/// Each group's share of the combined measure, in percent. Returns an empty
/// list when the combined measure is zero.
pub fn proportion(groups: &[HourGroupProfile], basis: ShareBasis) -> Vec<GroupShare> {
    let measure = |profile: &HourGroupProfile| match basis {
        ShareBasis::MeanCount => profile.mean_total,
        ShareBasis::TotalCount => profile.total as f64,
    };
    let combined: f64 = groups.iter().map(measure).sum();
    if combined <= 0.0 {
        return Vec::new();
    }

    groups
        .iter()
        .map(|profile| GroupShare {
            group: profile.group,
            percent: measure(profile) / combined * 100.0,
        })
        .collect()
}

/// Headline numbers for one rider series across the months present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStatistics {
    pub series: UserSeries,
    pub monthly_mean: f64,
    pub highest: MonthValue,
    pub lowest: MonthValue,
    pub strongest_growth: Option<MonthValue>,
}

pub fn series_statistics(
    totals: &[MonthlyAggregate],
    series: UserSeries,
) -> Option<SeriesStatistics> {
    let values = monthly_series(totals, series);
    let highest = argmax_month(&values)?;
    let lowest = argmin_month(&values)?;
    let monthly_mean = values.iter().map(|(_, value)| value).sum::<f64>() / values.len() as f64;

    let growth: Vec<(u32, f64)> = totals
        .iter()
        .filter_map(|aggregate| {
            aggregate
                .growth(series)
                .percent()
                .map(|percent| (aggregate.month, percent))
        })
        .collect();

    Some(SeriesStatistics {
        series,
        monthly_mean,
        highest,
        lowest,
        strongest_growth: argmax_month(&growth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{daily, hourly};
    use crate::aggregate::{hourly_mean, monthly_user_totals};
    use crate::classify::group_characteristics;

    #[test]
    fn argmax_and_argmin_break_ties_by_earliest_month() {
        let series = [(3, 5.0), (1, 9.0), (2, 9.0), (4, 5.0)];
        assert_eq!(
            argmax_month(&series),
            Some(MonthValue {
                month: 1,
                value: 9.0
            })
        );
        assert_eq!(
            argmin_month(&series),
            Some(MonthValue {
                month: 3,
                value: 5.0
            })
        );
        assert_eq!(argmax_month(&[]), None);
    }

    #[test]
    fn peak_hour_respects_window() {
        let rows = vec![
            hourly(1, 7, 100),
            hourly(1, 8, 400),
            hourly(1, 12, 900),
            hourly(1, 17, 500),
        ];
        let profile = hourly_mean(&rows);

        let morning = peak_hour_value(&profile, 7..=9).unwrap();
        assert_eq!(morning.hour, 8);
        assert_eq!(morning.mean_total, 400.0);

        let evening = peak_hour_value(&profile, 16..=18).unwrap();
        assert_eq!(evening.hour, 17);
    }

    #[test]
    fn peak_hour_over_empty_window_is_undefined() {
        let profile = hourly_mean(&[hourly(1, 12, 50)]);
        assert_eq!(peak_hour_value(&profile, 7..=9), None);
    }

    #[test]
    fn proportions_sum_to_one_hundred() {
        let rows = vec![
            hourly(1, 8, 300),
            hourly(1, 17, 120),
            hourly(1, 2, 7),
            hourly(1, 13, 91),
        ];
        let groups = group_characteristics(&rows);

        for basis in [ShareBasis::MeanCount, ShareBasis::TotalCount] {
            let shares = proportion(&groups, basis);
            assert_eq!(shares.len(), 2);
            let sum: f64 = shares.iter().map(|share| share.percent).sum();
            assert!((sum - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn proportion_of_zero_usage_is_empty() {
        let groups = group_characteristics(&[hourly(1, 8, 0)]);
        assert!(proportion(&groups, ShareBasis::MeanCount).is_empty());
    }

    #[test]
    fn statistics_skip_undefined_growth() {
        let rows = vec![
            daily(1, 1, 0, 10),
            daily(1, 2, 40, 10),
            daily(1, 3, 60, 10),
        ];
        let totals = monthly_user_totals(&rows);
        let stats = series_statistics(&totals, UserSeries::Casual).unwrap();

        assert_eq!(stats.highest.month, 3);
        assert_eq!(stats.lowest.month, 1);
        assert!((stats.monthly_mean - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            stats.strongest_growth,
            Some(MonthValue {
                month: 3,
                value: 50.0
            })
        );
    }
}
