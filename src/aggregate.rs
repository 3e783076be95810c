use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{
    DailyRecord, Growth, GrowthPoint, HourProfile, HourlyRecord, KeyedValue, MonthlyAggregate,
    Season, UserSeries, Weather,
};

/// Sums casual and registered riders per month present in `rows`,
/// ascending by month number.
pub fn monthly_user_totals(rows: &[DailyRecord]) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = months.entry(row.month).or_insert((0, 0));
        entry.0 += u64::from(row.casual);
        entry.1 += u64::from(row.registered);
    }

    let casual: Vec<(u32, f64)> = months.iter().map(|(m, v)| (*m, v.0 as f64)).collect();
    let registered: Vec<(u32, f64)> = months.iter().map(|(m, v)| (*m, v.1 as f64)).collect();
    let casual_growth = month_over_month_growth(&casual);
    let registered_growth = month_over_month_growth(&registered);

    months
        .into_iter()
        .zip(casual_growth.into_iter().zip(registered_growth))
        .map(|((month, (casual, registered)), (cg, rg))| MonthlyAggregate {
            month,
            casual,
            registered,
            casual_growth: cg.growth,
            registered_growth: rg.growth,
        })
        .collect()
}

/// Projects one user series out of the monthly totals.
pub fn monthly_series(totals: &[MonthlyAggregate], series: UserSeries) -> Vec<(u32, f64)> {
    totals
        .iter()
        .map(|aggregate| (aggregate.month, aggregate.value(series) as f64))
        .collect()
}

/// Percent change of each month against the month before it in `series`.
/// `series` must be strictly ascending by month.
pub fn month_over_month_growth(series: &[(u32, f64)]) -> Vec<GrowthPoint> {
    debug_assert!(
        series.windows(2).all(|pair| pair[0].0 < pair[1].0),
        "growth series must be strictly ascending by month"
    );
    let mut points = Vec::with_capacity(series.len());
    let mut previous: Option<f64> = None;

    for &(month, value) in series {
        let growth = match previous {
            None => Growth::FirstMonth,
            Some(base) if base == 0.0 => Growth::NoBaseline,
            Some(base) => Growth::Percent((value - base) / base * 100.0),
        };
        points.push(GrowthPoint { month, growth });
        previous = Some(value);
    }

    points
}

/// Mean total count per hour of day. Hours without rows are omitted.
pub fn hourly_mean(rows: &[HourlyRecord]) -> Vec<HourProfile> {
    let mut hours: BTreeMap<u8, (u64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = hours.entry(row.hour).or_insert((0, 0));
        entry.0 += u64::from(row.total);
        entry.1 += 1;
    }

    hours
        .into_iter()
        .map(|(hour, (sum, count))| HourProfile {
            hour,
            mean_total: sum as f64 / count as f64,
            observations: count,
        })
        .collect()
}

fn grouped<R, K: Ord>(
    rows: &[R],
    key: impl Fn(&R) -> K,
    value: impl Fn(&R) -> f64,
) -> BTreeMap<K, (f64, usize)> {
    let mut groups = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(key(row)).or_insert((0.0, 0));
        entry.0 += value(row);
        entry.1 += 1;
    }
    groups
}

pub fn sum_by<R, K: Ord>(
    rows: &[R],
    key: impl Fn(&R) -> K,
    value: impl Fn(&R) -> f64,
) -> Vec<KeyedValue<K>> {
    grouped(rows, key, value)
        .into_iter()
        .map(|(key, (sum, _))| KeyedValue { key, value: sum })
        .collect()
}

pub fn mean_by<R, K: Ord>(
    rows: &[R],
    key: impl Fn(&R) -> K,
    value: impl Fn(&R) -> f64,
) -> Vec<KeyedValue<K>> {
    grouped(rows, key, value)
        .into_iter()
        .map(|(key, (sum, count))| KeyedValue {
            key,
            value: sum / count as f64,
        })
        .collect()
}

pub fn season_totals(rows: &[DailyRecord]) -> Vec<KeyedValue<Season>> {
    sum_by(rows, |row| row.season, |row| f64::from(row.total))
}

pub fn working_day_means(rows: &[DailyRecord]) -> Vec<KeyedValue<bool>> {
    mean_by(rows, |row| row.working_day, |row| f64::from(row.total))
}

pub fn month_means(rows: &[DailyRecord]) -> Vec<KeyedValue<u32>> {
    mean_by(rows, |row| row.month, |row| f64::from(row.total))
}

pub fn weather_means(rows: &[DailyRecord]) -> Vec<KeyedValue<Weather>> {
    mean_by(rows, |row| row.weather, |row| f64::from(row.total))
}

pub fn weekday_means(rows: &[DailyRecord]) -> Vec<KeyedValue<u8>> {
    mean_by(rows, |row| row.weekday, |row| f64::from(row.total))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountDistribution {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent for a single observation.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Descriptive statistics of the daily total count.
pub fn count_distribution(rows: &[DailyRecord]) -> Option<CountDistribution> {
    if rows.is_empty() {
        return None;
    }

    let mut values: Vec<f64> = rows.iter().map(|row| f64::from(row.total)).collect();
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    Some(CountDistribution {
        count,
        mean,
        std_dev,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Pearson correlation between normalized temperature and total count.
pub fn temperature_correlation(rows: &[DailyRecord]) -> Option<f64> {
    if rows.len() < 2 {
        return None;
    }

    let n = rows.len() as f64;
    let mean_t = rows.iter().map(|row| row.temp).sum::<f64>() / n;
    let mean_c = rows.iter().map(|row| f64::from(row.total)).sum::<f64>() / n;

    let (mut cov, mut var_t, mut var_c) = (0.0, 0.0, 0.0);
    for row in rows {
        let dt = row.temp - mean_t;
        let dc = f64::from(row.total) - mean_c;
        cov += dt * dc;
        var_t += dt * dt;
        var_c += dc * dc;
    }

    if var_t == 0.0 || var_c == 0.0 {
        return None;
    }
    Some(cov / (var_t.sqrt() * var_c.sqrt()))
}
