use std::collections::BTreeMap;

use crate::models::{HourGroup, HourGroupProfile, HourlyRecord, TEMP_SCALE_CELSIUS};

/// Commute windows: 07:00-09:59 and 16:00-18:59.
pub fn classify_hour(hour: u8) -> HourGroup {
    match hour {
        7..=9 | 16..=18 => HourGroup::Peak,
        _ => HourGroup::OffPeak,
    }
}

#[derive(Default)]
struct Accumulator {
    weather: u64,
    temp: f64,
    total: u64,
    weekdays: [usize; 7],
    count: usize,
}

/// Per-group means over the hourly records. Groups with no records are omitted.
pub fn group_characteristics(rows: &[HourlyRecord]) -> Vec<HourGroupProfile> {
    let mut groups: BTreeMap<HourGroup, Accumulator> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry(classify_hour(row.hour)).or_default();
        acc.weather += u64::from(row.weather.code());
        acc.temp += row.temp;
        acc.total += u64::from(row.total);
        acc.weekdays[usize::from(row.weekday.min(6))] += 1;
        acc.count += 1;
    }

    groups
        .into_iter()
        .map(|(group, acc)| {
            let n = acc.count as f64;
            let mean_temp = acc.temp / n;
            HourGroupProfile {
                group,
                mean_weather: acc.weather as f64 / n,
                mean_temp,
                mean_temp_celsius: mean_temp * TEMP_SCALE_CELSIUS,
                modal_weekday: modal_weekday(&acc.weekdays),
                mean_total: acc.total as f64 / n,
                total: acc.total,
                observations: acc.count,
            }
        })
        .collect()
}

// Lowest weekday code wins ties.
fn modal_weekday(counts: &[usize; 7]) -> u8 {
    let mut best = 0;
    for (weekday, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = weekday;
        }
    }
    best as u8
}
