use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{self, CountDistribution};
use crate::assess::{self, DatasetAssessment};
use crate::cache::DatasetCache;
use crate::classify;
use crate::error::DataError;
use crate::filter::{Filtered, FilterSpec};
use crate::loader::{DatasetSources, Tables};
use crate::metrics::{self, GroupShare, SeriesStatistics, ShareBasis};
use crate::models::{
    DailyRecord, HourGroupProfile, HourProfile, HourlyRecord, KeyedValue, MonthlyAggregate,
    Season, UserSeries, Weather,
};

pub const MORNING_PEAK: RangeInclusive<u8> = 7..=9;
pub const EVENING_PEAK: RangeInclusive<u8> = 16..=18;

/// One half of a view: computed values, or a marker that the filter left no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData,
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub season_totals: Vec<KeyedValue<Season>>,
    pub working_day_means: Vec<KeyedValue<bool>>,
    pub month_means: Vec<KeyedValue<u32>>,
    pub weather_means: Vec<KeyedValue<Weather>>,
    pub weekday_means: Vec<KeyedValue<u8>>,
    pub distribution: Option<CountDistribution>,
    pub temperature_correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyView {
    pub totals: Vec<MonthlyAggregate>,
    pub statistics: Vec<SeriesStatistics>,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub profile: Vec<HourProfile>,
    pub morning_peak: Option<HourProfile>,
    pub evening_peak: Option<HourProfile>,
    pub groups: Vec<HourGroupProfile>,
    pub shares: Vec<GroupShare>,
}

/// Everything a dashboard needs for one filter selection, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filter: FilterSpec,
    pub monthly: Section<MonthlyView>,
    pub hourly: Section<HourlyView>,
}

pub fn monthly_view(rows: &[DailyRecord]) -> MonthlyView {
    let totals = aggregate::monthly_user_totals(rows);
    let statistics = UserSeries::ALL
        .into_iter()
        .filter_map(|series| metrics::series_statistics(&totals, series))
        .collect();

    MonthlyView {
        statistics,
        breakdown: Breakdown {
            season_totals: aggregate::season_totals(rows),
            working_day_means: aggregate::working_day_means(rows),
            month_means: aggregate::month_means(rows),
            weather_means: aggregate::weather_means(rows),
            weekday_means: aggregate::weekday_means(rows),
            distribution: aggregate::count_distribution(rows),
            temperature_correlation: aggregate::temperature_correlation(rows),
        },
        totals,
    }
}

pub fn hourly_view(rows: &[HourlyRecord], basis: ShareBasis) -> HourlyView {
    let profile = aggregate::hourly_mean(rows);
    let groups = classify::group_characteristics(rows);

    HourlyView {
        morning_peak: metrics::peak_hour_value(&profile, MORNING_PEAK),
        evening_peak: metrics::peak_hour_value(&profile, EVENING_PEAK),
        shares: metrics::proportion(&groups, basis),
        profile,
        groups,
    }
}

pub fn build_view(tables: &Tables, filter: &FilterSpec, basis: ShareBasis) -> DashboardView {
    let monthly = match filter.apply(&tables.daily) {
        Filtered::Rows(rows) => Section::Ready(monthly_view(&rows)),
        Filtered::Empty => Section::NoData,
    };
    let hourly = match filter.apply(&tables.hourly) {
        Filtered::Rows(rows) => Section::Ready(hourly_view(&rows, basis)),
        Filtered::Empty => Section::NoData,
    };

    DashboardView {
        filter: filter.clone(),
        monthly,
        hourly,
    }
}

/// Composes loading, caching, filtering and aggregation for a caller such
/// as the CLI. Owns its cache; dropping it releases the parsed tables.
#[derive(Debug)]
pub struct Insights {
    sources: DatasetSources,
    cache: DatasetCache,
    basis: ShareBasis,
}

impl Insights {
    pub fn new(sources: DatasetSources) -> Self {
        Self {
            sources,
            cache: DatasetCache::new(),
            basis: ShareBasis::MeanCount,
        }
    }

    pub fn with_share_basis(mut self, basis: ShareBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn tables(&mut self) -> Result<Arc<Tables>, DataError> {
        self.cache.get_or_load(&self.sources)
    }

    pub fn view(&mut self, filter: &FilterSpec) -> Result<DashboardView, DataError> {
        let tables = self.tables()?;
        Ok(build_view(&tables, filter, self.basis))
    }

    pub fn assessment(&mut self) -> Result<DatasetAssessment, DataError> {
        let tables = self.tables()?;
        Ok(assess::assess(&tables.daily, &tables.hourly))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::aggregate::tests::{daily, hourly};
    use crate::loader::tests::{write_file, DAY_HEADER, HOUR_HEADER};
    use crate::models::HourGroup;

    fn tables() -> Tables {
        Tables {
            daily: vec![
                daily(1, 1, 100, 400),
                DailyRecord {
                    weather: Weather::Mist,
                    ..daily(1, 2, 150, 500)
                },
            ],
            hourly: vec![
                hourly(1, 8, 200),
                hourly(2, 8, 300),
                hourly(1, 17, 150),
                hourly(1, 3, 10),
            ],
        }
    }

    #[test]
    fn unfiltered_view_has_every_section() {
        let view = build_view(&tables(), &FilterSpec::default(), ShareBasis::MeanCount);

        let monthly = view.monthly.ready().unwrap();
        assert_eq!(monthly.totals.len(), 2);
        assert_eq!(monthly.statistics.len(), 2);
        assert_eq!(monthly.totals[1].casual_growth.percent(), Some(50.0));

        let hourly = view.hourly.ready().unwrap();
        assert_eq!(hourly.morning_peak.as_ref().map(|p| p.mean_total), Some(250.0));
        assert_eq!(hourly.evening_peak.as_ref().map(|p| p.hour), Some(17));
        assert_eq!(hourly.groups[0].group, HourGroup::Peak);
        assert_eq!(hourly.shares.len(), 2);
    }

    #[test]
    fn filter_with_no_match_marks_sections_empty() {
        let filter = FilterSpec {
            weathers: BTreeSet::from([Weather::HeavyRain]),
            ..FilterSpec::default()
        };
        let view = build_view(&tables(), &filter, ShareBasis::MeanCount);
        assert_eq!(view.monthly, Section::NoData);
        assert_eq!(view.hourly, Section::NoData);
    }

    #[test]
    fn filtered_month_disappears_from_view() {
        let filter = FilterSpec {
            weathers: BTreeSet::from([Weather::Clear]),
            ..FilterSpec::default()
        };
        let view = build_view(&tables(), &filter, ShareBasis::MeanCount);
        let months: Vec<u32> = view
            .monthly
            .ready()
            .unwrap()
            .totals
            .iter()
            .map(|t| t.month)
            .collect();
        assert_eq!(months, vec![1]);
    }

    #[test]
    fn insights_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let day = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &["1,2011-01-01,1,0,1,0,6,0,2,0.34,0.36,0.80,0.16,331,654,985"],
        );
        let hour = write_file(
            dir.path(),
            "hour.csv",
            HOUR_HEADER,
            &["1,2011-01-01,1,0,1,8,0,6,0,1,0.24,0.28,0.81,0,3,13,16"],
        );

        let mut insights = Insights::new(DatasetSources::with_overrides(Some(day), Some(hour)));
        let view = insights.view(&FilterSpec::default()).unwrap();
        assert_eq!(view.monthly.ready().unwrap().totals[0].casual, 331);
        assert!(insights.assessment().unwrap().is_clean());
    }

    #[test]
    fn view_serializes_to_json() {
        let view = build_view(&tables(), &FilterSpec::default(), ShareBasis::TotalCount);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["monthly"]["ready"]["totals"].is_array());
        assert_eq!(json["monthly"]["ready"]["totals"][0]["casual_growth"], "first_month");
    }
}
