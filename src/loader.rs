use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::DataError;
use crate::models::{DailyRecord, HourlyRecord, Season, Weather, YearIndex};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Candidate locations for the two tables, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSources {
    pub daily: Vec<PathBuf>,
    pub hourly: Vec<PathBuf>,
}

impl Default for DatasetSources {
    fn default() -> Self {
        Self {
            daily: vec![PathBuf::from("data/day.csv"), PathBuf::from("../data/day.csv")],
            hourly: vec![PathBuf::from("data/hour.csv"), PathBuf::from("../data/hour.csv")],
        }
    }
}

impl DatasetSources {
    /// Explicit paths replace the default candidates for that table.
    pub fn with_overrides(daily: Option<PathBuf>, hourly: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            daily: daily.map(|path| vec![path]).unwrap_or(defaults.daily),
            hourly: hourly.map(|path| vec![path]).unwrap_or(defaults.hourly),
        }
    }

    pub fn resolve(&self) -> Result<(PathBuf, PathBuf), DataError> {
        Ok((
            resolve("daily", &self.daily)?,
            resolve("hourly", &self.hourly)?,
        ))
    }
}

/// Both parsed tables. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub daily: Vec<DailyRecord>,
    pub hourly: Vec<HourlyRecord>,
}

pub fn resolve(dataset: &'static str, candidates: &[PathBuf]) -> Result<PathBuf, DataError> {
    for candidate in candidates {
        if !candidate.is_file() {
            debug!(dataset, path = %candidate.display(), "dataset candidate missing");
            continue;
        }
        match File::open(candidate) {
            Ok(_) => {
                debug!(dataset, path = %candidate.display(), "dataset resolved");
                return Ok(candidate.clone());
            }
            Err(err) => {
                warn!(
                    dataset,
                    path = %candidate.display(),
                    error = %err,
                    "dataset candidate unreadable"
                );
            }
        }
    }

    Err(DataError::DataUnavailable {
        dataset,
        candidates: candidates.to_vec(),
    })
}

pub fn load_tables(daily_path: &Path, hourly_path: &Path) -> Result<Tables, DataError> {
    let daily = load_daily(daily_path)?;
    let hourly = load_hourly(hourly_path)?;
    info!(
        daily_rows = daily.len(),
        hourly_rows = hourly.len(),
        "datasets loaded"
    );
    Ok(Tables { daily, hourly })
}

pub fn load_daily(path: &Path) -> Result<Vec<DailyRecord>, DataError> {
    read_rows::<RawDailyRow, _>(path, RawDailyRow::into_record)
}

pub fn load_hourly(path: &Path) -> Result<Vec<HourlyRecord>, DataError> {
    read_rows::<RawHourlyRow, _>(path, RawHourlyRow::into_record)
}

fn read_rows<R, T>(path: &Path, convert: fn(R) -> Result<T, String>) -> Result<Vec<T>, DataError>
where
    R: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| csv_error(path, source))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let raw: R = record
            .deserialize(Some(&headers))
            .map_err(|err| malformed(path, line, err.to_string()))?;
        rows.push(convert(raw).map_err(|reason| malformed(path, line, reason))?);
    }

    debug!(path = %path.display(), rows = rows.len(), "table parsed");
    Ok(rows)
}

fn malformed(path: &Path, line: u64, reason: String) -> DataError {
    DataError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> DataError {
    match source.position().map(|pos| pos.line()) {
        Some(line) => malformed(path, line, source.to_string()),
        None => DataError::Csv {
            path: path.to_path_buf(),
            source,
        },
    }
}

// `instant` is not declared, so the index column never leaves the loader.
#[derive(Debug, Deserialize)]
struct RawDailyRow {
    dteday: String,
    season: u8,
    yr: u8,
    mnth: u32,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
    casual: u32,
    registered: u32,
    cnt: u32,
}

#[derive(Debug, Deserialize)]
struct RawHourlyRow {
    dteday: String,
    season: u8,
    yr: u8,
    mnth: u32,
    hr: u8,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
    casual: u32,
    registered: u32,
    cnt: u32,
}

struct Common {
    date: NaiveDate,
    season: Season,
    year: YearIndex,
    month: u32,
    holiday: bool,
    weekday: u8,
    working_day: bool,
    weather: Weather,
    temp: f64,
}

struct RawCommon<'a> {
    dteday: &'a str,
    season: u8,
    yr: u8,
    mnth: u32,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
}

impl RawCommon<'_> {
    fn validate(self) -> Result<Common, String> {
        let date = NaiveDate::parse_from_str(self.dteday, DATE_FORMAT)
            .map_err(|err| format!("unparseable date '{}': {err}", self.dteday))?;
        let season = Season::from_code(self.season)
            .ok_or_else(|| format!("season code {} is not in 1..=4", self.season))?;
        let year = YearIndex::from_code(self.yr)
            .ok_or_else(|| format!("year index {} is not 0 or 1", self.yr))?;
        if !(1..=12).contains(&self.mnth) {
            return Err(format!("month {} is not in 1..=12", self.mnth));
        }
        if self.mnth != date.month() {
            return Err(format!("month {} does not match date {date}", self.mnth));
        }
        if self.weekday > 6 {
            return Err(format!("weekday {} is not in 0..=6", self.weekday));
        }
        let weather = Weather::from_code(self.weathersit)
            .ok_or_else(|| format!("weather situation {} is not in 1..=4", self.weathersit))?;
        if !self.temp.is_finite() {
            return Err(format!("temperature {} is not a finite number", self.temp));
        }

        Ok(Common {
            date,
            season,
            year,
            month: self.mnth,
            holiday: flag("holiday", self.holiday)?,
            weekday: self.weekday,
            working_day: flag("workingday", self.workingday)?,
            weather,
            temp: self.temp,
        })
    }
}

fn flag(column: &str, value: u8) -> Result<bool, String> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(format!("{column} flag {other} is not 0 or 1")),
    }
}

fn check_total(casual: u32, registered: u32, cnt: u32) -> Result<(), String> {
    if u64::from(casual) + u64::from(registered) != u64::from(cnt) {
        return Err(format!("cnt {cnt} is not casual {casual} + registered {registered}"));
    }
    Ok(())
}

impl RawDailyRow {
    fn into_record(self) -> Result<DailyRecord, String> {
        let common = RawCommon {
            dteday: &self.dteday,
            season: self.season,
            yr: self.yr,
            mnth: self.mnth,
            holiday: self.holiday,
            weekday: self.weekday,
            workingday: self.workingday,
            weathersit: self.weathersit,
            temp: self.temp,
        }
        .validate()?;
        check_total(self.casual, self.registered, self.cnt)?;

        Ok(DailyRecord {
            date: common.date,
            season: common.season,
            year: common.year,
            month: common.month,
            holiday: common.holiday,
            weekday: common.weekday,
            working_day: common.working_day,
            weather: common.weather,
            temp: common.temp,
            casual: self.casual,
            registered: self.registered,
            total: self.cnt,
        })
    }
}

impl RawHourlyRow {
    fn into_record(self) -> Result<HourlyRecord, String> {
        let common = RawCommon {
            dteday: &self.dteday,
            season: self.season,
            yr: self.yr,
            mnth: self.mnth,
            holiday: self.holiday,
            weekday: self.weekday,
            workingday: self.workingday,
            weathersit: self.weathersit,
            temp: self.temp,
        }
        .validate()?;
        if self.hr > 23 {
            return Err(format!("hour {} is not in 0..=23", self.hr));
        }
        check_total(self.casual, self.registered, self.cnt)?;

        Ok(HourlyRecord {
            date: common.date,
            season: common.season,
            year: common.year,
            month: common.month,
            hour: self.hr,
            holiday: common.holiday,
            weekday: common.weekday,
            working_day: common.working_day,
            weather: common.weather,
            temp: common.temp,
            casual: self.casual,
            registered: self.registered,
            total: self.cnt,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const DAY_HEADER: &str =
        "instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt";
    pub const HOUR_HEADER: &str =
        "instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt";

    pub fn write_file(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut body = format!("{header}\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_daily_rows_without_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &[
                "1,2011-01-01,1,0,1,0,6,0,2,0.344167,0.363625,0.805833,0.160446,331,654,985",
                "2,2011-01-02,1,0,1,0,0,0,2,0.363478,0.353739,0.696087,0.248539,131,670,801",
            ],
        );

        let rows = load_daily(&path).unwrap();
        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(first.season, Season::Spring);
        assert_eq!(first.year, YearIndex::First);
        assert_eq!(first.weekday, 6);
        assert!(!first.working_day);
        assert_eq!(first.weather, Weather::Mist);
        assert_eq!(first.total, 985);
    }

    #[test]
    fn loads_hourly_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "hour.csv",
            HOUR_HEADER,
            &["1,2011-01-01,1,0,1,8,0,6,0,1,0.24,0.2879,0.81,0,3,13,16"],
        );

        let rows = load_hourly(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hour, 8);
        assert_eq!(rows[0].total, 16);
    }

    #[test]
    fn unparseable_date_is_fatal_and_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &[
                "1,2011-01-01,1,0,1,0,6,0,2,0.34,0.36,0.80,0.16,331,654,985",
                "2,not-a-date,1,0,1,0,0,0,2,0.36,0.35,0.69,0.24,131,670,801",
            ],
        );

        match load_daily(&path) {
            Err(DataError::MalformedRecord { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("not-a-date"));
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &["1,2011-01-01,1,0,1,0,6,0,2,0.34,0.36,0.80,0.16,many,654,985"],
        );

        assert!(matches!(
            load_daily(&path),
            Err(DataError::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn total_must_equal_user_sum() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &["1,2011-01-01,1,0,1,0,6,0,2,0.34,0.36,0.80,0.16,331,654,900"],
        );

        assert!(matches!(
            load_daily(&path),
            Err(DataError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "day.csv",
            DAY_HEADER,
            &["1,2011-01-01,5,0,1,0,6,0,2,0.34,0.36,0.80,0.16,331,654,985"],
        );

        match load_daily(&path) {
            Err(DataError::MalformedRecord { reason, .. }) => assert!(reason.contains("season")),
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn resolve_falls_back_to_second_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let present = write_file(dir.path(), "day.csv", DAY_HEADER, &[]);
        let missing = dir.path().join("missing.csv");

        let resolved = resolve("daily", &[missing, present.clone()]).unwrap();
        assert_eq!(resolved, present);
    }

    #[cfg(unix)]
    #[test]
    fn resolve_skips_unreadable_candidate() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = write_file(dir.path(), "a.csv", DAY_HEADER, &[]);
        let readable = write_file(dir.path(), "b.csv", DAY_HEADER, &[]);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not bind a privileged user.
        if File::open(&locked).is_ok() {
            return;
        }

        let resolved = resolve("daily", &[locked.clone(), readable.clone()]).unwrap();
        assert_eq!(resolved, readable);

        match resolve("daily", &[locked.clone()]) {
            Err(DataError::DataUnavailable { candidates, .. }) => {
                assert_eq!(candidates, vec![locked]);
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn resolve_reports_all_candidates_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![dir.path().join("a.csv"), dir.path().join("b.csv")];

        match resolve("hourly", &candidates) {
            Err(DataError::DataUnavailable {
                dataset,
                candidates: tried,
            }) => {
                assert_eq!(dataset, "hourly");
                assert_eq!(tried, candidates);
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_default_candidates() {
        let sources = DatasetSources::with_overrides(Some(PathBuf::from("x/day.csv")), None);
        assert_eq!(sources.daily, vec![PathBuf::from("x/day.csv")]);
        assert_eq!(sources.hourly, DatasetSources::default().hourly);
    }
}
