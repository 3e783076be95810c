use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

/// The dataset stores temperature divided by this maximum (degrees Celsius).
pub const TEMP_SCALE_CELSIUS: f64 = 41.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
            Season::Winter => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        if let Ok(code) = value.parse::<u8>() {
            return Season::from_code(code)
                .ok_or_else(|| format!("season code {code} is not in 1..=4"));
        }
        Season::ALL
            .into_iter()
            .find(|season| season.label() == value)
            .ok_or_else(|| format!("unknown season '{value}'"))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two dataset years a record belongs to (`yr` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearIndex {
    First,
    Second,
}

impl YearIndex {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(YearIndex::First),
            1 => Some(YearIndex::Second),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            YearIndex::First => 0,
            YearIndex::Second => 1,
        }
    }

    pub fn calendar_year(self) -> i32 {
        match self {
            YearIndex::First => 2011,
            YearIndex::Second => 2012,
        }
    }
}

impl FromStr for YearIndex {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "0" | "2011" => Ok(YearIndex::First),
            "1" | "2012" => Ok(YearIndex::Second),
            other => Err(format!("unknown year '{other}', expected 0, 1, 2011 or 2012")),
        }
    }
}

impl fmt::Display for YearIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.calendar_year())
    }
}

/// Weather situation, ordered from best (1) to worst (4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Clear,
    Mist,
    LightRain,
    HeavyRain,
}

impl Weather {
    pub const ALL: [Weather; 4] = [
        Weather::Clear,
        Weather::Mist,
        Weather::LightRain,
        Weather::HeavyRain,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Weather::Clear),
            2 => Some(Weather::Mist),
            3 => Some(Weather::LightRain),
            4 => Some(Weather::HeavyRain),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Weather::Clear => 1,
            Weather::Mist => 2,
            Weather::LightRain => 3,
            Weather::HeavyRain => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Mist => "mist",
            Weather::LightRain => "light-rain",
            Weather::HeavyRain => "heavy-rain",
        }
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        if let Ok(code) = value.parse::<u8>() {
            return Weather::from_code(code)
                .ok_or_else(|| format!("weather code {code} is not in 1..=4"));
        }
        Weather::ALL
            .into_iter()
            .find(|weather| weather.label() == value)
            .ok_or_else(|| format!("unknown weather '{value}'"))
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dataset weekday code, 0 = Sunday through 6 = Saturday.
pub fn weekday_name(code: u8) -> &'static str {
    match code {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub season: Season,
    pub year: YearIndex,
    pub month: u32,
    pub holiday: bool,
    pub weekday: u8,
    pub working_day: bool,
    pub weather: Weather,
    pub temp: f64,
    pub casual: u32,
    pub registered: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub date: NaiveDate,
    pub season: Season,
    pub year: YearIndex,
    pub month: u32,
    pub hour: u8,
    pub holiday: bool,
    pub weekday: u8,
    pub working_day: bool,
    pub weather: Weather,
    pub temp: f64,
    pub casual: u32,
    pub registered: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSeries {
    Casual,
    Registered,
}

impl UserSeries {
    pub const ALL: [UserSeries; 2] = [UserSeries::Casual, UserSeries::Registered];

    pub fn label(self) -> &'static str {
        match self {
            UserSeries::Casual => "casual",
            UserSeries::Registered => "registered",
        }
    }
}

/// Percent change against the previous month present in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
    FirstMonth,
    NoBaseline,
    Percent(f64),
}

impl Growth {
    pub fn percent(self) -> Option<f64> {
        match self {
            Growth::Percent(value) => Some(value),
            Growth::FirstMonth | Growth::NoBaseline => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub month: u32,
    pub growth: Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: u32,
    pub casual: u64,
    pub registered: u64,
    pub casual_growth: Growth,
    pub registered_growth: Growth,
}

impl MonthlyAggregate {
    pub fn value(&self, series: UserSeries) -> u64 {
        match series {
            UserSeries::Casual => self.casual,
            UserSeries::Registered => self.registered,
        }
    }

    pub fn growth(&self, series: UserSeries) -> Growth {
        match series {
            UserSeries::Casual => self.casual_growth,
            UserSeries::Registered => self.registered_growth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourProfile {
    pub hour: u8,
    pub mean_total: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HourGroup {
    Peak,
    OffPeak,
}

impl HourGroup {
    pub const ALL: [HourGroup; 2] = [HourGroup::Peak, HourGroup::OffPeak];

    pub fn label(self) -> &'static str {
        match self {
            HourGroup::Peak => "peak",
            HourGroup::OffPeak => "off-peak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourGroupProfile {
    pub group: HourGroup,
    pub mean_weather: f64,
    pub mean_temp: f64,
    pub mean_temp_celsius: f64,
    pub modal_weekday: u8,
    pub mean_total: f64,
    pub total: u64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedValue<K> {
    pub key: K,
    pub value: f64,
}
