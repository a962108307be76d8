//! Per-entity sales series and the read-only series store

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Ordinal position on a uniform period grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period(pub i64);

impl Period {
    /// Raw ordinal
    pub fn index(self) -> i64 {
        self.0
    }

    /// Period `n` steps later (earlier for negative `n`)
    pub fn offset(self, n: i64) -> Period {
        Period(self.0 + n)
    }

    /// Signed number of steps from `other` to `self`
    pub fn since(self, other: Period) -> i64 {
        self.0 - other.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Half-open range of periods `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: Period,
    pub end: Period,
}

impl PeriodRange {
    /// Create a range, empty when `end <= start`
    pub fn new(start: Period, end: Period) -> Self {
        Self { start, end }
    }

    /// Number of periods covered
    pub fn len(&self) -> usize {
        self.end.since(self.start).max(0) as usize
    }

    /// Whether the range covers no period
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `period` lies inside the range
    pub fn contains(&self, period: Period) -> bool {
        self.start <= period && period < self.end
    }

    /// Whether two ranges share at least one period
    pub fn overlaps(&self, other: &PeriodRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this range
    pub fn covers(&self, other: &PeriodRange) -> bool {
        other.is_empty() || (self.start <= other.start && other.end <= self.end)
    }

    /// Iterate over the periods of the range
    pub fn periods(&self) -> impl Iterator<Item = Period> {
        (self.start.0..self.end.0.max(self.start.0)).map(Period)
    }
}

/// Calendar granularity of the period grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Daily data
    Daily,
    /// Weekly data (Monday-based weeks)
    Weekly,
    /// Monthly data
    #[default]
    Monthly,
}

impl Granularity {
    /// Seasonal cycle length conventionally used at this granularity
    pub fn default_seasonal_period(self) -> usize {
        match self {
            Granularity::Daily => 7,
            Granularity::Weekly => 52,
            Granularity::Monthly => 12,
        }
    }

    /// Map a calendar date to its period
    pub fn period_of(self, date: NaiveDate) -> Period {
        match self {
            Granularity::Daily => Period(date.num_days_from_ce() as i64),
            // day 1 of the proleptic calendar is a Monday
            Granularity::Weekly => Period((date.num_days_from_ce() as i64 - 1).div_euclid(7)),
            Granularity::Monthly => Period(date.year() as i64 * 12 + date.month0() as i64),
        }
    }

    /// First calendar day of a period
    pub fn start_date(self, period: Period) -> Option<NaiveDate> {
        match self {
            Granularity::Daily => NaiveDate::from_num_days_from_ce_opt(i32::try_from(period.0).ok()?),
            Granularity::Weekly => {
                NaiveDate::from_num_days_from_ce_opt(i32::try_from(period.0 * 7 + 1).ok()?)
            }
            Granularity::Monthly => {
                let year = i32::try_from(period.0.div_euclid(12)).ok()?;
                let month = period.0.rem_euclid(12) as u32 + 1;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }

    /// Parse a period label: a date (`YYYY-MM-DD`), a month (`YYYY-MM`, monthly
    /// grids only) or a raw integer ordinal
    pub fn parse_period(self, text: &str) -> Result<Period> {
        let text = text.trim();
        if let Ok(ordinal) = text.parse::<i64>() {
            return Ok(Period(ordinal));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(self.period_of(date));
        }
        if self == Granularity::Monthly {
            let date = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")?;
            return Ok(self.period_of(date));
        }
        Err(ForecastError::ParseError(format!(
            "Unrecognised period label '{}'",
            text
        )))
    }
}

/// One period of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    /// Units sold, `NaN` marks a missing observation
    pub volume: f64,
    /// Revenue for the period
    pub value: f64,
}

impl Observation {
    pub fn new(period: Period, volume: f64, value: f64) -> Self {
        Self {
            period,
            volume,
            value,
        }
    }
}

/// Immutable, gap-free sales series for one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    id: String,
    observations: Vec<Observation>,
}

impl Series {
    /// Create a series, rejecting unsorted, duplicated or gapped periods
    /// and negative volumes
    pub fn new(id: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let id = id.into();
        for pair in observations.windows(2) {
            let step = pair[1].period.since(pair[0].period);
            if step <= 0 {
                return Err(ForecastError::InputError(format!(
                    "Series '{}' has unsorted or duplicate period {}",
                    id, pair[1].period
                )));
            }
            if step > 1 {
                return Err(ForecastError::InputError(format!(
                    "Series '{}' has a gap between {} and {}",
                    id, pair[0].period, pair[1].period
                )));
            }
        }
        if let Some(bad) = observations.iter().find(|o| o.volume < 0.0) {
            return Err(ForecastError::InputError(format!(
                "Series '{}' has negative volume at {}",
                id, bad.period
            )));
        }
        Ok(Self { id, observations })
    }

    /// Create a series from consecutive volumes starting at `start`, no value data
    pub fn from_volumes(id: impl Into<String>, start: Period, volumes: &[f64]) -> Result<Self> {
        let observations = volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(start.offset(i as i64), v, 0.0))
            .collect();
        Self::new(id, observations)
    }

    /// Create a series from consecutive `(volume, value)` pairs starting at `start`
    pub fn from_records(
        id: impl Into<String>,
        start: Period,
        records: &[(f64, f64)],
    ) -> Result<Self> {
        let observations = records
            .iter()
            .enumerate()
            .map(|(i, &(volume, value))| Observation::new(start.offset(i as i64), volume, value))
            .collect();
        Self::new(id, observations)
    }

    /// Series identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All observations, ascending by period
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observation
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Volumes in period order
    pub fn volumes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.volume).collect()
    }

    /// Values in period order
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// First period, if any
    pub fn first_period(&self) -> Option<Period> {
        self.observations.first().map(|o| o.period)
    }

    /// Last period, if any
    pub fn last_period(&self) -> Option<Period> {
        self.observations.last().map(|o| o.period)
    }

    /// Range covered by the series
    pub fn span(&self) -> Option<PeriodRange> {
        Some(PeriodRange::new(
            self.first_period()?,
            self.last_period()?.offset(1),
        ))
    }

    /// Observation at `period`
    pub fn get(&self, period: Period) -> Option<&Observation> {
        let first = self.first_period()?;
        let idx = usize::try_from(period.since(first)).ok()?;
        self.observations.get(idx)
    }

    /// Observations inside `range`, clipped to the series span
    pub fn window(&self, range: &PeriodRange) -> &[Observation] {
        let Some(first) = self.first_period() else {
            return &[];
        };
        let n = self.observations.len() as i64;
        let start = range.start.since(first).clamp(0, n) as usize;
        let end = range.end.since(first).clamp(0, n) as usize;
        if start >= end {
            return &[];
        }
        &self.observations[start..end]
    }

    /// Volumes for every period of `range`; periods outside the series are zero
    pub fn volumes_in(&self, range: &PeriodRange) -> Vec<f64> {
        range
            .periods()
            .map(|p| {
                self.get(p)
                    .map(|o| o.volume)
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Total volume inside `range`, missing observations count as zero
    pub fn volume_in(&self, range: &PeriodRange) -> f64 {
        self.window(range)
            .iter()
            .map(|o| o.volume)
            .filter(|v| v.is_finite())
            .sum()
    }

    /// Total value inside `range`
    pub fn value_in(&self, range: &PeriodRange) -> f64 {
        self.window(range)
            .iter()
            .map(|o| o.value)
            .filter(|v| v.is_finite())
            .sum()
    }
}

/// Row of the long-format CSV accepted by [`SeriesStore::from_csv`]
#[derive(Debug, Deserialize)]
struct SeriesRecord {
    series_id: String,
    period: String,
    volume: f64,
    #[serde(default)]
    value: f64,
}

/// Read-only collection of series keyed by id
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    granularity: Granularity,
    series: BTreeMap<String, Series>,
}

impl SeriesStore {
    /// Create an empty store
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            series: BTreeMap::new(),
        }
    }

    /// Build a store from already validated series
    pub fn from_series(granularity: Granularity, series: Vec<Series>) -> Result<Self> {
        let mut store = Self::new(granularity);
        for s in series {
            store.insert(s)?;
        }
        Ok(store)
    }

    /// Load series from a CSV file with columns `series_id,period,volume[,value]`
    pub fn from_csv<P: AsRef<Path>>(path: P, granularity: Granularity) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, granularity)
    }

    /// Load series from any CSV reader
    pub fn from_reader<R: Read>(reader: R, granularity: Granularity) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut grouped: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        for record in csv_reader.deserialize() {
            let record: SeriesRecord = record?;
            let period = granularity.parse_period(&record.period)?;
            grouped
                .entry(record.series_id)
                .or_default()
                .push(Observation::new(period, record.volume, record.value));
        }

        let mut store = Self::new(granularity);
        for (id, mut observations) in grouped {
            observations.sort_by_key(|o| o.period);
            store.insert(Series::new(id, observations)?)?;
        }
        Ok(store)
    }

    /// Add a series, rejecting duplicate ids
    pub fn insert(&mut self, series: Series) -> Result<()> {
        if self.series.contains_key(series.id()) {
            return Err(ForecastError::InputError(format!(
                "Duplicate series id '{}'",
                series.id()
            )));
        }
        self.series.insert(series.id().to_string(), series);
        Ok(())
    }

    /// Look up a series
    pub fn get(&self, id: &str) -> Result<&Series> {
        self.series
            .get(id)
            .ok_or_else(|| ForecastError::InputError(format!("Unknown series id '{}'", id)))
    }

    /// Whether the store holds `id`
    pub fn contains(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    /// Series ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Series in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Period grid of the store
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Smallest range covering every series
    pub fn span(&self) -> Option<PeriodRange> {
        let start = self.series.values().filter_map(Series::first_period).min()?;
        let end = self.series.values().filter_map(Series::last_period).max()?;
        Some(PeriodRange::new(start, end.offset(1)))
    }
}
