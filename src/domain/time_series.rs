// Time series domain model
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Days between the spreadsheet epoch (1899-12-30) and the Unix epoch.
const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: i64, value: f64, unit: impl Into<String>) -> Self {
        Self {
            timestamp,
            value,
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub total_records: usize,
    pub min_date: Option<i64>,
    pub max_date: Option<i64>,
    #[serde(default)]
    pub skipped_rows: usize,
}

/// A loaded series. Replaced wholesale on every upload or fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub metadata: SeriesMetadata,
}

impl TimeSeries {
    pub fn new(mut points: Vec<TimeSeriesPoint>, skipped_rows: usize) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let metadata = SeriesMetadata {
            total_records: points.len(),
            min_date: points.first().map(|p| p.timestamp),
            max_date: points.last().map(|p| p.timestamp),
            skipped_rows,
        };
        Self { points, metadata }
    }

    /// Points inside the inclusive `[from, to]` range. Open bounds when `None`.
    pub fn within(&self, from: Option<i64>, to: Option<i64>) -> Vec<TimeSeriesPoint> {
        self.points
            .iter()
            .filter(|p| from.is_none_or(|f| p.timestamp >= f))
            .filter(|p| to.is_none_or(|t| p.timestamp <= t))
            .cloned()
            .collect()
    }
}

/// Convert a spreadsheet date serial (days since 1899-12-30) to epoch millis.
pub fn spreadsheet_serial_to_millis(serial: f64) -> i64 {
    ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64
}

/// Parse a textual timestamp: epoch millis, RFC 3339, or a handful of
/// common naive layouts (interpreted as UTC).
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(millis) = text.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    // Backends that drop the offset but keep fractional seconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

/// Wall-clock time of `millis` at the given offset.
pub fn local_time(millis: i64, offset: FixedOffset) -> Option<NaiveDateTime> {
    let utc = Utc.timestamp_millis_opt(millis).single()?;
    Some(utc.with_timezone(&offset).naive_local())
}

/// Serialize epoch millis as a string; accept strings or numbers back.
pub mod millis_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(millis: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(millis) => Ok(millis),
            Raw::Float(millis) => Ok(millis as i64),
            Raw::Text(text) => super::parse_timestamp(&text)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}"))),
        }
    }
}
