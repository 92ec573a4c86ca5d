// View-mode bucketing, trend classification and chart statistics
use crate::domain::error::ValidationError;
use crate::domain::time_series::{local_time, millis_string};
use chrono::{Datelike, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Samples further than this many standard deviations from the mean are anomalies.
const ANOMALY_SIGMA: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
}

impl ViewMode {
    pub fn bucket_key(&self, dt: NaiveDateTime) -> String {
        let iso = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
        match self {
            ViewMode::Minute => iso[..16].to_string(),
            ViewMode::Hour => iso[..13].to_string(),
            ViewMode::Day => iso[..10].to_string(),
            ViewMode::Week => {
                let week_of_month = (dt.day() - 1) / 7 + 1;
                format!("{}-{:02}-W{}", dt.year(), dt.month(), week_of_month)
            }
        }
    }

    /// Percentage change between first and last quartile that counts as a trend.
    pub fn trend_threshold(&self) -> f64 {
        match self {
            ViewMode::Minute => 15.0,
            ViewMode::Hour => 12.0,
            _ => 10.0,
        }
    }
}

impl FromStr for ViewMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minute" => Ok(ViewMode::Minute),
            "hour" => Ok(ViewMode::Hour),
            "day" => Ok(ViewMode::Day),
            "week" => Ok(ViewMode::Week),
            other => Err(ValidationError::UnknownViewMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSample {
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub flow_rate: f64,
    pub loss: f64,
}

/// Label and value arrays aligned for the charting library.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartView {
    pub view_mode: ViewMode,
    pub labels: Vec<String>,
    pub flow_rate: Vec<f64>,
    pub loss: Vec<f64>,
    pub samples_per_bucket: Vec<usize>,
}

#[derive(Default)]
struct Bucket {
    flow_sum: f64,
    loss_sum: f64,
    count: usize,
}

pub fn aggregate(samples: &[ChartSample], mode: ViewMode, offset: FixedOffset) -> ChartView {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for sample in samples {
        let Some(dt) = local_time(sample.timestamp, offset) else {
            continue;
        };
        let bucket = buckets.entry(mode.bucket_key(dt)).or_default();
        bucket.flow_sum += sample.flow_rate;
        bucket.loss_sum += sample.loss;
        bucket.count += 1;
    }

    let mut view = ChartView {
        view_mode: mode,
        ..ChartView::default()
    };
    for (label, bucket) in buckets {
        let count = bucket.count as f64;
        view.labels.push(label);
        view.flow_rate.push(bucket.flow_sum / count);
        view.loss.push(bucket.loss_sum / count);
        view.samples_per_bucket.push(bucket.count);
    }
    view
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Compare the mean of the first and last quartile of `values`.
pub fn classify_trend(values: &[f64], mode: ViewMode) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let quartile = (values.len() / 4).max(1);
    let first = mean(&values[..quartile]);
    let last = mean(&values[values.len() - quartile..]);

    if first == 0.0 {
        return if last > 0.0 {
            Trend::Increasing
        } else {
            Trend::Stable
        };
    }

    let change = (last - first) / first.abs() * 100.0;
    let threshold = mode.trend_threshold();
    if change > threshold {
        Trend::Increasing
    } else if change < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anomaly {
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStatistics {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub std_dev: f64,
    pub peak_timestamp: Option<i64>,
    pub trend: Trend,
    pub anomalies: Vec<Anomaly>,
}

/// Summary numbers shown next to a chart, over `(timestamp, value)` pairs.
pub fn chart_statistics(points: &[(i64, f64)], mode: ViewMode) -> ChartStatistics {
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let count = values.len();
    let average = mean(&values);
    let std_dev = if count > 0 {
        (values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / count as f64).sqrt()
    } else {
        0.0
    };

    let peak = points
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1));

    let anomalies = if std_dev > 0.0 {
        points
            .iter()
            .filter(|(_, v)| (v - average).abs() > ANOMALY_SIGMA * std_dev)
            .map(|&(timestamp, value)| Anomaly { timestamp, value })
            .collect()
    } else {
        Vec::new()
    };

    ChartStatistics {
        count,
        average,
        min: values.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max: peak.map(|(_, v)| v).unwrap_or(0.0),
        total: values.iter().sum(),
        std_dev,
        peak_timestamp: peak.map(|(t, _)| t),
        trend: classify_trend(&values, mode),
        anomalies,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
