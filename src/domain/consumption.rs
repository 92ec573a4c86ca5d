// Consumption derivation and water-loss estimation
use crate::domain::error::ValidationError;
use crate::domain::time_series::{TimeSeriesPoint, local_time, millis_string};
use chrono::{FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MIN_WINDOW_HOURS: u32 = 1;
pub const MAX_WINDOW_HOURS: u32 = 720;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedIncrement {
    pub value: f64,
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub label: String,
}

/// Turn cumulative meter readings into per-interval consumption.
///
/// Every reading lower than its predecessor is dropped. The first reading
/// after such a drop is counted from zero, as the meter has been reset.
pub fn derive_increments(points: &[TimeSeriesPoint], offset: FixedOffset) -> Vec<DerivedIncrement> {
    let mut increments = Vec::with_capacity(points.len().saturating_sub(1));
    let Some(first) = points.first() else {
        return increments;
    };

    let mut previous = first.value;
    let mut after_reset = false;
    for point in &points[1..] {
        if point.value < previous {
            previous = point.value;
            after_reset = true;
            continue;
        }
        let value = if after_reset {
            point.value
        } else {
            point.value - previous
        };
        increments.push(DerivedIncrement {
            value,
            timestamp: point.timestamp,
            label: increment_label(point.timestamp, offset),
        });
        previous = point.value;
        after_reset = false;
    }

    increments
}

fn increment_label(millis: i64, offset: FixedOffset) -> String {
    local_time(millis, offset)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub fn validate_window(window_hours: u32) -> Result<(), ValidationError> {
    if !(MIN_WINDOW_HOURS..=MAX_WINDOW_HOURS).contains(&window_hours) {
        return Err(ValidationError::WindowOutOfRange {
            min: MIN_WINDOW_HOURS,
            max: MAX_WINDOW_HOURS,
        });
    }
    Ok(())
}

/// Baseline loss: every index carries the largest minimum among the full
/// windows that contain it, floored at zero.
///
/// Windows start at `0..=n - window`. A series shorter than the window has
/// no full window and stays at zero.
pub fn rolling_loss(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![0.0; n];
    if window == 0 || window > n {
        return result;
    }

    let minima = sliding_minima(values, window);
    let last_start = n - window;

    // Sliding maximum over the window minima whose window contains j.
    let mut candidates: VecDeque<usize> = VecDeque::new();
    let mut next_start = 0;
    for (j, slot) in result.iter_mut().enumerate() {
        while next_start <= last_start && next_start <= j {
            while candidates
                .back()
                .is_some_and(|&s| minima[s] <= minima[next_start])
            {
                candidates.pop_back();
            }
            candidates.push_back(next_start);
            next_start += 1;
        }
        while candidates.front().is_some_and(|&s| s + window <= j) {
            candidates.pop_front();
        }
        if let Some(&s) = candidates.front() {
            *slot = minima[s].max(0.0);
        }
    }

    result
}

/// Minimum of each window `values[s..s + window]`.
fn sliding_minima(values: &[f64], window: usize) -> Vec<f64> {
    let mut minima = Vec::with_capacity(values.len() + 1 - window);
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for (i, &value) in values.iter().enumerate() {
        while candidates.back().is_some_and(|&k| values[k] >= value) {
            candidates.pop_back();
        }
        candidates.push_back(i);
        while candidates.front().is_some_and(|&k| k + window <= i) {
            candidates.pop_front();
        }
        if i + 1 >= window {
            if let Some(&k) = candidates.front() {
                minima.push(values[k]);
            }
        }
    }

    minima
}

/// Hours `[start_hour, end_hour)`, wrapping past midnight when start > end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl NightWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, ValidationError> {
        if start_hour > 23 || end_hour > 23 {
            return Err(ValidationError::NightHourOutOfRange);
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Attribute consumption to loss only inside the night window.
pub fn night_loss(
    increments: &[DerivedIncrement],
    night: NightWindow,
    offset: FixedOffset,
) -> Vec<f64> {
    increments
        .iter()
        .map(|inc| {
            let hour = local_time(inc.timestamp, offset).map(|dt| dt.hour());
            match hour {
                Some(h) if night.contains(h) => inc.value,
                _ => 0.0,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LossMode {
    Rolling { window_hours: u32 },
    Night { start_hour: u32, end_hour: u32 },
}

impl LossMode {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            LossMode::Rolling { window_hours } => validate_window(window_hours),
            LossMode::Night {
                start_hour,
                end_hour,
            } => NightWindow::new(start_hour, end_hour).map(|_| ()),
        }
    }

    pub fn loss_series(&self, increments: &[DerivedIncrement], offset: FixedOffset) -> Vec<f64> {
        match *self {
            LossMode::Rolling { window_hours } => {
                let values: Vec<f64> = increments.iter().map(|i| i.value).collect();
                rolling_loss(&values, window_hours as usize)
            }
            LossMode::Night {
                start_hour,
                end_hour,
            } => night_loss(
                increments,
                NightWindow {
                    start_hour,
                    end_hour,
                },
                offset,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossSummary {
    pub total_consumption: f64,
    pub total_loss: f64,
    pub loss_percentage: f64,
    pub efficiency: f64,
}

impl LossSummary {
    pub fn compute(consumption: &[f64], loss: &[f64]) -> Self {
        let total_consumption: f64 = consumption.iter().sum();
        let raw_loss: f64 = loss.iter().sum();
        let total_loss = raw_loss.min(total_consumption).max(0.0);
        let loss_percentage = if total_consumption > 0.0 {
            total_loss / total_consumption * 100.0
        } else {
            0.0
        };

        Self {
            total_consumption,
            total_loss,
            loss_percentage,
            efficiency: 100.0 - loss_percentage,
        }
    }
}
