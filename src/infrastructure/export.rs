// CSV and JSON downloads built from in-memory data
use crate::application::loss_service::LossAnalysis;
use crate::domain::time_series::{TimeSeries, local_time};
use anyhow::{Context, Result};
use chrono::FixedOffset;

fn readable(millis: i64, offset: FixedOffset) -> String {
    local_time(millis, offset)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn series_csv(series: &TimeSeries, offset: FixedOffset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["timestamp", "fecha", "valor", "unidad"])?;
    for point in &series.points {
        writer.write_record(&[
            point.timestamp.to_string(),
            readable(point.timestamp, offset),
            point.value.to_string(),
            point.unit.clone(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))
}

pub fn analysis_csv(analysis: &LossAnalysis, offset: FixedOffset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["timestamp", "fecha", "consumo", "perdida"])?;
    for (increment, loss) in analysis.increments.iter().zip(&analysis.loss_series) {
        writer.write_record(&[
            increment.timestamp.to_string(),
            readable(increment.timestamp, offset),
            format!("{:.4}", increment.value),
            format!("{:.4}", loss),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))
}

pub fn series_json(series: &TimeSeries) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(series).context("Failed to serialize series")
}
