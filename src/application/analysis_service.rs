// Analysis service - Remote week/window analysis shaped for charts
use crate::application::analytics_api::{AnalysisPoint, AnalyticsApi, ReportArtifact};
use crate::application::error::ServiceError;
use crate::domain::aggregation::{
    ChartSample, ChartStatistics, ChartView, ViewMode, aggregate, chart_statistics,
};
use crate::domain::consumption::LossSummary;
use crate::domain::query::AnalysisQuery;
use chrono::FixedOffset;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub default_window_hours: u32,
    pub max_week_span: u32,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub query: AnalysisQuery,
    pub time_series: Vec<AnalysisPoint>,
    pub metadata: serde_json::Value,
    pub chart: ChartView,
    pub statistics: ChartStatistics,
    pub summary: LossSummary,
}

#[derive(Clone)]
pub struct AnalysisService {
    api: Arc<dyn AnalyticsApi>,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(api: Arc<dyn AnalyticsApi>, settings: AnalysisSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> AnalysisSettings {
        self.settings
    }

    pub async fn analysis_view(
        &self,
        query: AnalysisQuery,
        view_mode: ViewMode,
    ) -> Result<AnalysisView, ServiceError> {
        query.validate(self.settings.max_week_span)?;

        let response = self.api.fetch_analysis(&query).await?;
        tracing::debug!(
            "Analysis for place {} weeks {}-{}: {} points",
            query.place_id,
            query.start_week,
            query.end_week,
            response.time_series.len()
        );

        let samples: Vec<ChartSample> = response
            .time_series
            .iter()
            .map(|p| ChartSample {
                timestamp: p.timestamp,
                flow_rate: p.flow_rate,
                loss: p.rolling_min,
            })
            .collect();
        let chart = aggregate(&samples, view_mode, self.settings.offset);

        let flow: Vec<(i64, f64)> = samples.iter().map(|s| (s.timestamp, s.flow_rate)).collect();
        let statistics = chart_statistics(&flow, view_mode);

        let consumption: Vec<f64> = samples.iter().map(|s| s.flow_rate).collect();
        let loss: Vec<f64> = samples.iter().map(|s| s.loss).collect();
        let summary = LossSummary::compute(&consumption, &loss);

        Ok(AnalysisView {
            query,
            time_series: response.time_series,
            metadata: response.metadata,
            chart,
            statistics,
            summary,
        })
    }

    pub async fn report(&self, query: AnalysisQuery) -> Result<ReportArtifact, ServiceError> {
        query.validate(self.settings.max_week_span)?;
        Ok(self.api.fetch_report(&query).await?)
    }
}
