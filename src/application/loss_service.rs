// Loss service - Water-loss analysis over a locally loaded series
use crate::application::error::ServiceError;
use crate::domain::aggregation::{
    ChartSample, ChartStatistics, ChartView, ViewMode, aggregate, chart_statistics,
};
use crate::domain::consumption::{DerivedIncrement, LossMode, LossSummary, derive_increments};
use crate::domain::error::ValidationError;
use crate::domain::time_series::{TimeSeries, TimeSeriesPoint};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LossRequest {
    pub points: Vec<TimeSeriesPoint>,
    #[serde(default)]
    pub loss: Option<LossMode>,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LossAnalysis {
    pub mode: LossMode,
    pub increments: Vec<DerivedIncrement>,
    pub loss_series: Vec<f64>,
    pub summary: LossSummary,
    pub chart: ChartView,
    pub statistics: ChartStatistics,
}

#[derive(Debug, Clone, Copy)]
pub struct LossSettings {
    pub default_window_hours: u32,
    pub offset: FixedOffset,
}

#[derive(Clone)]
pub struct LossService {
    settings: LossSettings,
}

impl LossService {
    pub fn new(settings: LossSettings) -> Self {
        Self { settings }
    }

    /// Derive increments and loss for the requested range. Nothing is kept
    /// between calls; a new range or window recomputes from the points.
    pub fn analyze(&self, request: LossRequest) -> Result<LossAnalysis, ServiceError> {
        let mode = request.loss.unwrap_or(LossMode::Rolling {
            window_hours: self.settings.default_window_hours,
        });
        mode.validate()?;

        let series = TimeSeries::new(request.points, 0);
        let points = series.within(request.from, request.to);
        if points.len() < 2 {
            return Err(ValidationError::EmptySeries.into());
        }

        let offset = self.settings.offset;
        let increments = derive_increments(&points, offset);
        let loss_series = mode.loss_series(&increments, offset);

        let consumption: Vec<f64> = increments.iter().map(|i| i.value).collect();
        let summary = LossSummary::compute(&consumption, &loss_series);

        let samples: Vec<ChartSample> = increments
            .iter()
            .zip(&loss_series)
            .map(|(inc, loss)| ChartSample {
                timestamp: inc.timestamp,
                flow_rate: inc.value,
                loss: *loss,
            })
            .collect();
        let chart = aggregate(&samples, request.view_mode, offset);
        let pairs: Vec<(i64, f64)> = increments.iter().map(|i| (i.timestamp, i.value)).collect();
        let statistics = chart_statistics(&pairs, request.view_mode);

        tracing::debug!(
            "Analyzed {} increments ({:?}): loss {:.2} of {:.2}",
            increments.len(),
            mode,
            summary.total_loss,
            summary.total_consumption
        );

        Ok(LossAnalysis {
            mode,
            increments,
            loss_series,
            summary,
            chart,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LossService {
        LossService::new(LossSettings {
            default_window_hours: 2,
            offset: FixedOffset::east_opt(0).unwrap(),
        })
    }

    fn cumulative(values: &[f64]) -> Vec<TimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(i as i64 * 3_600_000, *v, "m3"))
            .collect()
    }

    fn request(points: Vec<TimeSeriesPoint>, loss: Option<LossMode>) -> LossRequest {
        LossRequest {
            points,
            loss,
            view_mode: ViewMode::Hour,
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_rolling_analysis_with_default_window() {
        // increments: 2, 3, 1, 4
        let analysis = service()
            .analyze(request(cumulative(&[0.0, 2.0, 5.0, 6.0, 10.0]), None))
            .unwrap();

        assert_eq!(analysis.mode, LossMode::Rolling { window_hours: 2 });
        // windows [2,3]=2 [3,1]=1 [1,4]=1
        assert_eq!(analysis.loss_series, vec![2.0, 2.0, 1.0, 1.0]);
        assert_eq!(analysis.summary.total_consumption, 10.0);
        assert_eq!(analysis.summary.total_loss, 6.0);
        assert_eq!(analysis.chart.labels.len(), 4);
        assert_eq!(analysis.loss_series.len(), analysis.increments.len());
    }

    #[test]
    fn test_night_mode() {
        let analysis = service()
            .analyze(request(
                cumulative(&[0.0, 1.0, 2.0, 3.0, 4.0]),
                Some(LossMode::Night {
                    start_hour: 2,
                    end_hour: 4,
                }),
            ))
            .unwrap();
        assert_eq!(analysis.loss_series, vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(analysis.summary.loss_percentage, 50.0);
    }

    #[test]
    fn test_date_range_filters_before_derivation() {
        let mut req = request(cumulative(&[0.0, 5.0, 7.0, 8.0]), None);
        req.from = Some(3_600_000);
        let analysis = service().analyze(req).unwrap();
        let values: Vec<f64> = analysis.increments.iter().map(|i| i.value).collect();
        assert_eq!(values, vec![2.0, 1.0]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let too_short = service().analyze(request(cumulative(&[1.0]), None));
        assert!(matches!(
            too_short,
            Err(ServiceError::Validation(ValidationError::EmptySeries))
        ));

        let bad_window = service().analyze(request(
            cumulative(&[1.0, 2.0, 3.0]),
            Some(LossMode::Rolling { window_hours: 0 }),
        ));
        assert!(matches!(
            bad_window,
            Err(ServiceError::Validation(ValidationError::WindowOutOfRange { .. }))
        ));
    }
}
