// Printable report content and layout geometry
use crate::domain::aggregation::{ChartStatistics, Trend};
use crate::domain::consumption::LossSummary;
use serde::Deserialize;

pub const CHART_FALLBACK_TEXT: &str = "Gráfico no disponible";

/// Everything the PDF renderer needs; all numbers are precomputed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    pub summary: LossSummary,
    #[serde(default)]
    pub statistics: Option<ReportStatistics>,
    /// Base64-encoded PNG snapshot of the rendered chart.
    #[serde(default)]
    pub chart_png_base64: Option<String>,
}

/// Caption fields for a report whose numbers are computed server-side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportHeading {
    pub title: String,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub chart_png_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportStatistics {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub trend: Trend,
    pub anomalies: usize,
}

impl From<&ChartStatistics> for ReportStatistics {
    fn from(stats: &ChartStatistics) -> Self {
        Self {
            average: stats.average,
            min: stats.min,
            max: stats.max,
            total: stats.total,
            trend: stats.trend,
            anomalies: stats.anomalies.len(),
        }
    }
}

impl ReportDocument {
    pub fn with_statistics(
        heading: ReportHeading,
        summary: LossSummary,
        statistics: &ChartStatistics,
    ) -> Self {
        Self {
            title: heading.title,
            place_name: heading.place_name,
            period: heading.period,
            summary,
            statistics: Some(statistics.into()),
            chart_png_base64: heading.chart_png_base64,
        }
    }

    pub fn metric_rows(&self) -> Vec<(String, String)> {
        let s = &self.summary;
        vec![
            ("Consumo total".to_string(), format!("{:.2}", s.total_consumption)),
            ("Pérdida total".to_string(), format!("{:.2}", s.total_loss)),
            ("Porcentaje de pérdida".to_string(), format!("{:.1} %", s.loss_percentage)),
            ("Eficiencia".to_string(), format!("{:.1} %", s.efficiency)),
        ]
    }

    pub fn statistic_rows(&self) -> Vec<(String, String)> {
        let Some(stats) = &self.statistics else {
            return Vec::new();
        };
        let trend = match stats.trend {
            Trend::Increasing => "Creciente",
            Trend::Decreasing => "Decreciente",
            Trend::Stable => "Estable",
        };
        vec![
            ("Promedio".to_string(), format!("{:.2}", stats.average)),
            ("Mínimo".to_string(), format!("{:.2}", stats.min)),
            ("Máximo".to_string(), format!("{:.2}", stats.max)),
            ("Total".to_string(), format!("{:.2}", stats.total)),
            ("Tendencia".to_string(), trend.to_string()),
            ("Anomalías".to_string(), stats.anomalies.to_string()),
        ]
    }
}

/// Largest `(width, height)` with the image's aspect ratio that fits the box.
pub fn fit_within(box_width: f64, box_height: f64, image_width: f64, image_height: f64) -> (f64, f64) {
    if image_width <= 0.0 || image_height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (box_width / image_width).min(box_height / image_height);
    (image_width * scale, image_height * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::{ViewMode, chart_statistics};

    #[test]
    fn test_fit_within_preserves_aspect_ratio() {
        // wide image limited by width
        assert_eq!(fit_within(180.0, 100.0, 1200.0, 400.0), (180.0, 60.0));
        // tall image limited by height
        assert_eq!(fit_within(180.0, 100.0, 300.0, 600.0), (50.0, 100.0));
        assert_eq!(fit_within(180.0, 100.0, 0.0, 10.0), (0.0, 0.0));
    }

    #[test]
    fn test_rows() {
        let doc = ReportDocument {
            title: "Informe".to_string(),
            place_name: None,
            period: None,
            summary: LossSummary::compute(&[8.0, 2.0], &[1.0, 1.0]),
            statistics: None,
            chart_png_base64: None,
        };
        let rows = doc.metric_rows();
        assert_eq!(rows[1], ("Pérdida total".to_string(), "2.00".to_string()));
        assert_eq!(rows[3], ("Eficiencia".to_string(), "80.0 %".to_string()));
        assert!(doc.statistic_rows().is_empty());
    }

    #[test]
    fn test_statistics_from_chart() {
        let heading = ReportHeading {
            title: "Informe".to_string(),
            place_name: Some("Planta Norte".to_string()),
            period: None,
            chart_png_base64: None,
        };
        let stats = chart_statistics(&[(0, 2.0), (1, 4.0), (2, 6.0)], ViewMode::Hour);
        let doc = ReportDocument::with_statistics(
            heading,
            LossSummary::compute(&[12.0], &[3.0]),
            &stats,
        );

        let rows = doc.statistic_rows();
        assert_eq!(rows[0], ("Promedio".to_string(), "4.00".to_string()));
        assert_eq!(rows[3], ("Total".to_string(), "12.00".to_string()));
        assert_eq!(rows[5], ("Anomalías".to_string(), "0".to_string()));
        assert_eq!(doc.place_name.as_deref(), Some("Planta Norte"));
    }
}
