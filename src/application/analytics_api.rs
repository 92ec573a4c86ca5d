// Port to the external analytics backend
use crate::domain::place::{NewPlace, Place, ScrapeOutcome, ScrapeRequest};
use crate::domain::query::AnalysisQuery;
use crate::domain::time_series::millis_string;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No se pudo contactar con el servidor de análisis: {0}")]
    Network(String),
    #[error("El servidor de análisis respondió {status}: {body}")]
    Status { status: String, body: String },
    #[error("Respuesta inválida del servidor de análisis: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPoint {
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub flow_rate: f64,
    #[serde(rename = "RollingMin", default)]
    pub rolling_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub time_series: Vec<AnalysisPoint>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// GET /places
    async fn list_places(&self) -> Result<Vec<Place>, ApiError>;

    /// POST /new_place
    async fn create_place(&self, place: &NewPlace) -> Result<Place, ApiError>;

    /// POST /scrape_place
    async fn scrape_place(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome, ApiError>;

    /// GET /analysis
    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisResponse, ApiError>;

    /// Report artifact (PDF or other blob) for the given analysis parameters
    async fn fetch_report(&self, query: &AnalysisQuery) -> Result<ReportArtifact, ApiError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    /// In-memory backend for service tests.
    #[derive(Default)]
    pub struct FakeAnalyticsApi {
        pub places: Mutex<Vec<Place>>,
        pub analysis: Mutex<Option<AnalysisResponse>>,
        pub scrape_fails: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeAnalyticsApi {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalyticsApi for FakeAnalyticsApi {
        async fn list_places(&self) -> Result<Vec<Place>, ApiError> {
            self.record("list_places");
            Ok(self.places.lock().unwrap().clone())
        }

        async fn create_place(&self, place: &NewPlace) -> Result<Place, ApiError> {
            self.record("create_place");
            let mut places = self.places.lock().unwrap();
            let created = Place {
                id: places.len() as i64 + 1,
                name: place.name.clone(),
                flow_reporter_id: place.flow_reporter_id.clone(),
            };
            places.push(created.clone());
            Ok(created)
        }

        async fn scrape_place(&self, _request: &ScrapeRequest) -> Result<ScrapeOutcome, ApiError> {
            self.record("scrape_place");
            if self.scrape_fails {
                return Err(ApiError::Status {
                    status: "500 Internal Server Error".to_string(),
                    body: "scraper down".to_string(),
                });
            }
            Ok(ScrapeOutcome {
                success: true,
                message: None,
            })
        }

        async fn fetch_analysis(&self, _query: &AnalysisQuery) -> Result<AnalysisResponse, ApiError> {
            self.record("fetch_analysis");
            self.analysis
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::Decode("no analysis".to_string()))
        }

        async fn fetch_report(&self, _query: &AnalysisQuery) -> Result<ReportArtifact, ApiError> {
            self.record("fetch_report");
            Ok(ReportArtifact {
                content_type: "application/pdf".to_string(),
                bytes: Bytes::from_static(b"%PDF-1.4"),
            })
        }
    }
}
