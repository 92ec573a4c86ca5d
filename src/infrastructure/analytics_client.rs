// HTTP client for the external analytics backend
use crate::application::analytics_api::{
    AnalysisResponse, AnalyticsApi, ApiError, PlacesResponse, ReportArtifact,
};
use crate::domain::place::{NewPlace, Place, ScrapeOutcome, ScrapeRequest};
use crate::domain::query::AnalysisQuery;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpAnalyticsApi {
    client: Client,
    base_url: String,
    report_path: String,
}

impl HttpAnalyticsApi {
    pub fn new(base_url: &str, report_path: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            report_path: format!("/{}", report_path.trim_start_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn query_url(&self, path: &str, query: &AnalysisQuery) -> String {
        let params: Vec<String> = query
            .to_query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect();
        format!("{}?{}", self.url(path), params.join("&"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AnalyticsApi for HttpAnalyticsApi {
    async fn list_places(&self) -> Result<Vec<Place>, ApiError> {
        let url = self.url("/places");
        tracing::debug!("GET {}", url);
        let response: PlacesResponse = self.json(self.client.get(&url)).await?;
        Ok(response.places)
    }

    async fn create_place(&self, place: &NewPlace) -> Result<Place, ApiError> {
        let url = self.url("/new_place");
        tracing::debug!("POST {} name={}", url, place.name);
        self.json(self.client.post(&url).json(place)).await
    }

    async fn scrape_place(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome, ApiError> {
        let url = self.url("/scrape_place");
        tracing::debug!("POST {} place_id={}", url, request.place_id);
        self.json(self.client.post(&url).json(request)).await
    }

    async fn fetch_analysis(&self, query: &AnalysisQuery) -> Result<AnalysisResponse, ApiError> {
        let url = self.query_url("/analysis", query);
        tracing::debug!("GET {}", url);
        self.json(self.client.get(&url)).await
    }

    async fn fetch_report(&self, query: &AnalysisQuery) -> Result<ReportArtifact, ApiError> {
        let url = self.query_url(&self.report_path, query);
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(&url)).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(ReportArtifact {
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_url() {
        let api = HttpAnalyticsApi::new("http://localhost:8000/", "report", Duration::from_secs(5))
            .unwrap();
        let query = AnalysisQuery {
            window_size: 24,
            start_week: 3,
            end_week: 5,
            year: 2024,
            place_id: 9,
        };
        assert_eq!(
            api.query_url("/analysis", &query),
            "http://localhost:8000/analysis?window_size=24&start_week=3&end_week=5&year=2024&place_id=9"
        );
        assert_eq!(
            api.query_url(&api.report_path, &query),
            "http://localhost:8000/report?window_size=24&start_week=3&end_week=5&year=2024&place_id=9"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let api = HttpAnalyticsApi::new("http://127.0.0.1:9", "/report", Duration::from_secs(2))
            .unwrap();
        assert!(matches!(api.list_places().await, Err(ApiError::Network(_))));
    }
}
