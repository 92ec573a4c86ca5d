// Place service - Listing, registering and scraping places
use crate::application::analytics_api::AnalyticsApi;
use crate::application::error::ServiceError;
use crate::domain::place::{NewPlace, Place, ScrapeOutcome, ScrapeRequest};
use crate::domain::status::RequestStatus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct PlaceService {
    api: Arc<dyn AnalyticsApi>,
    scrape_status: Arc<Mutex<HashMap<i64, RequestStatus>>>,
}

impl PlaceService {
    pub fn new(api: Arc<dyn AnalyticsApi>) -> Self {
        Self {
            api,
            scrape_status: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn list_places(&self) -> Result<Vec<Place>, ServiceError> {
        Ok(self.api.list_places().await?)
    }

    pub async fn create_place(&self, place: NewPlace) -> Result<Place, ServiceError> {
        let place = place.validated()?;
        let created = self.api.create_place(&place).await?;
        tracing::info!("Registered place {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Validate, then ask the backend to scrape. Status is tracked per place.
    pub async fn scrape(&self, request: ScrapeRequest) -> Result<ScrapeOutcome, ServiceError> {
        request.validate()?;
        if self.scrape_status(request.place_id).is_loading() {
            tracing::warn!("Scrape for place {} already in flight", request.place_id);
        }
        self.set_status(request.place_id, RequestStatus::Loading);

        tracing::debug!(
            "Scraping place {} from {} to {}",
            request.place_id,
            request.start_date,
            request.end_date
        );

        match self.api.scrape_place(&request).await {
            Ok(outcome) if outcome.success => {
                self.set_status(request.place_id, RequestStatus::Success);
                Ok(outcome)
            }
            Ok(outcome) => {
                let message = outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "La extracción no se completó".to_string());
                self.set_status(request.place_id, RequestStatus::Error { message });
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Scrape for place {} failed: {}", request.place_id, e);
                self.set_status(
                    request.place_id,
                    RequestStatus::Error {
                        message: e.to_string(),
                    },
                );
                Err(e.into())
            }
        }
    }

    pub fn scrape_status(&self, place_id: i64) -> RequestStatus {
        self.scrape_status
            .lock()
            .ok()
            .and_then(|statuses| statuses.get(&place_id).cloned())
            .unwrap_or_default()
    }

    fn set_status(&self, place_id: i64, status: RequestStatus) {
        if let Ok(mut statuses) = self.scrape_status.lock() {
            statuses.insert(place_id, status);
        }
    }
}
