// HTTP request handlers
use crate::application::analysis_service::AnalysisView;
use crate::application::loss_service::{LossAnalysis, LossRequest};
use crate::domain::aggregation::ViewMode;
use crate::domain::error::ImportError;
use crate::domain::note::{Note, NoteDraft};
use crate::domain::place::{NewPlace, Place, ScrapeOutcome, ScrapeRequest};
use crate::domain::query::AnalysisQuery;
use crate::domain::report::{ReportDocument, ReportHeading};
use crate::domain::status::RequestStatus;
use crate::domain::time_series::TimeSeries;
use crate::infrastructure::export::{analysis_csv, series_csv, series_json};
use crate::infrastructure::http_response::{CSV, JSON, PDF, attachment_response, export_filename};
use crate::infrastructure::pdf_report::render_report;
use crate::infrastructure::spreadsheet::parse_workbook;
use crate::presentation::app_state::{AppState, ClientDefaults};
use crate::presentation::error::AppError;
use crate::presentation::extract::{ApiJson, ApiPath, ApiQuery};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct AnalysisParams {
    pub window_size: Option<u32>,
    pub start_week: u32,
    pub end_week: u32,
    pub year: i32,
    pub place_id: i64,
    pub view_mode: Option<String>,
}

impl AnalysisParams {
    fn into_query(self, default_window: u32) -> AnalysisQuery {
        AnalysisQuery {
            window_size: self.window_size.unwrap_or(default_window),
            start_week: self.start_week,
            end_week: self.end_week,
            year: self.year,
            place_id: self.place_id,
        }
    }
}

#[derive(Deserialize)]
pub struct ScrapeBody {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct AnalysisReportBody {
    #[serde(flatten)]
    pub heading: ReportHeading,
    pub analysis: LossRequest,
}

#[derive(Serialize)]
pub struct PlacesBody {
    pub places: Vec<Place>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn client_defaults(State(state): State<Arc<AppState>>) -> Json<ClientDefaults> {
    Json(state.defaults.clone())
}

pub async fn list_places(State(state): State<Arc<AppState>>) -> Result<Json<PlacesBody>, AppError> {
    let places = state.place_service.list_places().await?;
    Ok(Json(PlacesBody { places }))
}

pub async fn create_place(
    State(state): State<Arc<AppState>>,
    ApiJson(place): ApiJson<NewPlace>,
) -> Result<(StatusCode, Json<Place>), AppError> {
    let created = state.place_service.create_place(place).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn scrape_place(
    ApiPath(place_id): ApiPath<i64>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ScrapeBody>,
) -> Result<Json<ScrapeOutcome>, AppError> {
    let request = ScrapeRequest {
        place_id,
        start_date: body.start_date,
        end_date: body.end_date,
    };
    Ok(Json(state.place_service.scrape(request).await?))
}

pub async fn scrape_status(
    ApiPath(place_id): ApiPath<i64>,
    State(state): State<Arc<AppState>>,
) -> Json<RequestStatus> {
    Json(state.place_service.scrape_status(place_id))
}

/// Remote analysis bucketed for the requested view mode
pub async fn analysis(
    ApiQuery(params): ApiQuery<AnalysisParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisView>, AppError> {
    let view_mode = params
        .view_mode
        .as_deref()
        .map(str::parse::<ViewMode>)
        .transpose()?
        .unwrap_or_default();
    let default_window = state.analysis_service.settings().default_window_hours;
    let query = params.into_query(default_window);

    Ok(Json(state.analysis_service.analysis_view(query, view_mode).await?))
}

/// Report artifact from the backend, passed through unchanged
pub async fn report(
    ApiQuery(params): ApiQuery<AnalysisParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let default_window = state.analysis_service.settings().default_window_hours;
    let artifact = state
        .analysis_service
        .report(params.into_query(default_window))
        .await?;
    Ok(([(header::CONTENT_TYPE, artifact.content_type)], artifact.bytes).into_response())
}

/// Parse an uploaded workbook into a time series. Nothing is stored.
pub async fn upload_workbook(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TimeSeries>, AppError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_lowercase) else {
            continue;
        };
        if !(filename.ends_with(".xlsx") || filename.ends_with(".xls")) {
            return Err(ImportError::UnsupportedFormat.into());
        }

        let bytes = field.bytes().await?;
        tracing::info!("Importing workbook {} ({} bytes)", filename, bytes.len());

        let series = tokio::task::spawn_blocking(move || parse_workbook(&bytes))
            .await
            .map_err(|e| anyhow::anyhow!("Workbook parser panicked: {}", e))??;
        return Ok(Json(series));
    }

    Err(ImportError::MissingFile.into())
}

pub async fn compute_loss(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LossRequest>,
) -> Result<Json<LossAnalysis>, AppError> {
    Ok(Json(state.loss_service.analyze(request)?))
}

pub async fn export_json(ApiJson(series): ApiJson<TimeSeries>) -> Result<Response, AppError> {
    let bytes = series_json(&series)?;
    download(bytes, JSON, &export_filename("serie", "json"))
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    ApiJson(series): ApiJson<TimeSeries>,
) -> Result<Response, AppError> {
    let bytes = series_csv(&series, state.offset)?;
    download(bytes, CSV, &export_filename("serie", "csv"))
}

pub async fn export_analysis_csv(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LossRequest>,
) -> Result<Response, AppError> {
    let analysis = state.loss_service.analyze(request)?;
    let bytes = analysis_csv(&analysis, state.offset)?;
    download(bytes, CSV, &export_filename("perdidas", "csv"))
}

pub async fn export_pdf(ApiJson(report): ApiJson<ReportDocument>) -> Result<Response, AppError> {
    let bytes = tokio::task::spawn_blocking(move || render_report(&report))
        .await
        .map_err(|e| anyhow::anyhow!("Report renderer panicked: {}", e))??;
    download(bytes, PDF, &export_filename("informe", "pdf"))
}

/// PDF of a local loss analysis, with statistics computed here.
pub async fn export_analysis_pdf(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AnalysisReportBody>,
) -> Result<Response, AppError> {
    let analysis = state.loss_service.analyze(body.analysis)?;
    let report =
        ReportDocument::with_statistics(body.heading, analysis.summary, &analysis.statistics);
    let bytes = tokio::task::spawn_blocking(move || render_report(&report))
        .await
        .map_err(|e| anyhow::anyhow!("Report renderer panicked: {}", e))??;
    download(bytes, PDF, &export_filename("informe_perdidas", "pdf"))
}

fn download(bytes: Vec<u8>, content_type: &str, filename: &str) -> Result<Response, AppError> {
    attachment_response(bytes, content_type, filename)
        .map_err(|status| AppError::Internal(anyhow::anyhow!("download failed: {}", status)))
}

pub async fn list_notes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.note_service.list()?))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<NoteDraft>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    Ok((StatusCode::CREATED, Json(state.note_service.create(draft)?)))
}

pub async fn update_note(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<NoteDraft>,
) -> Result<Json<Note>, AppError> {
    Ok(Json(state.note_service.update(id, draft)?))
}

pub async fn delete_note(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.note_service.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
