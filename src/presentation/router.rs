// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::auth::require_session;
use crate::presentation::handlers::{
    analysis, client_defaults, compute_loss, create_note, create_place, delete_note,
    export_analysis_csv, export_analysis_pdf, export_csv, export_json, export_pdf, health_check,
    list_notes, list_places, report, scrape_place, scrape_status, update_note, upload_workbook,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// Body ceiling for every API route; imported series are posted back whole.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/defaults", get(client_defaults))
        .route("/places", get(list_places).post(create_place))
        .route("/places/:id/scrape", post(scrape_place))
        .route("/places/:id/scrape-status", get(scrape_status))
        .route("/analysis", get(analysis))
        .route("/report", get(report))
        .route("/uploads", post(upload_workbook))
        .route("/loss", post(compute_loss))
        .route("/export/json", post(export_json))
        .route("/export/csv", post(export_csv))
        .route("/export/analysis-csv", post(export_analysis_csv))
        .route("/export/pdf", post(export_pdf))
        .route("/export/analysis-pdf", post(export_analysis_pdf))
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/:id", put(update_note).delete(delete_note))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analysis_service::{AnalysisService, AnalysisSettings};
    use crate::application::analytics_api::fake::FakeAnalyticsApi;
    use crate::application::loss_service::{LossService, LossSettings};
    use crate::application::note_service::NoteService;
    use crate::application::place_service::PlaceService;
    use crate::application::session::{IdentityProvider, SessionGate, SessionUser};
    use crate::presentation::app_state::ClientDefaults;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::FixedOffset;
    use std::num::NonZeroUsize;
    use std::time::Duration;
    use tower::ServiceExt;

    struct StaticProvider;

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn verify(&self, token: &str) -> anyhow::Result<Option<SessionUser>> {
            Ok((token == "valid").then(|| SessionUser {
                id: "admin".to_string(),
                email: None,
            }))
        }
    }

    fn state(with_auth: bool) -> Arc<AppState> {
        let api = Arc::new(FakeAnalyticsApi::default());
        let offset = FixedOffset::east_opt(0).unwrap();
        let session_gate = with_auth.then(|| {
            SessionGate::new(
                Arc::new(StaticProvider),
                Duration::from_secs(60),
                NonZeroUsize::new(16).unwrap(),
            )
        });
        Arc::new(AppState {
            place_service: PlaceService::new(api.clone()),
            analysis_service: AnalysisService::new(
                api,
                AnalysisSettings {
                    default_window_hours: 24,
                    max_week_span: 5,
                    offset,
                },
            ),
            loss_service: LossService::new(LossSettings {
                default_window_hours: 2,
                offset,
            }),
            note_service: NoteService::new(),
            session_gate,
            offset,
            defaults: ClientDefaults {
                default_window_hours: 2,
                min_window_hours: 1,
                max_window_hours: 720,
                max_week_span: 5,
                night_start_hour: 0,
                night_end_hour: 6,
            },
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = build_router(state(true))
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let router = build_router(state(true));

        let anonymous = router
            .clone()
            .oneshot(Request::get("/api/notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let authed = router
            .oneshot(
                Request::get("/api/notes")
                    .header(header::AUTHORIZATION, "Bearer valid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(authed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_week_validation_message() {
        let response = build_router(state(false))
            .oneshot(
                Request::get("/api/analysis?start_week=9&end_week=3&year=2024&place_id=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "La semana final no puede ser anterior a la semana inicial"
        );
    }

    #[tokio::test]
    async fn test_loss_endpoint() {
        let payload = serde_json::json!({
            "points": [
                {"timestamp": "0", "value": 10.0},
                {"timestamp": "3600000", "value": 15.0},
                {"timestamp": "7200000", "value": 12.0},
                {"timestamp": "10800000", "value": 20.0}
            ],
            "loss": {"mode": "rolling", "window_hours": 1}
        });
        let response = build_router(state(false))
            .oneshot(
                Request::post("/api/loss")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["increments"].as_array().unwrap().len(), 2);
        assert_eq!(body["summary"]["total_consumption"], 25.0);
        assert_eq!(body["summary"]["total_loss"], 25.0);
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let router = build_router(state(false));
        let created = router
            .clone()
            .oneshot(
                Request::post("/api/notes")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"timestamp":"1000","title":"Fuga"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let note = body_json(created).await;
        let id = note["id"].as_str().unwrap().to_string();
        assert_eq!(note["color"], "#3b82f6");

        let deleted = router
            .clone()
            .oneshot(
                Request::delete(format!("/api/notes/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = router
            .oneshot(
                Request::delete(format!("/api/notes/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_imported_series_fits_body_limit() {
        let points: Vec<serde_json::Value> = (0..60_000i64)
            .map(|i| serde_json::json!({"timestamp": (i * 60_000).to_string(), "value": i as f64}))
            .collect();
        let payload = serde_json::json!({ "points": points }).to_string();
        assert!(payload.len() > 2 * 1024 * 1024);

        let response = build_router(state(false))
            .oneshot(
                Request::post("/api/loss")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["increments"].as_array().unwrap().len(), 59_999);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let response = build_router(state(false))
            .oneshot(
                Request::post("/api/loss")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"points\": ["))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Solicitud no válida"));

        let response = build_router(state(false))
            .oneshot(
                Request::get("/api/analysis?start_week=uno&end_week=3&year=2024&place_id=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_analysis_pdf_export() {
        let payload = serde_json::json!({
            "title": "Informe de pérdidas",
            "place_name": "Planta Norte",
            "analysis": {
                "points": [
                    {"timestamp": "0", "value": 10.0},
                    {"timestamp": "3600000", "value": 15.0},
                    {"timestamp": "7200000", "value": 18.0}
                ]
            }
        });
        let response = build_router(state(false))
            .oneshot(
                Request::post("/api/export/analysis-pdf")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
