// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::analysis_service::{AnalysisService, AnalysisSettings};
use crate::application::loss_service::{LossService, LossSettings};
use crate::application::note_service::NoteService;
use crate::application::place_service::PlaceService;
use crate::application::session::SessionGate;
use crate::domain::consumption::{LossMode, MAX_WINDOW_HOURS, MIN_WINDOW_HOURS, NightWindow};
use crate::infrastructure::analytics_client::HttpAnalyticsApi;
use crate::infrastructure::config::load_config;
use crate::infrastructure::identity_client::HttpIdentityProvider;
use crate::presentation::app_state::{AppState, ClientDefaults};
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;
    let offset = config.analysis.offset()?;
    let timeout = Duration::from_secs(config.api.timeout_secs);

    // Night defaults are checked up front so a bad config fails at startup
    NightWindow::new(config.analysis.night_start_hour, config.analysis.night_end_hour)
        .context("Invalid night window in configuration")?;
    LossMode::Rolling {
        window_hours: config.analysis.default_window_hours,
    }
    .validate()
    .context("Invalid default window in configuration")?;

    // Create backend client (infrastructure layer)
    let api = Arc::new(HttpAnalyticsApi::new(
        &config.api.base_url,
        &config.api.report_path,
        timeout,
    )?);

    let session_gate = if config.auth.enabled {
        let provider = Arc::new(HttpIdentityProvider::new(
            config.auth.session_url.clone(),
            timeout,
        )?);
        let capacity = NonZeroUsize::new(config.auth.cache_capacity)
            .context("auth.cache_capacity must be positive")?;
        Some(SessionGate::new(
            provider,
            Duration::from_secs(config.auth.cache_ttl_secs),
            capacity,
        ))
    } else {
        tracing::warn!("Authentication disabled, admin API is open");
        None
    };

    // Create services (application layer)
    let state = Arc::new(AppState {
        place_service: PlaceService::new(api.clone()),
        analysis_service: AnalysisService::new(
            api,
            AnalysisSettings {
                default_window_hours: config.analysis.default_window_hours,
                max_week_span: config.analysis.max_week_span,
                offset,
            },
        ),
        loss_service: LossService::new(LossSettings {
            default_window_hours: config.analysis.default_window_hours,
            offset,
        }),
        note_service: NoteService::new(),
        session_gate,
        offset,
        defaults: ClientDefaults {
            default_window_hours: config.analysis.default_window_hours,
            min_window_hours: MIN_WINDOW_HOURS,
            max_window_hours: MAX_WINDOW_HOURS,
            max_week_span: config.analysis.max_week_span,
            night_start_hour: config.analysis.night_start_hour,
            night_end_hour: config.analysis.night_end_hour,
        },
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind: {}", config.server.bind))?;
    tracing::info!(
        "Starting water-loss dashboard on {} (analytics backend {})",
        addr,
        config.api.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
