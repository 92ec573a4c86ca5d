// Application state for HTTP handlers
use crate::application::analysis_service::AnalysisService;
use crate::application::loss_service::LossService;
use crate::application::note_service::NoteService;
use crate::application::place_service::PlaceService;
use crate::application::session::SessionGate;
use chrono::FixedOffset;
use serde::Serialize;

/// Form defaults and bounds handed to the dashboard front-end.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDefaults {
    pub default_window_hours: u32,
    pub min_window_hours: u32,
    pub max_window_hours: u32,
    pub max_week_span: u32,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub place_service: PlaceService,
    pub analysis_service: AnalysisService,
    pub loss_service: LossService,
    pub note_service: NoteService,
    /// `None` leaves the API open (auth disabled in config).
    pub session_gate: Option<SessionGate>,
    pub offset: FixedOffset,
    pub defaults: ClientDefaults,
}
