// Per-request status shown next to a form
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error { message: String },
}

impl RequestStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }
}
