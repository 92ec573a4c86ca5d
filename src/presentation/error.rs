// Mapping of failures to HTTP responses
use crate::application::analytics_api::ApiError;
use crate::application::error::ServiceError;
use crate::domain::error::{ImportError, ValidationError};
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum AppError {
    Service(ServiceError),
    Unauthorized,
    AuthUnavailable,
    /// The request could not be extracted (bad body, query, path or size).
    Rejected {
        status: StatusCode,
        detail: String,
    },
    Internal(anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::Import(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Service(ServiceError::Api(_)) => StatusCode::BAD_GATEWAY,
            AppError::Service(ServiceError::NoteNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Service(ServiceError::NoteStoreUnavailable) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::AuthUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Rejected { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Service(e) => e.to_string(),
            AppError::Unauthorized => "Sesión no válida o expirada".to_string(),
            AppError::AuthUnavailable => {
                "No se pudo verificar la sesión, inténtelo de nuevo".to_string()
            }
            AppError::Rejected { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "La solicitud supera el tamaño máximo permitido".to_string()
            }
            AppError::Rejected { detail, .. } => format!("Solicitud no válida: {}", detail),
            AppError::Internal(_) => "Error interno del servidor".to_string(),
        }
    }

    fn rejected(status: StatusCode, detail: String) -> Self {
        AppError::Rejected { status, detail }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            AppError::Service(ServiceError::Api(e)) => tracing::warn!("Upstream error: {}", e),
            _ => tracing::debug!("Request rejected ({}): {}", status, self.message()),
        }
        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::Service(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Service(e.into())
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        AppError::Service(e.into())
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        AppError::Service(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::rejected(e.status(), e.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}
