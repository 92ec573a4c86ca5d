// Errors returned by application services
use crate::application::analytics_api::ApiError;
use crate::domain::error::{ImportError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("No se encontró la nota {0}")]
    NoteNotFound(uuid::Uuid),
    #[error("Almacén de notas no disponible")]
    NoteStoreUnavailable,
}
