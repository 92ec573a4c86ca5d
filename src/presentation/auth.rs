// Session middleware for admin routes
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Reject requests without a live session. The verified user is attached
/// to the request extensions.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(gate) = &state.session_gate else {
        return Ok(next.run(request).await);
    };

    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;
    match gate.authenticate(&token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::error!("Session check failed: {:#}", e);
            Err(AppError::AuthUnavailable)
        }
    }
}
