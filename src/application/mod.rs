// Application layer - Use cases and ports to external services
pub mod analysis_service;
pub mod analytics_api;
pub mod error;
pub mod loss_service;
pub mod note_service;
pub mod place_service;
pub mod session;
