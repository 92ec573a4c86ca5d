// Infrastructure layer - External dependencies and adapters
pub mod analytics_client;
pub mod config;
pub mod export;
pub mod http_response;
pub mod identity_client;
pub mod pdf_report;
pub mod spreadsheet;
