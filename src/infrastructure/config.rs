use anyhow::Context;
use chrono::FixedOffset;
use serde::Deserialize;

pub const API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub report_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub enabled: bool,
    pub session_url: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    pub default_window_hours: u32,
    pub max_week_span: u32,
    pub utc_offset_minutes: i32,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
}

impl AnalysisConfig {
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("invalid utc_offset_minutes: {}", self.utc_offset_minutes))
    }
}

/// Defaults, then `config/dashboard.*`, then `DASHBOARD__*` variables.
/// `NEXT_PUBLIC_API_URL` wins for the backend base URL.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let api_url = std::env::var(API_URL_ENV).ok();
    build_config(
        config::File::with_name("config/dashboard").required(false),
        api_url.as_deref(),
    )
}

fn build_config<S>(file: S, api_url: Option<&str>) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let mut builder = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("api.base_url", "http://localhost:8000")?
        .set_default("api.timeout_secs", 30)?
        .set_default("api.report_path", "/report")?
        .set_default("auth.enabled", true)?
        .set_default("auth.session_url", "http://localhost:3000/api/auth/session")?
        .set_default("auth.cache_ttl_secs", 60)?
        .set_default("auth.cache_capacity", 1024)?
        .set_default("analysis.default_window_hours", 24)?
        .set_default("analysis.max_week_span", 5)?
        .set_default("analysis.utc_offset_minutes", 0)?
        .set_default("analysis.night_start_hour", 0)?
        .set_default("analysis.night_end_hour", 6)?
        .add_source(file)
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"));

    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        builder = builder.set_override("api.base_url", url)?;
    }

    let mut settings: AppConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    settings.api.base_url = settings.api.base_url.trim_end_matches('/').to_string();
    Ok(settings)
}
