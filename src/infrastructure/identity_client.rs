// Identity provider client - Verifies bearer sessions over HTTP
use crate::application::session::{IdentityProvider, SessionUser};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    session_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<SessionUser>,
}

impl HttpIdentityProvider {
    pub fn new(session_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            session_url,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Option<SessionUser>> {
        let response = self
            .client
            .get(&self.session_url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to reach identity provider")?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Identity provider failed with status {}: {}", status, body);
            }
            _ => {}
        }

        let session = response
            .json::<SessionResponse>()
            .await
            .context("Failed to parse identity provider response")?;
        Ok(session.user)
    }
}
