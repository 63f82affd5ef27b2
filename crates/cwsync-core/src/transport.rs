use async_trait::async_trait;
use serde_json::Value;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Request/response seam between the engine and the gateway.
///
/// Implementations return the decoded JSON response as-is; checking the
/// envelope's success status is the engine's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, command: &str, payload: Value, token: Option<&str>) -> SyncResult<Value>;
}

/// Gateway transport over HTTPS.
///
/// Holds one `reqwest::Client` with a cookie store, so the gateway's session
/// cookie survives between calls for as long as this transport lives.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    app_version: String,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            app_version: config.app_version.clone(),
        })
    }

    fn command_url(&self, command: &str) -> String {
        format!(
            "{}?_v={}&_av={}&cmd={}",
            self.endpoint, self.api_version, self.app_version, command
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, command: &str, payload: Value, token: Option<&str>) -> SyncResult<Value> {
        let mut form = vec![("pdata", serde_json::to_string(&payload)?)];
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            form.push(("_t", token.to_string()));
        }

        let response = self
            .client
            .post(self.command_url(command))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::trace!(command, %status, %body, "gateway response");

        if !status.is_success() {
            return Err(SyncError::Transport(format!(
                "{}: HTTP {}",
                command, status
            )));
        }

        serde_json::from_str(&body).map_err(|err| {
            SyncError::Protocol(format!("{}: undecodable response: {}", command, err))
        })
    }
}
