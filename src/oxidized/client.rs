use crate::app_config::AppConfig;
use crate::oxidized::device::{ConfigSummary, Device};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, instrument};

/// The operations the collector needs from an Oxidized instance.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, OxidizedError>;

    async fn config_summary(&self, group: &str, name: &str, only_default_group: bool) -> Result<ConfigSummary, OxidizedError>;
}

#[derive(Debug)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug)]
pub struct OxidizedClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

pub fn new_client(config: &AppConfig) -> Result<OxidizedClient, OxidizedError> {
    let client = Client::builder().user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))).build()?;
    let oxidized = config.oxidized();
    OxidizedClient::new(client, oxidized.url(), oxidized.username(), oxidized.password())
}

impl OxidizedClient {
    /// Basic authentication is only used when both `username` and `password` are non-empty.
    pub fn new(client: Client, base_url: &str, username: &str, password: &str) -> Result<Self, OxidizedError> {
        let base_url = Url::parse(base_url).map_err(|e| OxidizedError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(OxidizedError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let credentials = (!username.is_empty() && !password.is_empty()).then(|| Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });

        Ok(OxidizedClient {
            client,
            base_url,
            credentials,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        debug!(%url, "Sending request to Oxidized");
        let request = self.client.get(url);
        match &self.credentials {
            Some(credentials) => request.basic_auth(&credentials.username, Some(&credentials.password)),
            None => request,
        }
    }
}

#[async_trait]
impl Backend for OxidizedClient {
    #[instrument(skip(self))]
    async fn list_devices(&self) -> Result<Vec<Device>, OxidizedError> {
        let response = self.get(self.url(&["nodes"])).query(&[("format", "json")]).send().await?;

        let status = response.status();
        debug!(status_code = %status, "Got response from Oxidized");
        if !status.is_success() {
            return Err(OxidizedError::BackendStatus { code: status });
        }

        let body = response.text().await?;
        let devices = serde_json::from_str::<Vec<Device>>(&body)?;
        debug!(count = devices.len(), "Got devices");
        Ok(devices)
    }

    #[instrument(skip(self))]
    async fn config_summary(&self, group: &str, name: &str, only_default_group: bool) -> Result<ConfigSummary, OxidizedError> {
        let url = if only_default_group {
            self.url(&["node", "fetch", name])
        } else {
            self.url(&["node", "fetch", group, name])
        };

        let response = self.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(OxidizedError::BackendStatus { code: response.status() });
        }

        let body = response.bytes().await?;
        Ok(ConfigSummary::from_body(&body))
    }
}

#[derive(Error, Debug)]
pub enum OxidizedError {
    #[error("request to Oxidized failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode the Oxidized response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Oxidized responded with status {code}")]
    BackendStatus { code: StatusCode },
    #[error("invalid Oxidized URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
