use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::PortalConfig;
use crate::error::{PortalError, Result};
use crate::history::HistoryRecord;
use crate::request::{FormValue, MultipartForm};
use crate::result::RawAnalysis;
use crate::service::{PortalService, RegisterOutcome};

const REGISTER_PATH: &str = "register";
const ANALYZE_PATH: &str = "analyze";
const HISTORY_PATH: &str = "history";

/// `PortalService` over HTTP. One request per call, no retries.
pub struct HttpPortalClient {
    client: Client,
    base_url: Url,
}

impl HttpPortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PortalError::Config(format!("invalid base url '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PortalError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PortalError::Config(format!("building HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded as a single path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PortalError::Connectivity(format!("malformed {} payload: {}", what, e)))
    }
}

fn to_wire_form(form: MultipartForm) -> Result<Form> {
    let mut wire = Form::new();
    for part in form.into_parts() {
        wire = match part.value {
            FormValue::Text(text) => wire.text(part.name, text),
            FormValue::File(file) => {
                let body = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|e| {
                        PortalError::Validation(format!(
                            "invalid content type for {}: {}",
                            part.name, e
                        ))
                    })?;
                wire.part(part.name, body)
            }
        };
    }
    Ok(wire)
}

/// FastAPI reports failures as `{"detail": "..."}`; validation failures use a list instead.
fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        _ => None,
    }
}

#[async_trait(?Send)]
impl PortalService for HttpPortalClient {
    async fn register(&self, form: MultipartForm) -> Result<RegisterOutcome> {
        let url = self.endpoint(&[REGISTER_PATH]);
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .multipart(to_wire_form(form)?)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(RegisterOutcome::Accepted);
        }
        let body = response.bytes().await?;
        let detail = detail_message(&body);
        warn!("registration rejected with {} ({:?})", status, detail);
        Ok(RegisterOutcome::Rejected { detail })
    }

    async fn analyze(&self, form: MultipartForm) -> Result<RawAnalysis> {
        let url = self.endpoint(&[ANALYZE_PATH]);
        debug!("POST {} ({} parts)", url, form.len());
        let response = self
            .client
            .post(url)
            .multipart(to_wire_form(form)?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!("analysis failed with {}", status);
            return Err(PortalError::Connectivity(format!(
                "analysis service answered {}",
                status
            )));
        }
        Self::decode(response, "analysis").await
    }

    async fn history(&self, email: &str) -> Result<Vec<HistoryRecord>> {
        let url = self.endpoint(&[HISTORY_PATH, email]);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("history lookup failed with {}", status);
            return Err(PortalError::Connectivity(format!(
                "history service answered {}",
                status
            )));
        }
        Self::decode(response, "history").await
    }
}
