/// Adapter for the two-step extraction service: `POST /upload` turns the
/// file into raw text, `POST /extract` turns raw text into structured data.
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::{service_error, ExtractError, ExtractProfile, ResumeFile};
use crate::models::profile::{EmploymentStatus, ExtractedProfile};

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
}

/// `{ success, data?, error? }` as returned by both endpoints. `error` is
/// read from the raw body by [`service_error`] and may have any shape.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Clone)]
pub struct RemoteExtractor {
    client: Client,
    base_url: String,
}

impl RemoteExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn upload(&self, file: &ResumeFile) -> Result<String, ExtractError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(file.mime())?;
        let form = multipart::Form::new().part("file", part);

        debug!("Uploading {} to {}/upload", file.file_name, self.base_url);
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let envelope = read_envelope(response, "Upload").await?;
        let raw_text = envelope
            .data
            .as_ref()
            .and_then(|d| d.get("raw_text"))
            .and_then(|t| t.as_str())
            .unwrap_or_default();

        if raw_text.trim().is_empty() {
            return Err(ExtractError::EmptyText);
        }
        Ok(raw_text.to_string())
    }

    async fn extract_text(&self, text: &str) -> Result<Value, ExtractError> {
        debug!("Requesting extraction for {} chars of text", text.len());
        let response = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&ExtractRequest { text })
            .send()
            .await?;

        let envelope = read_envelope(response, "Extract").await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl ExtractProfile for RemoteExtractor {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn extract(&self, file: &ResumeFile) -> Result<ExtractedProfile, ExtractError> {
        let raw_text = self.upload(file).await?;
        let data = self.extract_text(&raw_text).await?;
        Ok(profile_from_payload(&data))
    }
}

/// Reads a `{ success, data, error }` body. A non-2xx status or a false
/// `success` flag fails with the service's own message when it sent one.
async fn read_envelope(
    response: reqwest::Response,
    step: &str,
) -> Result<Envelope, ExtractError> {
    let status = response.status();
    let body = response.text().await?;
    let parsed: Option<Value> = serde_json::from_str(&body).ok();

    let fallback = || format!("{step} failed: {}", status.as_u16());

    let Some(value) = parsed else {
        warn!("{step} returned {status} with a non-JSON body");
        return Err(ExtractError::Service(fallback()));
    };

    let message = service_error(&value);
    let envelope: Envelope = serde_json::from_value(value).unwrap_or(Envelope {
        success: false,
        data: None,
    });

    if !status.is_success() || !envelope.success {
        warn!("{step} failed with {status}: {:?}", message);
        return Err(ExtractError::Service(message.unwrap_or_else(fallback)));
    }
    Ok(envelope)
}

/// Maps the structured payload onto an [`ExtractedProfile`]. Missing or
/// mistyped sub-objects yield absent fields instead of an error.
pub fn profile_from_payload(data: &Value) -> ExtractedProfile {
    let text = |section: &str, key: &str| {
        data.get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    ExtractedProfile {
        full_name: text("personal", "full_name"),
        email: text("personal", "email"),
        phone: text("personal", "phone"),
        qualification: text("education", "highest_qualification"),
        branch: text("education", "branch_or_major"),
        skills: string_list(data.get("skills")),
        employment_status: Some(EmploymentStatus::from_extracted(
            data.get("employment")
                .and_then(|e| e.get("status"))
                .and_then(|s| s.as_str()),
        )),
        warnings: string_list(data.get("warnings")),
    }
}

pub(crate) fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect()
    })
}
