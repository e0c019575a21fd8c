/// Resume extraction adapters.
///
/// Every adapter turns a user-selected resume into an [`ExtractedProfile`].
/// Which adapter is active is decided once at startup from `EXTRACTOR_MODE`;
/// the two backend contracts are kept as separate adapters and never merged.
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::{Config, ExtractorMode};
use crate::models::profile::{ExtractedProfile, StoredProfile};

pub mod legacy;
pub mod mock;
pub mod remote;

pub use legacy::LegacyExtractor;
pub use mock::MockExtractor;
pub use remote::RemoteExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file was rejected before any work happened.
    #[error("{0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but reported failure.
    #[error("{0}")]
    Service(String),

    #[error("No text extracted from resume.")]
    EmptyText,

    #[error("Publishing profiles is not supported by the {0} extractor")]
    Unsupported(&'static str),
}

/// A resume as selected by the user. Only the bytes travel to the
/// extractor; the name is kept as metadata.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        let by_name = self.file_name.to_ascii_lowercase().ends_with(".pdf");
        let by_type = self
            .content_type
            .as_deref()
            .map(|ct| ct.eq_ignore_ascii_case("application/pdf"))
            .unwrap_or(false);
        by_name || by_type
    }

    /// MIME type to send upstream when the client did not provide one.
    pub fn mime(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}

#[async_trait]
pub trait ExtractProfile: Send + Sync {
    /// Short name of the active contract, reported on the landing step.
    fn name(&self) -> &'static str;

    /// Cheap pre-flight check run before any state changes.
    fn accepts(&self, _file: &ResumeFile) -> Result<(), ExtractError> {
        Ok(())
    }

    async fn extract(&self, file: &ResumeFile) -> Result<ExtractedProfile, ExtractError>;

    /// Forwards a finalized profile to the backend. Only the legacy
    /// contract has an endpoint for this.
    async fn publish(&self, _profile: &StoredProfile) -> Result<(), ExtractError> {
        Err(ExtractError::Unsupported(self.name()))
    }
}

pub fn build_extractor(config: &Config) -> Arc<dyn ExtractProfile> {
    match config.extractor_mode {
        ExtractorMode::Remote => Arc::new(RemoteExtractor::new(config.extractor_base_url.clone())),
        ExtractorMode::Legacy => Arc::new(LegacyExtractor::new(config.extractor_base_url.clone())),
        ExtractorMode::Mock => Arc::new(MockExtractor),
    }
}

/// Pulls an `error` string out of a service response body, if there is one.
pub(crate) fn service_error(body: &serde_json::Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
