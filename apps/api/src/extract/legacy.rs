/// Adapter for the older single-endpoint backend: the raw file goes to
/// `POST /upload` as field `resume` and the flat record comes straight back.
/// Finalized profiles are forwarded to `POST /profile`.
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::remote::string_list;
use crate::extract::{service_error, ExtractError, ExtractProfile, ResumeFile};
use crate::models::profile::{EmploymentStatus, ExtractedProfile, StoredProfile};

#[derive(Clone)]
pub struct LegacyExtractor {
    client: Client,
    base_url: String,
}

/// Body for `POST /profile`, in the nested shape the old backend stores.
#[derive(Debug, Serialize)]
struct LegacyProfile<'a> {
    personal: LegacyPersonal<'a>,
    education: LegacyEducation<'a>,
    skills: &'a [String],
    employment: &'a str,
}

#[derive(Debug, Serialize)]
struct LegacyPersonal<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct LegacyEducation<'a> {
    degree: &'a str,
    branch: &'a str,
    year: &'a str,
}

impl LegacyExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ExtractProfile for LegacyExtractor {
    fn name(&self) -> &'static str {
        "legacy"
    }

    async fn extract(&self, file: &ResumeFile) -> Result<ExtractedProfile, ExtractError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(file.mime())?;
        let form = multipart::Form::new().part("resume", part);

        debug!("Uploading {} to legacy {}/upload", file.file_name, self.base_url);
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            warn!("Legacy upload returned {status}");
            let message = parsed.as_ref().and_then(service_error);
            return Err(ExtractError::Service(
                message.unwrap_or_else(|| format!("Upload failed: {}", status.as_u16())),
            ));
        }

        let record = parsed
            .ok_or_else(|| ExtractError::Service("Upload returned a malformed response".into()))?;
        Ok(profile_from_flat(&record))
    }

    async fn publish(&self, profile: &StoredProfile) -> Result<(), ExtractError> {
        let body = LegacyProfile {
            personal: LegacyPersonal {
                name: &profile.full_name,
                email: &profile.email,
                phone: &profile.phone,
            },
            education: LegacyEducation {
                degree: &profile.qualification,
                branch: &profile.branch,
                year: "",
            },
            skills: &profile.skills,
            employment: profile.employment_status.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/profile", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Legacy profile publish returned {status}");
            return Err(ExtractError::Service(format!(
                "Profile submission failed: {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

/// Maps the flat legacy record. `education.year` has no form field and is
/// dropped.
pub fn profile_from_flat(record: &Value) -> ExtractedProfile {
    let text = |section: &str, key: &str| {
        record
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    ExtractedProfile {
        full_name: text("personal", "name"),
        email: text("personal", "email"),
        phone: text("personal", "phone"),
        qualification: text("education", "degree"),
        branch: text("education", "branch"),
        skills: string_list(record.get("skills")),
        employment_status: Some(EmploymentStatus::from_extracted(
            record.get("employment").and_then(|e| e.as_str()),
        )),
        warnings: None,
    }
}
