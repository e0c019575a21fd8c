/// Offline adapter: accepts PDFs only and answers with a fixed sample
/// record. No network call is made.
use async_trait::async_trait;
use tracing::debug;

use crate::extract::{ExtractError, ExtractProfile, ResumeFile};
use crate::models::profile::{EmploymentStatus, ExtractedProfile};

pub const PDF_ONLY_MESSAGE: &str = "Please upload a PDF resume for this demo.";

#[derive(Debug, Clone, Copy, Default)]
pub struct MockExtractor;

/// The record every accepted upload resolves to.
pub fn sample_profile() -> ExtractedProfile {
    ExtractedProfile {
        full_name: Some("Priya Sharma".into()),
        email: Some("priya.sharma@example.com".into()),
        phone: Some("+91 98765 43210".into()),
        qualification: Some("B.Tech".into()),
        branch: Some("Computer Science and Engineering".into()),
        skills: Some(vec![
            "Python".into(),
            "SQL".into(),
            "Data Analysis".into(),
            "Communication".into(),
        ]),
        employment_status: Some(EmploymentStatus::Fresher),
        warnings: None,
    }
}

#[async_trait]
impl ExtractProfile for MockExtractor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn accepts(&self, file: &ResumeFile) -> Result<(), ExtractError> {
        if !file.is_pdf() {
            return Err(ExtractError::Validation(PDF_ONLY_MESSAGE.to_string()));
        }
        Ok(())
    }

    async fn extract(&self, file: &ResumeFile) -> Result<ExtractedProfile, ExtractError> {
        self.accepts(file)?;
        debug!("Simulating extraction for {}", file.file_name);
        Ok(sample_profile())
    }
}
