use serde::{Deserialize, Serialize};

/// Employment status as presented on the registration form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentStatus {
    #[default]
    Fresher,
    Experienced,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Fresher => "Fresher",
            EmploymentStatus::Experienced => "Experienced",
        }
    }

    /// Lenient mapping used for extractor output: only an exact
    /// "Experienced" counts, everything else is a fresher.
    pub fn from_extracted(raw: Option<&str>) -> Self {
        match raw {
            Some("Experienced") => EmploymentStatus::Experienced,
            _ => EmploymentStatus::Fresher,
        }
    }

    /// Strict parse for user edits.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Fresher" => Some(EmploymentStatus::Fresher),
            "Experienced" => Some(EmploymentStatus::Experienced),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort result of resume extraction. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub qualification: Option<String>,
    pub branch: Option<String>,
    pub skills: Option<Vec<String>>,
    pub employment_status: Option<EmploymentStatus>,
    pub warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMeta {
    pub resume_file_name: Option<String>,
}

/// The finalized profile written at submission and read by the summary step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub qualification: String,
    pub branch: String,
    pub skills: Vec<String>,
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub meta: ProfileMeta,
}
