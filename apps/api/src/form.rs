use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::profile::{EmploymentStatus, ExtractedProfile, ProfileMeta, StoredProfile};

/// Identifiers of the editable registration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    FullName,
    Email,
    Phone,
    Qualification,
    Branch,
    Skills,
    EmploymentStatus,
}

impl FieldId {
    /// Fields filled by every extraction, in form order.
    pub const MAPPED: [FieldId; 7] = [
        FieldId::FullName,
        FieldId::Email,
        FieldId::Phone,
        FieldId::Qualification,
        FieldId::Branch,
        FieldId::Skills,
        FieldId::EmploymentStatus,
    ];

    pub const REQUIRED: [FieldId; 5] = [
        FieldId::FullName,
        FieldId::Email,
        FieldId::Phone,
        FieldId::Qualification,
        FieldId::Branch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FieldId::FullName => "Full Name",
            FieldId::Email => "Email",
            FieldId::Phone => "Phone",
            FieldId::Qualification => "Highest Qualification",
            FieldId::Branch => "Branch / Specialization",
            FieldId::Skills => "Skills",
            FieldId::EmploymentStatus => "Employment Status",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Please fill in: {}", .0.iter().map(|f| f.label()).collect::<Vec<_>>().join(", "))]
    MissingFields(Vec<FieldId>),

    #[error("Employment status must be Fresher or Experienced, got '{0}'")]
    InvalidEmploymentStatus(String),
}

/// Editable mirror of the registration form.
///
/// `auto_filled` drives highlighting only; it is replaced wholesale by each
/// extraction and left alone by manual edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub qualification: String,
    pub branch: String,
    /// Free text, comma separated.
    pub skills: String,
    pub employment_status: EmploymentStatus,
    pub auto_filled: BTreeSet<FieldId>,
}

impl FormState {
    pub fn value(&self, field: FieldId) -> String {
        match field {
            FieldId::FullName => self.full_name.clone(),
            FieldId::Email => self.email.clone(),
            FieldId::Phone => self.phone.clone(),
            FieldId::Qualification => self.qualification.clone(),
            FieldId::Branch => self.branch.clone(),
            FieldId::Skills => self.skills.clone(),
            FieldId::EmploymentStatus => self.employment_status.to_string(),
        }
    }
}

/// Overwrites every mapped field from `profile`. Absent values become empty
/// strings; an absent employment status falls back to Fresher. Nothing of
/// the previous state survives, hand edits included.
pub fn apply_extracted(_state: FormState, profile: &ExtractedProfile) -> FormState {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    FormState {
        full_name: text(&profile.full_name),
        email: text(&profile.email),
        phone: text(&profile.phone),
        qualification: text(&profile.qualification),
        branch: text(&profile.branch),
        skills: profile
            .skills
            .as_ref()
            .map(|s| s.join(", "))
            .unwrap_or_default(),
        employment_status: profile.employment_status.unwrap_or_default(),
        auto_filled: FieldId::MAPPED.into_iter().collect(),
    }
}

/// A single manual edit. The auto-filled markers are not touched.
pub fn edit(mut state: FormState, field: FieldId, value: &str) -> Result<FormState, FormError> {
    match field {
        FieldId::FullName => state.full_name = value.to_string(),
        FieldId::Email => state.email = value.to_string(),
        FieldId::Phone => state.phone = value.to_string(),
        FieldId::Qualification => state.qualification = value.to_string(),
        FieldId::Branch => state.branch = value.to_string(),
        FieldId::Skills => state.skills = value.to_string(),
        FieldId::EmploymentStatus => {
            state.employment_status = EmploymentStatus::parse(value)
                .ok_or_else(|| FormError::InvalidEmploymentStatus(value.to_string()))?;
        }
    }
    Ok(state)
}

/// Splits comma separated skills, trimming each token and dropping empties.
pub fn parse_skills(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validates required fields and assembles the profile to store.
pub fn submit(
    state: &FormState,
    resume_file_name: Option<&str>,
) -> Result<StoredProfile, FormError> {
    let missing: Vec<FieldId> = FieldId::REQUIRED
        .into_iter()
        .filter(|f| state.value(*f).is_empty())
        .collect();
    if !missing.is_empty() {
        return Err(FormError::MissingFields(missing));
    }

    Ok(StoredProfile {
        full_name: state.full_name.clone(),
        email: state.email.clone(),
        phone: state.phone.clone(),
        qualification: state.qualification.clone(),
        branch: state.branch.clone(),
        skills: parse_skills(&state.skills),
        employment_status: state.employment_status,
        meta: ProfileMeta {
            resume_file_name: resume_file_name.map(String::from),
        },
    })
}
