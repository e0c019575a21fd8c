/// Hands the submitted profile from the registration step to the summary
/// step through a session-scoped key-value slot.
use std::sync::Arc;

use tracing::warn;

use crate::config::ExtractorMode;
use crate::models::profile::{ExtractedProfile, StoredProfile};

pub mod store;

pub use store::{KvStore, MemoryStore, RedisStore, StoreError};

pub const PROFILE_KEY: &str = "demoJobseekerProfile";
pub const LEGACY_EXTRACTED_KEY: &str = "profileData";
pub const LEGACY_PROFILE_KEY: &str = "finalProfile";

const EXPORT_TITLE: &str = "Jobseeker Profile – Demo Export";

/// Slot names, which differ between the current and legacy contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageKeys {
    pub profile: &'static str,
    pub extracted: Option<&'static str>,
}

impl StorageKeys {
    pub fn for_mode(mode: ExtractorMode) -> Self {
        match mode {
            ExtractorMode::Legacy => StorageKeys {
                profile: LEGACY_PROFILE_KEY,
                extracted: Some(LEGACY_EXTRACTED_KEY),
            },
            ExtractorMode::Remote | ExtractorMode::Mock => StorageKeys {
                profile: PROFILE_KEY,
                extracted: None,
            },
        }
    }
}

/// One session's view of the transfer slots.
#[derive(Clone)]
pub struct ProfileTransferStore {
    kv: Arc<dyn KvStore>,
    scope: String,
    keys: StorageKeys,
}

impl ProfileTransferStore {
    pub fn new(kv: Arc<dyn KvStore>, scope: impl Into<String>, keys: StorageKeys) -> Self {
        Self {
            kv,
            scope: scope.into(),
            keys,
        }
    }

    fn slot(&self, key: &str) -> String {
        format!("session:{}:{}", self.scope, key)
    }

    /// Overwrites the slot with `profile`.
    pub async fn save(&self, profile: &StoredProfile) -> Result<(), StoreError> {
        let raw = serde_json::to_string(profile)?;
        self.kv.set(&self.slot(self.keys.profile), raw).await
    }

    /// Reads the slot. Absence, a backend failure and unparseable content
    /// all come back as `None`.
    pub async fn load(&self) -> Option<StoredProfile> {
        let raw = match self.kv.get(&self.slot(self.keys.profile)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Could not read stored profile for {}: {e}", self.scope);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Ignoring unparseable stored profile for {}: {e}", self.scope);
                None
            }
        }
    }

    /// Keeps the raw extraction result around where the contract expects it.
    pub async fn save_extracted(&self, profile: &ExtractedProfile) -> Result<(), StoreError> {
        let Some(key) = self.keys.extracted else {
            return Ok(());
        };
        let raw = serde_json::to_string(profile)?;
        self.kv.set(&self.slot(key), raw).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.kv.clear(&self.slot(self.keys.profile)).await?;
        if let Some(key) = self.keys.extracted {
            self.kv.clear(&self.slot(key)).await?;
        }
        Ok(())
    }
}

/// Copy-ready text for pasting into another registration system. The
/// line order is fixed.
pub fn export_text(profile: &StoredProfile) -> String {
    let mut lines = vec![
        EXPORT_TITLE.to_string(),
        String::new(),
        format!("Full Name: {}", profile.full_name),
        format!("Email: {}", profile.email),
        format!("Phone: {}", profile.phone),
        String::new(),
        format!("Highest Qualification: {}", profile.qualification),
        format!("Branch / Specialization: {}", profile.branch),
        String::new(),
        format!("Employment Status: {}", profile.employment_status),
        String::new(),
        "Skills:".to_string(),
    ];

    if profile.skills.is_empty() {
        lines.push("- (not specified)".to_string());
    } else {
        lines.extend(profile.skills.iter().map(|s| format!("- {s}")));
    }

    if let Some(name) = profile
        .meta
        .resume_file_name
        .as_deref()
        .filter(|n| !n.is_empty())
    {
        lines.push(String::new());
        lines.push(format!("Sample resume file used in demo: {name}"));
    }

    lines.join("\n")
}
