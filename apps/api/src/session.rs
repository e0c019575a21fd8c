/// Wizard sessions: one per browser tab, holding the registration form
/// between requests.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ExtractProfile, ResumeFile};
use crate::form::{self, FieldId, FormState};
use crate::models::profile::{ExtractedProfile, StoredProfile};
use crate::transfer::ProfileTransferStore;

#[derive(Debug, Clone)]
pub struct WizardSession {
    pub form: FormState,
    pub resume_file_name: Option<String>,
    /// Uploads currently awaiting the extractor.
    pub in_flight: u32,
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Last request that touched this session.
    pub last_seen: Instant,
}

impl WizardSession {
    fn new() -> Self {
        Self {
            form: FormState::default(),
            resume_file_name: None,
            in_flight: 0,
            error_message: None,
            warnings: Vec::new(),
            created_at: Utc::now(),
            last_seen: Instant::now(),
        }
    }

    /// Idle past `ttl` with no upload pending.
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.in_flight == 0 && now.duration_since(self.last_seen) >= ttl
    }
}

/// What the registration step renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub session_id: Uuid,
    pub form: FormState,
    pub resume_file_name: Option<String>,
    pub loading: bool,
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FormView {
    fn of(id: Uuid, session: &WizardSession) -> Self {
        Self {
            session_id: id,
            form: session.form.clone(),
            resume_file_name: session.resume_file_name.clone(),
            loading: session.in_flight > 0,
            error_message: session.error_message.clone(),
            warnings: session.warnings.clone(),
            created_at: session.created_at,
        }
    }
}

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1800);

/// Live wizard sessions. A session idle for longer than `ttl` is dropped.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, WizardSession>>>,
    ttl: Duration,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

/// Looks up a session and marks it as seen.
fn touch(
    sessions: &mut HashMap<Uuid, WizardSession>,
    id: Uuid,
) -> Result<&mut WizardSession, AppError> {
    let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
    session.last_seen = Instant::now();
    Ok(session)
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub async fn create(&self) -> FormView {
        let id = Uuid::new_v4();
        let session = WizardSession::new();
        let view = FormView::of(id, &session);
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        sessions.insert(id, session);
        info!("Started wizard session {id}");
        view
    }

    /// Drops every expired session and returns their ids so the caller
    /// can clear their transfer slots.
    pub async fn evict_expired(&self) -> Vec<Uuid> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(now, self.ttl))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        expired
    }

    pub async fn view(&self, id: Uuid) -> Result<FormView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = touch(&mut sessions, id)?;
        Ok(FormView::of(id, session))
    }

    /// Marks a session as still in use, e.g. while its summary is read.
    pub async fn keep_alive(&self, id: Uuid) {
        let mut sessions = self.sessions.write().await;
        let _ = touch(&mut sessions, id);
    }

    pub async fn exists(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        touch(&mut sessions, id).is_ok()
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    pub async fn edit(&self, id: Uuid, field: FieldId, value: &str) -> Result<FormView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = touch(&mut sessions, id)?;
        session.form = form::edit(session.form.clone(), field, value)?;
        Ok(FormView::of(id, session))
    }

    async fn begin_upload(&self, id: Uuid, file_name: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = touch(&mut sessions, id)?;
        session.resume_file_name = Some(file_name.to_string());
        session.error_message = None;
        session.in_flight += 1;
        Ok(())
    }

    /// Settles one upload. Whichever upload settles last owns the form.
    async fn finish_upload(
        &self,
        id: Uuid,
        outcome: Result<&ExtractedProfile, String>,
    ) -> Result<FormView, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = touch(&mut sessions, id)?;
        session.in_flight = session.in_flight.saturating_sub(1);
        match outcome {
            Ok(profile) => {
                session.form = form::apply_extracted(session.form.clone(), profile);
                session.warnings = profile.warnings.clone().unwrap_or_default();
            }
            Err(message) => session.error_message = Some(message),
        }
        Ok(FormView::of(id, session))
    }

    async fn snapshot(&self, id: Uuid) -> Result<(FormState, Option<String>), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = touch(&mut sessions, id)?;
        Ok((session.form.clone(), session.resume_file_name.clone()))
    }
}

/// Runs the active extractor on `file` and merges the result into the form.
///
/// A file the extractor refuses up front changes nothing. Once the upload
/// starts the loading flag is raised, and it is lowered again on both the
/// success and the failure path.
pub async fn upload_resume(
    sessions: &SessionRegistry,
    extractor: &dyn ExtractProfile,
    transfer: &ProfileTransferStore,
    id: Uuid,
    file: ResumeFile,
) -> Result<FormView, AppError> {
    if !sessions.exists(id).await {
        return Err(not_found(id));
    }
    extractor.accepts(&file)?;

    sessions.begin_upload(id, &file.file_name).await?;
    info!(
        "Extracting {} ({} bytes) with the {} extractor",
        file.file_name,
        file.bytes.len(),
        extractor.name()
    );

    match extractor.extract(&file).await {
        Ok(profile) => {
            if let Err(e) = transfer.save_extracted(&profile).await {
                warn!("Could not keep extracted record for {id}: {e}");
            }
            sessions.finish_upload(id, Ok(&profile)).await
        }
        Err(e) => {
            warn!("Extraction failed for {id}: {e}");
            sessions.finish_upload(id, Err(e.to_string())).await?;
            Err(e.into())
        }
    }
}

/// Validates the form, stores the finalized profile and hands back what
/// the summary step will show.
pub async fn submit_profile(
    sessions: &SessionRegistry,
    transfer: &ProfileTransferStore,
    id: Uuid,
) -> Result<StoredProfile, AppError> {
    let (form_state, file_name) = sessions.snapshot(id).await?;
    let profile = form::submit(&form_state, file_name.as_deref())?;
    transfer.save(&profile).await?;
    info!("Stored profile for session {id}");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorMode;
    use crate::extract::{ExtractError, MockExtractor};
    use crate::models::profile::EmploymentStatus;
    use crate::transfer::{MemoryStore, StorageKeys};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    struct FailingExtractor;

    /// Holds each extraction until its gate is opened.
    struct GatedExtractor {
        gate: Arc<Notify>,
        full_name: &'static str,
    }

    #[async_trait]
    impl ExtractProfile for GatedExtractor {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn extract(&self, _file: &ResumeFile) -> Result<ExtractedProfile, ExtractError> {
            self.gate.notified().await;
            Ok(ExtractedProfile {
                full_name: Some(self.full_name.to_string()),
                ..ExtractedProfile::default()
            })
        }
    }

    fn spawn_gated_upload(
        sessions: &SessionRegistry,
        store: &ProfileTransferStore,
        id: Uuid,
        file_name: &str,
        full_name: &'static str,
    ) -> (Arc<Notify>, JoinHandle<Result<FormView, AppError>>) {
        let gate = Arc::new(Notify::new());
        let extractor = GatedExtractor {
            gate: gate.clone(),
            full_name,
        };
        let sessions = sessions.clone();
        let store = store.clone();
        let file = ResumeFile::new(file_name, None, Bytes::new());
        let task = tokio::spawn(async move {
            upload_resume(&sessions, &extractor, &store, id, file).await
        });
        (gate, task)
    }

    async fn wait_until(sessions: &SessionRegistry, id: Uuid, ready: impl Fn(&FormView) -> bool) {
        for _ in 0..1000 {
            if ready(&sessions.view(id).await.unwrap()) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("session {id} never reached the expected state");
    }

    #[async_trait]
    impl ExtractProfile for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn extract(&self, _file: &ResumeFile) -> Result<ExtractedProfile, ExtractError> {
            Err(ExtractError::Service("Extract failed: 500".into()))
        }
    }

    fn transfer(id: Uuid) -> ProfileTransferStore {
        ProfileTransferStore::new(
            Arc::new(MemoryStore::new()),
            id.to_string(),
            StorageKeys::for_mode(ExtractorMode::Mock),
        )
    }

    fn pdf() -> ResumeFile {
        ResumeFile::new("resume.pdf", Some("application/pdf".into()), Bytes::new())
    }

    #[tokio::test]
    async fn test_upload_populates_form() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;

        let view = upload_resume(&sessions, &MockExtractor, &transfer(id), id, pdf())
            .await
            .unwrap();
        assert_eq!(view.form.full_name, "Priya Sharma");
        assert_eq!(view.form.auto_filled.len(), FieldId::MAPPED.len());
        assert_eq!(view.resume_file_name.as_deref(), Some("resume.pdf"));
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_non_pdf_leaves_state_untouched() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        let before = sessions.view(id).await.unwrap();

        let file = ResumeFile::new("resume.txt", Some("text/plain".into()), Bytes::new());
        let err = upload_resume(&sessions, &MockExtractor, &transfer(id), id, file)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let after = sessions.view(id).await.unwrap();
        assert_eq!(after.form, before.form);
        assert_eq!(after.resume_file_name, None);
        assert!(after.form.auto_filled.is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_records_message_and_clears_loading() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        sessions.edit(id, FieldId::FullName, "Typed by hand").await.unwrap();

        let err = upload_resume(&sessions, &FailingExtractor, &transfer(id), id, pdf())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));

        let view = sessions.view(id).await.unwrap();
        assert!(!view.loading);
        assert_eq!(view.error_message.as_deref(), Some("Extract failed: 500"));
        assert_eq!(view.form.full_name, "Typed by hand");
    }

    #[tokio::test]
    async fn test_submit_stores_profile() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        let store = transfer(id);
        upload_resume(&sessions, &MockExtractor, &store, id, pdf())
            .await
            .unwrap();
        sessions
            .edit(id, FieldId::Skills, "Java, SQL,, Python ")
            .await
            .unwrap();
        sessions
            .edit(id, FieldId::EmploymentStatus, "Experienced")
            .await
            .unwrap();

        let profile = submit_profile(&sessions, &store, id).await.unwrap();
        assert_eq!(profile.skills, vec!["Java", "SQL", "Python"]);
        assert_eq!(profile.employment_status, EmploymentStatus::Experienced);
        assert_eq!(store.load().await, Some(profile));
    }

    #[tokio::test]
    async fn test_submit_with_missing_fields_stores_nothing() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        let store = transfer(id);

        let err = submit_profile(&sessions, &store, id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let sessions = SessionRegistry::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            sessions.view(id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            sessions.remove(id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_loading_is_set_while_upload_is_pending() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        let store = transfer(id);

        let (gate, task) = spawn_gated_upload(&sessions, &store, id, "a.pdf", "Slow Upload");
        wait_until(&sessions, id, |v| v.loading).await;
        assert_eq!(sessions.view(id).await.unwrap().form.full_name, "");

        gate.notify_one();
        let view = task.await.unwrap().unwrap();
        assert!(!view.loading);
        assert_eq!(view.form.full_name, "Slow Upload");
        assert!(!sessions.view(id).await.unwrap().loading);
    }

    #[tokio::test]
    async fn test_overlapping_uploads_later_resolution_wins() {
        let sessions = SessionRegistry::new();
        let id = sessions.create().await.session_id;
        let store = transfer(id);

        let (first_gate, first) = spawn_gated_upload(&sessions, &store, id, "first.pdf", "First");
        wait_until(&sessions, id, |v| v.loading).await;
        let (second_gate, second) =
            spawn_gated_upload(&sessions, &store, id, "second.pdf", "Second");
        wait_until(&sessions, id, |v| {
            v.resume_file_name.as_deref() == Some("second.pdf")
        })
        .await;

        // The second upload settles first; the first is still pending.
        second_gate.notify_one();
        second.await.unwrap().unwrap();
        let view = sessions.view(id).await.unwrap();
        assert!(view.loading);
        assert_eq!(view.form.full_name, "Second");

        first_gate.notify_one();
        first.await.unwrap().unwrap();
        let view = sessions.view(id).await.unwrap();
        assert!(!view.loading);
        assert_eq!(view.form.full_name, "First");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let sessions = SessionRegistry::with_ttl(Duration::from_secs(60));
        let idle = sessions.create().await.session_id;
        let active = sessions.create().await.session_id;

        tokio::time::advance(Duration::from_secs(45)).await;
        sessions.view(active).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(sessions.evict_expired().await, vec![idle]);
        assert!(matches!(
            sessions.view(idle).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(sessions.view(active).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_drops_expired_sessions() {
        let sessions = SessionRegistry::with_ttl(Duration::from_secs(60));
        let mut abandoned = Vec::new();
        for _ in 0..100 {
            abandoned.push(sessions.create().await.session_id);
        }

        tokio::time::advance(Duration::from_secs(61)).await;
        sessions.create().await;

        assert!(sessions.evict_expired().await.is_empty());
        assert!(!sessions.exists(abandoned[0]).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_upload_keeps_session_alive() {
        let sessions = SessionRegistry::with_ttl(Duration::from_secs(60));
        let id = sessions.create().await.session_id;
        let store = transfer(id);

        let (gate, task) = spawn_gated_upload(&sessions, &store, id, "a.pdf", "Slow Upload");
        wait_until(&sessions, id, |v| v.loading).await;
        tokio::time::advance(Duration::from_secs(120)).await;

        assert!(sessions.evict_expired().await.is_empty());
        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap().form.full_name, "Slow Upload");
    }
}
