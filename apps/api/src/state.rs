use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::extract::ExtractProfile;
use crate::session::SessionRegistry;
use crate::transfer::{KvStore, ProfileTransferStore, StorageKeys};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The one extraction contract chosen at startup.
    pub extractor: Arc<dyn ExtractProfile>,
    /// Backing slots for the profile handed from the form to the summary.
    pub kv: Arc<dyn KvStore>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// The transfer store scoped to one wizard session.
    pub fn transfer(&self, session_id: Uuid) -> ProfileTransferStore {
        ProfileTransferStore::new(
            self.kv.clone(),
            session_id.to_string(),
            StorageKeys::for_mode(self.config.extractor_mode),
        )
    }

    /// Drops idle sessions together with their transfer slots.
    pub async fn evict_expired_sessions(&self) -> usize {
        let expired = self.sessions.evict_expired().await;
        for id in &expired {
            if let Err(e) = self.transfer(*id).clear().await {
                warn!("Could not clear transfer slots for expired session {id}: {e}");
            }
        }
        if !expired.is_empty() {
            info!("Evicted {} expired wizard sessions", expired.len());
        }
        expired.len()
    }
}
