//! Board application context
//!
//! [`Board`] owns everything a running session needs: the stage registry,
//! the session manager, the deal store and the active stage tab. It is
//! created at startup and dropped at exit. Mutating methods take
//! `&mut self`, so at most one board operation is in flight at a time.

use crate::abstractions::{DealPersistence, Identity, IdentityProvider};
use crate::board::{Deal, DealDraft, DealField, DealId, DealStore, StageFilter, StageRegistry};
use crate::error::{BoardError, BoardResult};
use crate::session::{SessionManager, SessionState};
use std::sync::Arc;
use tracing::info;

/// A signed-in user's view of the deal pipeline
pub struct Board {
    registry: Arc<StageRegistry>,
    session: SessionManager,
    store: DealStore,
    active: StageFilter,
}

impl Board {
    pub fn new(
        registry: StageRegistry,
        identity: Arc<dyn IdentityProvider>,
        persistence: Arc<dyn DealPersistence>,
    ) -> Self {
        let registry = Arc::new(registry);
        Self {
            store: DealStore::new(persistence, registry.clone()),
            session: SessionManager::new(identity),
            registry,
            active: StageFilter::All,
        }
    }

    /// Resolve the session and, when already signed in, load the board
    pub async fn start(&mut self) -> BoardResult<&SessionState> {
        if self.session.restore().await.is_signed_in() {
            self.store.load().await?;
        }
        Ok(self.session.state())
    }

    /// Sign in and perform the initial load.
    ///
    /// If the credentials are accepted but the load fails, the session stays
    /// signed in and the load error is returned; `reload` can retry it.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> BoardResult<Identity> {
        let identity = self.session.sign_in(email, password).await?;
        self.store.load().await?;
        info!(
            "Board ready for {} with {} deals",
            identity.display_name(),
            self.store.len()
        );
        Ok(identity)
    }

    /// Re-fetch every deal from the remote store
    pub async fn reload(&mut self) -> BoardResult<usize> {
        self.session.require_identity()?;
        self.store.load().await
    }

    pub async fn add_deal(&mut self, draft: DealDraft) -> BoardResult<Vec<DealId>> {
        self.session.require_identity()?;
        self.store.add_deal(draft).await
    }

    pub async fn update_field(
        &mut self,
        id: &DealId,
        field: DealField,
        value: impl Into<String>,
    ) -> BoardResult<()> {
        self.session.require_identity()?;
        self.store.update_field(id, field, value).await
    }

    pub async fn delete_deal(&mut self, id: &DealId) -> BoardResult<()> {
        self.session.require_identity()?;
        self.store.delete_deal(id).await
    }

    /// Empty draft placed in the first pipeline stage
    pub fn draft(&self, company: impl Into<String>) -> DealDraft {
        DealDraft::new(company, self.registry.first())
    }

    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// All deals in stage order; empty until signed in and loaded
    pub fn deals(&self) -> BoardResult<&[Deal]> {
        self.ensure_readable()?;
        Ok(self.store.deals())
    }

    pub fn active_stage(&self) -> &StageFilter {
        &self.active
    }

    pub fn set_active_stage(&mut self, active: StageFilter) {
        self.active = active;
    }

    /// Deals under the active stage tab
    pub fn visible(&self) -> BoardResult<Vec<&Deal>> {
        self.ensure_readable()?;
        Ok(self.store.view(&self.active))
    }

    fn ensure_readable(&self) -> BoardResult<()> {
        self.session.require_identity()?;
        if self.store.is_loaded() {
            Ok(())
        } else {
            Err(BoardError::NotLoaded)
        }
    }
}
