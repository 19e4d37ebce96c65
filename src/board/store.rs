//! Write-through deal store
//!
//! The store is the single source of truth for what the board shows. Every
//! mutation goes to the remote service first; the local collection only
//! changes after the service acknowledges, and is re-sorted by stage right
//! after. A failed remote call leaves the collection exactly as it was and
//! hands the failure back to the caller.

use super::{filter, Deal, DealDraft, DealField, DealId, StageFilter, StageRegistry};
use crate::abstractions::DealPersistence;
use crate::error::{BoardError, BoardResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stage-ordered, write-through collection of deals
pub struct DealStore {
    persistence: Arc<dyn DealPersistence>,
    registry: Arc<StageRegistry>,
    deals: Vec<Deal>,
    loaded: bool,
}

impl DealStore {
    /// Create an empty, not-yet-loaded store
    pub fn new(persistence: Arc<dyn DealPersistence>, registry: Arc<StageRegistry>) -> Self {
        Self {
            persistence,
            registry,
            deals: Vec::new(),
            loaded: false,
        }
    }

    /// Deals in stage order
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn get(&self, id: &DealId) -> Option<&Deal> {
        self.deals.iter().find(|d| d.id == *id)
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Whether a `load()` has completed successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Deals visible under the given stage tab
    pub fn view(&self, active: &StageFilter) -> Vec<&Deal> {
        filter(&self.deals, active)
    }

    /// Replace the local collection with everything the remote store holds.
    ///
    /// Returns the number of deals loaded.
    pub async fn load(&mut self) -> BoardResult<usize> {
        debug!("Fetching deals from remote store");
        let fetched = match self.persistence.list().await {
            Ok(deals) => deals,
            Err(e) => {
                error!("Failed to load deals: {}", e);
                return Err(e.into());
            }
        };

        let mut seen = HashSet::new();
        let mut deals = Vec::with_capacity(fetched.len());
        for deal in fetched {
            if seen.insert(deal.id.clone()) {
                self.warn_if_unknown_stage(&deal);
                deals.push(deal);
            } else {
                warn!("Remote store returned deal {} more than once, keeping the first", deal.id);
            }
        }

        self.deals = deals;
        self.sort();
        self.loaded = true;
        info!("Loaded {} deals", self.deals.len());
        Ok(self.deals.len())
    }

    /// Persist a new deal and add what the store saved to the board.
    ///
    /// Returns the ids the remote store assigned.
    pub async fn add_deal(&mut self, draft: DealDraft) -> BoardResult<Vec<DealId>> {
        self.ensure_loaded()?;

        debug!("Inserting deal for {}", draft.company);
        let saved = match self.persistence.insert(&draft).await {
            Ok(saved) => saved,
            Err(e) => {
                error!("Failed to add deal for {}: {}", draft.company, e);
                return Err(e.into());
            }
        };

        let mut ids = HashSet::new();
        for deal in &saved {
            if self.get(&deal.id).is_some() || !ids.insert(deal.id.clone()) {
                error!("Remote store returned duplicate deal id {}", deal.id);
                return Err(BoardError::DuplicateDeal(deal.id.clone()));
            }
        }

        let added: Vec<DealId> = saved.iter().map(|d| d.id.clone()).collect();
        for deal in saved {
            self.warn_if_unknown_stage(&deal);
            info!("Added deal {} ({}) at {}", deal.id, deal.company, deal.stage);
            self.deals.push(deal);
        }
        self.sort();
        Ok(added)
    }

    /// Change one field of one deal.
    ///
    /// Empty input clears `sourcer`, `partner` and `notes`.
    pub async fn update_field(
        &mut self,
        id: &DealId,
        field: DealField,
        value: impl Into<String>,
    ) -> BoardResult<()> {
        self.ensure_loaded()?;
        if self.get(id).is_none() {
            return Err(BoardError::DealNotFound(id.clone()));
        }

        let value = field.normalize(value.into());
        debug!("Updating {} on deal {}", field, id);
        if let Err(e) = self.persistence.update(id, field, value.as_deref()).await {
            error!("Failed to update {} on deal {}: {}", field, id, e);
            return Err(e.into());
        }

        if let Some(deal) = self.deals.iter_mut().find(|d| d.id == *id) {
            deal.set_field(field, value);
        }
        if field == DealField::Stage {
            if let Some(deal) = self.get(id) {
                self.warn_if_unknown_stage(deal);
            }
        }
        self.sort();
        info!("Updated {} on deal {}", field, id);
        Ok(())
    }

    /// Remove a deal from the remote store and then from the board
    pub async fn delete_deal(&mut self, id: &DealId) -> BoardResult<()> {
        self.ensure_loaded()?;
        if self.get(id).is_none() {
            return Err(BoardError::DealNotFound(id.clone()));
        }

        debug!("Deleting deal {}", id);
        if let Err(e) = self.persistence.delete(id).await {
            error!("Failed to delete deal {}: {}", id, e);
            return Err(e.into());
        }

        self.deals.retain(|d| d.id != *id);
        info!("Deleted deal {}", id);
        Ok(())
    }

    fn ensure_loaded(&self) -> BoardResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(BoardError::NotLoaded)
        }
    }

    /// Stable sort by registry position; equal stages keep their order
    fn sort(&mut self) {
        let registry = &self.registry;
        self.deals.sort_by_key(|deal| registry.index_of(&deal.stage));
    }

    fn warn_if_unknown_stage(&self, deal: &Deal) {
        if !self.registry.contains(&deal.stage) {
            warn!(
                "Deal {} has unrecognized stage '{}', placing it ahead of all stages",
                deal.id, deal.stage
            );
        }
    }
}
