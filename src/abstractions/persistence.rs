//! Remote persistence abstraction layer
//!
//! Record-level access to the table backing the board. The board never
//! talks to a backend directly; it goes through [`DealPersistence`] so tests
//! can script failures.

use crate::board::{Deal, DealDraft, DealField, DealId};
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Trait for the remote store holding deal records
#[async_trait]
pub trait DealPersistence: Send + Sync {
    /// Fetch every record
    async fn list(&self) -> RemoteResult<Vec<Deal>>;

    /// Persist a new record, returning what the store saved
    async fn insert(&self, draft: &DealDraft) -> RemoteResult<Vec<Deal>>;

    /// Patch a single field; `None` writes null
    async fn update(&self, id: &DealId, field: DealField, value: Option<&str>)
        -> RemoteResult<()>;

    /// Remove a record
    async fn delete(&self, id: &DealId) -> RemoteResult<()>;
}

/// Kind of remote call, used to script mock failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistenceOp {
    List,
    Insert,
    Update,
    Delete,
}

/// A call observed by [`MockDealPersistence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceCall {
    List,
    Insert(DealDraft),
    Update {
        id: DealId,
        field: DealField,
        value: Option<String>,
    },
    Delete(DealId),
}

/// Mock implementation of DealPersistence for testing
///
/// Behaves like a tiny table: inserts get sequential integer ids and a
/// fresh `last_updated`. Any call can be made to fail once with
/// [`MockDealPersistence::fail_next`].
pub struct MockDealPersistence {
    /// Rows as the remote store sees them
    pub records: Arc<Mutex<Vec<Deal>>>,
    /// Scripted failures, consumed in order per operation
    failures: Arc<Mutex<HashMap<PersistenceOp, VecDeque<String>>>>,
    /// Track calls for verification
    pub called: Arc<Mutex<Vec<PersistenceCall>>>,
    next_id: AtomicI64,
}

impl MockDealPersistence {
    /// Create an empty mock table
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a mock table pre-populated with rows, in fetch order
    pub fn with_records(records: Vec<Deal>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|d| d.id.as_str().parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            records: Arc::new(Mutex::new(records)),
            failures: Arc::new(Mutex::new(HashMap::new())),
            called: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicI64::new(next_id),
        }
    }

    /// Make the next call of `op` fail with `message`
    pub async fn fail_next(&self, op: PersistenceOp, message: &str) {
        self.failures
            .lock()
            .await
            .entry(op)
            .or_default()
            .push_back(message.to_string());
    }

    /// Id the next insert will be assigned
    pub fn set_next_id(&self, id: i64) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    /// Get the list of observed calls
    pub async fn get_calls(&self) -> Vec<PersistenceCall> {
        self.called.lock().await.clone()
    }

    /// Snapshot of the remote rows
    pub async fn snapshot(&self) -> Vec<Deal> {
        self.records.lock().await.clone()
    }

    async fn record(&self, op: PersistenceOp, call: PersistenceCall) -> RemoteResult<()> {
        self.called.lock().await.push(call);
        let mut failures = self.failures.lock().await;
        match failures.get_mut(&op).and_then(|queue| queue.pop_front()) {
            Some(message) => Err(RemoteError::status(500, message)),
            None => Ok(()),
        }
    }
}

impl Default for MockDealPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DealPersistence for MockDealPersistence {
    async fn list(&self) -> RemoteResult<Vec<Deal>> {
        self.record(PersistenceOp::List, PersistenceCall::List).await?;
        Ok(self.records.lock().await.clone())
    }

    async fn insert(&self, draft: &DealDraft) -> RemoteResult<Vec<Deal>> {
        self.record(PersistenceOp::Insert, PersistenceCall::Insert(draft.clone()))
            .await?;

        let deal = Deal {
            id: DealId::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
            company: draft.company.clone(),
            stage: draft.stage.clone(),
            sourcer: draft.sourcer.clone(),
            partner: draft.partner.clone(),
            notes: draft.notes.clone(),
            last_updated: Some(Utc::now()),
        };
        self.records.lock().await.push(deal.clone());
        Ok(vec![deal])
    }

    async fn update(
        &self,
        id: &DealId,
        field: DealField,
        value: Option<&str>,
    ) -> RemoteResult<()> {
        self.record(
            PersistenceOp::Update,
            PersistenceCall::Update {
                id: id.clone(),
                field,
                value: value.map(str::to_string),
            },
        )
        .await?;

        // A filter matching no rows is still a successful patch
        if let Some(row) = self.records.lock().await.iter_mut().find(|d| d.id == *id) {
            row.set_field(field, value.map(str::to_string));
            row.last_updated = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: &DealId) -> RemoteResult<()> {
        self.record(PersistenceOp::Delete, PersistenceCall::Delete(id.clone()))
            .await?;
        self.records.lock().await.retain(|d| d.id != *id);
        Ok(())
    }
}
