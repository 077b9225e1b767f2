//! Pull/push reconciliation engine.
//!
//! The engine sequences one sync session: pull the full server snapshot into
//! the local store, then push dirty local rows back. The two phases never
//! overlap and are never wrapped in one transaction; a crash between them
//! leaves pulled data durable and push safely re-triggerable. Callers must
//! serialize invocations; the engine assumes a single in-process caller.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::models::{Invoice, InvoiceItemWithProduct, Product};
use crate::sync::{
    DeviceIdentityProvider, InvoiceDto, ProductDto, PushRequest, PushResponse, SyncEngineStatus,
    SyncSnapshot,
};

/// Counts reported by one pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSummary {
    pub products_applied: usize,
    pub invoices_applied: usize,
}

/// Result of applying a snapshot, including which local rows the pull
/// touched so the orchestrator can exclude them from the push that follows
/// in the same session. The staleness window alone would usually exclude
/// them, but the exclusion set makes it structural rather than clock-dependent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    pub products_applied: usize,
    pub invoices_applied: usize,
    pub touched_product_ids: Vec<i32>,
    pub touched_invoice_ids: Vec<i32>,
}

impl PullOutcome {
    pub fn summary(&self) -> PullSummary {
        PullSummary {
            products_applied: self.products_applied,
            invoices_applied: self.invoices_applied,
        }
    }
}

/// Counts for one full pull-then-push session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub pulled: usize,
    pub pushed: usize,
}

/// Rows excluded from dirty selection because the preceding pull already
/// reconciled them to server truth.
#[derive(Debug, Clone, Default)]
pub struct PushExclusions {
    pub product_ids: Vec<i32>,
    pub invoice_ids: Vec<i32>,
}

/// Local-store capability consumed by the engine. Every multi-row mutation
/// behind these methods runs inside one scoped transaction.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Merge a full server snapshot; atomic, idempotent.
    async fn apply_snapshot(&self, snapshot: SyncSnapshot) -> Result<PullOutcome>;

    /// Dirty products eligible for push, minus the excluded ids.
    fn load_dirty_products(&self, exclude_ids: &[i32]) -> Result<Vec<Product>>;

    /// Dirty invoices with their items denormalized against product names.
    fn load_dirty_invoices(
        &self,
        exclude_ids: &[i32],
    ) -> Result<Vec<(Invoice, Vec<InvoiceItemWithProduct>)>>;

    /// Stamp server ids and sync metadata from a push response; atomic.
    /// Returns the number of local rows acknowledged.
    async fn apply_push_response(&self, response: PushResponse) -> Result<usize>;

    async fn record_pull_completed(&self) -> Result<()>;
    async fn record_push_completed(&self) -> Result<()>;
    async fn record_engine_error(&self, message: String) -> Result<()>;
    fn engine_status(&self) -> Result<SyncEngineStatus>;
}

/// Remote server capability. Implemented by the sync-client crate.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<SyncSnapshot>;
    async fn push_batch(&self, request: PushRequest) -> Result<PushResponse>;
    async fn check_connectivity(&self) -> bool;
}

/// Orchestrates pull and push against one local store.
pub struct SyncEngine {
    store: Arc<dyn SyncStore>,
    transport: Arc<dyn SyncTransport>,
    device: Arc<dyn DeviceIdentityProvider>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn SyncStore>,
        transport: Arc<dyn SyncTransport>,
        device: Arc<dyn DeviceIdentityProvider>,
    ) -> Self {
        Self {
            store,
            transport,
            device,
        }
    }

    /// Merge the full server snapshot into the local store.
    pub async fn pull(&self) -> Result<PullSummary> {
        Ok(self.pull_outcome().await?.summary())
    }

    async fn pull_outcome(&self) -> Result<PullOutcome> {
        let snapshot = match self.transport.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.record_phase_error(err, "Failed to pull").await),
        };
        debug!(
            "Pulled snapshot: {} products, {} invoices",
            snapshot.products.len(),
            snapshot.invoices.len()
        );

        let outcome = match self.store.apply_snapshot(snapshot).await {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.record_phase_error(err, "Failed to pull").await),
        };

        // The snapshot is already durable; a bookkeeping failure must not
        // surface the pull itself as failed.
        if let Err(err) = self.store.record_pull_completed().await {
            warn!("Failed to record pull completion: {}", err);
        }
        info!(
            "Pull applied {} products, {} invoices",
            outcome.products_applied, outcome.invoices_applied
        );
        Ok(outcome)
    }

    /// Wrap a phase failure and record it in the engine status, best-effort.
    async fn record_phase_error(&self, err: Error, context: &'static str) -> Error {
        let err = err.with_context(context);
        let _ = self.store.record_engine_error(err.to_string()).await;
        err
    }

    /// Push all dirty local rows in one batch. Returns the number of rows
    /// the server acknowledged.
    pub async fn push(&self) -> Result<usize> {
        self.push_excluding(&PushExclusions::default()).await
    }

    async fn push_excluding(&self, exclusions: &PushExclusions) -> Result<usize> {
        let products = self.store.load_dirty_products(&exclusions.product_ids)?;
        let invoices = self.store.load_dirty_invoices(&exclusions.invoice_ids)?;
        if products.is_empty() && invoices.is_empty() {
            debug!("Nothing dirty to push");
            return Ok(0);
        }

        let request = PushRequest {
            products: products.iter().map(ProductDto::from_local).collect(),
            invoices: invoices
                .iter()
                .map(|(invoice, items)| InvoiceDto::from_local(invoice, items))
                .collect(),
            device_id: self.device.device_id()?,
        };
        debug!(
            "Pushing {} products, {} invoices",
            request.products.len(),
            request.invoices.len()
        );

        // A transport failure aborts here with no local mutation.
        let response = match self.transport.push_batch(request).await {
            Ok(response) => response,
            Err(err) => return Err(self.record_phase_error(err, "Failed to push").await),
        };

        let acknowledged = match self.store.apply_push_response(response).await {
            Ok(count) => count,
            Err(err) => return Err(self.record_phase_error(err, "Failed to push").await),
        };

        if let Err(err) = self.store.record_push_completed().await {
            warn!("Failed to record push completion: {}", err);
        }
        info!("Push acknowledged {} rows", acknowledged);
        Ok(acknowledged)
    }

    /// One full sync session: pull, then push. Strictly sequential so push's
    /// dirty selection observes post-pull state.
    pub async fn full_sync(&self) -> Result<SyncSummary> {
        let outcome = self.pull_outcome().await?;
        let pushed = self
            .push_excluding(&PushExclusions {
                product_ids: outcome.touched_product_ids.clone(),
                invoice_ids: outcome.touched_invoice_ids.clone(),
            })
            .await?;

        Ok(SyncSummary {
            pulled: outcome.products_applied + outcome.invoices_applied,
            pushed,
        })
    }

    /// Lightweight liveness probe, independent of pull/push.
    pub async fn check_connectivity(&self) -> bool {
        self.transport.check_connectivity().await
    }

    /// Persisted engine status for callers.
    pub fn status(&self) -> Result<SyncEngineStatus> {
        self.store.engine_status()
    }
}
