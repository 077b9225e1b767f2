//! SQLite implementation of the engine's store capability.
//!
//! Snapshot merges and push acknowledgements each run inside one writer
//! transaction; a failure anywhere in a batch rolls the whole phase back.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::sync::Arc;

use stockbook_core::models::{Invoice, InvoiceItemWithProduct, Product};
use stockbook_core::sync::{
    is_dirty, InvoiceDto, ProductDto, PullOutcome, PushResponse, SyncEngineStatus, SyncSnapshot,
    SyncStore,
};
use stockbook_core::Result;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::invoices::model::{InvoiceDB, InvoiceItemDB, NewInvoiceDB, NewInvoiceItemDB};
use crate::products::model::{NewProductDB, ProductDB};
use crate::schema::{invoice_items, invoices, products, sync_engine_state};
use crate::sync::identity;
use crate::sync::model::SyncEngineStateDB;
use crate::write_actor::WriteHandle;

pub struct SqliteSyncStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteSyncStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Upsert one server product; returns the local row id.
fn apply_server_product(
    conn: &mut SqliteConnection,
    dto: &ProductDto,
    server_id: &str,
    now: &str,
) -> Result<i32> {
    match identity::resolve_product(conn, server_id)? {
        Some(local_id) => {
            diesel::update(products::table.find(local_id))
                .set((
                    products::name.eq(&dto.name),
                    products::cost_price.eq(dto.cost_price),
                    products::selling_price.eq(dto.selling_price),
                    products::quantity.eq(dto.quantity),
                    products::low_stock_level.eq(dto.low_stock_level),
                    products::server_id.eq(Some(server_id)),
                    products::synced_at.eq(Some(now)),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
            Ok(local_id)
        }
        None => {
            let row = NewProductDB {
                name: dto.name.clone(),
                cost_price: dto.cost_price,
                selling_price: dto.selling_price,
                quantity: dto.quantity,
                low_stock_level: dto.low_stock_level,
                created_at: dto
                    .created_at
                    .clone()
                    .unwrap_or_else(|| now.to_string()),
                server_id: Some(server_id.to_string()),
                synced_at: Some(now.to_string()),
            };
            let local_id = diesel::insert_into(products::table)
                .values(&row)
                .returning(products::id)
                .get_result::<i32>(conn)
                .map_err(StorageError::from)?;
            Ok(local_id)
        }
    }
}

/// Upsert one server invoice; returns the local row id.
fn apply_server_invoice(
    conn: &mut SqliteConnection,
    dto: &InvoiceDto,
    server_id: &str,
    now: &str,
) -> Result<i32> {
    match identity::resolve_invoice(conn, server_id)? {
        Some(local_id) => {
            diesel::update(invoices::table.find(local_id))
                .set((
                    invoices::total_amount.eq(dto.total_amount),
                    invoices::total_items.eq(dto.total_items),
                    invoices::server_id.eq(Some(server_id)),
                    invoices::synced_at.eq(Some(now)),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
            Ok(local_id)
        }
        None => {
            let row = NewInvoiceDB {
                total_amount: dto.total_amount,
                total_items: dto.total_items,
                created_at: dto
                    .created_at
                    .clone()
                    .unwrap_or_else(|| now.to_string()),
                server_id: Some(server_id.to_string()),
                synced_at: Some(now.to_string()),
            };
            let local_id = diesel::insert_into(invoices::table)
                .values(&row)
                .returning(invoices::id)
                .get_result::<i32>(conn)
                .map_err(StorageError::from)?;
            Ok(local_id)
        }
    }
}

/// Replace an invoice's local items with the server's item list. Items whose
/// product cannot be resolved are skipped; the rest of the pull proceeds.
fn replace_invoice_items(
    conn: &mut SqliteConnection,
    local_invoice_id: i32,
    items: &[stockbook_core::sync::ItemDto],
) -> Result<()> {
    diesel::delete(invoice_items::table.filter(invoice_items::invoice_id.eq(local_invoice_id)))
        .execute(conn)
        .map_err(StorageError::from)?;

    for item in items {
        let Some(product_ref) = item.product_id.as_deref() else {
            warn!(
                "Skipping item without product reference on invoice {}",
                local_invoice_id
            );
            continue;
        };
        let Some(local_product_id) = identity::resolve_product(conn, product_ref)? else {
            warn!(
                "Skipping item for unresolvable product '{}' on invoice {}",
                product_ref, local_invoice_id
            );
            continue;
        };
        diesel::insert_into(invoice_items::table)
            .values(NewInvoiceItemDB {
                invoice_id: local_invoice_id,
                product_id: local_product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

#[async_trait]
impl SyncStore for SqliteSyncStore {
    async fn apply_snapshot(&self, snapshot: SyncSnapshot) -> Result<PullOutcome> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut outcome = PullOutcome::default();

                // Products first so item references in the same batch resolve.
                for dto in &snapshot.products {
                    let Some(server_id) = dto.id.as_deref() else {
                        warn!("Skipping server product '{}' without id", dto.name);
                        continue;
                    };
                    let local_id = apply_server_product(conn, dto, server_id, &now)?;
                    outcome.products_applied += 1;
                    outcome.touched_product_ids.push(local_id);
                }

                for dto in &snapshot.invoices {
                    let Some(server_id) = dto.id.as_deref() else {
                        warn!("Skipping server invoice without id");
                        continue;
                    };
                    let local_id = apply_server_invoice(conn, dto, server_id, &now)?;
                    outcome.invoices_applied += 1;
                    outcome.touched_invoice_ids.push(local_id);

                    if let Some(items) = &dto.items {
                        replace_invoice_items(conn, local_id, items)?;
                    }
                }

                Ok(outcome)
            })
            .await
    }

    fn load_dirty_products(&self, exclude_ids: &[i32]) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now();
        let rows = products::table
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .filter(|row| {
                !exclude_ids.contains(&row.id) && is_dirty(row.synced_at.as_deref(), now)
            })
            .map(Product::from)
            .collect())
    }

    fn load_dirty_invoices(
        &self,
        exclude_ids: &[i32],
    ) -> Result<Vec<(Invoice, Vec<InvoiceItemWithProduct>)>> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now();
        let dirty = invoices::table
            .load::<InvoiceDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .filter(|row| {
                !exclude_ids.contains(&row.id) && is_dirty(row.synced_at.as_deref(), now)
            })
            .map(Invoice::from)
            .collect::<Vec<_>>();

        let mut result = Vec::with_capacity(dirty.len());
        for invoice in dirty {
            let lines = invoice_items::table
                .inner_join(products::table)
                .filter(invoice_items::invoice_id.eq(invoice.id))
                .select((
                    InvoiceItemDB::as_select(),
                    products::name,
                    products::server_id,
                ))
                .load::<(InvoiceItemDB, String, Option<String>)>(&mut conn)
                .map_err(StorageError::from)?
                .into_iter()
                .map(|(item, product_name, product_server_id)| InvoiceItemWithProduct {
                    item: item.into(),
                    product_name,
                    product_server_id,
                })
                .collect();
            result.push((invoice, lines));
        }
        Ok(result)
    }

    async fn apply_push_response(&self, response: PushResponse) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut acknowledged = 0usize;

                // A row only counts as acknowledged when the response carries
                // both halves of the identity mapping; anything less would
                // mark a row clean, or erase its server id, without cause.
                for dto in &response.products {
                    let Some(local_id) = dto.local_id else {
                        warn!("Push response product without localId; ignoring");
                        continue;
                    };
                    let Some(server_id) = dto.id.as_deref() else {
                        warn!("Push response product {} without server id; ignoring", local_id);
                        continue;
                    };
                    acknowledged += diesel::update(products::table.find(local_id))
                        .set((
                            products::server_id.eq(Some(server_id)),
                            products::synced_at.eq(Some(now.as_str())),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                for dto in &response.invoices {
                    let Some(local_id) = dto.local_id else {
                        warn!("Push response invoice without localId; ignoring");
                        continue;
                    };
                    let Some(server_id) = dto.id.as_deref() else {
                        warn!("Push response invoice {} without server id; ignoring", local_id);
                        continue;
                    };
                    acknowledged += diesel::update(invoices::table.find(local_id))
                        .set((
                            invoices::server_id.eq(Some(server_id)),
                            invoices::synced_at.eq(Some(now.as_str())),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Ok(acknowledged)
            })
            .await
    }

    async fn record_pull_completed(&self) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB {
                        id: 1,
                        last_pull_at: Some(now.clone()),
                        last_push_at: None,
                        last_error: None,
                        consecutive_failures: 0,
                    })
                    .on_conflict(sync_engine_state::id)
                    .do_update()
                    .set((
                        sync_engine_state::last_pull_at.eq(Some(now)),
                        sync_engine_state::last_error.eq(None::<String>),
                        sync_engine_state::consecutive_failures.eq(0),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn record_push_completed(&self) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB {
                        id: 1,
                        last_pull_at: None,
                        last_push_at: Some(now.clone()),
                        last_error: None,
                        consecutive_failures: 0,
                    })
                    .on_conflict(sync_engine_state::id)
                    .do_update()
                    .set((
                        sync_engine_state::last_push_at.eq(Some(now)),
                        sync_engine_state::last_error.eq(None::<String>),
                        sync_engine_state::consecutive_failures.eq(0),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn record_engine_error(&self, message: String) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB {
                        id: 1,
                        last_pull_at: None,
                        last_push_at: None,
                        last_error: Some(message.clone()),
                        consecutive_failures: 1,
                    })
                    .on_conflict(sync_engine_state::id)
                    .do_update()
                    .set((
                        sync_engine_state::last_error.eq(Some(message)),
                        sync_engine_state::consecutive_failures
                            .eq(sync_engine_state::consecutive_failures + 1),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn engine_status(&self) -> Result<SyncEngineStatus> {
        let mut conn = get_connection(&self.pool)?;
        let state = sync_engine_state::table
            .find(1)
            .first::<SyncEngineStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(SyncEngineStatus {
            last_pull_at: state.as_ref().and_then(|s| s.last_pull_at.clone()),
            last_push_at: state.as_ref().and_then(|s| s.last_push_at.clone()),
            last_error: state.as_ref().and_then(|s| s.last_error.clone()),
            consecutive_failures: state.map(|s| s.consecutive_failures).unwrap_or(0),
        })
    }
}
