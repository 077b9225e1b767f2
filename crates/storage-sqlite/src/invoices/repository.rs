//! Local invoice CRUD.
//!
//! Creating an invoice decrements the referenced products' stock; deleting
//! one cascades its items and restores that stock. Both run in a single
//! transaction so stock counts never drift from the item rows.

use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use stockbook_core::models::{Invoice, InvoiceItem, NewInvoice};
use stockbook_core::{DatabaseError, Error, Result};

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::{invoice_items, invoices, products};
use crate::write_actor::WriteHandle;

use super::model::{InvoiceDB, InvoiceItemDB, NewInvoiceDB, NewInvoiceItemDB};

pub struct InvoiceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InvoiceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = invoices::table
            .order(invoices::created_at.desc())
            .load::<InvoiceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    pub fn load_items(&self, for_invoice_id: i32) -> Result<Vec<InvoiceItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = invoice_items::table
            .filter(invoice_items::invoice_id.eq(for_invoice_id))
            .load::<InvoiceItemDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(InvoiceItem::from).collect())
    }

    pub async fn create_invoice(&self, new_invoice: NewInvoice) -> Result<Invoice> {
        self.writer
            .exec(move |conn| {
                if new_invoice.items.is_empty() {
                    return Err(Error::Database(DatabaseError::Internal(
                        "Invoice must have at least one item".to_string(),
                    )));
                }

                let total_items: i32 = new_invoice.items.iter().map(|i| i.quantity).sum();
                let row = NewInvoiceDB {
                    total_amount: new_invoice.total_amount,
                    total_items,
                    created_at: Utc::now().to_rfc3339(),
                    server_id: None,
                    synced_at: None,
                };
                let invoice = diesel::insert_into(invoices::table)
                    .values(&row)
                    .returning(InvoiceDB::as_returning())
                    .get_result::<InvoiceDB>(conn)
                    .map_err(StorageError::from)?;

                for item in &new_invoice.items {
                    diesel::insert_into(invoice_items::table)
                        .values(NewInvoiceItemDB {
                            invoice_id: invoice.id,
                            product_id: item.product_id,
                            quantity: item.quantity,
                            price: item.price,
                        })
                        .execute(conn)
                        .map_err(StorageError::from)?;

                    diesel::update(products::table.find(item.product_id))
                        .set(products::quantity.eq(products::quantity - item.quantity))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Ok(Invoice::from(invoice))
            })
            .await
    }

    /// Delete an invoice, cascade its items and restore product stock.
    pub async fn delete_invoice(&self, invoice_id_to_delete: i32) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let items = invoice_items::table
                    .filter(invoice_items::invoice_id.eq(invoice_id_to_delete))
                    .load::<InvoiceItemDB>(conn)
                    .map_err(StorageError::from)?;

                for item in &items {
                    diesel::update(products::table.find(item.product_id))
                        .set(products::quantity.eq(products::quantity + item.quantity))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                // ON DELETE CASCADE removes the item rows.
                let affected = diesel::delete(invoices::table.find(invoice_id_to_delete))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
