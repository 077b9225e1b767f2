//! Database models for invoices and invoice line items.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use stockbook_core::models::{Invoice, InvoiceItem};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvoiceDB {
    pub id: i32,
    pub total_amount: f64,
    pub total_items: i32,
    pub created_at: String,
    pub server_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::invoices)]
pub struct NewInvoiceDB {
    pub total_amount: f64,
    pub total_items: i32,
    pub created_at: String,
    pub server_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::invoice_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvoiceItemDB {
    pub id: i32,
    pub invoice_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::invoice_items)]
pub struct NewInvoiceItemDB {
    pub invoice_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

impl From<InvoiceDB> for Invoice {
    fn from(db: InvoiceDB) -> Self {
        Invoice {
            id: db.id,
            server_id: db.server_id,
            total_amount: db.total_amount,
            total_items: db.total_items,
            created_at: db.created_at,
            synced_at: db.synced_at,
        }
    }
}

impl From<InvoiceItemDB> for InvoiceItem {
    fn from(db: InvoiceItemDB) -> Self {
        InvoiceItem {
            id: db.id,
            invoice_id: db.invoice_id,
            product_id: db.product_id,
            quantity: db.quantity,
            price: db.price,
        }
    }
}
