//! Domain models for products, invoices and invoice line items.

use serde::{Deserialize, Serialize};

/// A stocked product. `server_id` and `synced_at` are owned by the sync
/// engine; local CRUD paths never touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub server_id: Option<String>,
    pub name: String,
    pub cost_price: f64,
    pub selling_price: f64,
    pub quantity: i32,
    pub low_stock_level: i32,
    pub created_at: String,
    pub synced_at: Option<String>,
}

/// Payload for creating a product locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub cost_price: f64,
    pub selling_price: f64,
    pub quantity: i32,
    pub low_stock_level: i32,
}

/// A sale invoice. Owns a list of [`InvoiceItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i32,
    pub server_id: Option<String>,
    pub total_amount: f64,
    pub total_items: i32,
    pub created_at: String,
    pub synced_at: Option<String>,
}

/// One invoice line. `price` is the unit price captured at sale time and is
/// independent of later product price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: i32,
    pub invoice_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

/// Line item for a new invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceItem {
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

/// Payload for creating an invoice with its items in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub total_amount: f64,
    pub items: Vec<NewInvoiceItem>,
}

/// Invoice line joined with its product's name, used when denormalizing
/// push payloads for server-side readability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemWithProduct {
    pub item: InvoiceItem,
    pub product_name: String,
    pub product_server_id: Option<String>,
}
