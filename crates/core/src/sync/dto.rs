//! Wire DTOs for the sync API.
//!
//! The server historically emitted both `id` and `_id` as the identifier
//! field depending on export path; DTOs accept either and normalization
//! happens here at the boundary, never deeper in the engine.

use serde::{Deserialize, Serialize};

use crate::models::{Invoice, InvoiceItemWithProduct, Product};

/// Server-side product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    /// Server identifier; absent on first push of a locally created row.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Local numeric id carried through the push round trip as an opaque
    /// passthrough so responses can be re-matched without identity resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub selling_price: f64,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub low_stock_level: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ProductDto {
    /// Build the outbound payload for a dirty local product.
    pub fn from_local(product: &Product) -> Self {
        Self {
            id: product.server_id.clone(),
            local_id: Some(product.id),
            name: product.name.clone(),
            cost_price: product.cost_price,
            selling_price: product.selling_price,
            quantity: product.quantity,
            low_stock_level: product.low_stock_level,
            created_at: Some(product.created_at.clone()),
        }
    }
}

/// Server-side invoice line item.
///
/// Outbound items denormalize the product name for server-side readability;
/// inbound items reference the product by its server identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    #[serde(default, alias = "product_id", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price: f64,
}

/// Server-side invoice record, optionally embedding its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<i32>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub total_items: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemDto>>,
}

impl InvoiceDto {
    /// Build the outbound payload for a dirty local invoice and its items.
    pub fn from_local(invoice: &Invoice, items: &[InvoiceItemWithProduct]) -> Self {
        Self {
            id: invoice.server_id.clone(),
            local_id: Some(invoice.id),
            total_amount: invoice.total_amount,
            total_items: invoice.total_items,
            created_at: Some(invoice.created_at.clone()),
            items: Some(
                items
                    .iter()
                    .map(|line| ItemDto {
                        product_id: line.product_server_id.clone(),
                        product_name: Some(line.product_name.clone()),
                        quantity: line.item.quantity,
                        price: line.item.price,
                    })
                    .collect(),
            ),
        }
    }
}

/// Full server export applied by the pull reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    #[serde(default)]
    pub products: Vec<ProductDto>,
    #[serde(default)]
    pub invoices: Vec<InvoiceDto>,
}

/// One batched push of all dirty rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub products: Vec<ProductDto>,
    pub invoices: Vec<InvoiceDto>,
    pub device_id: String,
}

/// Canonical server copies returned from a push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    #[serde(default)]
    pub products: Vec<ProductDto>,
    #[serde(default)]
    pub invoices: Vec<InvoiceDto>,
}
