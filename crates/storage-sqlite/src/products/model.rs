//! Database models for products.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use stockbook_core::models::Product;

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
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductDB {
    pub id: i32,
    pub name: String,
    pub cost_price: f64,
    pub selling_price: f64,
    pub quantity: i32,
    pub low_stock_level: i32,
    pub created_at: String,
    pub server_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProductDB {
    pub name: String,
    pub cost_price: f64,
    pub selling_price: f64,
    pub quantity: i32,
    pub low_stock_level: i32,
    pub created_at: String,
    pub server_id: Option<String>,
    pub synced_at: Option<String>,
}

impl From<ProductDB> for Product {
    fn from(db: ProductDB) -> Self {
        Product {
            id: db.id,
            server_id: db.server_id,
            name: db.name,
            cost_price: db.cost_price,
            selling_price: db.selling_price,
            quantity: db.quantity,
            low_stock_level: db.low_stock_level,
            created_at: db.created_at,
            synced_at: db.synced_at,
        }
    }
}
