//! Local product CRUD. Mutations here never touch `server_id`/`synced_at`;
//! those columns belong to the sync engine, so locally edited rows stay
//! dirty until the next push.

use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use stockbook_core::models::{NewProduct, Product};
use stockbook_core::Result;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::products;
use crate::write_actor::WriteHandle;

use super::model::{NewProductDB, ProductDB};

pub struct ProductRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProductRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = products::table
            .order(products::name.asc())
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub fn get_product(&self, product_id: i32) -> Result<Option<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let row = products::table
            .find(product_id)
            .first::<ProductDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Product::from))
    }

    /// Products at or below their low-stock level.
    pub fn list_low_stock(&self) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = products::table
            .filter(products::quantity.le(products::low_stock_level))
            .order(products::quantity.asc())
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn insert_new_product(&self, new_product: NewProduct) -> Result<Product> {
        self.writer
            .exec(move |conn| {
                let row = NewProductDB {
                    name: new_product.name,
                    cost_price: new_product.cost_price,
                    selling_price: new_product.selling_price,
                    quantity: new_product.quantity,
                    low_stock_level: new_product.low_stock_level,
                    created_at: Utc::now().to_rfc3339(),
                    server_id: None,
                    synced_at: None,
                };
                let inserted = diesel::insert_into(products::table)
                    .values(&row)
                    .returning(ProductDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Product::from(inserted))
            })
            .await
    }

    pub async fn update_product(&self, product: Product) -> Result<Product> {
        self.writer
            .exec(move |conn| {
                diesel::update(products::table.find(product.id))
                    .set((
                        products::name.eq(product.name),
                        products::cost_price.eq(product.cost_price),
                        products::selling_price.eq(product.selling_price),
                        products::quantity.eq(product.quantity),
                        products::low_stock_level.eq(product.low_stock_level),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                let row = products::table
                    .find(product.id)
                    .first::<ProductDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Product::from(row))
            })
            .await
    }
}
