//! Identity resolution between server ids and local rows.
//!
//! Matching order: exact match on the stored `server_id`, then a fallback on
//! local primary-key equality for first-sync bootstrapping, where a server
//! export still carries the original local numeric id. Read-only; the
//! reconcilers decide what to do with the result.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use stockbook_core::Result;

use crate::errors::StorageError;
use crate::schema::{invoices, products};

/// Local product id for a server identifier, if any.
pub fn resolve_product(conn: &mut SqliteConnection, server_id: &str) -> Result<Option<i32>> {
    let by_server_id = products::table
        .filter(products::server_id.eq(server_id))
        .select(products::id)
        .first::<i32>(conn)
        .optional()
        .map_err(StorageError::from)?;
    if by_server_id.is_some() {
        return Ok(by_server_id);
    }

    let Ok(numeric_id) = server_id.parse::<i32>() else {
        return Ok(None);
    };
    let by_local_id = products::table
        .find(numeric_id)
        .select((products::id, products::server_id))
        .first::<(i32, Option<String>)>(conn)
        .optional()
        .map_err(StorageError::from)?;

    // The fallback must not steal a row already attached to another server id.
    Ok(match by_local_id {
        Some((local_id, None)) => Some(local_id),
        Some((local_id, Some(existing))) if existing == server_id => Some(local_id),
        _ => None,
    })
}

/// Local invoice id for a server identifier, if any. Same matching order as
/// [`resolve_product`].
pub fn resolve_invoice(conn: &mut SqliteConnection, server_id: &str) -> Result<Option<i32>> {
    let by_server_id = invoices::table
        .filter(invoices::server_id.eq(server_id))
        .select(invoices::id)
        .first::<i32>(conn)
        .optional()
        .map_err(StorageError::from)?;
    if by_server_id.is_some() {
        return Ok(by_server_id);
    }

    let Ok(numeric_id) = server_id.parse::<i32>() else {
        return Ok(None);
    };
    let by_local_id = invoices::table
        .find(numeric_id)
        .select((invoices::id, invoices::server_id))
        .first::<(i32, Option<String>)>(conn)
        .optional()
        .map_err(StorageError::from)?;

    Ok(match by_local_id {
        Some((local_id, None)) => Some(local_id),
        Some((local_id, Some(existing))) if existing == server_id => Some(local_id),
        _ => None,
    })
}
