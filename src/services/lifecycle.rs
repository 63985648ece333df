//! Generic resource lifecycle: list, get, create, update, delete.
//!
//! Each resource type describes its collection, its id width, its
//! representation and its write rules through [`Resource`]; the operations
//! below are written once against that contract. Create and update run their
//! rule checks and their write inside one transaction on the locked store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::ids;
use crate::state::AppState;
use crate::validation::Shape;

pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const ID_BYTES: usize = ids::DEFAULT_ID_BYTES;
    const NOT_FOUND: &'static str;

    type Input: Shape + Send + 'static;
    type Output: Serialize + Send + 'static;

    fn represent(id: &str, doc: &Self, config: &AppConfig) -> Self::Output;

    /// Uniqueness and foreign-key rules for a new document.
    fn before_create(_conn: &Connection, _input: &Self::Input) -> Result<(), AppError> {
        Ok(())
    }

    /// Rules for replacing `current`; only fields that changed need rechecking.
    fn before_update(
        _conn: &Connection,
        _id: &str,
        _current: &Self,
        _input: &Self::Input,
    ) -> Result<(), AppError> {
        Ok(())
    }

    fn build(input: Self::Input, now: DateTime<Utc>) -> Self;

    /// Full replace of the mutable fields. Creation time and server-owned
    /// flags come from `current`.
    fn merge(current: Self, input: Self::Input) -> Self;

    /// Side effects after a successful create. Must not block or fail.
    fn on_created(_state: &Arc<AppState>, _id: &str, _doc: &Self) {}
}

pub fn list<R: Resource>(conn: &Connection) -> Result<Vec<(String, R)>, AppError> {
    Ok(queries::list_documents(conn, R::COLLECTION)?)
}

pub fn get<R: Resource>(conn: &Connection, id: &str) -> Result<R, AppError> {
    queries::get_document(conn, R::COLLECTION, id)?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", R::NOT_FOUND))
}

pub fn create<R: Resource>(
    conn: &mut Connection,
    input: R::Input,
    now: DateTime<Utc>,
) -> Result<(String, R), AppError> {
    let tx = conn.transaction()?;

    R::before_create(&tx, &input)?;
    let doc = R::build(input, now);
    let id = ids::insert_with_fresh_id(&tx, R::COLLECTION, R::ID_BYTES, &doc)?;

    tx.commit()?;
    tracing::info!(collection = R::COLLECTION, id = %id, "document created");
    Ok((id, doc))
}

pub fn update<R: Resource>(
    conn: &mut Connection,
    id: &str,
    input: R::Input,
) -> Result<R, AppError> {
    let tx = conn.transaction()?;

    let current: R = get(&tx, id)?;
    R::before_update(&tx, id, &current, &input)?;
    let doc = R::merge(current, input);
    queries::replace_document(&tx, R::COLLECTION, id, &doc)?;

    tx.commit()?;
    tracing::info!(collection = R::COLLECTION, id = %id, "document replaced");
    Ok(doc)
}

pub fn delete<R: Resource>(conn: &Connection, id: &str) -> Result<(), AppError> {
    if !queries::document_exists(conn, R::COLLECTION, id)? {
        return Err(AppError::not_found("NOT_FOUND", R::NOT_FOUND));
    }
    queries::delete_document(conn, R::COLLECTION, id)?;
    tracing::info!(collection = R::COLLECTION, id = %id, "document deleted");
    Ok(())
}
