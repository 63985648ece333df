//! Identifier issuance.
//!
//! Ids are random hex tokens written with an insert-if-absent against the
//! store, so two writers can never end up sharing an id: a taken id makes
//! the insert a no-op and a fresh token is drawn.

use rand::RngCore;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;

/// 32 hex characters.
pub const USER_ID_BYTES: usize = 16;
/// 16 hex characters.
pub const DEFAULT_ID_BYTES: usize = 8;

const MAX_ATTEMPTS: usize = 32;

pub fn random_id(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Stores `doc` under a freshly generated id and returns the id.
pub fn insert_with_fresh_id<T: Serialize>(
    conn: &Connection,
    collection: &str,
    id_bytes: usize,
    doc: &T,
) -> anyhow::Result<String> {
    insert_with_ids(conn, collection, doc, || random_id(id_bytes))
}

/// Like [`insert_with_fresh_id`] but draws candidates from `next_id`.
pub fn insert_with_ids<T, F>(
    conn: &Connection,
    collection: &str,
    doc: &T,
    mut next_id: F,
) -> anyhow::Result<String>
where
    T: Serialize,
    F: FnMut() -> String,
{
    for _ in 0..MAX_ATTEMPTS {
        let id = next_id();
        if queries::insert_document(conn, collection, &id, doc)? {
            return Ok(id);
        }
        tracing::debug!(collection, id = %id, "id already taken, drawing another");
    }

    anyhow::bail!("no free id in {collection} after {MAX_ATTEMPTS} attempts")
}
