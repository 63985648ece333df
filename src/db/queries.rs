use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

// ── Reads ──

pub fn get_document<T: DeserializeOwned>(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> anyhow::Result<Option<T>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    match data {
        Some(json) => {
            let doc = serde_json::from_str(&json)
                .with_context(|| format!("malformed document {collection}/{id}"))?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

pub fn document_exists(conn: &Connection, collection: &str, id: &str) -> anyhow::Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Every document in a collection, in store order. Documents that no longer
/// decode into `T` are skipped.
pub fn list_documents<T: DeserializeOwned>(
    conn: &Connection,
    collection: &str,
) -> anyhow::Result<Vec<(String, T)>> {
    let mut stmt =
        conn.prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map(params![collection], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut docs = vec![];
    for row in rows {
        let (id, json) = row?;
        match serde_json::from_str(&json) {
            Ok(doc) => docs.push((id, doc)),
            Err(e) => {
                tracing::warn!(collection, id = %id, error = %e, "skipping undecodable document");
            }
        }
    }
    Ok(docs)
}

/// Documents whose top-level string `field` equals `value`.
pub fn find_by_field<T: DeserializeOwned>(
    conn: &Connection,
    collection: &str,
    field: &str,
    value: &str,
) -> anyhow::Result<Vec<(String, T)>> {
    let path = format!("$.{field}");
    let mut stmt = conn.prepare(
        "SELECT id, data FROM documents
         WHERE collection = ?1 AND json_extract(data, ?2) = ?3
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![collection, path, value], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut docs = vec![];
    for row in rows {
        let (id, json) = row?;
        let doc = serde_json::from_str(&json)
            .with_context(|| format!("malformed document {collection}/{id}"))?;
        docs.push((id, doc));
    }
    Ok(docs)
}

// ── Writes ──

/// Inserts a document only if the id is free. Returns `false` when another
/// document already holds the id.
pub fn insert_document<T: Serialize>(
    conn: &Connection,
    collection: &str,
    id: &str,
    doc: &T,
) -> anyhow::Result<bool> {
    let data = serde_json::to_string(doc)?;
    let inserted = conn.execute(
        "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, id) DO NOTHING",
        params![collection, id, data],
    )?;
    Ok(inserted > 0)
}

pub fn replace_document<T: Serialize>(
    conn: &Connection,
    collection: &str,
    id: &str,
    doc: &T,
) -> anyhow::Result<bool> {
    let data = serde_json::to_string(doc)?;
    let updated = conn.execute(
        "UPDATE documents SET data = ?3 WHERE collection = ?1 AND id = ?2",
        params![collection, id, data],
    )?;
    Ok(updated > 0)
}

pub fn delete_document(conn: &Connection, collection: &str, id: &str) -> anyhow::Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        owner: String,
        body: String,
    }

    fn note(owner: &str, body: &str) -> Note {
        Note {
            owner: owner.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn insert_refuses_taken_id() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(insert_document(&conn, "notes", "a", &note("x", "first")).unwrap());
        assert!(!insert_document(&conn, "notes", "a", &note("y", "second")).unwrap());

        let stored: Note = get_document(&conn, "notes", "a").unwrap().unwrap();
        assert_eq!(stored, note("x", "first"));
    }

    #[test]
    fn ids_are_scoped_per_collection() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(insert_document(&conn, "notes", "a", &note("x", "1")).unwrap());
        assert!(insert_document(&conn, "drafts", "a", &note("x", "2")).unwrap());
        assert!(document_exists(&conn, "drafts", "a").unwrap());
        assert!(!document_exists(&conn, "drafts", "b").unwrap());
    }

    #[test]
    fn find_by_field_matches_exact_value() {
        let conn = db::init_db(":memory:").unwrap();
        insert_document(&conn, "notes", "a", &note("alice", "1")).unwrap();
        insert_document(&conn, "notes", "b", &note("bob", "2")).unwrap();
        insert_document(&conn, "notes", "c", &note("alice", "3")).unwrap();

        let found: Vec<(String, Note)> = find_by_field(&conn, "notes", "owner", "alice").unwrap();
        let ids: Vec<&str> = found.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn list_skips_documents_of_another_shape() {
        let conn = db::init_db(":memory:").unwrap();
        insert_document(&conn, "notes", "a", &note("x", "1")).unwrap();
        insert_document(&conn, "notes", "legacy", &serde_json::json!({"text": "old"})).unwrap();

        let docs: Vec<(String, Note)> = list_documents(&conn, "notes").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, "a");
    }

    #[test]
    fn replace_and_delete_report_missing_documents() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(!replace_document(&conn, "notes", "nope", &note("x", "1")).unwrap());
        assert!(!delete_document(&conn, "notes", "nope").unwrap());

        insert_document(&conn, "notes", "a", &note("x", "1")).unwrap();
        assert!(replace_document(&conn, "notes", "a", &note("x", "2")).unwrap());
        let stored: Note = get_document(&conn, "notes", "a").unwrap().unwrap();
        assert_eq!(stored.body, "2");

        assert!(delete_document(&conn, "notes", "a").unwrap());
        assert!(get_document::<Note>(&conn, "notes", "a").unwrap().is_none());
    }
}
