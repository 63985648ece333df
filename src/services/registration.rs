//! Phone-number uniqueness for people who register themselves.
//!
//! A verified holder owns the number outright. An unverified holder is an
//! abandoned registration: a new registration with the same number replaces
//! it.

use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::db::queries;
use crate::errors::AppError;

pub trait Registrant: DeserializeOwned {
    fn phone_number(&self) -> &str;
    fn is_verified(&self) -> bool;
}

/// Clears the way for a new registration of `phone_number`.
pub fn release_unverified<R: Registrant>(
    conn: &Connection,
    collection: &str,
    phone_number: &str,
    conflict_code: &'static str,
    conflict_message: &str,
) -> Result<(), AppError> {
    let holders: Vec<(String, R)> =
        queries::find_by_field(conn, collection, "phone_number", phone_number)?;

    if holders.iter().any(|(_, holder)| holder.is_verified()) {
        return Err(AppError::conflict(conflict_code, conflict_message));
    }

    for (id, _) in holders {
        queries::delete_document(conn, collection, &id)?;
        tracing::info!(collection, id = %id, "replaced unverified registration");
    }

    Ok(())
}

/// Rejects a phone-number change onto a number someone else holds.
pub fn ensure_phone_free<R: Registrant>(
    conn: &Connection,
    collection: &str,
    id: &str,
    current: &R,
    phone_number: &str,
) -> Result<(), AppError> {
    if current.phone_number() == phone_number {
        return Ok(());
    }

    let holders: Vec<(String, R)> =
        queries::find_by_field(conn, collection, "phone_number", phone_number)?;
    if holders.iter().any(|(holder_id, _)| holder_id != id) {
        return Err(AppError::conflict(
            "PHONE_EXISTS",
            "Phone number is already registered",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Person {
        phone_number: String,
        is_verified: bool,
    }

    impl Registrant for Person {
        fn phone_number(&self) -> &str {
            &self.phone_number
        }
        fn is_verified(&self) -> bool {
            self.is_verified
        }
    }

    fn person(phone: &str, verified: bool) -> Person {
        Person {
            phone_number: phone.to_string(),
            is_verified: verified,
        }
    }

    #[test]
    fn verified_holder_blocks_registration() {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_document(&conn, "people", "p1", &person("998901234567", true)).unwrap();

        let err = release_unverified::<Person>(
            &conn,
            "people",
            "998901234567",
            "USER_ALREADY_REGISTERED",
            "taken",
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "USER_ALREADY_REGISTERED");
        assert!(queries::document_exists(&conn, "people", "p1").unwrap());
    }

    #[test]
    fn unverified_holders_are_removed() {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_document(&conn, "people", "p1", &person("998901234567", false)).unwrap();
        queries::insert_document(&conn, "people", "p2", &person("998901234567", false)).unwrap();
        queries::insert_document(&conn, "people", "p3", &person("998907654321", false)).unwrap();

        release_unverified::<Person>(&conn, "people", "998901234567", "PHONE_EXISTS", "taken")
            .unwrap();

        assert!(!queries::document_exists(&conn, "people", "p1").unwrap());
        assert!(!queries::document_exists(&conn, "people", "p2").unwrap());
        assert!(queries::document_exists(&conn, "people", "p3").unwrap());
    }

    #[test]
    fn phone_change_onto_taken_number_conflicts() {
        let conn = db::init_db(":memory:").unwrap();
        let me = person("998900000001", true);
        queries::insert_document(&conn, "people", "me", &me).unwrap();
        queries::insert_document(&conn, "people", "other", &person("998900000002", false))
            .unwrap();

        // Keeping the same number is always fine.
        ensure_phone_free(&conn, "people", "me", &me, "998900000001").unwrap();
        ensure_phone_free(&conn, "people", "me", &me, "998900000003").unwrap();

        let err = ensure_phone_free(&conn, "people", "me", &me, "998900000002").unwrap_err();
        assert_eq!(err.error_code(), "PHONE_EXISTS");
    }
}
