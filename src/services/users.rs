use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{NewUser, User, UserResponse};
use crate::services::events;
use crate::services::ids;
use crate::services::lifecycle::Resource;
use crate::services::registration::{self, Registrant};
use crate::state::AppState;

pub const COLLECTION: &str = "users";

impl Registrant for User {
    fn phone_number(&self) -> &str {
        &self.phone_number
    }

    fn is_verified(&self) -> bool {
        self.is_verified
    }
}

impl Resource for User {
    const COLLECTION: &'static str = COLLECTION;
    const ID_BYTES: usize = ids::USER_ID_BYTES;
    const NOT_FOUND: &'static str = "User not found";

    type Input = NewUser;
    type Output = UserResponse;

    fn represent(id: &str, doc: &Self, _config: &AppConfig) -> UserResponse {
        UserResponse::new(id, doc)
    }

    fn before_create(conn: &Connection, input: &NewUser) -> Result<(), AppError> {
        registration::release_unverified::<User>(
            conn,
            COLLECTION,
            &input.phone_number,
            "USER_ALREADY_REGISTERED",
            "User already registered",
        )
    }

    fn before_update(
        conn: &Connection,
        id: &str,
        current: &Self,
        input: &NewUser,
    ) -> Result<(), AppError> {
        registration::ensure_phone_free(conn, COLLECTION, id, current, &input.phone_number)
    }

    fn build(input: NewUser, now: DateTime<Utc>) -> Self {
        User {
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            telegram_id: input.telegram_id,
            is_verified: false,
            created_at: now,
        }
    }

    fn merge(current: Self, input: NewUser) -> Self {
        User {
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            telegram_id: input.telegram_id,
            ..current
        }
    }

    fn on_created(state: &Arc<AppState>, id: &str, doc: &Self) {
        let state = Arc::clone(state);
        let id = id.to_string();
        let user = doc.clone();
        tokio::spawn(async move {
            events::on_user_created(&state, &id, &user).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::lifecycle;

    fn input(phone: &str) -> NewUser {
        NewUser {
            first_name: "Ali".to_string(),
            last_name: "Valiyev".to_string(),
            phone_number: phone.to_string(),
            telegram_id: 42,
        }
    }

    #[test]
    fn created_users_start_unverified_with_long_ids() {
        let mut conn = db::init_db(":memory:").unwrap();
        let (id, user) = lifecycle::create::<User>(&mut conn, input("998901234567"), Utc::now())
            .unwrap();

        assert_eq!(id.len(), 32);
        assert!(!user.is_verified);
        let stored: User = lifecycle::get(&conn, &id).unwrap();
        assert_eq!(stored, user);
    }

    #[test]
    fn re_registration_replaces_unverified_user() {
        let mut conn = db::init_db(":memory:").unwrap();
        let (first, _) =
            lifecycle::create::<User>(&mut conn, input("998901234567"), Utc::now()).unwrap();
        let (second, _) =
            lifecycle::create::<User>(&mut conn, input("998901234567"), Utc::now()).unwrap();

        assert_ne!(first, second);
        let err = lifecycle::get::<User>(&conn, &first).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(lifecycle::list::<User>(&conn).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_verification_and_creation_time() {
        let mut conn = db::init_db(":memory:").unwrap();
        let (id, mut user) =
            lifecycle::create::<User>(&mut conn, input("998901234567"), Utc::now()).unwrap();
        user.is_verified = true;
        crate::db::queries::replace_document(&conn, COLLECTION, &id, &user).unwrap();

        let mut changed = input("998901234567");
        changed.first_name = "Vali".to_string();
        let updated = lifecycle::update::<User>(&mut conn, &id, changed).unwrap();

        assert_eq!(updated.first_name, "Vali");
        assert!(updated.is_verified);
        assert_eq!(updated.created_at, user.created_at);
    }
}
