use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::BusinessResponse;
use crate::services::businesses;
use crate::state::AppState;

// GET /businesses/owner/:owner_id
pub async fn by_owner(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<BusinessResponse>>, AppError> {
    let found = {
        let db = state.db()?;
        businesses::list_by_owner(&db, &owner_id)?
    };

    Ok(Json(
        found
            .iter()
            .map(|(id, business)| {
                BusinessResponse::new(id, business, &state.config.public_base_url)
            })
            .collect(),
    ))
}
