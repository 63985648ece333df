//! CRUD handlers shared by every stored resource.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::services::lifecycle::{self, Resource};
use crate::state::AppState;
use crate::validation::Valid;

// GET /{resource}
pub async fn list<R: Resource>(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<R::Output>>, AppError> {
    let docs = {
        let db = state.db()?;
        lifecycle::list::<R>(&db)?
    };

    Ok(Json(
        docs.iter()
            .map(|(id, doc)| R::represent(id, doc, &state.config))
            .collect(),
    ))
}

// GET /{resource}/:id
pub async fn get<R: Resource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<R::Output>, AppError> {
    let doc = {
        let db = state.db()?;
        lifecycle::get::<R>(&db, &id)?
    };

    Ok(Json(R::represent(&id, &doc, &state.config)))
}

// POST /{resource} and /{resource}/register
pub async fn create<R: Resource>(
    State(state): State<Arc<AppState>>,
    Valid(input): Valid<R::Input>,
) -> Result<(StatusCode, Json<R::Output>), AppError> {
    let (id, doc) = {
        let mut db = state.db()?;
        lifecycle::create::<R>(&mut db, input, Utc::now())?
    };

    R::on_created(&state, &id, &doc);

    Ok((
        StatusCode::CREATED,
        Json(R::represent(&id, &doc, &state.config)),
    ))
}

// PUT /{resource}/:id
pub async fn update<R: Resource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Valid(input): Valid<R::Input>,
) -> Result<Json<R::Output>, AppError> {
    let doc = {
        let mut db = state.db()?;
        lifecycle::update::<R>(&mut db, &id, input)?
    };

    Ok(Json(R::represent(&id, &doc, &state.config)))
}

// DELETE /{resource}/:id
pub async fn delete<R: Resource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let db = state.db()?;
    lifecycle::delete::<R>(&db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
