use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::services::places::{PlaceSchedule, PlaceSearch, PlaceSummary};
use crate::state::AppState;
use crate::validation::ValidQuery;

const DEFAULT_PHOTO_WIDTH: u32 = 800;

#[derive(Serialize)]
pub struct SearchResponse {
    results: Vec<PlaceSummary>,
    total: usize,
}

// GET /places/search?query=
pub async fn search(
    State(state): State<Arc<AppState>>,
    ValidQuery(search): ValidQuery<PlaceSearch>,
) -> Result<Json<SearchResponse>, AppError> {
    let places = state.places.text_search(&search.query).await?;
    tracing::debug!(query = %search.query, count = places.len(), "places search");

    let results: Vec<PlaceSummary> = places
        .into_iter()
        .map(|place| PlaceSummary::new(place, &state.config.public_base_url))
        .collect();

    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}

// GET /places/:place_id/details
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceSchedule>, AppError> {
    let place = state.places.details(&place_id).await?;

    PlaceSchedule::new(&place_id, place, &state.config.public_base_url)
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found(
                "NO_OPENING_HOURS",
                "No opening hours available for this place",
            )
        })
}

#[derive(Deserialize)]
pub struct PhotoQuery {
    maxwidth: Option<u32>,
}

// GET /places/photo/:photo_reference?maxwidth=
pub async fn photo(
    State(state): State<Arc<AppState>>,
    Path(photo_reference): Path<String>,
    query: Result<Query<PhotoQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|_| {
        AppError::Validation(vec![FieldError::new(
            "maxwidth",
            "maxwidth must be a positive integer",
        )])
    })?;
    let max_width = query
        .maxwidth
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_PHOTO_WIDTH);

    let photo = state.places.photo(&photo_reference, max_width).await?;

    Ok((
        [
            (CONTENT_TYPE, photo.content_type),
            (CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        photo.bytes,
    )
        .into_response())
}
