use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::{self, resources};
use crate::models::{Business, BusinessOwner, User};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root::hello))
        // Users
        .route("/users", get(resources::list::<User>))
        .route("/users/register", post(resources::create::<User>))
        .route(
            "/users/:id",
            get(resources::get::<User>)
                .put(resources::update::<User>)
                .delete(resources::delete::<User>),
        )
        // Business owners
        .route(
            "/business-owners",
            get(resources::list::<BusinessOwner>).post(resources::create::<BusinessOwner>),
        )
        .route(
            "/business-owners/register",
            post(resources::create::<BusinessOwner>),
        )
        .route(
            "/business-owners/:id",
            get(resources::get::<BusinessOwner>)
                .put(resources::update::<BusinessOwner>)
                .delete(resources::delete::<BusinessOwner>),
        )
        // Businesses
        .route(
            "/businesses",
            get(resources::list::<Business>).post(resources::create::<Business>),
        )
        .route(
            "/businesses/owner/:owner_id",
            get(handlers::businesses::by_owner),
        )
        .route(
            "/businesses/:id",
            get(resources::get::<Business>)
                .put(resources::update::<Business>)
                .delete(resources::delete::<Business>),
        )
        // OTP
        .route("/otp/send", post(handlers::otp::send))
        .route("/otp/verify", post(handlers::otp::verify))
        // Places proxy
        .route("/places/search", get(handlers::places::search))
        .route("/places/:place_id/details", get(handlers::places::details))
        .route(
            "/places/photo/:photo_reference",
            get(handlers::places::photo),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}
