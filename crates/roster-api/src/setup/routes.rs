//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::constants::{API_PREFIX, OPENAPI_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use roster_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Room for text fields and multipart framing on top of the files themselves.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // route_layer so unknown paths stay 404 instead of 401
    let protected = protected_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    // A member update may carry both a photo and a logo.
    let body_limit = config.max_photo_size_bytes() * 2 + FORM_OVERHEAD_BYTES;

    let app = public_routes()
        .merge(protected)
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_PATH).path("/docs"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Routes reachable without a token.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .route(
            &format!("{}/registrations", API_PREFIX),
            post(handlers::registrations::submit_registration),
        )
}

/// Routes behind the bearer token. Role checks happen in the handlers.
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/registrations", API_PREFIX),
            get(handlers::registrations::list_registrations)
                .put(handlers::registrations::update_registration),
        )
        .route(
            &format!("{}/registrations/{{id}}", API_PREFIX),
            get(handlers::registrations::get_registration),
        )
        .route(
            &format!("{}/registrations/{{id}}/reject", API_PREFIX),
            post(handlers::registrations::reject_registration),
        )
        .route(
            &format!("{}/members", API_PREFIX),
            get(handlers::members::list_members),
        )
        .route(
            &format!("{}/members/{{id}}", API_PREFIX),
            get(handlers::members::get_member).patch(handlers::members::update_member),
        )
        .route(
            &format!("{}/files/{{*key}}", API_PREFIX),
            get(handlers::files::get_file),
        )
        .route(
            &format!("{}/admin/credential-deliveries", API_PREFIX),
            get(handlers::credential_deliveries::list_pending_deliveries),
        )
        .route(
            &format!("{}/admin/credential-deliveries/{{member_ref}}/reissue", API_PREFIX),
            post(handlers::credential_deliveries::reissue_credentials),
        )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    };
    Ok(cors)
}
