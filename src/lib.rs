pub mod admin;
pub mod auth;
pub mod core;
pub mod drive;
pub mod profiles;
pub mod recruit;
pub mod site;
pub mod store;
pub mod tickets;

use std::sync::Arc;

use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::state::AppState;

/// Assembles the full application router over the given state. Tests
/// build this against in-memory backends; `main` wires the real ones.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(site::configure_site_routes())
        .merge(auth::routes::configure_auth_routes())
        .merge(recruit::configure_recruit_routes())
        .merge(profiles::configure_profiles_routes())
        .merge(tickets::configure_tickets_routes())
        .merge(admin::configure_admin_routes())
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
