pub mod nav;

use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Json, Router};

use crate::auth::resolver::SessionContext;
use crate::core::state::AppState;
use crate::site::nav::render_page;

pub fn configure_site_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handle_landing))
        .route("/gate", get(handle_gate))
        .route("/health", get(handle_health))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "arenahub",
    }))
}

async fn handle_landing(ctx: SessionContext) -> Html<String> {
    let body = "<section class=\"hero\">\
            <h1>ArenaHub</h1>\
            <p>Competitive teams, creator squads and the people behind them.</p>\
            <a class=\"btn btn-primary\" href=\"/gate\">Join us</a>\
        </section>\
        <section class=\"landing-grid\">\
            <article class=\"landing-card\"><h3>Teams</h3><p>Rosters across the titles we compete in.</p></article>\
            <article class=\"landing-card\"><h3>Creators</h3><p>Streamers and content creators under the banner.</p></article>\
            <article class=\"landing-card\"><h3>Recruitment</h3><p>Open tryouts all season. Apply from any platform.</p></article>\
        </section>";
    Html(render_page("Home", &ctx, body))
}

/// Entry gate: a binary choice. The recruitment path is always offered;
/// the admin card exists in the rendered output only when elevation
/// resolved true. Terminal once navigated.
async fn handle_gate(State(_state): State<Arc<AppState>>, ctx: SessionContext) -> Html<String> {
    Html(render_page("Welcome", &ctx, &render_gate(&ctx)))
}

pub fn render_gate(ctx: &SessionContext) -> String {
    let mut cards = String::from(
        "<a class=\"gate-card\" href=\"/recruit\">\
            <h2>I'm being recruited</h2>\
            <p>Apply to join a team or the creator program.</p>\
        </a>",
    );
    if ctx.is_elevated() {
        cards.push_str(
            "<a class=\"gate-card gate-admin\" href=\"/admin\">\
                <h2>Admin Access</h2>\
                <p>HR console and member management.</p>\
            </a>",
        );
    }
    format!("<section class=\"gate\">{cards}</section>")
}
