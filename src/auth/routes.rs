use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_cookies::{
    cookie::{Cookie, SameSite},
    Cookies,
};

use crate::auth::resolver::SessionContext;
use crate::auth::SESSION_COOKIE;
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::site::nav::{render_notice, render_page};
use crate::store::Profile;

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", get(handle_signup_page).post(handle_signup_submit))
        .route("/auth/signin", get(handle_signin_page).post(handle_signin_submit))
        .route("/auth/signout", post(handle_signout))
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub gamertag: String,
    pub full_name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub dob: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn render_signup_form() -> String {
    "<section class=\"auth-form\">\
        <h1>Create your account</h1>\
        <form method=\"post\" action=\"/auth/signup\">\
            <label>Gamertag <input name=\"gamertag\" required></label>\
            <label>Full name <input name=\"full_name\" required></label>\
            <label>Date of birth <input type=\"date\" name=\"dob\" required></label>\
            <label>Email <input type=\"email\" name=\"email\" required></label>\
            <label>Password <input type=\"password\" name=\"password\" required minlength=\"8\"></label>\
            <button type=\"submit\" class=\"btn btn-primary\">Sign up</button>\
        </form>\
        <p>Already on the roster? <a href=\"/auth/signin\">Sign in</a></p>\
    </section>"
        .to_string()
}

fn render_signin_form() -> String {
    "<section class=\"auth-form\">\
        <h1>Sign in</h1>\
        <form method=\"post\" action=\"/auth/signin\">\
            <label>Email <input type=\"email\" name=\"email\" required></label>\
            <label>Password <input type=\"password\" name=\"password\" required></label>\
            <button type=\"submit\" class=\"btn btn-primary\">Sign in</button>\
        </form>\
        <p>New here? <a href=\"/auth/signup\">Create an account</a></p>\
    </section>"
        .to_string()
}

async fn handle_signup_page(ctx: SessionContext) -> Html<String> {
    Html(render_page("Sign up", &ctx, &render_signup_form()))
}

async fn handle_signin_page(ctx: SessionContext) -> Html<String> {
    Html(render_page("Sign in", &ctx, &render_signin_form()))
}

/// Sign-up creates the authentication identity plus the profile row
/// carrying the immutable identity fields, then opens a session.
async fn handle_signup_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    ctx: SessionContext,
    Form(req): Form<SignUpForm>,
) -> Response {
    match sign_up_flow(&state, &req).await {
        Ok(token) => {
            cookies.add(session_cookie(token));
            Redirect::to("/recruit").into_response()
        }
        Err(err) => {
            let body = format!(
                "{}{}",
                render_notice("error", &err.to_string()),
                render_signup_form()
            );
            (err.status(), Html(render_page("Sign up", &ctx, &body))).into_response()
        }
    }
}

async fn sign_up_flow(state: &AppState, req: &SignUpForm) -> Result<String, AppError> {
    let dob = NaiveDate::parse_from_str(&req.dob, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("date of birth must be YYYY-MM-DD".to_string()))?;
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let principal = state.auth.sign_up(&req.email, &req.password).await?;
    state
        .store
        .insert_profile(Profile::new(
            principal.id,
            req.gamertag.trim().to_string(),
            req.full_name.trim().to_string(),
            req.email.trim().to_string(),
            dob,
        ))
        .await?;

    log::info!("new account {} ({})", principal.id, req.gamertag);
    Ok(state.sessions.issue(principal))
}

async fn handle_signin_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    ctx: SessionContext,
    Form(req): Form<SignInForm>,
) -> Response {
    match state.auth.verify(&req.email, &req.password).await {
        Ok(principal) => {
            cookies.add(session_cookie(state.sessions.issue(principal)));
            Redirect::to("/gate").into_response()
        }
        Err(err) => {
            let err = AppError::from(err);
            let body = format!(
                "{}{}",
                render_notice("error", &err.to_string()),
                render_signin_form()
            );
            (err.status(), Html(render_page("Sign in", &ctx, &body))).into_response()
        }
    }
}

/// Invalidates the server session and clears the cookie, the only
/// locally cached session hint, then returns to the public entry point.
async fn handle_signout(State(state): State<Arc<AppState>>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value());
    }
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    cookies.remove(removal);
    Redirect::to("/")
}
