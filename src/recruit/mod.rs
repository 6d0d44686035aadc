pub mod ui;

use std::sync::Arc;

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::resolver::SessionContext;
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::site::nav::{render_notice, render_page};
use crate::store::{Profile, ProfilePatch};

pub fn configure_recruit_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recruit", get(handle_recruit_page))
        .route("/recruit/summary", get(handle_summary_page))
        .route("/api/recruit", post(handle_recruit_save))
}

#[derive(Debug, Deserialize, Default)]
pub struct RecruitForm {
    pub experience_years: Option<String>,
    /// Comma-separated platform list ("PC, Xbox").
    pub platforms: Option<String>,
    pub game_title: Option<String>,
    pub followers_instagram: Option<String>,
    pub followers_twitch: Option<String>,
    pub bio: Option<String>,
    pub is_minor: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

fn parse_optional_number(value: &Option<String>, field: &str) -> Result<Option<i32>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{field} must be a number"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Overlays the application form on the profile's current state. One
/// patch carries every mutable field; `applied_at` is stamped on the
/// first submission and preserved afterwards.
pub fn recruit_patch(profile: &Profile, form: RecruitForm) -> Result<ProfilePatch, AppError> {
    let mut patch = profile.patch();
    patch.experience_years = parse_optional_number(&form.experience_years, "experience")?;
    patch.followers_instagram =
        parse_optional_number(&form.followers_instagram, "instagram followers")?;
    patch.followers_twitch = parse_optional_number(&form.followers_twitch, "twitch followers")?;
    patch.platforms = form
        .platforms
        .unwrap_or_default()
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    patch.game_title = non_empty(form.game_title);
    patch.bio = non_empty(form.bio);
    patch.is_minor = form.is_minor.is_some();
    if patch.is_minor {
        patch.guardian_name = non_empty(form.guardian_name);
        patch.guardian_phone = non_empty(form.guardian_phone);
    } else {
        patch.guardian_name = None;
        patch.guardian_phone = None;
    }
    patch.applied_at = Some(profile.applied_at.unwrap_or_else(Utc::now));
    Ok(patch)
}

async fn handle_recruit_page(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    let Some(principal) = ctx.principal.clone() else {
        return Ok(Html(render_page(
            "Recruitment",
            &ctx,
            ui::RECRUIT_SIGNUP_PROMPT,
        )));
    };
    let profile = state
        .store
        .profile(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;
    Ok(Html(render_page(
        "Recruitment",
        &ctx,
        &ui::render_recruit_form(&profile),
    )))
}

async fn handle_recruit_save(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Form(form): Form<RecruitForm>,
) -> Result<Html<String>, AppError> {
    let principal = ctx.require_principal()?;
    let profile = state
        .store
        .profile(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;
    let patch = recruit_patch(&profile, form)?;
    match state.store.update_profile(principal.id, patch).await {
        Ok(()) => Ok(Html(render_notice("success", "Application saved"))),
        Err(e) => {
            log::error!("application save failed for {}: {e}", principal.id);
            Ok(Html(render_notice("error", "Could not save the application")))
        }
    }
}

/// Pure read view of the submitted application.
async fn handle_summary_page(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    let principal = ctx.require_principal()?;
    let profile = state
        .store
        .profile(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;
    Ok(Html(render_page(
        "Application Summary",
        &ctx,
        &ui::render_summary(&profile),
    )))
}
