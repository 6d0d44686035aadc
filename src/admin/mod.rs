pub mod ui;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::resolver::SessionContext;
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::site::nav::{render_notice, render_page};
use crate::store::{Profile, ROLE_ADMIN, ROLE_SUPERADMIN, ROLE_USER};

pub fn configure_admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(handle_admin_home))
        .route("/admin/setup", get(handle_setup_page))
        .route("/api/admin/setup", post(handle_setup_submit))
        .route("/admin/members", get(handle_members_page))
        .route("/admin/members/list", get(handle_members_list))
        .route("/api/admin/members/:id/role", put(handle_set_role))
}

#[derive(Debug, Deserialize)]
pub struct SetupForm {
    pub gamertag: String,
    pub full_name: String,
    pub dob: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub setup_code: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

async fn handle_admin_home(ctx: SessionContext) -> Result<Html<String>, AppError> {
    ctx.require_elevated_page()?;
    Ok(Html(render_page("Admin", &ctx, ui::ADMIN_HOME)))
}

async fn handle_setup_page(ctx: SessionContext) -> Html<String> {
    Html(render_page("Admin Setup", &ctx, ui::SETUP_FORM))
}

/// One-time provisioning of the first privileged account, gated by the
/// configured shared secret.
async fn handle_setup_submit(
    State(state): State<Arc<AppState>>,
    Form(req): Form<SetupForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = provision_admin(&state, req).await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "user_id": user_id,
    })))
}

/// Preconditions are checked in order, each failing before anything is
/// created: no privileged account may exist, the password confirmation
/// must match, and the code must equal the configured secret. A profile
/// insert that fails after the identity was created is surfaced as the
/// distinct partial-provisioning error, never as a generic failure.
pub async fn provision_admin(state: &AppState, req: SetupForm) -> Result<Uuid, AppError> {
    if state.store.privileged_profile_exists().await? {
        return Err(AppError::Validation(
            "Admin account already exists".to_string(),
        ));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("passwords do not match".to_string()));
    }
    if req.setup_code != state.config.admin_setup_code {
        return Err(AppError::Forbidden("invalid setup code".to_string()));
    }
    let dob = NaiveDate::parse_from_str(&req.dob, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("date of birth must be YYYY-MM-DD".to_string()))?;

    let principal = state.auth.sign_up(&req.email, &req.password).await?;

    let mut profile = Profile::new(
        principal.id,
        req.gamertag.trim().to_string(),
        req.full_name.trim().to_string(),
        req.email.trim().to_string(),
        dob,
    );
    profile.role = ROLE_SUPERADMIN.to_string();
    profile.is_admin = true;
    profile.is_superadmin = true;

    if let Err(e) = state.store.insert_profile(profile).await {
        // The identity exists but carries no role; manual remediation is
        // required, so this must never look like a generic signup error.
        log::error!(
            "admin provisioning left orphaned identity {}: {e}",
            principal.id
        );
        return Err(AppError::PartialProvision);
    }

    log::info!("provisioned first admin account {}", principal.id);
    Ok(principal.id)
}

async fn handle_members_page(
    State(_state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    ctx.require_elevated_page()?;
    Ok(Html(render_page("Members", &ctx, ui::MEMBERS_PAGE)))
}

async fn handle_members_list(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    ctx.require_elevated()?;
    let members = state.store.list_profiles().await?;
    Ok(Html(ui::render_members_table(&members, &ctx)))
}

/// Role changes are superadmin-only; elevated-but-not-superadmin staff
/// see the table without the controls.
async fn handle_set_role(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(user_id): Path<Uuid>,
    Form(req): Form<RoleForm>,
) -> Result<Html<String>, AppError> {
    ctx.require_superadmin()?;
    if ![ROLE_USER, ROLE_ADMIN, ROLE_SUPERADMIN].contains(&req.role.as_str()) {
        return Err(AppError::Validation(format!("unknown role {}", req.role)));
    }
    match state.store.set_role(user_id, &req.role).await {
        Ok(()) => Ok(Html(render_notice("success", "Role updated"))),
        Err(e) => {
            log::error!("role change failed for {user_id}: {e}");
            Ok(Html(render_notice("error", "Could not update the role")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthProvider, MemAuthProvider};
    use crate::core::config::{AppConfig, DatabaseConfig, DriveConfig, ServerConfig};
    use crate::drive::MemBlobStore;
    use crate::store::mem::MemStore;
    use crate::store::RecordStore;
    use std::sync::atomic::Ordering;

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "unused".into(),
                max_connections: 1,
            },
            drive: DriveConfig {
                server: "http://localhost:9000".into(),
                access_key: "test".into(),
                secret_key: "test".into(),
                bucket: "arenahub".into(),
            },
            admin_setup_code: "sekrit".into(),
        }
    }

    fn test_state() -> (Arc<AppState>, Arc<MemStore>, Arc<MemAuthProvider>) {
        let store = Arc::new(MemStore::new());
        let auth = Arc::new(MemAuthProvider::new());
        let state = Arc::new(AppState::new(
            test_config(),
            store.clone(),
            auth.clone(),
            Arc::new(MemBlobStore::new()),
        ));
        (state, store, auth)
    }

    fn setup_form(code: &str) -> SetupForm {
        SetupForm {
            gamertag: "boss".into(),
            full_name: "The Boss".into(),
            dob: "1990-01-01".into(),
            email: "boss@arena.gg".into(),
            password: "hunter2hunter2".into(),
            confirm_password: "hunter2hunter2".into(),
            setup_code: code.into(),
        }
    }

    #[tokio::test]
    async fn wrong_code_creates_nothing() {
        let (state, store, auth) = test_state();
        let err = provision_admin(&state, setup_form("wrong")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(!store.privileged_profile_exists().await.unwrap());
        assert!(auth.verify("boss@arena.gg", "hunter2hunter2").await.is_err());
    }

    #[tokio::test]
    async fn mismatched_passwords_create_nothing() {
        let (state, _store, auth) = test_state();
        let mut form = setup_form("sekrit");
        form.confirm_password = "other".into();
        let err = provision_admin(&state, form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(auth.verify("boss@arena.gg", "hunter2hunter2").await.is_err());
    }

    #[tokio::test]
    async fn existing_privileged_profile_blocks_even_correct_code() {
        let (state, _store, _auth) = test_state();
        provision_admin(&state, setup_form("sekrit")).await.unwrap();

        let mut again = setup_form("sekrit");
        again.email = "second@arena.gg".into();
        let err = provision_admin(&state, again).await.unwrap_err();
        assert_eq!(err.to_string(), "Admin account already exists");
    }

    #[tokio::test]
    async fn success_creates_superadmin_profile() {
        let (state, store, auth) = test_state();
        let user_id = provision_admin(&state, setup_form("sekrit")).await.unwrap();
        let profile = store.profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.role, ROLE_SUPERADMIN);
        assert!(profile.is_superadmin);
        assert!(auth.verify("boss@arena.gg", "hunter2hunter2").await.is_ok());
    }

    #[tokio::test]
    async fn failed_profile_insert_is_reported_as_partial_provision() {
        let (state, store, auth) = test_state();
        store.fail_profile_inserts.store(true, Ordering::SeqCst);
        let err = provision_admin(&state, setup_form("sekrit")).await.unwrap_err();
        assert!(matches!(err, AppError::PartialProvision));
        assert_eq!(err.code(), "partial_provision");
        // The orphaned identity is real; only the role assignment failed.
        assert!(auth.verify("boss@arena.gg", "hunter2hunter2").await.is_ok());
    }
}
