pub mod ui;

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Html,
    routing::{get, post},
    Router,
};

use crate::auth::resolver::SessionContext;
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::site::nav::{render_notice, render_page};

pub fn configure_profiles_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(handle_profile_page))
        .route("/api/profile", post(handle_profile_save))
}

/// Parsed profile form: the mutable text fields plus an optional photo.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub gamertag: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<(Vec<u8>, String)>,
}

async fn handle_profile_page(
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
        "Profile",
        &ctx,
        &ui::render_profile_form(&profile),
    )))
}

async fn handle_profile_save(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    ctx.require_principal()?;
    let update = parse_profile_form(multipart).await?;
    match apply_profile_update(&state, &ctx, update).await {
        Ok(()) => Ok(Html(render_notice("success", "Profile saved"))),
        Err(AppError::Blob(e)) => {
            log::error!("photo upload failed: {e}");
            Ok(Html(render_notice(
                "error",
                "Photo upload failed; nothing was saved",
            )))
        }
        Err(AppError::Store(e)) => {
            log::error!("profile save failed: {e}");
            Ok(Html(render_notice("error", "Could not save the profile")))
        }
        Err(other) => Err(other),
    }
}

async fn parse_profile_form(mut multipart: Multipart) -> Result<ProfileUpdate, AppError> {
    let mut update = ProfileUpdate::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable photo: {e}")))?;
                if !bytes.is_empty() {
                    update.photo = Some((bytes.to_vec(), content_type));
                }
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?;
                let value = value.trim().to_string();
                match other {
                    "gamertag" => update.gamertag = value,
                    "phone" => update.phone = Some(value).filter(|v| !v.is_empty()),
                    "bio" => update.bio = Some(value).filter(|v| !v.is_empty()),
                    _ => {}
                }
            }
        }
    }
    if update.gamertag.is_empty() {
        return Err(AppError::Validation("gamertag is required".to_string()));
    }
    Ok(update)
}

/// If a new photo was chosen it is stored under a path keyed by the
/// owner's id before the record save, and its public reference replaces
/// the prior one inside the same patch. An upload failure aborts the save
/// with no partial write.
pub async fn apply_profile_update(
    state: &AppState,
    ctx: &SessionContext,
    update: ProfileUpdate,
) -> Result<(), AppError> {
    let principal = ctx.require_principal()?;
    let profile = state
        .store
        .profile(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;

    let mut patch = profile.patch();
    patch.gamertag = update.gamertag;
    patch.phone = update.phone;
    patch.bio = update.bio;

    if let Some((bytes, content_type)) = update.photo {
        let path = format!("avatars/{}", principal.id);
        state.blob.upload(&path, bytes, &content_type, true).await?;
        patch.photo_path = Some(state.blob.public_url(&path));
    }

    state.store.update_profile(principal.id, patch).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::resolve;
    use crate::auth::{MemAuthProvider, Principal};
    use crate::core::config::{AppConfig, DatabaseConfig, DriveConfig, ServerConfig};
    use crate::drive::MemBlobStore;
    use crate::store::mem::MemStore;
    use crate::store::{Profile, RecordStore};
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;
    use uuid::Uuid;

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

    async fn state_with_profile() -> (Arc<AppState>, Uuid) {
        let store = Arc::new(MemStore::new());
        let profile = Profile::new(
            Uuid::new_v4(),
            "shadow".into(),
            "Full Name".into(),
            "s@arena.gg".into(),
            NaiveDate::from_ymd_opt(2000, 3, 4).unwrap(),
        );
        let user_id = profile.user_id;
        store.insert_profile(profile).await.unwrap();
        let state = Arc::new(AppState::new(
            test_config(),
            store,
            Arc::new(MemAuthProvider::new()),
            Arc::new(MemBlobStore::new()),
        ));
        (state, user_id)
    }

    async fn ctx_for(state: &AppState, user_id: Uuid) -> SessionContext {
        resolve(
            state.store.as_ref(),
            Some(Principal {
                id: user_id,
                email: "s@arena.gg".into(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn phone_only_update_leaves_immutable_fields_unchanged() {
        let (state, user_id) = state_with_profile().await;
        let ctx = ctx_for(&state, user_id).await;
        let before = state.store.profile(user_id).await.unwrap().unwrap();

        apply_profile_update(
            &state,
            &ctx,
            ProfileUpdate {
                gamertag: before.gamertag.clone(),
                phone: Some("+1 555 0101".into()),
                bio: before.bio.clone(),
                photo: None,
            },
        )
        .await
        .unwrap();

        let after = state.store.profile(user_id).await.unwrap().unwrap();
        assert_eq!(after.phone.as_deref(), Some("+1 555 0101"));
        assert_eq!(after.full_name, before.full_name);
        assert_eq!(after.dob, before.dob);
        assert_eq!(after.email, before.email);
    }

    #[tokio::test]
    async fn upload_failure_aborts_the_save() {
        let (state, user_id) = state_with_profile().await;
        let ctx = ctx_for(&state, user_id).await;
        let blob = Arc::new(MemBlobStore::new());
        blob.fail_uploads.store(true, Ordering::SeqCst);
        let state = Arc::new(AppState::new(
            test_config(),
            state.store.clone(),
            state.auth.clone(),
            blob,
        ));

        let err = apply_profile_update(
            &state,
            &ctx,
            ProfileUpdate {
                gamertag: "newtag".into(),
                phone: Some("+1 555 0101".into()),
                bio: None,
                photo: Some((vec![1, 2, 3], "image/png".into())),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Blob(_)));

        // No partial write: the record still carries its prior state.
        let after = state.store.profile(user_id).await.unwrap().unwrap();
        assert_eq!(after.gamertag, "shadow");
        assert_eq!(after.phone, None);
        assert_eq!(after.photo_path, None);
    }

    #[tokio::test]
    async fn successful_photo_upload_replaces_the_reference() {
        let (state, user_id) = state_with_profile().await;
        let ctx = ctx_for(&state, user_id).await;

        apply_profile_update(
            &state,
            &ctx,
            ProfileUpdate {
                gamertag: "shadow".into(),
                phone: None,
                bio: None,
                photo: Some((vec![9, 9], "image/jpeg".into())),
            },
        )
        .await
        .unwrap();

        let after = state.store.profile(user_id).await.unwrap().unwrap();
        assert_eq!(
            after.photo_path.as_deref(),
            Some(format!("mem://avatars/{user_id}").as_str())
        );
    }
}
