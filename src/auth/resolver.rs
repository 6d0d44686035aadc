use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use tower_cookies::Cookies;

use crate::auth::{Principal, SESSION_COOKIE};
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::store::{Profile, RecordStore, ROLE_ADMIN, ROLE_SUPERADMIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    /// Role classification from a profile row. The `role` string is the
    /// current representation; the legacy `is_admin`/`is_superadmin`
    /// booleans can only raise the tier, never lower it.
    pub fn from_profile(profile: &Profile) -> Self {
        let from_string = match profile.role.as_str() {
            ROLE_SUPERADMIN => Self::Superadmin,
            ROLE_ADMIN => Self::Admin,
            _ => Self::User,
        };
        if profile.is_superadmin {
            Self::Superadmin
        } else if profile.is_admin && from_string == Self::User {
            Self::Admin
        } else {
            from_string
        }
    }
}

/// Typed elevation result. `Unknown` means the profile fetch failed: it
/// suppresses elevated UI exactly like `NotElevated`, but tests can tell
/// "denied" from "fetch failed". This gates display only; mutating admin
/// handlers re-check on the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    Elevated,
    NotElevated,
    Unknown,
}

/// Per-request session context, passed explicitly into each view instead
/// of living in ambient globals.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub principal: Option<Principal>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub elevation: Elevation,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self {
            principal: None,
            display_name: None,
            role: None,
            elevation: Elevation::NotElevated,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn is_elevated(&self) -> bool {
        self.elevation == Elevation::Elevated
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Some(Role::Superadmin)
    }

    pub fn require_principal(&self) -> Result<&Principal, AppError> {
        self.principal.as_ref().ok_or(AppError::Unauthenticated)
    }

    pub fn require_elevated(&self) -> Result<(), AppError> {
        if self.is_elevated() {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin access required".to_string()))
        }
    }

    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.is_superadmin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("superadmin access required".to_string()))
        }
    }

    /// Admin pages are indistinguishable from missing routes for
    /// non-elevated viewers.
    pub fn require_elevated_page(&self) -> Result<(), AppError> {
        if self.is_elevated() {
            Ok(())
        } else {
            Err(AppError::NotFound("page not found".to_string()))
        }
    }
}

/// Resolves a principal into a session context by fetching its profile
/// row. Missing row fails open for basic navigation; a fetch error fails
/// closed for privilege display only.
pub async fn resolve(store: &dyn RecordStore, principal: Option<Principal>) -> SessionContext {
    let Some(principal) = principal else {
        return SessionContext::anonymous();
    };
    match store.profile(principal.id).await {
        Ok(Some(profile)) => {
            let role = Role::from_profile(&profile);
            let elevation = if role == Role::Admin || role == Role::Superadmin {
                Elevation::Elevated
            } else {
                Elevation::NotElevated
            };
            SessionContext {
                principal: Some(principal),
                display_name: Some(profile.gamertag),
                role: Some(role),
                elevation,
            }
        }
        Ok(None) => SessionContext {
            principal: Some(principal),
            display_name: None,
            role: None,
            elevation: Elevation::NotElevated,
        },
        Err(e) => {
            log::warn!("role fetch failed for {}: {e}", principal.id);
            SessionContext {
                principal: Some(principal),
                display_name: None,
                role: None,
                elevation: Elevation::Unknown,
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = Arc::<AppState>::from_ref(state);
        let Ok(cookies) = parts.extract::<Cookies>().await else {
            return Ok(SessionContext::anonymous());
        };
        let principal = cookies
            .get(SESSION_COOKIE)
            .and_then(|cookie| app.sessions.resolve(cookie.value()));
        Ok(resolve(app.store.as_ref(), principal).await)
    }
}
