pub mod resolver;
pub mod routes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::core::schema::identities;
use crate::store::pg::DbPool;

pub const SESSION_COOKIE: &str = "arenahub_session";

/// The currently authenticated identity.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("auth backend: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
    async fn verify(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = identities)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity records in Postgres, argon2 password hashes.
pub struct PgAuthProvider {
    pool: DbPool,
}

impl PgAuthProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let existing: i64 = identities::table
            .filter(identities::email.eq(email))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        if existing > 0 {
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .to_string();

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash,
            created_at: Utc::now(),
        };
        diesel::insert_into(identities::table)
            .values(&identity)
            .execute(&mut conn)
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        Ok(Principal {
            id: identity.id,
            email: identity.email,
        })
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let identity: Identity = identities::table
            .filter(identities::email.eq(email))
            .first(&mut conn)
            .optional()
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&identity.password_hash)
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(Principal {
            id: identity.id,
            email: identity.email,
        })
    }
}

/// In-memory auth fake for tests. Passwords are held in the clear; this
/// never backs a real deployment.
pub struct MemAuthProvider {
    accounts: Mutex<HashMap<String, (Uuid, String)>>,
}

impl MemAuthProvider {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        let id = Uuid::new_v4();
        accounts.insert(email.to_string(), (id, password.to_string()));
        Ok(Principal {
            id,
            email: email.to_string(),
        })
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((id, stored)) if stored == password => Ok(Principal {
                id: *id,
                email: email.to_string(),
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Server-side session table: opaque token -> principal. The cookie only
/// ever carries the token, never a role hint.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, Principal>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn issue(&self, principal: Principal) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        let token = hex::encode(bytes);
        self.sessions.lock().unwrap().insert(token.clone(), principal);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<Principal> {
        self.sessions.lock().unwrap().get(token).cloned()
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
