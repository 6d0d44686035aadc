pub mod mem;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::schema::{profiles, support_tickets, ticket_feedback};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

pub const TICKET_STATUSES: [&str; 3] = ["open", "in_review", "resolved"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub user_id: Uuid,
    pub gamertag: String,
    pub full_name: String,
    pub email: String,
    pub dob: NaiveDate,
    pub phone: Option<String>,
    pub role: String,
    pub is_admin: bool,
    pub is_superadmin: bool,
    pub experience_years: Option<i32>,
    pub platforms: Vec<String>,
    pub game_title: Option<String>,
    pub followers_instagram: Option<i32>,
    pub followers_twitch: Option<i32>,
    pub bio: Option<String>,
    pub is_minor: bool,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub photo_path: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh profile with role `user` and empty recruitment fields. The
    /// identity fields passed here (name, dob, email) are immutable from
    /// this point on: no patch carries them.
    pub fn new(user_id: Uuid, gamertag: String, full_name: String, email: String, dob: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            gamertag,
            full_name,
            email,
            dob,
            phone: None,
            role: ROLE_USER.to_string(),
            is_admin: false,
            is_superadmin: false,
            experience_years: None,
            platforms: Vec::new(),
            game_title: None,
            followers_instagram: None,
            followers_twitch: None,
            bio: None,
            is_minor: false,
            guardian_name: None,
            guardian_phone: None,
            photo_path: None,
            applied_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Patch pre-filled with the profile's current mutable fields. Screens
    /// overlay the fields they edit and submit the whole patch in one call.
    pub fn patch(&self) -> ProfilePatch {
        ProfilePatch {
            gamertag: self.gamertag.clone(),
            phone: self.phone.clone(),
            experience_years: self.experience_years,
            platforms: self.platforms.clone(),
            game_title: self.game_title.clone(),
            followers_instagram: self.followers_instagram,
            followers_twitch: self.followers_twitch,
            bio: self.bio.clone(),
            is_minor: self.is_minor,
            guardian_name: self.guardian_name.clone(),
            guardian_phone: self.guardian_phone.clone(),
            photo_path: self.photo_path.clone(),
            applied_at: self.applied_at,
            updated_at: Utc::now(),
        }
    }
}

/// Every mutable profile field, and nothing else: `full_name`, `dob` and
/// `email` cannot be changed through any update because no patch column
/// exists for them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = profiles)]
#[diesel(treat_none_as_null = true)]
pub struct ProfilePatch {
    pub gamertag: String,
    pub phone: Option<String>,
    pub experience_years: Option<i32>,
    pub platforms: Vec<String>,
    pub game_title: Option<String>,
    pub followers_instagram: Option<i32>,
    pub followers_twitch: Option<i32>,
    pub bio: Option<String>,
    pub is_minor: bool,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub photo_path: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = support_tickets)]
pub struct SupportTicket {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject: String,
    pub message: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SupportTicket {
    pub fn new(owner_id: Uuid, subject: String, message: String, category: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            subject,
            message,
            category,
            status: "open".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = ticket_feedback)]
pub struct TicketFeedback {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    /// Snapshot of the author's role at submission time.
    pub author_role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(String),
    #[error("query: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Profiles,
    Tickets,
    Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// Notification that a row changed in the hosted store. Consumers refetch
/// the whole collection rather than merging incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    pub id: Uuid,
}

/// Broadcast fan-out of change events. Subscribing yields an explicit
/// guard object; dropping it unsubscribes.
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn publish(&self, collection: Collection, action: ChangeAction, id: Uuid) {
        // No receivers is fine: nobody is watching.
        let _ = self.tx.send(ChangeEvent { collection, action, id });
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ChangeSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Next change event, or `None` once the feed is closed. A lagged
    /// receiver skips to the oldest retained event; since every consumer
    /// responds with a full refetch, dropped events lose nothing.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Record-store operations consumed by the views. Implementations publish
/// a `ChangeEvent` for every successful mutation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_profile(&self, profile: Profile) -> Result<(), StoreError>;
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<(), StoreError>;
    /// Batched lookup over distinct ids, one query.
    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError>;
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;
    async fn privileged_profile_exists(&self) -> Result<bool, StoreError>;
    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<(), StoreError>;

    async fn insert_ticket(&self, ticket: SupportTicket) -> Result<(), StoreError>;
    /// All tickets, newest first.
    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, StoreError>;
    async fn ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, StoreError>;
    async fn tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<SupportTicket>, StoreError>;
    async fn set_ticket_status(&self, id: Uuid, status: &str) -> Result<(), StoreError>;
    async fn delete_ticket(&self, id: Uuid) -> Result<(), StoreError>;

    async fn insert_feedback(&self, feedback: TicketFeedback) -> Result<(), StoreError>;
    /// Feedback thread for one ticket, oldest first.
    async fn feedback_for(&self, ticket_id: Uuid) -> Result<Vec<TicketFeedback>, StoreError>;
    async fn feedback_for_tickets(&self, ids: &[Uuid]) -> Result<Vec<TicketFeedback>, StoreError>;

    fn changes(&self) -> &ChangeFeed;
}
