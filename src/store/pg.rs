use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use uuid::Uuid;

use crate::core::config::DatabaseConfig;
use crate::core::schema::{profiles, support_tickets, ticket_feedback};
use crate::store::{
    ChangeAction, ChangeFeed, Collection, Profile, ProfilePatch, RecordStore, StoreError,
    SupportTicket, TicketFeedback, ROLE_ADMIN, ROLE_SUPERADMIN,
};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(config: &DatabaseConfig) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .map_err(|e| StoreError::Pool(e.to_string()))
}

/// Postgres-backed record store. Every successful mutation publishes a
/// change event on the feed.
pub struct PgStore {
    pool: DbPool,
    feed: ChangeFeed,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))
    }
}

fn query_err(e: diesel::result::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let id = profile.user_id;
        diesel::insert_into(profiles::table)
            .values(&profile)
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Profiles, ChangeAction::Insert, id);
        Ok(())
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let mut conn = self.conn()?;
        profiles::table
            .filter(profiles::user_id.eq(user_id))
            .first(&mut conn)
            .optional()
            .map_err(query_err)
    }

    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
            .set(&patch)
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Profiles, ChangeAction::Update, user_id);
        Ok(())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        let mut conn = self.conn()?;
        profiles::table
            .filter(profiles::user_id.eq_any(ids.iter().copied()))
            .load(&mut conn)
            .map_err(query_err)
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let mut conn = self.conn()?;
        profiles::table
            .order(profiles::created_at.asc())
            .load(&mut conn)
            .map_err(query_err)
    }

    async fn privileged_profile_exists(&self) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let count: i64 = profiles::table
            .filter(
                profiles::role
                    .eq(ROLE_ADMIN)
                    .or(profiles::role.eq(ROLE_SUPERADMIN))
                    .or(profiles::is_admin.eq(true))
                    .or(profiles::is_superadmin.eq(true)),
            )
            .count()
            .get_result(&mut conn)
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
            .set((
                profiles::role.eq(role),
                profiles::is_admin.eq(role == ROLE_ADMIN || role == ROLE_SUPERADMIN),
                profiles::is_superadmin.eq(role == ROLE_SUPERADMIN),
                profiles::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Profiles, ChangeAction::Update, user_id);
        Ok(())
    }

    async fn insert_ticket(&self, ticket: SupportTicket) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let id = ticket.id;
        diesel::insert_into(support_tickets::table)
            .values(&ticket)
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Tickets, ChangeAction::Insert, id);
        Ok(())
    }

    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, StoreError> {
        let mut conn = self.conn()?;
        support_tickets::table
            .order(support_tickets::created_at.desc())
            .load(&mut conn)
            .map_err(query_err)
    }

    async fn ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, StoreError> {
        let mut conn = self.conn()?;
        support_tickets::table
            .filter(support_tickets::id.eq(id))
            .first(&mut conn)
            .optional()
            .map_err(query_err)
    }

    async fn tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<SupportTicket>, StoreError> {
        let mut conn = self.conn()?;
        support_tickets::table
            .filter(support_tickets::owner_id.eq(owner_id))
            .order(support_tickets::created_at.desc())
            .load(&mut conn)
            .map_err(query_err)
    }

    async fn set_ticket_status(&self, id: Uuid, status: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::update(support_tickets::table.filter(support_tickets::id.eq(id)))
            .set(support_tickets::status.eq(status))
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Tickets, ChangeAction::Update, id);
        Ok(())
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        // Feedback rows never outlive their ticket.
        diesel::delete(ticket_feedback::table.filter(ticket_feedback::ticket_id.eq(id)))
            .execute(&mut conn)
            .map_err(query_err)?;
        diesel::delete(support_tickets::table.filter(support_tickets::id.eq(id)))
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Tickets, ChangeAction::Delete, id);
        Ok(())
    }

    async fn insert_feedback(&self, feedback: TicketFeedback) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let id = feedback.id;
        diesel::insert_into(ticket_feedback::table)
            .values(&feedback)
            .execute(&mut conn)
            .map_err(query_err)?;
        self.feed.publish(Collection::Feedback, ChangeAction::Insert, id);
        Ok(())
    }

    async fn feedback_for(&self, ticket_id: Uuid) -> Result<Vec<TicketFeedback>, StoreError> {
        let mut conn = self.conn()?;
        ticket_feedback::table
            .filter(ticket_feedback::ticket_id.eq(ticket_id))
            .order(ticket_feedback::created_at.asc())
            .load(&mut conn)
            .map_err(query_err)
    }

    async fn feedback_for_tickets(&self, ids: &[Uuid]) -> Result<Vec<TicketFeedback>, StoreError> {
        let mut conn = self.conn()?;
        ticket_feedback::table
            .filter(ticket_feedback::ticket_id.eq_any(ids.iter().copied()))
            .order(ticket_feedback::created_at.asc())
            .load(&mut conn)
            .map_err(query_err)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
