use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::store::{
    ChangeAction, ChangeFeed, Collection, Profile, ProfilePatch, RecordStore, StoreError,
    SupportTicket, TicketFeedback, ROLE_ADMIN, ROLE_SUPERADMIN,
};

#[derive(Default)]
struct MemInner {
    profiles: Vec<Profile>,
    tickets: Vec<SupportTicket>,
    feedback: Vec<TicketFeedback>,
}

/// In-memory record store with the same ordering guarantees as the
/// Postgres one. Used as the hermetic fake in tests; the failure toggles
/// let tests exercise the degraded paths.
pub struct MemStore {
    inner: Mutex<MemInner>,
    feed: ChangeFeed,
    pub fail_profile_reads: AtomicBool,
    pub fail_profile_inserts: AtomicBool,
    pub fail_ticket_writes: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemInner::default()),
            feed: ChangeFeed::new(),
            fail_profile_reads: AtomicBool::new(false),
            fail_profile_inserts: AtomicBool::new(false),
            fail_ticket_writes: AtomicBool::new(false),
        }
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Query("simulated backend failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemStore {
    async fn insert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.check(&self.fail_profile_inserts)?;
        let id = profile.user_id;
        self.inner.lock().unwrap().profiles.push(profile);
        self.feed.publish(Collection::Profiles, ChangeAction::Insert, id);
        Ok(())
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.check(&self.fail_profile_reads)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(profile) = inner.profiles.iter_mut().find(|p| p.user_id == user_id) else {
                return Err(StoreError::Query("profile not found".to_string()));
            };
            profile.gamertag = patch.gamertag;
            profile.phone = patch.phone;
            profile.experience_years = patch.experience_years;
            profile.platforms = patch.platforms;
            profile.game_title = patch.game_title;
            profile.followers_instagram = patch.followers_instagram;
            profile.followers_twitch = patch.followers_twitch;
            profile.bio = patch.bio;
            profile.is_minor = patch.is_minor;
            profile.guardian_name = patch.guardian_name;
            profile.guardian_phone = patch.guardian_phone;
            profile.photo_path = patch.photo_path;
            profile.applied_at = patch.applied_at;
            profile.updated_at = patch.updated_at;
        }
        self.feed.publish(Collection::Profiles, ChangeAction::Update, user_id);
        Ok(())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        self.check(&self.fail_profile_reads)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.check(&self.fail_profile_reads)?;
        let inner = self.inner.lock().unwrap();
        let mut profiles = inner.profiles.clone();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }

    async fn privileged_profile_exists(&self) -> Result<bool, StoreError> {
        self.check(&self.fail_profile_reads)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.iter().any(|p| {
            p.role == ROLE_ADMIN || p.role == ROLE_SUPERADMIN || p.is_admin || p.is_superadmin
        }))
    }

    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(profile) = inner.profiles.iter_mut().find(|p| p.user_id == user_id) else {
                return Err(StoreError::Query("profile not found".to_string()));
            };
            profile.role = role.to_string();
            profile.is_admin = role == ROLE_ADMIN || role == ROLE_SUPERADMIN;
            profile.is_superadmin = role == ROLE_SUPERADMIN;
            profile.updated_at = chrono::Utc::now();
        }
        self.feed.publish(Collection::Profiles, ChangeAction::Update, user_id);
        Ok(())
    }

    async fn insert_ticket(&self, ticket: SupportTicket) -> Result<(), StoreError> {
        self.check(&self.fail_ticket_writes)?;
        let id = ticket.id;
        self.inner.lock().unwrap().tickets.push(ticket);
        self.feed.publish(Collection::Tickets, ChangeAction::Insert, id);
        Ok(())
    }

    async fn list_tickets(&self) -> Result<Vec<SupportTicket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut tickets = inner.tickets.clone();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<SupportTicket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut tickets: Vec<SupportTicket> = inner
            .tickets
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn set_ticket_status(&self, id: Uuid, status: &str) -> Result<(), StoreError> {
        self.check(&self.fail_ticket_writes)?;
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(ticket) = inner.tickets.iter_mut().find(|t| t.id == id) else {
                return Err(StoreError::Query("ticket not found".to_string()));
            };
            ticket.status = status.to_string();
        }
        self.feed.publish(Collection::Tickets, ChangeAction::Update, id);
        Ok(())
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(&self.fail_ticket_writes)?;
        {
            let mut inner = self.inner.lock().unwrap();
            inner.feedback.retain(|f| f.ticket_id != id);
            inner.tickets.retain(|t| t.id != id);
        }
        self.feed.publish(Collection::Tickets, ChangeAction::Delete, id);
        Ok(())
    }

    async fn insert_feedback(&self, feedback: TicketFeedback) -> Result<(), StoreError> {
        let id = feedback.id;
        self.inner.lock().unwrap().feedback.push(feedback);
        self.feed.publish(Collection::Feedback, ChangeAction::Insert, id);
        Ok(())
    }

    async fn feedback_for(&self, ticket_id: Uuid) -> Result<Vec<TicketFeedback>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<TicketFeedback> = inner
            .feedback
            .iter()
            .filter(|f| f.ticket_id == ticket_id)
            .cloned()
            .collect();
        items.sort_by_key(|f| f.created_at);
        Ok(items)
    }

    async fn feedback_for_tickets(&self, ids: &[Uuid]) -> Result<Vec<TicketFeedback>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<TicketFeedback> = inner
            .feedback
            .iter()
            .filter(|f| ids.contains(&f.ticket_id))
            .cloned()
            .collect();
        items.sort_by_key(|f| f.created_at);
        Ok(items)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
