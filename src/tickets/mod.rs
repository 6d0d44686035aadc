pub mod ui;

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    routing::{delete, get, post, put},
    Form, Router,
};
use futures_util::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::resolver::SessionContext;
use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::site::nav::{render_notice, render_page};
use crate::store::{
    ChangeAction, ChangeEvent, Collection, RecordStore, StoreError, SupportTicket, TicketFeedback,
    TICKET_STATUSES,
};

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/support", get(handle_support_page))
        .route("/support/list", get(handle_support_list))
        .route("/api/tickets", post(handle_create_ticket))
        .route("/api/tickets/:id/feedback", post(handle_add_feedback))
        .route("/api/tickets/:id/status", put(handle_change_status))
        .route("/api/tickets/:id", delete(handle_delete_ticket))
        .route("/admin/tickets", get(handle_console_page))
        .route("/admin/tickets/list", get(handle_console_list))
        .route("/admin/tickets/events", get(handle_console_events))
}

/// One ticket with its resolved owner and feedback thread, the unit the
/// console renders and filters over.
#[derive(Debug, Clone)]
pub struct TicketView {
    pub ticket: SupportTicket,
    pub owner_name: Option<String>,
    pub owner_role: Option<String>,
    pub feedback: Vec<TicketFeedback>,
}

/// Assembles the console's working set: all tickets newest-first, owner
/// names resolved with one batched query over the distinct owner ids,
/// feedback threads fetched batched and grouped oldest-first.
pub async fn load_ticket_views(store: &dyn RecordStore) -> Result<Vec<TicketView>, StoreError> {
    let tickets = store.list_tickets().await?;

    let mut seen = HashSet::new();
    let owner_ids: Vec<Uuid> = tickets
        .iter()
        .map(|t| t.owner_id)
        .filter(|id| seen.insert(*id))
        .collect();
    let owners: HashMap<Uuid, (String, String)> = store
        .profiles_by_ids(&owner_ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id, (p.gamertag, p.role)))
        .collect();

    let ticket_ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let mut threads: HashMap<Uuid, Vec<TicketFeedback>> = HashMap::new();
    for feedback in store.feedback_for_tickets(&ticket_ids).await? {
        threads.entry(feedback.ticket_id).or_default().push(feedback);
    }

    Ok(tickets
        .into_iter()
        .map(|ticket| {
            let owner = owners.get(&ticket.owner_id);
            let feedback = threads.remove(&ticket.id).unwrap_or_default();
            TicketView {
                owner_name: owner.map(|(name, _)| name.clone()),
                owner_role: owner.map(|(_, role)| role.clone()),
                feedback,
                ticket,
            }
        })
        .collect())
}

/// Console filter: status matches the selected tab (or the tab is `all`)
/// AND the resolved owner display name contains the search text,
/// case-insensitively. A ticket whose owner could not be resolved only
/// matches an empty search.
pub fn matches_filter(view: &TicketView, tab: &str, search: &str) -> bool {
    if tab != "all" && view.ticket.status != tab {
        return false;
    }
    if search.is_empty() {
        return true;
    }
    match &view.owner_name {
        Some(name) => name.to_lowercase().contains(&search.to_lowercase()),
        None => false,
    }
}

/// The console refetches on ticket insert/update/delete and on feedback
/// inserts; profile changes are not its concern.
pub fn console_relevant(event: &ChangeEvent) -> bool {
    match event.collection {
        Collection::Tickets => true,
        Collection::Feedback => event.action == ChangeAction::Insert,
        Collection::Profiles => false,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketForm {
    pub subject: String,
    pub message: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsoleQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

async fn handle_create_ticket(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Form(req): Form<CreateTicketForm>,
) -> Result<Html<String>, AppError> {
    let principal = ctx.require_principal()?;
    if req.subject.trim().is_empty() || req.message.trim().is_empty() {
        return Err(AppError::Validation(
            "subject and message are required".to_string(),
        ));
    }
    let ticket = SupportTicket::new(
        principal.id,
        req.subject.trim().to_string(),
        req.message.trim().to_string(),
        req.category,
    );
    match state.store.insert_ticket(ticket).await {
        Ok(()) => Ok(Html(render_notice("success", "Ticket submitted"))),
        Err(e) => {
            log::error!("ticket create failed: {e}");
            Ok(Html(render_notice("error", "Could not submit the ticket")))
        }
    }
}

/// Feedback is append-only and tagged with the submitting principal's id,
/// display name and role snapshot. Ticket owners and elevated staff may
/// write; nobody edits or deletes.
async fn handle_add_feedback(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(ticket_id): Path<Uuid>,
    Form(req): Form<FeedbackForm>,
) -> Result<Html<String>, AppError> {
    let principal = ctx.require_principal()?;
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("feedback cannot be empty".to_string()));
    }
    let ticket = state
        .store
        .ticket(ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound("ticket not found".to_string()))?;
    if ticket.owner_id != principal.id && !ctx.is_elevated() {
        return Err(AppError::Forbidden(
            "only the ticket owner or staff can reply".to_string(),
        ));
    }

    let feedback = TicketFeedback {
        id: Uuid::new_v4(),
        ticket_id: ticket.id,
        author_id: principal.id,
        author_name: ctx
            .display_name
            .clone()
            .unwrap_or_else(|| principal.email.clone()),
        author_role: ctx
            .role
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|| "user".to_string()),
        content: req.content.trim().to_string(),
        created_at: chrono::Utc::now(),
    };
    match state.store.insert_feedback(feedback).await {
        Ok(()) => Ok(Html(render_notice("success", "Reply added"))),
        Err(e) => {
            log::error!("feedback insert failed: {e}");
            Ok(Html(render_notice("error", "Could not add the reply")))
        }
    }
}

async fn handle_change_status(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(ticket_id): Path<Uuid>,
    Form(req): Form<StatusForm>,
) -> Result<Html<String>, AppError> {
    ctx.require_elevated()?;
    if !TICKET_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!(
            "unknown status {}",
            req.status
        )));
    }
    match state.store.set_ticket_status(ticket_id, &req.status).await {
        Ok(()) => Ok(Html(render_notice("success", "Status updated"))),
        Err(e) => {
            log::error!("status update failed for {ticket_id}: {e}");
            Ok(Html(render_notice("error", "Could not update the status")))
        }
    }
}

/// Deletion is restricted to superadmin; the confirmation step happens in
/// the modal client-side, and the role is re-checked here regardless.
async fn handle_delete_ticket(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(ticket_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    ctx.require_superadmin()?;
    match state.store.delete_ticket(ticket_id).await {
        Ok(()) => Ok(Html(render_notice("success", "Ticket deleted"))),
        Err(e) => {
            log::error!("delete failed for {ticket_id}: {e}");
            Ok(Html(render_notice("error", "Could not delete the ticket")))
        }
    }
}

async fn handle_support_page(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    if !ctx.authenticated() {
        let body = "<section class=\"auth-form\">\
            <h1>Support</h1>\
            <p><a href=\"/auth/signin\">Sign in</a> to open an HR ticket.</p>\
        </section>";
        return Ok(Html(render_page("Support", &ctx, body)));
    }
    let list = support_list_fragment(&state, &ctx).await?;
    Ok(Html(render_page(
        "Support",
        &ctx,
        &ui::render_support_page(&list),
    )))
}

async fn handle_support_list(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    Ok(Html(support_list_fragment(&state, &ctx).await?))
}

async fn support_list_fragment(
    state: &AppState,
    ctx: &SessionContext,
) -> Result<String, AppError> {
    let principal = ctx.require_principal()?;
    let tickets = state.store.tickets_for_owner(principal.id).await?;
    let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let mut threads: HashMap<Uuid, Vec<TicketFeedback>> = HashMap::new();
    for feedback in state.store.feedback_for_tickets(&ids).await? {
        threads.entry(feedback.ticket_id).or_default().push(feedback);
    }
    Ok(ui::render_own_tickets(&tickets, &threads))
}

async fn handle_console_page(
    State(_state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Html<String>, AppError> {
    ctx.require_elevated_page()?;
    Ok(Html(render_page(
        "HR Console",
        &ctx,
        &ui::render_console_page(),
    )))
}

async fn handle_console_list(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<ConsoleQuery>,
) -> Result<Html<String>, AppError> {
    ctx.require_elevated()?;
    let tab = query.status.unwrap_or_else(|| "all".to_string());
    let search = query.q.unwrap_or_default();
    let views: Vec<TicketView> = load_ticket_views(state.store.as_ref())
        .await?
        .into_iter()
        .filter(|view| matches_filter(view, &tab, &search))
        .collect();
    Ok(Html(ui::render_console_list(&views, &ctx)))
}

/// Live console feed. Every relevant change event is pushed as an SSE
/// `change` event and the page answers with a full list refetch. The
/// stream ends on shutdown; a disconnected client drops its subscription.
async fn handle_console_events(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    ctx.require_elevated()?;
    let mut sub = state.store.changes().subscribe();
    let shutdown = state.shutdown.clone();
    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = sub.recv() => match event {
                    Some(event) if console_relevant(&event) => {
                        let data = serde_json::to_string(&event).unwrap_or_default();
                        yield Ok(Event::default().event("change").data(data));
                    }
                    Some(_) => continue,
                    None => break,
                },
            }
        }
    };
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
