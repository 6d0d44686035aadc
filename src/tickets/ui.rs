use std::collections::HashMap;

use uuid::Uuid;

use crate::auth::resolver::SessionContext;
use crate::site::nav::html_escape;
use crate::store::{SupportTicket, TicketFeedback, TICKET_STATUSES};
use crate::tickets::TicketView;

fn status_badge(status: &str) -> &'static str {
    match status {
        "open" => "<span class=\"badge badge-primary\">Open</span>",
        "in_review" => "<span class=\"badge badge-warning\">In review</span>",
        "resolved" => "<span class=\"badge badge-success\">Resolved</span>",
        _ => "<span class=\"badge\">Unknown</span>",
    }
}

fn render_empty_state(title: &str, description: &str) -> String {
    format!(
        "<div class=\"empty-state\"><h3>{}</h3><p>{}</p></div>",
        html_escape(title),
        html_escape(description)
    )
}

pub fn render_feedback_thread(items: &[TicketFeedback]) -> String {
    if items.is_empty() {
        return "<p class=\"thread-empty\">No replies yet.</p>".to_string();
    }
    let entries: String = items
        .iter()
        .map(|f| {
            format!(
                "<li class=\"feedback-entry\">\
                    <span class=\"feedback-author\">{} <em>({})</em></span>\
                    <span class=\"feedback-time\">{}</span>\
                    <p>{}</p>\
                </li>",
                html_escape(&f.author_name),
                html_escape(&f.author_role),
                f.created_at.format("%Y-%m-%d %H:%M"),
                html_escape(&f.content)
            )
        })
        .collect();
    format!("<ul class=\"feedback-thread\">{entries}</ul>")
}

fn render_feedback_form(ticket_id: Uuid) -> String {
    format!(
        "<form class=\"feedback-form\" hx-post=\"/api/tickets/{ticket_id}/feedback\" \
          hx-target=\"#notices\" hx-swap=\"innerHTML\">\
            <textarea name=\"content\" rows=\"2\" required placeholder=\"Write a reply\"></textarea>\
            <button type=\"submit\" class=\"btn-sm\">Reply</button>\
        </form>"
    )
}

/// Owner-facing support screen: create form plus the refreshing list of
/// the viewer's own tickets.
pub fn render_support_page(list_fragment: &str) -> String {
    format!(
        "<section class=\"support\">\
            <h1>HR Support</h1>\
            <form class=\"ticket-form\" hx-post=\"/api/tickets\" hx-target=\"#notices\" hx-swap=\"innerHTML\">\
                <label>Subject <input name=\"subject\" required></label>\
                <label>Category \
                    <select name=\"category\">\
                        <option value=\"hr\">HR</option>\
                        <option value=\"equipment\">Equipment</option>\
                        <option value=\"payments\">Payments</option>\
                        <option value=\"other\">Other</option>\
                    </select>\
                </label>\
                <label>Message <textarea name=\"message\" rows=\"4\" required></textarea></label>\
                <button type=\"submit\" class=\"btn btn-primary\">Submit ticket</button>\
            </form>\
            <div id=\"own-tickets\" hx-get=\"/support/list\" hx-trigger=\"every 30s\">{list_fragment}</div>\
        </section>"
    )
}

pub fn render_own_tickets(
    tickets: &[SupportTicket],
    threads: &HashMap<Uuid, Vec<TicketFeedback>>,
) -> String {
    if tickets.is_empty() {
        return render_empty_state("No tickets yet", "Anything on your mind? Open a ticket above.");
    }
    tickets
        .iter()
        .map(|ticket| {
            let empty = Vec::new();
            let thread = threads.get(&ticket.id).unwrap_or(&empty);
            format!(
                "<article class=\"ticket-card\" data-id=\"{id}\">\
                    <header>\
                        <h4>{subject}</h4>\
                        {status}\
                        <span class=\"ticket-created\">{created}</span>\
                    </header>\
                    <p>{message}</p>\
                    {thread}\
                    {form}\
                </article>",
                id = ticket.id,
                subject = html_escape(&ticket.subject),
                status = status_badge(&ticket.status),
                created = ticket.created_at.format("%Y-%m-%d %H:%M"),
                message = html_escape(&ticket.message),
                thread = render_feedback_thread(thread),
                form = render_feedback_form(ticket.id),
            )
        })
        .collect()
}

/// Admin console shell: status tabs, owner search, the list container and
/// the SSE wiring that turns every change event into a full refetch.
pub fn render_console_page() -> String {
    let tabs: String = std::iter::once("all")
        .chain(TICKET_STATUSES)
        .map(|status| format!("<option value=\"{status}\">{status}</option>"))
        .collect();
    format!(
        "<section class=\"console\">\
            <h1>HR Console</h1>\
            <div class=\"console-controls\">\
                <select id=\"status-filter\" name=\"status\" \
                    hx-get=\"/admin/tickets/list\" hx-target=\"#ticket-list\" \
                    hx-include=\"#status-filter,#owner-search\">{tabs}</select>\
                <input id=\"owner-search\" name=\"q\" placeholder=\"Search by gamertag\" \
                    hx-get=\"/admin/tickets/list\" hx-target=\"#ticket-list\" \
                    hx-trigger=\"keyup changed delay:300ms\" \
                    hx-include=\"#status-filter,#owner-search\">\
            </div>\
            <div id=\"ticket-list\" hx-get=\"/admin/tickets/list\" hx-trigger=\"load\"></div>\
            <script>\
                const feed = new EventSource('/admin/tickets/events');\
                feed.addEventListener('change', () => {{\
                    const status = document.getElementById('status-filter').value;\
                    const q = document.getElementById('owner-search').value;\
                    htmx.ajax('GET', '/admin/tickets/list?status=' + encodeURIComponent(status) \
                        + '&q=' + encodeURIComponent(q), '#ticket-list');\
                }});\
            </script>\
        </section>"
    )
}

fn render_status_select(ticket: &SupportTicket) -> String {
    let options: String = TICKET_STATUSES
        .iter()
        .map(|status| {
            let selected = if *status == ticket.status { " selected" } else { "" };
            format!("<option value=\"{status}\"{selected}>{status}</option>")
        })
        .collect();
    format!(
        "<select name=\"status\" hx-put=\"/api/tickets/{}/status\" \
          hx-trigger=\"change\" hx-target=\"#notices\" hx-swap=\"innerHTML\">{options}</select>",
        ticket.id
    )
}

/// Explicit confirmation step: the delete call fires only from the
/// modal's confirm button; cancel closes the modal with no action.
fn render_delete_modal(ticket_id: Uuid) -> String {
    format!(
        "<button class=\"btn-danger btn-sm\" \
            onclick=\"document.getElementById('delete-modal-{ticket_id}').style.display='block'\">\
            Delete</button>\
        <div class=\"modal\" id=\"delete-modal-{ticket_id}\" style=\"display:none\">\
            <div class=\"modal-body\">\
                <p>Delete this ticket and its whole thread? This cannot be undone.</p>\
                <button class=\"btn-danger\" hx-delete=\"/api/tickets/{ticket_id}\" \
                    hx-target=\"#notices\" hx-swap=\"innerHTML\">Confirm delete</button>\
                <button class=\"btn\" \
                    onclick=\"document.getElementById('delete-modal-{ticket_id}').style.display='none'\">\
                    Cancel</button>\
            </div>\
        </div>"
    )
}

pub fn render_console_list(views: &[TicketView], viewer: &SessionContext) -> String {
    if views.is_empty() {
        return render_empty_state("No tickets", "Nothing matches the current filter.");
    }
    views
        .iter()
        .map(|view| {
            let owner = view.owner_name.as_deref().unwrap_or("(no profile)");
            let owner_role = view.owner_role.as_deref().unwrap_or("-");
            let delete_control = if viewer.is_superadmin() {
                render_delete_modal(view.ticket.id)
            } else {
                String::new()
            };
            format!(
                "<article class=\"ticket-card\" data-id=\"{id}\">\
                    <header>\
                        <h4>{subject}</h4>\
                        {status}\
                        <span class=\"ticket-owner\">{owner} <em>({owner_role})</em></span>\
                        <span class=\"ticket-created\">{created}</span>\
                    </header>\
                    <p class=\"ticket-category\">{category}</p>\
                    <p>{message}</p>\
                    {thread}\
                    {feedback_form}\
                    <footer class=\"ticket-actions\">{status_select}{delete_control}</footer>\
                </article>",
                id = view.ticket.id,
                subject = html_escape(&view.ticket.subject),
                status = status_badge(&view.ticket.status),
                owner = html_escape(owner),
                owner_role = html_escape(owner_role),
                created = view.ticket.created_at.format("%Y-%m-%d %H:%M"),
                category = html_escape(&view.ticket.category),
                message = html_escape(&view.ticket.message),
                thread = render_feedback_thread(&view.feedback),
                feedback_form = render_feedback_form(view.ticket.id),
                status_select = render_status_select(&view.ticket),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::resolver::{Elevation, Role};
    use crate::auth::Principal;
    use chrono::{Duration, Utc};

    fn viewer(role: Role) -> SessionContext {
        SessionContext {
            principal: Some(Principal {
                id: Uuid::new_v4(),
                email: "staff@arena.gg".into(),
            }),
            display_name: Some("staff".into()),
            role: Some(role),
            elevation: if role == Role::User {
                Elevation::NotElevated
            } else {
                Elevation::Elevated
            },
        }
    }

    fn sample_view() -> TicketView {
        TicketView {
            ticket: SupportTicket::new(Uuid::new_v4(), "Broken mouse".into(), "m".into(), "equipment".into()),
            owner_name: Some("AnaPlays".into()),
            owner_role: Some("user".into()),
            feedback: Vec::new(),
        }
    }

    #[test]
    fn delete_control_renders_only_for_superadmin() {
        let views = vec![sample_view()];
        let admin_html = render_console_list(&views, &viewer(Role::Admin));
        assert!(!admin_html.contains("hx-delete"));
        let superadmin_html = render_console_list(&views, &viewer(Role::Superadmin));
        assert!(superadmin_html.contains("hx-delete"));
        assert!(superadmin_html.contains("Confirm delete"));
        assert!(superadmin_html.contains("Cancel"));
    }

    #[test]
    fn thread_renders_entries_in_given_order_with_role_snapshot() {
        let ticket_id = Uuid::new_v4();
        let entry = |content: &str, role: &str, minutes: i64| TicketFeedback {
            id: Uuid::new_v4(),
            ticket_id,
            author_id: Uuid::new_v4(),
            author_name: "Ana".into(),
            author_role: role.into(),
            content: content.into(),
            created_at: Utc::now() - Duration::minutes(minutes),
        };
        let html = render_feedback_thread(&[entry("first", "user", 10), entry("second", "admin", 1)]);
        let first_pos = html.find("first").unwrap();
        let second_pos = html.find("second").unwrap();
        assert!(first_pos < second_pos);
        assert!(html.contains("(admin)"));
    }

    #[test]
    fn ticket_content_is_escaped() {
        let mut view = sample_view();
        view.ticket.subject = "<img onerror=x>".into();
        let html = render_console_list(&[view], &viewer(Role::Admin));
        assert!(!html.contains("<img onerror=x>"));
    }
}
