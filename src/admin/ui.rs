use crate::auth::resolver::SessionContext;
use crate::site::nav::html_escape;
use crate::store::{Profile, ROLE_ADMIN, ROLE_SUPERADMIN, ROLE_USER};

pub const ADMIN_HOME: &str = "<section class=\"admin-home\">\
    <h1>Admin</h1>\
    <div class=\"admin-cards\">\
        <a class=\"admin-card\" href=\"/admin/tickets\"><h3>HR Console</h3>\
            <p>Support tickets and feedback threads.</p></a>\
        <a class=\"admin-card\" href=\"/admin/members\"><h3>Members</h3>\
            <p>Profiles and role assignments.</p></a>\
    </div>\
</section>";

pub const SETUP_FORM: &str = "<section class=\"auth-form\">\
    <h1>Admin setup</h1>\
    <p>One-time creation of the first privileged account. Requires the \
    setup code configured on the server.</p>\
    <form hx-post=\"/api/admin/setup\" hx-target=\"#notices\" hx-swap=\"innerHTML\">\
        <label>Gamertag <input name=\"gamertag\" required></label>\
        <label>Full name <input name=\"full_name\" required></label>\
        <label>Date of birth <input type=\"date\" name=\"dob\" required></label>\
        <label>Email <input type=\"email\" name=\"email\" required></label>\
        <label>Password <input type=\"password\" name=\"password\" required minlength=\"8\"></label>\
        <label>Confirm password <input type=\"password\" name=\"confirm_password\" required></label>\
        <label>Setup code <input type=\"password\" name=\"setup_code\" required></label>\
        <button type=\"submit\" class=\"btn btn-primary\">Provision admin</button>\
    </form>\
</section>";

pub const MEMBERS_PAGE: &str = "<section class=\"members\">\
    <h1>Members</h1>\
    <div id=\"members-table\" hx-get=\"/admin/members/list\" hx-trigger=\"load\"></div>\
</section>";

fn role_select(member: &Profile) -> String {
    let options: String = [ROLE_USER, ROLE_ADMIN, ROLE_SUPERADMIN]
        .iter()
        .map(|role| {
            let selected = if *role == member.role { " selected" } else { "" };
            format!("<option value=\"{role}\"{selected}>{role}</option>")
        })
        .collect();
    format!(
        "<select name=\"role\" hx-put=\"/api/admin/members/{}/role\" \
          hx-trigger=\"change\" hx-target=\"#notices\" hx-swap=\"innerHTML\">{options}</select>",
        member.user_id
    )
}

/// Member table. The role control is rendered only for superadmin
/// viewers; everyone elevated can read the table.
pub fn render_members_table(members: &[Profile], viewer: &SessionContext) -> String {
    if members.is_empty() {
        return "<p class=\"empty-state\">No members yet.</p>".to_string();
    }
    let rows: String = members
        .iter()
        .map(|member| {
            let role_cell = if viewer.is_superadmin() {
                role_select(member)
            } else {
                html_escape(&member.role)
            };
            format!(
                "<tr data-id=\"{id}\">\
                    <td>{gamertag}</td>\
                    <td>{full_name}</td>\
                    <td>{email}</td>\
                    <td>{role_cell}</td>\
                    <td>{joined}</td>\
                </tr>",
                id = member.user_id,
                gamertag = html_escape(&member.gamertag),
                full_name = html_escape(&member.full_name),
                email = html_escape(&member.email),
                joined = member.created_at.format("%Y-%m-%d"),
            )
        })
        .collect();
    format!(
        "<table class=\"members-table\">\
            <thead><tr><th>Gamertag</th><th>Name</th><th>Email</th><th>Role</th><th>Joined</th></tr></thead>\
            <tbody>{rows}</tbody>\
        </table>"
    )
}
