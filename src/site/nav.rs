use crate::auth::resolver::SessionContext;

/// One navigation entry. The link set is derived from the resolved
/// session context; there is no other source of menu state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl NavLink {
    const fn new(label: &'static str, href: &'static str) -> Self {
        Self { label, href }
    }
}

/// Common links always; admin entries appended only when elevation
/// resolved true. `Unknown` elevation renders exactly like not elevated.
pub fn nav_links(ctx: &SessionContext) -> Vec<NavLink> {
    let mut links = vec![
        NavLink::new("Home", "/"),
        NavLink::new("Recruitment", "/recruit"),
    ];
    if ctx.authenticated() {
        links.push(NavLink::new("Support", "/support"));
        links.push(NavLink::new("Profile", "/profile"));
    }
    if ctx.is_elevated() {
        links.push(NavLink::new("Admin Console", "/admin"));
    }
    links
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn render_nav(ctx: &SessionContext) -> String {
    let items: String = nav_links(ctx)
        .iter()
        .map(|link| {
            format!(
                "<a class=\"nav-link\" href=\"{}\">{}</a>",
                link.href, link.label
            )
        })
        .collect();

    let session_controls = if ctx.authenticated() {
        let name = ctx.display_name.as_deref().unwrap_or("Player");
        format!(
            "<span class=\"nav-user\">{}</span>\
             <form class=\"nav-signout\" method=\"post\" action=\"/auth/signout\">\
                <button type=\"submit\" class=\"btn-link\">Sign out</button>\
             </form>",
            html_escape(name)
        )
    } else {
        "<a class=\"nav-link\" href=\"/auth/signin\">Sign in</a>".to_string()
    };

    format!(
        "<nav class=\"navbar\">\
            <a class=\"nav-brand\" href=\"/\">ArenaHub</a>\
            <div class=\"nav-links\">{items}</div>\
            <div class=\"nav-session\">{session_controls}</div>\
        </nav>"
    )
}

pub fn render_notice(kind: &str, message: &str) -> String {
    format!(
        "<div class=\"notice notice-{kind}\" role=\"status\">{}</div>",
        html_escape(message)
    )
}

/// Full page shell: nav, notice target, htmx runtime.
pub fn render_page(title: &str, ctx: &SessionContext, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
        <html lang=\"en\">\
        <head>\
            <meta charset=\"utf-8\">\
            <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
            <title>{} | ArenaHub</title>\
            <link rel=\"stylesheet\" href=\"/static/arenahub.css\">\
            <script src=\"https://unpkg.com/htmx.org@1.9.12\"></script>\
        </head>\
        <body>\
            {}\
            <div id=\"notices\"></div>\
            <main class=\"content\">{}</main>\
        </body>\
        </html>",
        html_escape(title),
        render_nav(ctx),
        body
    )
}
