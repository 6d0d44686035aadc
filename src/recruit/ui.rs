use crate::site::nav::html_escape;
use crate::store::Profile;

pub const RECRUIT_SIGNUP_PROMPT: &str = "<section class=\"recruit-intro\">\
    <h1>Join ArenaHub</h1>\
    <p>Open tryouts for players and creators. Create an account to start \
    your application.</p>\
    <a class=\"btn btn-primary\" href=\"/auth/signup\">Create an account</a>\
</section>";

fn readonly_field(label: &str, value: &str) -> String {
    format!(
        "<label>{label} <input value=\"{}\" readonly disabled></label>",
        html_escape(value)
    )
}

fn text_field(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{label} <input name=\"{name}\" value=\"{}\"></label>",
        html_escape(value)
    )
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn opt_num(value: Option<i32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Application form. Identity fields are always rendered read-only; the
/// guardian sub-section exists in the output only when the minor flag is
/// set on the record.
pub fn render_recruit_form(profile: &Profile) -> String {
    let guardian_section = if profile.is_minor {
        format!(
            "<fieldset class=\"guardian\">\
                <legend>Guardian</legend>\
                {}{}\
            </fieldset>",
            text_field("Guardian name", "guardian_name", opt(&profile.guardian_name)),
            text_field("Guardian phone", "guardian_phone", opt(&profile.guardian_phone)),
        )
    } else {
        String::new()
    };
    let minor_checked = if profile.is_minor { " checked" } else { "" };

    format!(
        "<section class=\"recruit\">\
            <h1>Recruitment application</h1>\
            <p><a href=\"/recruit/summary\">View submitted summary</a></p>\
            <form hx-post=\"/api/recruit\" hx-target=\"#notices\" hx-swap=\"innerHTML\">\
                <fieldset><legend>Identity</legend>\
                    {full_name}{dob}{email}\
                </fieldset>\
                <fieldset><legend>Player</legend>\
                    {experience}\
                    {platforms}\
                    {game_title}\
                </fieldset>\
                <fieldset><legend>Reach</legend>\
                    {instagram}{twitch}\
                </fieldset>\
                <label>Bio <textarea name=\"bio\" rows=\"4\">{bio}</textarea></label>\
                <label class=\"check\"><input type=\"checkbox\" name=\"is_minor\"{minor_checked}> I am under 18</label>\
                {guardian_section}\
                <button type=\"submit\" class=\"btn btn-primary\">Save application</button>\
            </form>\
        </section>",
        full_name = readonly_field("Full name", &profile.full_name),
        dob = readonly_field("Date of birth", &profile.dob.to_string()),
        email = readonly_field("Email", &profile.email),
        experience = text_field(
            "Years of competitive experience",
            "experience_years",
            &opt_num(profile.experience_years)
        ),
        platforms = text_field("Platforms (comma separated)", "platforms", &profile.platforms.join(", ")),
        game_title = text_field("Main game title", "game_title", opt(&profile.game_title)),
        instagram = text_field(
            "Instagram followers",
            "followers_instagram",
            &opt_num(profile.followers_instagram)
        ),
        twitch = text_field("Twitch followers", "followers_twitch", &opt_num(profile.followers_twitch)),
        bio = html_escape(opt(&profile.bio)),
    )
}

fn summary_row(label: &str, value: &str) -> String {
    format!(
        "<div class=\"summary-row\"><dt>{label}</dt><dd>{}</dd></div>",
        html_escape(value)
    )
}

/// Read-only application summary; no mutation reachable from here.
pub fn render_summary(profile: &Profile) -> String {
    let applied = profile
        .applied_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "not submitted".to_string());
    let guardian = if profile.is_minor {
        format!(
            "{}{}",
            summary_row("Guardian", opt(&profile.guardian_name)),
            summary_row("Guardian phone", opt(&profile.guardian_phone)),
        )
    } else {
        String::new()
    };
    format!(
        "<section class=\"summary\">\
            <h1>Application summary</h1>\
            <dl>\
                {gamertag}{full_name}{dob}{email}\
                {experience}{platforms}{game_title}\
                {instagram}{twitch}{bio}{guardian}\
                {applied_row}\
            </dl>\
            <p><a href=\"/recruit\">Back to the application</a></p>\
        </section>",
        gamertag = summary_row("Gamertag", &profile.gamertag),
        full_name = summary_row("Full name", &profile.full_name),
        dob = summary_row("Date of birth", &profile.dob.to_string()),
        email = summary_row("Email", &profile.email),
        experience = summary_row("Experience (years)", &opt_num(profile.experience_years)),
        platforms = summary_row("Platforms", &profile.platforms.join(", ")),
        game_title = summary_row("Main game", opt(&profile.game_title)),
        instagram = summary_row("Instagram followers", &opt_num(profile.followers_instagram)),
        twitch = summary_row("Twitch followers", &opt_num(profile.followers_twitch)),
        bio = summary_row("Bio", opt(&profile.bio)),
        guardian = guardian,
        applied_row = summary_row("Applied", &applied),
    )
}
