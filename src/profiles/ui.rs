use crate::site::nav::html_escape;
use crate::store::Profile;

fn readonly_field(label: &str, value: &str) -> String {
    format!(
        "<label>{label} <input value=\"{}\" readonly disabled></label>",
        html_escape(value)
    )
}

/// Account screen. Name, date of birth and email are presented read-only
/// to the owner; only gamertag, phone, bio and the photo are editable.
pub fn render_profile_form(profile: &Profile) -> String {
    let photo = profile
        .photo_path
        .as_deref()
        .map(|url| {
            format!(
                "<img class=\"avatar\" src=\"{}\" alt=\"profile photo\">",
                html_escape(url)
            )
        })
        .unwrap_or_else(|| "<div class=\"avatar avatar-empty\">No photo</div>".to_string());

    format!(
        "<section class=\"profile\">\
            <h1>Your profile</h1>\
            {photo}\
            <form hx-post=\"/api/profile\" hx-encoding=\"multipart/form-data\" \
                hx-target=\"#notices\" hx-swap=\"innerHTML\">\
                <fieldset><legend>Identity</legend>\
                    {full_name}{dob}{email}\
                </fieldset>\
                <label>Gamertag <input name=\"gamertag\" value=\"{gamertag}\" required></label>\
                <label>Phone <input name=\"phone\" value=\"{phone}\"></label>\
                <label>Bio <textarea name=\"bio\" rows=\"4\">{bio}</textarea></label>\
                <label>Profile photo <input type=\"file\" name=\"photo\" accept=\"image/*\"></label>\
                <button type=\"submit\" class=\"btn btn-primary\">Save profile</button>\
            </form>\
        </section>",
        full_name = readonly_field("Full name", &profile.full_name),
        dob = readonly_field("Date of birth", &profile.dob.to_string()),
        email = readonly_field("Email", &profile.email),
        gamertag = html_escape(&profile.gamertag),
        phone = html_escape(profile.phone.as_deref().unwrap_or("")),
        bio = html_escape(profile.bio.as_deref().unwrap_or("")),
    )
}
