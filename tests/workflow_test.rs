use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use arenahub::auth::{MemAuthProvider, Principal};
use arenahub::build_router;
use arenahub::core::config::{AppConfig, DatabaseConfig, DriveConfig, ServerConfig};
use arenahub::core::state::AppState;
use arenahub::drive::MemBlobStore;
use arenahub::store::mem::MemStore;
use arenahub::store::{Profile, RecordStore, ROLE_SUPERADMIN};

const SETUP_CODE: &str = "tryouts-2024";

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "unused".into(),
            max_connections: 1,
        },
        drive: DriveConfig {
            server: "http://localhost:9000".into(),
            access_key: "test".into(),
            secret_key: "test".into(),
            bucket: "arenahub".into(),
        },
        admin_setup_code: SETUP_CODE.into(),
    }
}

fn test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        test_config(),
        Arc::new(MemStore::new()),
        Arc::new(MemAuthProvider::new()),
        Arc::new(MemBlobStore::new()),
    ));
    (build_router(state.clone()), state)
}

async fn seed_member(state: &AppState, gamertag: &str, role: &str) -> String {
    let mut profile = Profile::new(
        Uuid::new_v4(),
        gamertag.into(),
        format!("{gamertag} Fullname"),
        format!("{gamertag}@arena.gg"),
        NaiveDate::from_ymd_opt(1998, 6, 15).unwrap(),
    );
    profile.role = role.to_string();
    profile.is_admin = role != "user";
    profile.is_superadmin = role == ROLE_SUPERADMIN;
    let principal = Principal {
        id: profile.user_id,
        email: profile.email.clone(),
    };
    state.store.insert_profile(profile).await.unwrap();
    let token = state.sessions.issue(principal);
    format!("arenahub_session={token}")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn gate_hides_admin_path_for_plain_users() {
    let (app, state) = test_app();
    let cookie = seed_member(&state, "rookie", "user").await;

    let response = app.clone().oneshot(get("/gate", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("I'm being recruited") || html.contains("I&#x27;m being recruited"));
    assert!(!html.contains("Admin Access"));

    let admin_cookie = seed_member(&state, "boss", ROLE_SUPERADMIN).await;
    let response = app.oneshot(get("/gate", Some(&admin_cookie))).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Admin Access"));
}

#[tokio::test]
async fn admin_pages_are_not_found_for_non_elevated_viewers() {
    let (app, state) = test_app();
    let cookie = seed_member(&state, "rookie", "user").await;

    let page = app.clone().oneshot(get("/admin/tickets", Some(&cookie))).await.unwrap();
    assert_eq!(page.status(), StatusCode::NOT_FOUND);

    let fragment = app
        .clone()
        .oneshot(get("/admin/tickets/list", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(fragment.status(), StatusCode::FORBIDDEN);

    let anonymous = app.oneshot(get("/admin", None)).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ticket_workflow_end_to_end() {
    let (app, state) = test_app();
    let owner_cookie = seed_member(&state, "AnaPlays", "user").await;
    let admin_cookie = seed_member(&state, "boss", ROLE_SUPERADMIN).await;

    // Owner files a ticket.
    let response = app
        .clone()
        .oneshot(form(
            "POST",
            "/api/tickets",
            Some(&owner_cookie),
            "subject=Broken+headset&message=Left+channel+is+dead&category=equipment",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Ticket submitted"));

    let ticket_id = state.store.list_tickets().await.unwrap()[0].id;

    // Admin sees it in the console list.
    let response = app
        .clone()
        .oneshot(get("/admin/tickets/list?status=all&q=ana", Some(&admin_cookie)))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Broken headset"));

    // Status filter excludes it until resolved.
    let response = app
        .clone()
        .oneshot(get("/admin/tickets/list?status=resolved&q=ana", Some(&admin_cookie)))
        .await
        .unwrap();
    assert!(!body_string(response).await.contains("Broken headset"));

    // Admin replies and resolves.
    let response = app
        .clone()
        .oneshot(form(
            "POST",
            &format!("/api/tickets/{ticket_id}/feedback"),
            Some(&admin_cookie),
            "content=Replacement+shipped",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(form(
            "PUT",
            &format!("/api/tickets/{ticket_id}/status"),
            Some(&admin_cookie),
            "status=resolved",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/admin/tickets/list?status=resolved&q=ana", Some(&admin_cookie)))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Broken headset"));
    assert!(html.contains("Replacement shipped"));

    // A plain member cannot transition status or delete.
    let response = app
        .clone()
        .oneshot(form(
            "PUT",
            &format!("/api/tickets/{ticket_id}/status"),
            Some(&owner_cookie),
            "status=open",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(form(
            "DELETE",
            &format!("/api/tickets/{ticket_id}"),
            Some(&owner_cookie),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Superadmin deletion removes the ticket and its thread.
    let response = app
        .clone()
        .oneshot(form(
            "DELETE",
            &format!("/api/tickets/{ticket_id}"),
            Some(&admin_cookie),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.store.list_tickets().await.unwrap().is_empty());
    assert!(state.store.feedback_for(ticket_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn owner_support_view_shows_only_own_thread() {
    let (app, state) = test_app();
    let ana_cookie = seed_member(&state, "AnaPlays", "user").await;
    let bob_cookie = seed_member(&state, "bob", "user").await;

    app.clone()
        .oneshot(form(
            "POST",
            "/api/tickets",
            Some(&ana_cookie),
            "subject=Travel+stipend&message=When+is+it+paid&category=payments",
        ))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/support", Some(&bob_cookie))).await.unwrap();
    assert!(!body_string(response).await.contains("Travel stipend"));

    let response = app.oneshot(get("/support", Some(&ana_cookie))).await.unwrap();
    assert!(body_string(response).await.contains("Travel stipend"));
}

#[tokio::test]
async fn provisioning_rejects_wrong_code_and_second_admin() {
    let (app, state) = test_app();

    let wrong = form(
        "POST",
        "/api/admin/setup",
        None,
        "gamertag=boss&full_name=The+Boss&dob=1990-01-01&email=boss@arena.gg\
         &password=hunter2hunter2&confirm_password=hunter2hunter2&setup_code=nope",
    );
    let response = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!state.store.privileged_profile_exists().await.unwrap());

    let good = form(
        "POST",
        "/api/admin/setup",
        None,
        &format!(
            "gamertag=boss&full_name=The+Boss&dob=1990-01-01&email=boss@arena.gg\
             &password=hunter2hunter2&confirm_password=hunter2hunter2&setup_code={SETUP_CODE}"
        ),
    );
    let response = app.clone().oneshot(good).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.store.privileged_profile_exists().await.unwrap());

    let second = form(
        "POST",
        "/api/admin/setup",
        None,
        &format!(
            "gamertag=boss2&full_name=Other&dob=1990-01-01&email=boss2@arena.gg\
             &password=hunter2hunter2&confirm_password=hunter2hunter2&setup_code={SETUP_CODE}"
        ),
    );
    let response = app.oneshot(second).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("Admin account already exists"));
}

#[tokio::test]
async fn signup_creates_profile_and_session() {
    let (app, state) = test_app();

    let response = app
        .clone()
        .oneshot(form(
            "POST",
            "/auth/signup",
            None,
            "email=new@arena.gg&password=longenough1&gamertag=fresh&full_name=Fresh+Face&dob=2001-09-09",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
        .expect("session cookie");

    let profiles = state.store.list_profiles().await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].gamertag, "fresh");
    assert_eq!(profiles[0].role, "user");

    // The fresh session reaches the profile screen.
    let response = app.clone().oneshot(get("/profile", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("fresh"));

    // Sign-out invalidates the session.
    let response = app
        .clone()
        .oneshot(form("POST", "/auth/signout", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app.oneshot(get("/profile", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recruitment_save_round_trips_and_keeps_identity_fields() {
    let (app, state) = test_app();
    let cookie = seed_member(&state, "AnaPlays", "user").await;
    let before = state.store.list_profiles().await.unwrap()[0].clone();

    let response = app
        .clone()
        .oneshot(form(
            "POST",
            "/api/recruit",
            Some(&cookie),
            "experience_years=4&platforms=PC,+Xbox&game_title=Valorant\
             &followers_instagram=1200&followers_twitch=800&bio=IGL",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Application saved"));

    let after = state.store.profile(before.user_id).await.unwrap().unwrap();
    assert_eq!(after.experience_years, Some(4));
    assert_eq!(after.platforms, vec!["PC", "Xbox"]);
    assert!(after.applied_at.is_some());
    assert_eq!(after.full_name, before.full_name);
    assert_eq!(after.dob, before.dob);
    assert_eq!(after.email, before.email);

    // Summary is a pure read view; nothing on it is editable.
    let response = app.oneshot(get("/recruit/summary", Some(&cookie))).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Valorant"));
    assert!(!html.contains("<input"));
    assert!(!html.contains("<textarea"));
}
