use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use uuid::Uuid;

use super::{create_router, AppState};
use crate::auth::password::hash_with;
use crate::auth::session::{SessionStore, SessionUser};
use crate::frontend::routes::RouteResolver;
use crate::mailer::Mailer;
use crate::metrics::Metrics;
use crate::store::models::{Role, UserRecord};
use crate::store::Storage;

pub const TEST_PASSWORD: &str = "s3cret-pass";

// Low-cost hash for seeded users; verify_password honors the embedded count.
const TEST_ITERATIONS: u32 = 1_000;

pub fn test_state() -> Arc<AppState> {
    // build_recorder gives a handle without installing a global recorder,
    // so tests stay independent of each other.
    let prometheus_handle = PrometheusBuilder::new().build_recorder().handle();
    Arc::new(AppState {
        storage: Storage::new(),
        sessions: SessionStore::new("medtrack_session".to_string()),
        resolver: RouteResolver::new(),
        mailer: Mailer::disabled(),
        metrics: Metrics::new(prometheus_handle),
    })
}

pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = test_state();
    (create_router(state.clone()), state)
}

pub fn seed_patient(state: &AppState, name: &str, email: &str) -> UserRecord {
    let user = UserRecord {
        id: Uuid::new_v4(),
        role: Role::Patient,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_with(TEST_PASSWORD, b"testsalt00000000", TEST_ITERATIONS),
        age: 34,
        mobile: "555-0100".to_string(),
        address: Some("12 Elm St".to_string()),
        specialization: None,
        created_at: Utc::now(),
    };
    state.storage.insert_user(user.clone()).expect("seed patient");
    user
}

pub fn seed_doctor(state: &AppState, name: &str, email: &str) -> UserRecord {
    let user = UserRecord {
        id: Uuid::new_v4(),
        role: Role::Doctor,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_with(TEST_PASSWORD, b"testsalt00000000", TEST_ITERATIONS),
        age: 48,
        mobile: "555-0199".to_string(),
        address: None,
        specialization: Some("Cardiology".to_string()),
        created_at: Utc::now(),
    };
    state.storage.insert_user(user.clone()).expect("seed doctor");
    user
}

/// Cookie header value for a session logged in directly against the store,
/// skipping the login form.
pub fn authed_cookie(state: &AppState, user: &UserRecord) -> String {
    let (_, session_id) = state.sessions.ensure(CookieJar::new());
    state.sessions.login(
        session_id,
        SessionUser {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        },
    );
    format!("medtrack_session={}", session_id)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form_with_cookie(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` part of the session cookie set by a response.
pub fn set_cookie_value(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").to_string())
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
