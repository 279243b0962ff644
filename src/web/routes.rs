use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::AppState;
use crate::frontend::static_files;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/signup", get(handlers::signup_form).post(handlers::signup_submit))
        .route("/login", get(handlers::login_form).post(handlers::login_submit))
        .route("/logout", get(handlers::logout))
        .route("/patient/dashboard", get(handlers::patient_dashboard))
        .route("/doctor/dashboard", get(handlers::doctor_dashboard))
        .route(
            "/book-appointment",
            get(handlers::book_appointment_form).post(handlers::book_appointment_submit),
        )
        .route("/view-appointment/:id", get(handlers::view_appointment_patient))
        .route(
            "/doctor/view-appointment/:id",
            get(handlers::view_appointment_doctor),
        )
        .route("/doctor/submit-diagnosis/:id", post(handlers::submit_diagnosis))
        .route("/patient/profile", get(handlers::patient_profile))
        .route("/doctor/profile", get(handlers::doctor_profile))
        .route(
            "/forgot-password",
            get(handlers::forgot_password_form).post(handlers::forgot_password_submit),
        )
        .merge(static_files::create_static_router())
        .with_state(state)
}
