use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::frontend::templates::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {:?}", self);
        let body = Html(
            "<h1>Something went wrong</h1><p>Please try again later.</p>".to_string(),
        );
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// Form payloads. Field names match the HTML form controls; everything is
// optional so validation can flash a message instead of rejecting the
// request at the deserialization layer.

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub mobile: Option<String>,
    pub patient_age: Option<String>,
    pub address: Option<String>,
    pub doctor_age: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub role: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentForm {
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub symptoms: String,
}

#[derive(Debug, Deserialize)]
pub struct DiagnosisForm {
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub prescription: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: Option<String>,
}
