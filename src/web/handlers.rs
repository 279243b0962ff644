use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Datelike, Utc};
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::types::{
    AppError, BookAppointmentForm, DiagnosisForm, ForgotPasswordForm, LoginForm, SignupForm,
};
use super::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{FlashLevel, SessionUser};
use crate::frontend::templates::{self, escape_html};
use crate::store::models::{Appointment, AppointmentStatus, Role, UserRecord};

/// Drains the session's flash queue and renders the named template with the
/// common context entries every page expects.
fn render_page(
    state: &AppState,
    session_id: Uuid,
    name: &str,
    mut ctx: Value,
) -> Result<Html<String>, AppError> {
    let mut flash_html = String::new();
    for message in state.sessions.take_flash(session_id) {
        let _ = write!(
            flash_html,
            "<div class=\"flash flash-{}\">{}</div>",
            message.level.as_str(),
            escape_html(&message.message)
        );
    }
    ctx["flash_messages"] = Value::String(flash_html);
    ctx["year"] = json!(Utc::now().year());

    let started = Instant::now();
    let html = templates::render(name, &ctx, &state.resolver)?;
    state.metrics.record_page_render_time(started.elapsed());
    Ok(Html(html))
}

/// Post/redirect/get: queue a flash message and bounce to a named route.
fn flash_and_redirect(
    state: &AppState,
    jar: CookieJar,
    session_id: Uuid,
    level: FlashLevel,
    message: &str,
    route: &str,
) -> Result<Response, AppError> {
    state.sessions.push_flash(session_id, level, message);
    let redirect = Redirect::to(&state.resolver.url_for(route)?);
    Ok((jar, redirect).into_response())
}

fn login_redirect(state: &AppState) -> Redirect {
    Redirect::to(state.resolver.path_template("login").unwrap_or("/login"))
}

/// Role gate shared by every protected page. On failure the denial message
/// is queued on the session and the caller bounces to the login page.
fn require_role(
    state: &AppState,
    jar: &CookieJar,
    session_id: Uuid,
    role: Role,
    denial: &str,
) -> Result<UserRecord, Redirect> {
    if let Some(user) = state.sessions.current_user(jar) {
        if user.role == role {
            if let Some(record) = state.storage.user_by_id(user.user_id) {
                return Ok(record);
            }
        }
    }
    state.sessions.push_flash(session_id, FlashLevel::Danger, denial);
    Err(login_redirect(state))
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let page = render_page(&state, session_id, "index", json!({}))?;
    Ok((jar, page).into_response())
}

pub async fn signup_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let page = render_page(&state, session_id, "signup", json!({}))?;
    Ok((jar, page).into_response())
}

pub async fn signup_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);

    let user_type = form.user_type.as_deref().unwrap_or("").trim();
    let name = form.name.as_deref().unwrap_or("").trim();
    let email = form.email.as_deref().unwrap_or("").trim();
    let password = form.password.as_deref().unwrap_or("");
    let confirm_password = form.confirm_password.as_deref().unwrap_or("");
    let mobile = form.mobile.as_deref().unwrap_or("").trim();

    if user_type.is_empty()
        || name.is_empty()
        || email.is_empty()
        || password.is_empty()
        || confirm_password.is_empty()
    {
        return flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Please fill in all required fields.",
            "signup",
        );
    }

    let role = match Role::parse(user_type) {
        Some(role) => role,
        None => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Please choose a valid account type.",
                "signup",
            );
        }
    };

    if password != confirm_password {
        return flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Passwords do not match.",
            "signup",
        );
    }

    let age_field = match role {
        Role::Patient => form.patient_age.as_deref(),
        Role::Doctor => form.doctor_age.as_deref(),
    };
    let age: u32 = match age_field.unwrap_or("").trim().parse() {
        Ok(age) => age,
        Err(_) => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Please enter a valid age.",
                "signup",
            );
        }
    };

    let (address, specialization) = match role {
        Role::Patient => (
            Some(form.address.as_deref().unwrap_or("").trim().to_string()),
            None,
        ),
        Role::Doctor => (
            None,
            Some(
                form.specialization
                    .as_deref()
                    .unwrap_or("")
                    .trim()
                    .to_string(),
            ),
        ),
    };

    let record = UserRecord {
        id: Uuid::new_v4(),
        role,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password),
        age,
        mobile: mobile.to_string(),
        address,
        specialization,
        created_at: Utc::now(),
    };

    if state.storage.insert_user(record).is_err() {
        return flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Email already registered.",
            "signup",
        );
    }

    info!("Registered new {} account for {}", role.as_str(), email);
    state.metrics.record_signup(role);
    flash_and_redirect(
        &state,
        jar,
        session_id,
        FlashLevel::Success,
        "Signup successful. Please log in.",
        "login",
    )
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let page = render_page(&state, session_id, "login", json!({}))?;
    Ok((jar, page).into_response())
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);

    let role = form.role.as_deref().and_then(Role::parse);
    let email = form.email.as_deref().unwrap_or("").trim();
    let password = form.password.as_deref().unwrap_or("");

    let user = match (role, state.storage.user_by_email(email)) {
        (Some(role), Some(user))
            if user.role == role && verify_password(password, &user.password_hash) =>
        {
            user
        }
        _ => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Invalid credentials or role mismatch.",
                "login",
            );
        }
    };

    state.sessions.login(
        session_id,
        SessionUser {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        },
    );
    info!("Login for {} as {}", user.email, user.role.as_str());
    state.metrics.record_login(user.role);

    let target = match user.role {
        Role::Patient => "patient_dashboard",
        Role::Doctor => "doctor_dashboard",
    };
    flash_and_redirect(
        &state,
        jar,
        session_id,
        FlashLevel::Success,
        "Login successful!",
        target,
    )
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    state.sessions.logout(&jar);
    // A fresh anonymous session carries the farewell flash.
    let (jar, session_id) = state.sessions.ensure(jar);
    flash_and_redirect(
        &state,
        jar,
        session_id,
        FlashLevel::Success,
        "Logged out successfully.",
        "login",
    )
}

pub async fn patient_dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let user = match require_role(&state, &jar, session_id, Role::Patient, "Please log in as a patient.") {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let appointments = state.storage.appointments_for_patient(user.id);
    let ctx = json!({
        "user": user.profile(),
        "pending": count_by_status(&appointments, AppointmentStatus::Pending),
        "completed": count_by_status(&appointments, AppointmentStatus::Completed),
        "total": appointments.len(),
        "appointment_rows": patient_appointment_rows(&state, &appointments)?,
    });
    let page = render_page(&state, session_id, "patient_dashboard", ctx)?;
    Ok((jar, page).into_response())
}

pub async fn doctor_dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let user = match require_role(&state, &jar, session_id, Role::Doctor, "Please log in as a doctor.") {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let appointments = state.storage.appointments_for_doctor(user.id);
    let ctx = json!({
        "user": user.profile(),
        "pending": count_by_status(&appointments, AppointmentStatus::Pending),
        "completed": count_by_status(&appointments, AppointmentStatus::Completed),
        "total": appointments.len(),
        "appointment_rows": doctor_appointment_rows(&state, &appointments)?,
    });
    let page = render_page(&state, session_id, "doctor_dashboard", ctx)?;
    Ok((jar, page).into_response())
}

pub async fn book_appointment_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    if let Err(redirect) = require_role(
        &state,
        &jar,
        session_id,
        Role::Patient,
        "Please log in as a patient to book an appointment.",
    ) {
        return Ok((jar, redirect).into_response());
    }

    let doctors = state.storage.doctors();
    let mut options = String::new();
    for doctor in &doctors {
        let _ = write!(
            options,
            "<option value=\"{}\">Dr. {} ({})</option>",
            doctor.id,
            escape_html(&doctor.name),
            escape_html(doctor.specialization.as_deref().unwrap_or("General"))
        );
    }
    if doctors.is_empty() {
        options = "<option value=\"\" disabled>No doctors registered yet</option>".to_string();
    }

    let page = render_page(
        &state,
        session_id,
        "book_appointment",
        json!({ "doctor_options": options }),
    )?;
    Ok((jar, page).into_response())
}

pub async fn book_appointment_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<BookAppointmentForm>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let patient = match require_role(
        &state,
        &jar,
        session_id,
        Role::Patient,
        "Please log in as a patient to book an appointment.",
    ) {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let doctor = form
        .doctor_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .and_then(|id| state.storage.user_by_id(id))
        .filter(|user| user.role == Role::Doctor);
    let doctor = match doctor {
        Some(doctor) => doctor,
        None => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Please choose a valid doctor.",
                "book_appointment",
            );
        }
    };

    let date = form.appointment_date.as_deref().unwrap_or("").trim().to_string();
    let time = form.appointment_time.as_deref().unwrap_or("").trim().to_string();
    if date.is_empty() || time.is_empty() {
        return flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Please choose a date and time.",
            "book_appointment",
        );
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        date,
        time,
        symptoms: form.symptoms.trim().to_string(),
        status: AppointmentStatus::Pending,
        diagnosis: None,
        treatment_plan: None,
        prescription: None,
        created_at: Utc::now(),
    };

    let body = format!(
        "<h3>New Appointment</h3><p>You have a new appointment on {} at {}.<br>Symptoms: {}</p>",
        escape_html(&appointment.date),
        escape_html(&appointment.time),
        escape_html(&appointment.symptoms)
    );
    state.storage.insert_appointment(appointment);
    state.metrics.record_appointment_booked();

    // Notify the doctor off the request path; delivery failures only log.
    let notify_state = Arc::clone(&state);
    tokio::spawn(async move {
        let delivered = notify_state
            .mailer
            .send(&doctor.email, "New Appointment Booked", body)
            .await;
        notify_state.metrics.record_email_outcome(delivered);
    });

    flash_and_redirect(
        &state,
        jar,
        session_id,
        FlashLevel::Success,
        "Appointment booked successfully! Notification sent to doctor.",
        "patient_dashboard",
    )
}

pub async fn view_appointment_patient(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);

    let viewer = state.sessions.current_user(&jar);
    let appointment = state.storage.appointment(id);
    let appointment = match (viewer, appointment) {
        (Some(viewer), Some(appointment))
            if viewer.role == Role::Patient && appointment.patient_id == viewer.user_id =>
        {
            appointment
        }
        _ => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Access denied.",
                "patient_dashboard",
            );
        }
    };

    let doctor = match state.storage.user_by_id(appointment.doctor_id) {
        Some(doctor) => json!({
            "name": doctor.name,
            "specialization": doctor.specialization.unwrap_or_default(),
            "mobile": doctor.mobile,
        }),
        None => json!({ "name": "Unknown", "specialization": "", "mobile": "" }),
    };

    let ctx = json!({
        "appointment": appointment_ctx(&appointment),
        "doctor": doctor,
        "diagnosis_section": diagnosis_section(&appointment),
    });
    let page = render_page(&state, session_id, "view_appointment_patient", ctx)?;
    Ok((jar, page).into_response())
}

pub async fn view_appointment_doctor(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    if let Err(redirect) = require_role(
        &state,
        &jar,
        session_id,
        Role::Doctor,
        "Please log in as a doctor.",
    ) {
        return Ok((jar, redirect).into_response());
    }

    let appointment = match state.storage.appointment(id) {
        Some(appointment) => appointment,
        None => {
            return flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Danger,
                "Appointment not found.",
                "doctor_dashboard",
            );
        }
    };

    let patient = match state.storage.user_by_id(appointment.patient_id) {
        Some(patient) => json!({
            "name": patient.name,
            "age": patient.age,
            "email": patient.email,
            "mobile": patient.mobile,
        }),
        None => json!({ "name": "Unknown", "age": "", "email": "", "mobile": "" }),
    };

    let ctx = json!({
        "appointment": appointment_ctx(&appointment),
        "patient": patient,
        "submit_diagnosis_url": state
            .resolver
            .url_for_with("submit_diagnosis", &appointment.id.to_string())?,
        "diagnosis_section": diagnosis_section(&appointment),
    });
    let page = render_page(&state, session_id, "view_appointment_doctor", ctx)?;
    Ok((jar, page).into_response())
}

pub async fn submit_diagnosis(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<DiagnosisForm>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    if let Err(redirect) = require_role(&state, &jar, session_id, Role::Doctor, "Unauthorized access.") {
        return Ok((jar, redirect).into_response());
    }

    let diagnosis = form.diagnosis.as_deref().unwrap_or("").trim().to_string();
    let treatment_plan = form.treatment_plan.as_deref().unwrap_or("").trim().to_string();
    let prescription = form.prescription.as_deref().unwrap_or("").trim().to_string();

    match state
        .storage
        .submit_diagnosis(id, diagnosis, treatment_plan, prescription)
    {
        Ok(()) => {
            state.metrics.record_diagnosis_submitted();
            flash_and_redirect(
                &state,
                jar,
                session_id,
                FlashLevel::Success,
                "Diagnosis submitted successfully.",
                "doctor_dashboard",
            )
        }
        Err(_) => flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Appointment not found.",
            "doctor_dashboard",
        ),
    }
}

pub async fn patient_profile(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let user = match require_role(&state, &jar, session_id, Role::Patient, "Unauthorized access.") {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let page = render_page(
        &state,
        session_id,
        "patient_profile",
        json!({ "user": user.profile() }),
    )?;
    Ok((jar, page).into_response())
}

pub async fn doctor_profile(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let user = match require_role(&state, &jar, session_id, Role::Doctor, "Unauthorized access.") {
        Ok(user) => user,
        Err(redirect) => return Ok((jar, redirect).into_response()),
    };

    let page = render_page(
        &state,
        session_id,
        "doctor_profile",
        json!({ "user": user.profile() }),
    )?;
    Ok((jar, page).into_response())
}

pub async fn forgot_password_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);
    let page = render_page(&state, session_id, "forgot_password", json!({}))?;
    Ok((jar, page).into_response())
}

pub async fn forgot_password_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let (jar, session_id) = state.sessions.ensure(jar);

    let email = form.email.as_deref().unwrap_or("").trim();
    if !email.is_empty() && state.storage.user_by_email(email).is_some() {
        flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Success,
            "Password reset link sent (simulated).",
            "login",
        )
    } else {
        flash_and_redirect(
            &state,
            jar,
            session_id,
            FlashLevel::Danger,
            "Email not found.",
            "login",
        )
    }
}

fn count_by_status(appointments: &[Appointment], status: AppointmentStatus) -> usize {
    appointments.iter().filter(|a| a.status == status).count()
}

fn appointment_ctx(appointment: &Appointment) -> Value {
    json!({
        "date": appointment.date,
        "time": appointment.time,
        "status": appointment.status.as_str(),
        "symptoms": appointment.symptoms,
    })
}

/// Completed appointments get a findings block; pending ones an empty slot.
fn diagnosis_section(appointment: &Appointment) -> String {
    if appointment.status != AppointmentStatus::Completed {
        return String::new();
    }
    format!(
        "<h2>Diagnosis</h2><dl class=\"fields\">\
         <dt>Diagnosis</dt><dd>{}</dd>\
         <dt>Treatment plan</dt><dd>{}</dd>\
         <dt>Prescription</dt><dd>{}</dd></dl>",
        escape_html(appointment.diagnosis.as_deref().unwrap_or("")),
        escape_html(appointment.treatment_plan.as_deref().unwrap_or("")),
        escape_html(appointment.prescription.as_deref().unwrap_or(""))
    )
}

fn patient_appointment_rows(
    state: &AppState,
    appointments: &[Appointment],
) -> Result<String, AppError> {
    if appointments.is_empty() {
        return Ok(
            "<tr><td colspan=\"6\" class=\"empty\">No appointments yet.</td></tr>".to_string(),
        );
    }

    let mut rows = String::new();
    for appointment in appointments {
        let doctor = state
            .storage
            .user_by_id(appointment.doctor_id)
            .map(|d| d.name)
            .unwrap_or_else(|| "Unknown".to_string());
        let link = state
            .resolver
            .url_for_with("view_appointment_patient", &appointment.id.to_string())?;
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>Dr. {}</td><td>{}</td>\
             <td class=\"status-{}\">{}</td><td><a href=\"{}\">View</a></td></tr>",
            escape_html(&appointment.date),
            escape_html(&appointment.time),
            escape_html(&doctor),
            escape_html(&appointment.symptoms),
            appointment.status.as_str().to_lowercase(),
            appointment.status.as_str(),
            link
        );
    }
    Ok(rows)
}

fn doctor_appointment_rows(
    state: &AppState,
    appointments: &[Appointment],
) -> Result<String, AppError> {
    if appointments.is_empty() {
        return Ok(
            "<tr><td colspan=\"6\" class=\"empty\">No appointments yet.</td></tr>".to_string(),
        );
    }

    let mut rows = String::new();
    for appointment in appointments {
        let patient = state
            .storage
            .user_by_id(appointment.patient_id)
            .map(|p| p.name)
            .unwrap_or_else(|| "Unknown".to_string());
        let link = state
            .resolver
            .url_for_with("view_appointment_doctor", &appointment.id.to_string())?;
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td class=\"status-{}\">{}</td><td><a href=\"{}\">View</a></td></tr>",
            escape_html(&appointment.date),
            escape_html(&appointment.time),
            escape_html(&patient),
            escape_html(&appointment.symptoms),
            appointment.status.as_str().to_lowercase(),
            appointment.status.as_str(),
            link
        );
    }
    Ok(rows)
}
