use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::store::models::Role;

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("page_render_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )
        .unwrap()
        .install_recorder()
        .unwrap()
}

#[derive(Clone)]
pub struct Metrics {
    pub prometheus_handle: PrometheusHandle,
}

impl Metrics {
    pub fn new(prometheus_handle: PrometheusHandle) -> Self {
        Self { prometheus_handle }
    }

    /// This function records a completed registration, labeled by role.
    pub fn record_signup(&self, role: Role) {
        metrics::increment_counter!("signups_total", "role" => role.as_str());
    }

    /// This function records a successful login, labeled by role.
    pub fn record_login(&self, role: Role) {
        metrics::increment_counter!("logins_total", "role" => role.as_str());
    }

    pub fn record_appointment_booked(&self) {
        metrics::increment_counter!("appointments_booked_total");
    }

    pub fn record_diagnosis_submitted(&self) {
        metrics::increment_counter!("diagnoses_submitted_total");
    }

    /// This function records the outcome of an email handoff to the relay.
    pub fn record_email_outcome(&self, delivered: bool) {
        if delivered {
            metrics::increment_counter!("emails_sent_total");
        } else {
            metrics::increment_counter!("emails_failed_total");
        }
    }

    /// This function records the time taken to render a page.
    /// It records the duration in seconds.
    pub fn record_page_render_time(&self, duration: Duration) {
        metrics::histogram!("page_render_seconds", duration.as_secs_f64());
    }
}
