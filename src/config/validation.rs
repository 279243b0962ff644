use super::Settings;

/// Checks the listener address before the server tries to bind it.
pub fn validate_application_settings(settings: &Settings) -> Result<(), String> {
    if settings.application.port == 0 {
        return Err("application.port must be non-zero".to_string());
    }

    settings
        .application
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|_| format!("application.host is not an IP address: {}", settings.application.host))?;

    Ok(())
}

/// SMTP credentials are optional, but an enabled mailer needs all of them.
pub fn validate_smtp_settings(settings: &Settings) -> Result<(), String> {
    if !settings.smtp.enabled {
        return Ok(());
    }

    if settings.smtp.from_email.is_empty() {
        return Err("smtp.from_email must be set when smtp.enabled is true".to_string());
    }

    if settings.smtp.password.is_empty() {
        return Err("smtp.password must be set when smtp.enabled is true".to_string());
    }

    if settings.smtp.relay.is_empty() {
        return Err("smtp.relay must be set when smtp.enabled is true".to_string());
    }

    Ok(())
}
