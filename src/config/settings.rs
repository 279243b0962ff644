use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub smtp: SmtpSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    #[serde(default = "default_cors_origin")]
    pub cors_allow_origin: String,
    #[serde(default = "default_cors_methods")]
    pub cors_allow_methods: String,
    #[serde(default = "default_cors_headers")]
    pub cors_allow_headers: String,
}

// Default functions for CORS settings
fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_cors_methods() -> String {
    "GET, POST, OPTIONS".to_string()
}

fn default_cors_headers() -> String {
    "Content-Type, Authorization".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_relay")]
    pub relay: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub password: String,
}

fn default_smtp_relay() -> String {
    "smtp.gmail.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,
}

fn default_session_cookie_name() -> String {
    "medtrack_session".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(Environment::default().separator("__"))
            // Defaults for critical settings so a bare environment still boots
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8080)?
            .set_default("smtp.enabled", false)?
            .set_default("session.cookie_name", "medtrack_session")?
            .build()?;

        config.try_deserialize()
    }
}
