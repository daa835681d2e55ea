//! Runtime configuration for a check run.
//!
//! All values come from the environment; `.env` files are loaded by the
//! binary before this module is consulted. The configuration is read
//! once at startup and passed by reference into each component, so no
//! stage touches the environment on its own.

use std::fmt;

use tracing::{debug, error, info};

use crate::error::ConfigError;

/// What happens once a summary is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Send the notification email.
    Email,
    /// Log the summary and skip delivery.
    DryRun,
}

impl RunMode {
    /// Maps the `MODE` environment value onto a run mode.
    ///
    /// An unset variable means email. Any value other than `email`
    /// falls back to a dry run, so a typo can never cause a send.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None | Some("email") => RunMode::Email,
            Some(_) => RunMode::DryRun,
        }
    }
}

/// Everything a check run needs, resolved once at startup.
///
/// Half of these fields are secrets, so the `Debug` rendering redacts
/// them. Use [`CheckConfig::trace_loaded`] for a safe log record.
#[derive(Clone)]
pub struct CheckConfig {
    /// Credential for the completion API.
    pub openai_api_key: String,
    /// Account that sends the notification email.
    pub email_username: String,
    /// Password for the sending account.
    pub email_password: String,
    /// Address the summary is delivered to.
    pub recipient_email: String,
    /// Username for the plan server.
    pub auth_username: String,
    /// Password for the plan server.
    pub auth_password: String,
    /// Location of the published plan document.
    pub plan_url: String,
    /// Whether to deliver the summary or only log it.
    pub mode: RunMode,
    /// Set when running under the scheduled workflow.
    pub scheduled: bool,
}

impl fmt::Debug for CheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckConfig")
            .field("openai_api_key", &"<redacted>")
            .field("email_username", &self.email_username)
            .field("email_password", &"<redacted>")
            .field("recipient_email", &self.recipient_email)
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .field("plan_url", &self.plan_url)
            .field("mode", &self.mode)
            .field("scheduled", &self.scheduled)
            .finish()
    }
}

impl CheckConfig {
    /// Names of required values that are missing or blank.
    ///
    /// The list preserves the documented variable order so the error
    /// message reads the same as the deployment instructions.
    pub fn missing_values(&self) -> Vec<String> {
        let required = [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("EMAIL_USERNAME", &self.email_username),
            ("EMAIL_PASSWORD", &self.email_password),
            ("RECIPIENT_EMAIL", &self.recipient_email),
            ("AUTH_USERNAME", &self.auth_username),
            ("AUTH_PASSWORD", &self.auth_password),
            ("PDF_URL", &self.plan_url),
        ];
        required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Logs the loaded configuration without echoing any secrets.
    pub fn trace_loaded(&self) {
        info!(
            plan_url = %self.plan_url,
            recipient = %self.recipient_email,
            mode = ?self.mode,
            scheduled = self.scheduled,
            api_key_set = !self.openai_api_key.is_empty(),
            mail_credentials_set =
                !self.email_username.is_empty() && !self.email_password.is_empty(),
            "configuration loaded"
        );
        debug!("configuration resolved from environment");
    }
}

/// Reads the configuration from the environment.
///
/// Every required variable is checked before returning, so a single
/// failed run reports the complete set of missing names instead of
/// only the first one.
pub fn load_config() -> Result<CheckConfig, ConfigError> {
    let config = CheckConfig {
        openai_api_key: env_or_blank("OPENAI_API_KEY"),
        email_username: env_or_blank("EMAIL_USERNAME"),
        email_password: env_or_blank("EMAIL_PASSWORD"),
        recipient_email: env_or_blank("RECIPIENT_EMAIL"),
        auth_username: env_or_blank("AUTH_USERNAME"),
        auth_password: env_or_blank("AUTH_PASSWORD"),
        plan_url: env_or_blank("PDF_URL"),
        mode: RunMode::from_env_value(std::env::var("MODE").ok().as_deref()),
        scheduled: std::env::var("GITHUB_ACTIONS")
            .map(|value| value == "true")
            .unwrap_or(false),
    };

    let missing = config.missing_values();
    if !missing.is_empty() {
        error!(missing = ?missing, "required configuration is absent");
        return Err(ConfigError { missing });
    }

    Ok(config)
}

fn env_or_blank(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
