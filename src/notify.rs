//! Email delivery of the finished summary.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::CheckConfig;
use crate::contract::Notifier;
use crate::error::{ConfigError, NotifyError};

/// Fixed mail submission endpoint.
const SMTP_HOST: &str = "smtp.gmail.com";
const SMTP_PORT: u16 = 587;

/// How long connecting, upgrading and submitting may take in total.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Subject line for a notification about `day`.
pub fn subject_for(day: &str) -> String {
    format!("Vertretungen für {day}")
}

/// Sends the summary over one authenticated STARTTLS session.
///
/// One connection, one message, no retry. The connection is dropped
/// together with the transport at the end of [`Notifier::notify`].
pub struct MailNotifier {
    username: String,
    password: String,
    recipient: String,
}

impl MailNotifier {
    /// Builds a notifier from the resolved configuration.
    ///
    /// Fails before any network access when the sender credentials or
    /// the recipient address are blank.
    pub fn new(config: &CheckConfig) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if config.email_username.trim().is_empty() {
            missing.push("EMAIL_USERNAME".to_string());
        }
        if config.email_password.trim().is_empty() {
            missing.push("EMAIL_PASSWORD".to_string());
        }
        if config.recipient_email.trim().is_empty() {
            missing.push("RECIPIENT_EMAIL".to_string());
        }
        if !missing.is_empty() {
            error!(missing = ?missing, "notifier is not configured");
            return Err(ConfigError { missing });
        }

        Ok(Self {
            username: config.email_username.clone(),
            password: config.email_password.clone(),
            recipient: config.recipient_email.clone(),
        })
    }

    fn build_message(&self, day: &str, body: &str) -> Result<Message, NotifyError> {
        let from: Mailbox = self
            .username
            .parse()
            .map_err(|e| NotifyError::Transport(format!("invalid sender address: {e}")))?;
        let to: Mailbox = self
            .recipient
            .parse()
            .map_err(|e| NotifyError::Transport(format!("invalid recipient address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject_for(day))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Transport(format!("could not build message: {e}")))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(SMTP_HOST)
            .map_err(|e| NotifyError::Transport(format!("could not configure transport: {e}")))?;

        Ok(builder
            .port(SMTP_PORT)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn notify(&self, day: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(day, body)?;
        let mailer = self.transport()?;

        info!(recipient = %self.recipient, day = %day, "sending notification");
        match mailer.send(message).await {
            Ok(_) => {
                info!(recipient = %self.recipient, "notification delivered");
                Ok(())
            }
            Err(e) => {
                let err = classify_smtp_error(e);
                error!(error = %err, "notification failed");
                Err(err)
            }
        }
    }
}

/// Separates credential rejections (53x reply codes) from every other
/// SMTP failure, so the log says whether to rotate a password or look
/// at the network.
fn classify_smtp_error(error: lettre::transport::smtp::Error) -> NotifyError {
    match error.status() {
        Some(code) if code.to_string().starts_with("53") => {
            NotifyError::Authentication(error.to_string())
        }
        _ => NotifyError::Transport(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;

    fn mail_config() -> CheckConfig {
        CheckConfig {
            openai_api_key: "key".to_string(),
            email_username: "sender@example.com".to_string(),
            email_password: "secret".to_string(),
            recipient_email: "recipient@example.com".to_string(),
            auth_username: "user".to_string(),
            auth_password: "pass".to_string(),
            plan_url: "https://school.example/plan.pdf".to_string(),
            mode: RunMode::Email,
            scheduled: false,
        }
    }

    #[test]
    fn subject_names_the_resolved_day() {
        assert_eq!(subject_for("Dienstag"), "Vertretungen für Dienstag");
    }

    #[test]
    fn message_builds_for_plain_addresses() {
        let notifier = MailNotifier::new(&mail_config()).unwrap();
        let message =
            notifier.build_message("Montag", "Für Montag gibt es keine Vertretungen.");
        assert!(message.is_ok());
    }

    #[test]
    fn unparsable_sender_is_a_transport_error() {
        let mut config = mail_config();
        config.email_username = "not an address".to_string();
        let notifier = MailNotifier::new(&config).unwrap();
        let err = notifier
            .build_message("Montag", "body")
            .err()
            .expect("The sender address should not parse");
        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn blank_mail_configuration_is_reported_completely() {
        let mut config = mail_config();
        config.email_password = String::new();
        config.recipient_email = "  ".to_string();
        let err = MailNotifier::new(&config)
            .err()
            .expect("Blank credentials should be rejected");
        assert_eq!(
            err.missing,
            vec!["EMAIL_PASSWORD".to_string(), "RECIPIENT_EMAIL".to_string()]
        );
    }
}
