//! Run summary notification by email
//!
//! After a run that is not a dry run, the summary report is mailed to the
//! configured recipient. Sending is best effort: every failure is logged
//! (masked) and reported as an outcome, never as an error of the run.

use crate::config::EmailSettings;
use crate::logging::SecretMask;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;

/// Subject line of the summary email
pub const SUMMARY_SUBJECT: &str = "Part-Scout - Process Completed";

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while sending a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("EMAIL_USER and EMAIL_PASS must be set for email notifications")]
    MissingCredentials,

    #[error("No recipient configured for email notifications (EMAIL_NOTIFY_TO)")]
    MissingRecipient,

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Failed to send email: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// What happened to the summary notification of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Notifications are turned off
    Disabled,

    /// Dry runs never notify
    SkippedDryRun,

    Sent,

    /// Sending failed; the message is already masked
    Failed(String),
}

/// Sends the run summary over SMTP
pub struct EmailNotifier {
    server: String,
    port: u16,
    use_tls: bool,
    username: String,
    password: String,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Creates a notifier, or None when notifications are disabled
    ///
    /// # Returns
    ///
    /// * `Ok(Some(EmailNotifier))` - Notifications are on and fully configured
    /// * `Ok(None)` - Notifications are off
    /// * `Err(NotifyError)` - Credentials or addresses are missing or malformed
    pub fn from_settings(settings: &EmailSettings) -> Result<Option<Self>, NotifyError> {
        if !settings.enabled {
            return Ok(None);
        }

        let (username, password) = settings
            .credentials()
            .ok_or(NotifyError::MissingCredentials)?;
        let to = settings.recipient().ok_or(NotifyError::MissingRecipient)?;

        Ok(Some(Self {
            server: settings.smtp_server.trim().to_string(),
            port: settings.smtp_port,
            use_tls: settings.use_tls,
            username: username.to_string(),
            password: password.to_string(),
            from: username.trim().parse()?,
            to: to.trim().parse()?,
        }))
    }

    /// Builds the plain-text summary email
    pub fn summary_message(&self, summary: &str) -> Result<Message, NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(SUMMARY_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(summary.to_string())?;
        Ok(message)
    }

    /// Sends the summary email
    pub async fn send_summary(&self, summary: &str) -> Result<(), NotifyError> {
        let message = self.summary_message(summary)?;

        let builder = if self.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.server)
        };
        let mailer = builder
            .port(self.port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}

/// Mails the summary report after a run
///
/// Does nothing for dry runs or when notifications are disabled. A failure
/// is logged as a masked warning and returned as [`NotifyOutcome::Failed`].
pub async fn notify_run_complete(
    settings: &EmailSettings,
    summary: &str,
    dry_run: bool,
    mask: &SecretMask,
) -> NotifyOutcome {
    if !settings.enabled {
        return NotifyOutcome::Disabled;
    }
    if dry_run {
        tracing::debug!("Dry run: not sending the summary email");
        return NotifyOutcome::SkippedDryRun;
    }

    let result = match EmailNotifier::from_settings(settings) {
        Ok(Some(notifier)) => notifier.send_summary(summary).await,
        Ok(None) => return NotifyOutcome::Disabled,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!("Notification email sent");
            NotifyOutcome::Sent
        }
        Err(e) => {
            let message = mask.mask(&e.to_string());
            tracing::warn!("Failed to send notification email: {}", message);
            NotifyOutcome::Failed(message)
        }
    }
}
