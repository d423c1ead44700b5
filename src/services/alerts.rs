//! Operator alerts.
//!
//! The removal workflow describes what went wrong as an [`Alert`] and hands it to an
//! [`AlertChannel`]. Delivery problems are the channel's concern: callers log them
//! and carry on.

use crate::models::EmailSettings;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

pub const SUBJECT_REMOVAL_FAILED: &str = "Error: Transmission Torrent Removal Failed";
pub const SUBJECT_TORRENT_MISSING: &str = "Torrent Missing";
pub const SUBJECT_FOLDER_REMOVAL_FAILED: &str = "Error: Torrent Folder Removal Failed";
pub const SUBJECT_PROGRAM_ERROR: &str = "Transmission Remove - Exiting Program Error Occurred";

/// A notification for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Alert for an error that aborted a poll cycle. The body carries the
    /// full error chain.
    pub fn program_error(error: &anyhow::Error) -> Self {
        Self::new(
            SUBJECT_PROGRAM_ERROR,
            format!(
                "A fatal error occurred while running a remove job.\n\n{:#}",
                error
            ),
        )
    }
}

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Somewhere alerts can be sent
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Send an alert, logging instead of failing if delivery does not work.
pub async fn send_or_log<A: AlertChannel + ?Sized>(channel: &A, alert: &Alert) {
    if let Err(e) = channel.send(alert).await {
        tracing::warn!("Failed to send alert '{}': {}", alert.subject, e);
    }
}

/// Emails alerts over SMTP
pub struct EmailAlerter {
    settings: EmailSettings,
}

impl EmailAlerter {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Build the message for an alert. `to_email` may list several
    /// comma-separated recipients.
    pub fn build_message(&self, alert: &Alert) -> Result<Message, AlertError> {
        let mut builder = Message::builder()
            .from(self.settings.from_email.parse::<Mailbox>()?)
            .subject(alert.subject.as_str())
            .header(ContentType::TEXT_PLAIN);

        for recipient in self
            .settings
            .to_email
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        Ok(builder.body(alert.body.clone())?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, AlertError> {
        let (host, port) = self.settings.endpoint();

        let builder = if self.settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mut builder = builder.port(port);

        if self.settings.authentication_required {
            builder = builder.credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl AlertChannel for EmailAlerter {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let message = self.build_message(alert)?;
        self.transport()?.send(message).await?;
        tracing::info!(
            "Alert '{}' emailed to {}",
            alert.subject,
            self.settings.to_email
        );
        Ok(())
    }
}

/// Records alerts in the log only. Used when email alerts are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerter;

#[async_trait]
impl AlertChannel for LogAlerter {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        tracing::warn!("Alert (email disabled): {} - {}", alert.subject, alert.body);
        Ok(())
    }
}
