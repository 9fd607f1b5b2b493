//! services/api/src/adapters/mail.rs
//!
//! `NotificationService` implementations: SMTP delivery via lettre, and a
//! logging fallback for environments without a mail relay.

use agro_shop_core::notify::Notification;
use agro_shop_core::ports::{NotificationService, PortError, PortResult};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Sends notifications through an SMTP relay (STARTTLS).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    fn build(&self, notification: &Notification) -> PortResult<Message> {
        Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| PortError::Unexpected(format!("Invalid sender {}", self.from_address)))?,
            )
            .to(notification
                .to
                .parse()
                .map_err(|_| PortError::Validation(format!("Invalid recipient {}", notification.to)))?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(notification.html_body.clone())
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl NotificationService for SmtpMailer {
    async fn send(&self, notification: &Notification) -> PortResult<()> {
        let message = self.build(notification)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| PortError::Unexpected(format!("SMTP send failed: {e}")))?;
        info!(to = %notification.to, subject = %notification.subject, "Email sent successfully");
        Ok(())
    }
}

/// Logs notifications instead of sending them.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl NotificationService for LogMailer {
    async fn send(&self, notification: &Notification) -> PortResult<()> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            kind = ?notification.kind,
            "Mail relay not configured; notification logged only"
        );
        Ok(())
    }
}
