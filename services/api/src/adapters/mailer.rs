//! services/api/src/adapters/mailer.rs
//!
//! SMTP implementation of the `MailService` port. Used for the
//! best-effort notification sent when a new drive is posted; callers
//! log failures and never surface them to the HTTP client.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use placement_core::ports::{MailService, PortError, PortResult};

/// An adapter that implements the `MailService` port over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        username: String,
        password: String,
        from: &str,
    ) -> Result<Self, PortError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| PortError::Unexpected(format!("smtp relay: {}", e)))?
            .credentials(Credentials::new(username, password))
            .build();
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| PortError::Unexpected(format!("bad MAIL_FROM address: {}", e)))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailService for SmtpMailer {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> PortResult<()> {
        for recipient in to {
            let mailbox = recipient
                .parse::<Mailbox>()
                .map_err(|e| PortError::Unexpected(format!("bad recipient: {}", e)))?;
            let message = Message::builder()
                .from(self.from.clone())
                .to(mailbox)
                .subject(subject)
                .body(body.to_string())
                .map_err(|e| PortError::Unexpected(format!("mail build: {}", e)))?;
            self.transport
                .send(message)
                .await
                .map_err(|e| PortError::Unexpected(format!("mail send: {}", e)))?;
        }
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured; sends go nowhere but are
/// logged so a misconfigured deployment is visible.
pub struct NoopMailer;

#[async_trait]
impl MailService for NoopMailer {
    async fn send(&self, to: &[String], subject: &str, _body: &str) -> PortResult<()> {
        tracing::warn!(
            recipients = to.len(),
            subject,
            "SMTP not configured; dropping outbound mail"
        );
        Ok(())
    }
}
