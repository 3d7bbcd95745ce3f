//! SMTP notification delivery.
//!
//! Sends plain-text mail through an authenticated relay (implicit TLS,
//! Gmail's `smtp.gmail.com:465` by default). A fresh transport is built per
//! notification.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::monitor::{DeliveryError, Notification, Notifier};

#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Build the message without sending it.
    pub fn build_message(&self, notification: &Notification) -> Result<Message, DeliveryError> {
        let from: Mailbox = self
            .config
            .address
            .parse()
            .map_err(|e| DeliveryError::invalid_payload(format!("bad sender address: {}", e)))?;
        let to: Mailbox = self
            .config
            .recipient()
            .parse()
            .map_err(|e| DeliveryError::invalid_payload(format!("bad recipient address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| DeliveryError::invalid_payload(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let credentials = SmtpCredentials::new(
            self.config.address.clone(),
            self.config.app_password.clone(),
        );

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| DeliveryError::transport(e.to_string()))?
                .port(self.config.smtp_port)
                .credentials(credentials)
                .build(),
        )
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let message = self.build_message(notification)?;

        self.transport()?.send(message).await.map_err(|e| {
            if e.is_permanent() {
                DeliveryError::auth(e.to_string())
            } else {
                DeliveryError::transport(e.to_string())
            }
        })?;

        Ok(())
    }

    fn notifier_name(&self) -> &str {
        "email"
    }
}
