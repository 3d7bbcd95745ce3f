//! Webhook notification delivery.
//!
//! POSTs each notification as JSON (`{"subject": .., "body": ..}`) to a
//! single configured URL. Any non-2xx response counts as a failed delivery.

use async_trait::async_trait;
use reqwest::Client;

use crate::monitor::{DeliveryError, Notification, Notifier};

#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    http: Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let response = self.http.post(&self.url).json(notification).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::rejected(status.as_u16(), message));
        }

        Ok(())
    }

    fn notifier_name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> Notification {
        Notification {
            subject: "[listing-monitor] 1 new listing(s)".to_string(),
            body: "body text".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_subject_and_body_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "subject": "[listing-monitor] 1 new listing(s)",
                "body": "body text",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));

        notifier.notify(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri());
        let err = notifier.notify(&notification()).await.unwrap_err();

        assert_eq!(err, DeliveryError::rejected(500, "boom"));
    }
}
