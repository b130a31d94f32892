mod message;

pub use message::{EmailAddress, ItemBody, MailMessage, Recipient, SendMailRequest};

use common::{Error, Result};
use directory::{GraphApi, Method};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Mails rendered reports through the Graph `sendMail` action.
pub struct ReportDispatcher {
    api: Arc<dyn GraphApi>,
    endpoint: String,
}

impl ReportDispatcher {
    /// Sends as the signed-in user, or as `sender` when given.
    pub fn new(api: Arc<dyn GraphApi>, sender: Option<&str>) -> Self {
        let endpoint = match sender.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sender) => format!(
                "/users/{}/sendMail",
                url::form_urlencoded::byte_serialize(sender.as_bytes()).collect::<String>()
            ),
            None => "/me/sendMail".to_string(),
        };
        Self { api, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(Error::InvalidRecipient);
        }

        let payload = serde_json::to_value(SendMailRequest::html(recipient, subject, html_body))?;
        self.api
            .call(&self.endpoint, Method::POST, Some(payload), &HashMap::new())
            .await?;

        info!(recipient, subject, endpoint = %self.endpoint, "Report mail sent");
        Ok(())
    }
}
