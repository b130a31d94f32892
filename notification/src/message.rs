use serde::Serialize;

/// Request body of the Graph `sendMail` action.
#[derive(Debug, Serialize)]
pub struct SendMailRequest {
    pub message: MailMessage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub subject: String,
    pub body: ItemBody,
    pub to_recipients: Vec<Recipient>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    pub content_type: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Serialize)]
pub struct EmailAddress {
    pub address: String,
}

impl SendMailRequest {
    /// One HTML message to a single recipient.
    pub fn html(recipient: &str, subject: &str, html_body: &str) -> Self {
        Self {
            message: MailMessage {
                subject: subject.to_string(),
                body: ItemBody {
                    content_type: "HTML",
                    content: html_body.to_string(),
                },
                to_recipients: vec![Recipient {
                    email_address: EmailAddress {
                        address: recipient.to_string(),
                    },
                }],
            },
        }
    }
}
