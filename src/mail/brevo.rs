use async_trait::async_trait;
use serde::Serialize;

use super::{MailError, Mailer, Recipient, TemplatedEmail};

/// Brevo (formerly Sendinblue) transactional email client.
pub struct BrevoMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    sender: Recipient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: &'a Recipient,
    to: [&'a Recipient; 1],
    template_id: i64,
    params: &'a serde_json::Value,
}

impl BrevoMailer {
    pub fn new(api_base: String, api_key: String, sender: Recipient) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send_template(&self, email: &TemplatedEmail) -> Result<(), MailError> {
        let body = SendRequest {
            sender: &self.sender,
            to: [&email.to],
            template_id: email.template_id,
            params: &email.params,
        };

        let response = self
            .client
            .post(format!("{}/v3/smtp/email", self.api_base))
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(
                template_id = email.template_id,
                to = %email.to.email,
                "Transactional email accepted"
            );
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(MailError::Rejected { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> TemplatedEmail {
        TemplatedEmail {
            template_id: 7,
            to: Recipient {
                email: "ada@bistro.example".to_string(),
                name: Some("Ada Chef".to_string()),
            },
            params: json!({ "temporary_password": "Tmp#Pass1234" }),
        }
    }

    fn mailer(server: &MockServer) -> BrevoMailer {
        BrevoMailer::new(
            server.uri(),
            "test-key".to_string(),
            Recipient {
                email: "noreply@restaurant.local".to_string(),
                name: Some("Restaurant Platform".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn posts_template_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/smtp/email"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(json!({
                "templateId": 7,
                "to": [{ "email": "ada@bistro.example", "name": "Ada Chef" }],
                "sender": { "email": "noreply@restaurant.local" },
                "params": { "temporary_password": "Tmp#Pass1234" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "messageId": "m-1" })))
            .expect(1)
            .mount(&server)
            .await;

        mailer(&server).send_template(&email()).await.unwrap();
    }

    #[tokio::test]
    async fn provider_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/smtp/email"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid template"))
            .mount(&server)
            .await;

        let err = mailer(&server).send_template(&email()).await.unwrap_err();
        assert!(matches!(
            err,
            MailError::Rejected { status: 400, ref body } if body == "invalid template"
        ));
    }
}
