//! Transactional email delivery.
//!
//! Emails are rendered by the provider from numeric template ids; this module
//! only supplies the recipient and template parameters. Delivery is always
//! best effort from the caller's point of view.

mod brevo;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{AppConfig, MailConfig};

pub use brevo::BrevoMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Recipient of a transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An email rendered remotely from `template_id` with `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatedEmail {
    pub template_id: i64,
    pub to: Recipient,
    pub params: serde_json::Value,
}

/// Sends templated emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_template(&self, email: &TemplatedEmail) -> Result<(), MailError>;
}

/// Mailer used when no provider key is configured: logs instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_template(&self, email: &TemplatedEmail) -> Result<(), MailError> {
        tracing::info!(
            template_id = email.template_id,
            to = %email.to.email,
            "Email delivery disabled; message not sent"
        );
        Ok(())
    }
}

/// Picks the Brevo mailer when an API key is configured.
pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.brevo_api_key.as_deref() {
        Some(api_key) => Arc::new(BrevoMailer::new(
            config.brevo_api_base.clone(),
            api_key.to_string(),
            Recipient {
                email: config.sender_email.clone(),
                name: Some(config.sender_name.clone()),
            },
        )),
        None => {
            tracing::warn!("BREVO_API_KEY not configured; emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Welcome email for the admin provisioned when a restaurant is activated.
pub fn welcome_email(
    config: &AppConfig,
    restaurant_name: &str,
    admin_name: &str,
    admin_email: &str,
    temporary_password: &str,
) -> TemplatedEmail {
    TemplatedEmail {
        template_id: config.mail.welcome_template_id,
        to: Recipient {
            email: admin_email.to_string(),
            name: Some(admin_name.to_string()),
        },
        params: json!({
            "restaurant_name": restaurant_name,
            "admin_name": admin_name,
            "email": admin_email,
            "temporary_password": temporary_password,
            "login_url": format!("{}/login", config.frontend_url.trim_end_matches('/')),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_email_carries_login_link_and_credentials() {
        let config = AppConfig {
            frontend_url: "https://app.example/".to_string(),
            ..AppConfig::default()
        };
        let email = welcome_email(&config, "Bistro", "Ada Chef", "ada@bistro.example", "Tmp#Pass1234");

        assert_eq!(email.template_id, config.mail.welcome_template_id);
        assert_eq!(email.to.email, "ada@bistro.example");
        assert_eq!(email.params["login_url"], "https://app.example/login");
        assert_eq!(email.params["temporary_password"], "Tmp#Pass1234");
        assert_eq!(email.params["restaurant_name"], "Bistro");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let email = TemplatedEmail {
            template_id: 3,
            to: Recipient {
                email: "x@y.io".to_string(),
                name: None,
            },
            params: json!({}),
        };
        assert!(LogMailer.send_template(&email).await.is_ok());
    }

    #[test]
    fn missing_api_key_falls_back_to_logging() {
        // Only checks construction succeeds; the concrete type is opaque.
        let _mailer = mailer_from_config(&MailConfig::default());
    }
}
