use crate::config::MailConfig;
use crate::entities::validation_entity::ValidationType;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMailRequest {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Client for the HTTP mail relay.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    config: MailConfig,
}

impl MailService {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_url.is_empty()
    }

    pub fn validation_message(&self, to: &str, kind: ValidationType, token: &str) -> SendMailRequest {
        let subject = match kind {
            ValidationType::Password => format!("{} - password reset", self.config.app_name),
            _ => format!("{} - validate your account", self.config.app_name),
        };

        SendMailRequest {
            from: self.config.from.clone(),
            to: to.to_string(),
            subject,
            text: format!(
                "Your {} validation code is: {}. It is valid for a limited time.",
                kind, token
            ),
        }
    }

    pub async fn send_validation(&self, to: &str, kind: ValidationType, token: &str) -> AppResult<()> {
        let message = self.validation_message(to, kind, token);
        self.send(&message).await
    }

    /// Posts the message to the relay, up to three attempts one second apart.
    pub async fn send(&self, message: &SendMailRequest) -> AppResult<()> {
        if !self.is_enabled() {
            log::warn!("Mail relay disabled, message to {} not sent", message.to);
            return Ok(());
        }

        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.post(message).await {
                Ok(()) => {
                    log::info!("Mail sent successfully: {}", message.to);
                    return Ok(());
                }
                Err(e) => {
                    log::warn!(
                        "Mail to {} failed (attempt {attempt}/{MAX_ATTEMPTS}): {e}",
                        message.to
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }

        Err(AppError::ExternalApiError(format!(
            "Mail sending failed: {last_error}"
        )))
    }

    async fn post(&self, message: &SendMailRequest) -> AppResult<()> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(message)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::ExternalApiError(format!("{status}: {error_text}")))
        }
    }
}
