use anyhow::Context;
use async_trait::async_trait;

use super::SmsProvider;

const SEND_URL: &str = "https://notify.eskiz.uz/api/message/sms/send";

pub struct EskizSmsProvider {
    token: String,
    sender: String,
    client: reqwest::Client,
}

impl EskizSmsProvider {
    pub fn new(token: String, sender: String) -> Self {
        Self {
            token,
            sender,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SmsProvider for EskizSmsProvider {
    async fn send_sms(&self, to: &str, body: &str) -> anyhow::Result<bool> {
        if self.token.is_empty() {
            tracing::debug!("ESKIZ_TOKEN not set, skipping SMS");
            return Ok(false);
        }

        self.client
            .post(SEND_URL)
            .bearer_auth(&self.token)
            .form(&[
                ("mobile_phone", to),
                ("message", body),
                ("from", self.sender.as_str()),
            ])
            .send()
            .await
            .context("failed to send Eskiz SMS")?
            .error_for_status()
            .context("Eskiz API returned error")?;

        Ok(true)
    }
}
