pub mod eskiz;
pub mod telegram;

use async_trait::async_trait;

/// Outbound SMS. Returns `Ok(false)` when the provider is not configured and
/// the message was skipped.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> anyhow::Result<bool>;
}

/// Outbound chat message to the operators' chat.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}
