use crate::notify::{AlertNotification, PushProvider};
use async_trait::async_trait;
use serde_json::json;

pub struct GChatProvider {
    webhook_url: String,
    extra_text: String,
}

impl GChatProvider {
    pub fn new(webhook_url: String, extra_text: String) -> Self {
        Self {
            webhook_url,
            extra_text,
        }
    }
}

#[async_trait]
impl PushProvider for GChatProvider {
    async fn send_alert(
        &self,
        notification: &AlertNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::Client::new();
        let mut text = format!("🚨 *{}*\n{}", notification.title(), notification.body());
        if !self.extra_text.is_empty() {
            text.push('\n');
            text.push_str(&self.extra_text);
        }

        let res = client
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(format!("Google Chat webhook returned HTTP {}", res.status()).into());
        }

        Ok(())
    }
}
