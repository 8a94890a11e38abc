use crate::notify::{AlertNotification, PushProvider};
use async_trait::async_trait;
use serde_json::json;
use tracing::error;

pub struct LineProvider {
    channel_access_token: String,
    to_ids: Vec<String>,
    extra_text: String,
}

impl LineProvider {
    pub fn new(channel_access_token: String, to_ids: Vec<String>, extra_text: String) -> Self {
        Self {
            channel_access_token,
            to_ids,
            extra_text,
        }
    }

    async fn push_message(
        &self,
        message: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::Client::new();
        for id in &self.to_ids {
            let payload = json!({
                "to": id,
                "messages": [message]
            });

            let res = client
                .post("https://api.line.me/v2/bot/message/push")
                .bearer_auth(&self.channel_access_token)
                .json(&payload)
                .send()
                .await?;

            if !res.status().is_success() {
                let err_body = res.text().await?;
                error!("LINE push failed for {}: {}", id, err_body);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PushProvider for LineProvider {
    async fn send_alert(
        &self,
        notification: &AlertNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut text = format!("🚨 {}\n{}", notification.title(), notification.body());
        if !self.extra_text.is_empty() {
            text.push('\n');
            text.push_str(&self.extra_text);
        }
        self.push_message(json!({
            "type": "text",
            "text": text
        }))
        .await
    }
}
