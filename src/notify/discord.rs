use crate::notify::{AlertNotification, PushProvider};
use crate::severity::PushTier;
use async_trait::async_trait;
use serde_json::json;

pub struct DiscordProvider {
    webhook_url: String,
    use_embed: bool,
    extra_text: String,
}

impl DiscordProvider {
    pub fn new(webhook_url: String, use_embed: bool, extra_text: String) -> Self {
        Self {
            webhook_url,
            use_embed,
            extra_text,
        }
    }

    fn embed_color(tier: PushTier) -> u32 {
        match tier {
            PushTier::Caution => 0xFFA500,
            PushTier::Evacuate => 0xFF0000,
        }
    }
}

#[async_trait]
impl PushProvider for DiscordProvider {
    async fn send_alert(
        &self,
        notification: &AlertNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::Client::new();
        let mut body = notification.body();
        if !self.extra_text.is_empty() {
            body.push('\n');
            body.push_str(&self.extra_text);
        }

        let payload = if self.use_embed {
            let mut embed = json!({
                "title": notification.title(),
                "description": body,
                "color": Self::embed_color(notification.tier),
            });
            if let Some(time) = notification.time {
                embed["timestamp"] = json!(time.to_rfc3339());
            }
            json!({ "embeds": [embed] })
        } else {
            json!({ "content": format!("🚨 **{}**\n{}", notification.title(), body) })
        };

        let res = client.post(&self.webhook_url).json(&payload).send().await?;
        if !res.status().is_success() {
            return Err(format!("Discord webhook returned HTTP {}", res.status()).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[tokio::test]
    async fn test_send_alert_posts_embed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = String::new();
            let mut buf = [0u8; 8192];
            // Headers and JSON body may arrive in separate segments
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if n == 0 || request.trim_end().ends_with('}') {
                    break;
                }
            }
            let _ = stream.write_all(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n");
            request
        });

        let provider = DiscordProvider::new(
            format!("http://127.0.0.1:{}/webhook", port),
            true,
            "".to_string(),
        );
        let notification = AlertNotification {
            station: "QuakeSense".to_string(),
            key: "-Nx9".to_string(),
            magnitude: 6.2,
            severity: "Major".to_string(),
            tier: PushTier::Evacuate,
            time: None,
        };

        provider.send_alert(&notification).await.unwrap();
        let request = handle.join().unwrap();
        assert!(request.contains("POST /webhook"));
        assert!(request.contains("embeds"));
        assert!(request.contains("M6.2 earthquake detected"));
    }
}
