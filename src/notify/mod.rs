use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::settings::Settings;
use crate::severity::PushTier;

pub mod discord;
pub mod gchat;
pub mod line;

use self::discord::DiscordProvider;
use self::gchat::GChatProvider;
use self::line::LineProvider;

/// A push-worthy alert: a new event at or above the caution floor.
/// Events below magnitude 5.0 never reach this module.
#[derive(Debug, Clone)]
pub struct AlertNotification {
    pub station: String,
    pub key: String,
    pub magnitude: f64,
    pub severity: String,
    pub tier: PushTier,
    pub time: Option<DateTime<Utc>>,
}

impl AlertNotification {
    pub fn title(&self) -> String {
        format!("{}: M{:.1} earthquake detected", self.station, self.magnitude)
    }

    pub fn body(&self) -> String {
        match self.tier {
            PushTier::Caution => format!(
                "A magnitude {:.1} ({}) earthquake was detected. Be aware of visible damage around you and move away from windows, shelves and other hazards.",
                self.magnitude, self.severity
            ),
            PushTier::Evacuate => format!(
                "A magnitude {:.1} ({}) earthquake was detected. Evacuate immediately and do not stay inside buildings.",
                self.magnitude, self.severity
            ),
        }
    }
}

/// A push destination. Fire and forget: no delivery acknowledgment is
/// expected and failures are only logged.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_alert(
        &self,
        notification: &AlertNotification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct PushManager {
    providers: Vec<Arc<dyn PushProvider>>,
}

impl PushManager {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut manager = Self {
            providers: Vec::new(),
        };

        // Discord
        if settings.discord.enabled {
            manager.providers.push(Arc::new(DiscordProvider::new(
                settings.discord.webhook_url.clone(),
                settings.discord.use_embed,
                settings.discord.extra_text.clone(),
            )));
        }

        // Google Chat
        if settings.googlechat.enabled {
            manager.providers.push(Arc::new(GChatProvider::new(
                settings.googlechat.webhook_url.clone(),
                settings.googlechat.extra_text.clone(),
            )));
        }

        // LINE
        if settings.line.enabled {
            manager.providers.push(Arc::new(LineProvider::new(
                settings.line.channel_access_token.clone(),
                settings
                    .line
                    .to_ids
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                settings.line.extra_text.clone(),
            )));
        }

        manager
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Dispatch to every configured provider without blocking the pipeline.
    pub fn dispatch(&self, notification: &AlertNotification) {
        for provider in &self.providers {
            let provider = provider.clone();
            let notification = notification.clone();
            tokio::spawn(async move {
                if let Err(e) = provider.send_alert(&notification).await {
                    tracing::warn!("Failed to send push notification: {}", e);
                }
            });
        }
    }
}
