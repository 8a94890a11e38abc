use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub struct Settings {
    #[serde(alias = "SETTINGS")]
    pub settings: SettingsSection,
    #[serde(alias = "FEED")]
    pub feed: FeedSettings,
    #[serde(alias = "ALERT")]
    pub alert: AlertSettings,
    #[serde(alias = "WEB")]
    pub web: WebSettings,
    #[serde(alias = "DISCORD")]
    pub discord: DiscordSettings,
    #[serde(alias = "GOOGLECHAT")]
    pub googlechat: GoogleChatSettings,
    #[serde(alias = "LINE")]
    pub line: LineSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct SettingsSection {
    #[serde(alias = "DEBUG")]
    pub debug: bool,
    /// Display name for the monitored station/region, used in API output
    /// and notification titles.
    #[serde(alias = "STATION")]
    pub station: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct FeedSettings {
    /// Realtime database base URL, e.g.
    /// `https://example-default-rtdb.asia-southeast1.firebasedatabase.app`.
    #[serde(alias = "BASE_URL")]
    pub base_url: String,
    /// Path under the base URL holding the event records.
    #[serde(alias = "PATH")]
    pub path: String,
    #[serde(alias = "REQUEST_TIMEOUT_SECONDS")]
    pub request_timeout_seconds: u64,
    #[serde(alias = "RECONNECT_MIN_SECONDS")]
    pub reconnect_min_seconds: u64,
    #[serde(alias = "RECONNECT_MAX_SECONDS")]
    pub reconnect_max_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct AlertSettings {
    /// Master switch for push dispatch. In-process alerts (log lines,
    /// websocket broadcast) fire regardless.
    #[serde(alias = "ENABLED")]
    pub enabled: bool,
    #[serde(alias = "HISTORY_CAPACITY")]
    pub history_capacity: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct WebSettings {
    #[serde(alias = "ENABLED")]
    pub enabled: bool,
    #[serde(alias = "BIND")]
    pub bind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct DiscordSettings {
    #[serde(alias = "ENABLED")]
    pub enabled: bool,
    #[serde(alias = "WEBHOOK_URL")]
    pub webhook_url: String,
    #[serde(alias = "USE_EMBED")]
    pub use_embed: bool,
    #[serde(alias = "EXTRA_TEXT")]
    pub extra_text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct GoogleChatSettings {
    #[serde(alias = "ENABLED")]
    pub enabled: bool,
    #[serde(alias = "WEBHOOK_URL")]
    pub webhook_url: String,
    #[serde(alias = "EXTRA_TEXT")]
    pub extra_text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub struct LineSettings {
    #[serde(alias = "ENABLED")]
    pub enabled: bool,
    #[serde(alias = "CHANNEL_ACCESS_TOKEN")]
    pub channel_access_token: String,
    /// Comma-separated list of LINE user/group ids to push to.
    #[serde(alias = "TO_IDS")]
    pub to_ids: String,
    #[serde(alias = "EXTRA_TEXT")]
    pub extra_text: String,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            debug: false,
            station: "QuakeSense".to_string(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: "".to_string(),
            path: "earthquakes".to_string(),
            request_timeout_seconds: 10,
            reconnect_min_seconds: 1,
            reconnect_max_seconds: 60,
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            history_capacity: 500,
        }
    }
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: "n/a".to_string(),
            use_embed: true,
            extra_text: "".to_string(),
        }
    }
}

impl Default for GoogleChatSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: "n/a".to_string(),
            extra_text: "".to_string(),
        }
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_access_token: "n/a".to_string(),
            to_ids: "".to_string(),
            extra_text: "".to_string(),
        }
    }
}

impl Settings {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Load defaults
        let default_settings = Settings::default();
        builder = builder.add_source(config::Config::try_from(&default_settings)?);

        // 2. Load from file if specified
        if let Some(path) = config_path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            } else {
                warn!("Configuration file not found: {:?}", path);
            }
        } else {
            // Standard search path
            if let Some(home) = dirs::home_dir() {
                let toml_path = home.join(".quakesense").join("settings.toml");
                let yaml_path = home.join(".quakesense").join("settings.yaml");

                if toml_path.exists() {
                    builder = builder.add_source(File::from(toml_path));
                } else if yaml_path.exists() {
                    builder = builder.add_source(File::from(yaml_path));
                }
            }
        }

        // 3. Environment variables
        builder = builder.add_source(
            Environment::with_prefix("QUAKESENSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        // Detect unknown sections so typos don't silently fall back to defaults
        if let Ok(table) = config.clone().try_deserialize::<serde_json::Value>() {
            if let Some(map) = table.as_object() {
                let known_sections =
                    ["settings", "feed", "alert", "web", "discord", "googlechat", "line"];
                for key in map.keys() {
                    let lower_key = key.to_lowercase();
                    if !known_sections.contains(&lower_key.as_str()) {
                        warn!("Unknown configuration section: {}", key);
                    }
                }
            }
        }

        config.try_deserialize()
    }

    pub fn dump(&self, format: &str) -> Result<String, Box<dyn std::error::Error>> {
        match format.to_lowercase().as_str() {
            "toml" => Ok(toml::to_string_pretty(self)?),
            "yaml" | "yml" => Ok(serde_yaml::to_string(self)?),
            _ => Err("Unsupported format".into()),
        }
    }
}
