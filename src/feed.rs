use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::event::{decode_snapshot, FeedSnapshot};
use crate::settings::FeedSettings;

/// Errors from the feed client.
#[derive(Debug)]
pub enum FeedError {
    /// No base_url configured; there is nothing to subscribe to.
    MissingBaseUrl,
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::MissingBaseUrl => write!(f, "Feed config: base_url is empty"),
            FeedError::Http(e) => write!(f, "Feed HTTP error: {}", e),
            FeedError::Status(code) => write!(f, "Feed returned HTTP {}", code),
        }
    }
}

impl std::error::Error for FeedError {}

/// REST client for the realtime database path holding the event records.
///
/// Two operations, matching what the consumer needs from the store:
/// a one-shot [`fetch`](FeedClient::fetch) of the full value, and a
/// long-lived SSE subscription that re-fetches the full value on every
/// change so downstream always sees a complete snapshot.
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    request_timeout: Duration,
}

impl FeedClient {
    pub fn new(config: &FeedSettings) -> Result<Self, FeedError> {
        if config.base_url.is_empty() {
            return Err(FeedError::MissingBaseUrl);
        }
        let url = format!(
            "{}/{}.json",
            config.base_url.trim_end_matches('/'),
            config.path.trim_matches('/')
        );
        // No client-wide timeout: it would also cap the SSE stream body.
        // fetch() applies a per-request timeout instead.
        let client = reqwest::Client::builder().build().map_err(FeedError::Http)?;
        Ok(Self {
            client,
            url,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One-shot GET of the full value at the feed path.
    pub async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(FeedError::Http)?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }
        let value: serde_json::Value = response.json().await.map_err(FeedError::Http)?;
        Ok(decode_snapshot(&value))
    }

    /// Hold an SSE subscription open and push a fresh full snapshot into
    /// `tx` for every change event. Returns Ok(()) when the server closes
    /// the stream, the consumer goes away, or `cancel` fires.
    async fn stream_changes(
        &self,
        tx: &mpsc::Sender<FeedSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), FeedError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(FeedError::Http)?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }
        info!("feed: subscribed to {}", self.url);

        let mut stream = response.bytes_stream();
        let mut buf = String::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                chunk = stream.next() => {
                    let Some(chunk) = chunk else { return Ok(()) };
                    let chunk = chunk.map_err(FeedError::Http)?;
                    buf.push_str(&String::from_utf8_lossy(&chunk));
                    while let Some(pos) = buf.find('\n') {
                        let line = buf[..pos].trim_end_matches('\r').to_string();
                        buf.drain(..=pos);
                        if let Some(event_name) = line.strip_prefix("event:") {
                            // put/patch mean the value changed; keep-alive and
                            // auth_revoked are ignored here (the latter ends the
                            // stream and triggers a reconnect).
                            let event_name = event_name.trim();
                            if event_name == "put" || event_name == "patch" {
                                let snapshot = self.fetch().await?;
                                if tx.send(snapshot).await.is_err() {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Feed task: deliver a baseline snapshot, then hold the subscription open,
/// reconnecting with bounded backoff until cancelled.
///
/// All failures are logged and retried; downstream cannot distinguish a
/// broken feed from a quiet one, which matches the upstream store's
/// fire-and-forget delivery model.
pub async fn run_feed(
    config: FeedSettings,
    tx: mpsc::Sender<FeedSnapshot>,
    cancel: CancellationToken,
) {
    let client = match FeedClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            warn!("feed: not starting: {}", e);
            return;
        }
    };

    let min = Duration::from_secs(config.reconnect_min_seconds.max(1));
    let max = Duration::from_secs(config.reconnect_max_seconds.max(config.reconnect_min_seconds.max(1)));
    let mut backoff = min;

    loop {
        // Baseline snapshot so the consumer has the current state before
        // any change arrives (also re-syncs after a reconnect gap).
        match client.fetch().await {
            Ok(snapshot) => {
                backoff = min;
                if tx.send(snapshot).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!("feed: fetch failed: {}", e),
        }

        match client.stream_changes(&tx, &cancel).await {
            Ok(()) => {
                if cancel.is_cancelled() {
                    info!("feed: subscription cancelled");
                    return;
                }
                warn!("feed: stream closed, reconnecting in {:?}", backoff);
            }
            Err(e) => warn!("feed: stream error: {} (reconnecting in {:?})", e, backoff),
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(max);
    }
}
