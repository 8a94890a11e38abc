use tokio::sync::mpsc;
use tracing::info;

use crate::detector::{AlertDecision, ChangeDetector};
use crate::event::FeedSnapshot;
use crate::history::{HistoryEntry, SharedHistory};
use crate::notify::{AlertNotification, PushManager};
use crate::severity::push_tier;
use crate::web::WebState;

/// Owns the per-subscription state: the change detector, the shared
/// history, and the push dispatcher. One snapshot is processed to
/// completion before the next is taken off the channel, so nothing in
/// here needs synchronization beyond the shared history lock.
pub struct PipelineManager {
    detector: ChangeDetector,
    history: SharedHistory,
    push: PushManager,
    push_enabled: bool,
    web: WebState,
}

impl PipelineManager {
    pub fn new(history: SharedHistory, push: PushManager, push_enabled: bool, web: WebState) -> Self {
        Self {
            detector: ChangeDetector::new(),
            history,
            push,
            push_enabled,
            web,
        }
    }

    pub fn handle_snapshot(&mut self, snapshot: FeedSnapshot) {
        {
            let mut history = self.history.lock().unwrap();
            history.update(&snapshot);
            self.web.broadcast_latest(history.latest());
        }

        let AlertDecision::Alert { key, event } = self.detector.observe(&snapshot) else {
            return;
        };

        let severity = event
            .severity_label()
            .unwrap_or_else(|| "unknown".to_string());
        let magnitude_text = event
            .magnitude
            .map(|m| format!("{:.1}", m))
            .unwrap_or_else(|| "n/a".to_string());
        info!("New event {}: magnitude {}, severity {}", key, magnitude_text, severity);

        // In-app alert always fires on a new event, push is tier-gated.
        self.web.broadcast_alert(HistoryEntry {
            key: key.clone(),
            magnitude: event.magnitude,
            severity: Some(severity.clone()),
            time: event.time(),
        });

        let Some(magnitude) = event.magnitude else { return };
        let Some(tier) = push_tier(magnitude) else { return };
        if !self.push_enabled {
            return;
        }

        let notification = AlertNotification {
            station: self.web.station.clone(),
            key,
            magnitude,
            severity,
            tier,
            time: event.time(),
        };
        info!(
            "Dispatching {:?} push for {} (M{:.1})",
            tier, notification.key, magnitude
        );
        self.push.dispatch(&notification);
    }
}

pub async fn run_pipeline(mut input_rx: mpsc::Receiver<FeedSnapshot>, mut manager: PipelineManager) {
    info!("Pipeline started");
    while let Some(snapshot) = input_rx.recv().await {
        manager.handle_snapshot(snapshot);
    }
    info!("Pipeline stopped");
}
