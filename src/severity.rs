use serde::{Deserialize, Serialize};
use std::fmt;

/// Seven-class magnitude scale used for display and history records.
/// Intervals are half-open, lower-inclusive: `[2.0, 3.0)` is `Minor`, etc.
/// `Ord` follows severity order, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Micro,
    Minor,
    Light,
    Moderate,
    Strong,
    Major,
    Great,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Micro => "Micro",
            Severity::Minor => "Minor",
            Severity::Light => "Light",
            Severity::Moderate => "Moderate",
            Severity::Strong => "Strong",
            Severity::Major => "Major",
            Severity::Great => "Great",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a magnitude to its severity class. Total over the real line.
pub fn classify(magnitude: f64) -> Severity {
    if magnitude < 2.0 { Severity::Micro }
    else if magnitude < 3.0 { Severity::Minor }
    else if magnitude < 4.0 { Severity::Light }
    else if magnitude < 5.0 { Severity::Moderate }
    else if magnitude < 6.0 { Severity::Strong }
    else if magnitude < 7.0 { Severity::Major }
    else { Severity::Great }
}

/// Coarse two-threshold scale used only for push notifications.
///
/// This is deliberately NOT derived from [`Severity`]: the upstream feed
/// applications use the full seven-class scale for display and this
/// separate 5.0/6.0 split for alerting, and the two do not line up
/// ("Strong" straddles the caution boundary). Keep them independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushTier {
    Caution,
    Evacuate,
}

/// Push tier for a magnitude, or `None` when the event is below the
/// notification floor (in-app alerts still fire; only the push is skipped).
pub fn push_tier(magnitude: f64) -> Option<PushTier> {
    if magnitude >= 6.0 {
        Some(PushTier::Evacuate)
    } else if magnitude >= 5.0 {
        Some(PushTier::Caution)
    } else {
        None
    }
}
