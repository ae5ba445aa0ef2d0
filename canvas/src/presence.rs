//! Presence overlay: where every other participant is pointing.
//!
//! The transport delivers the full presence map periodically; each snapshot
//! replaces the previous one outright, so a participant who leaves simply stops
//! appearing. Outbound self-updates are throttled to one per interval and
//! anything in between is dropped.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::PRESENCE_LABEL_MIN_SCALE;
use crate::palette::Palette;
use crate::viewport::{GridPos, GridSize};

/// Cursor color as sent by peers: either a CSS color or a palette index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresenceColor {
    Palette(u16),
    Css(String),
}

impl PresenceColor {
    /// Resolve to a CSS color string.
    #[must_use]
    pub fn to_css(&self, palette: &Palette) -> String {
        match self {
            Self::Palette(index) => palette.color(*index).to_css(),
            Self::Css(css) => css.clone(),
        }
    }
}

/// Last known cursor of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    #[serde(default)]
    pub participant_id: String,
    pub x: i32,
    pub y: i32,
    pub color: PresenceColor,
    #[serde(default)]
    pub name: String,
}

impl PresenceEntry {
    #[must_use]
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// Outbound self-presence payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub x: i32,
    pub y: i32,
    pub color: PresenceColor,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PresenceOverlay {
    self_id: String,
    entries: HashMap<String, PresenceEntry>,
    interval_ms: f64,
    last_publish_ms: Option<f64>,
}

impl PresenceOverlay {
    #[must_use]
    pub fn new(self_id: impl Into<String>, interval_ms: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let interval_ms = interval_ms as f64;
        Self { self_id: self_id.into(), entries: HashMap::new(), interval_ms, last_publish_ms: None }
    }

    #[must_use]
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Replace the known set with `snapshot`. Map keys are authoritative ids.
    pub fn apply_snapshot(&mut self, snapshot: HashMap<String, PresenceEntry>) {
        self.entries = snapshot
            .into_iter()
            .map(|(id, mut entry)| {
                entry.participant_id.clone_from(&id);
                (id, entry)
            })
            .collect();
        log::debug!("presence: {} participants", self.entries.len());
    }

    /// Throttle gate for self-publishing. Returns the update when it may go out now.
    pub fn publish_self(&mut self, now_ms: f64, update: PresenceUpdate) -> Option<PresenceUpdate> {
        if let Some(last) = self.last_publish_ms {
            if now_ms - last < self.interval_ms {
                return None;
            }
        }
        self.last_publish_ms = Some(now_ms);
        Some(update)
    }

    /// Entries to draw: everyone but us, inside the grid, in id order.
    #[must_use]
    pub fn visible(&self, grid: GridSize) -> Vec<&PresenceEntry> {
        let mut out: Vec<&PresenceEntry> = self
            .entries
            .values()
            .filter(|e| e.participant_id != self.self_id && grid.contains(e.pos()))
            .collect();
        out.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
        out
    }

    #[must_use]
    pub fn get(&self, participant_id: &str) -> Option<&PresenceEntry> {
        self.entries.get(participant_id)
    }

    /// Number of known participants, including ourselves if the transport echoes us.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (session closed).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Whether name tags are legible at `scale`.
#[must_use]
pub fn show_labels(scale: f64) -> bool {
    scale >= PRESENCE_LABEL_MIN_SCALE
}
