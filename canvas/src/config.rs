//! Engine configuration handed over by the host page as JSON.
//!
//! Only the board identity and size are required; every tunable has a default
//! matching [`crate::consts`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::consts::{
    COOLDOWN_TICK_MS, DEFAULT_SCALE, MINIMAP_SIZE_PX, PAINT_COOLDOWN_MS, PRESENCE_INTERVAL_MS,
    RATE_LIMITED_COOLDOWN_MS,
};
use crate::error::ConfigError;
use crate::palette::Palette;
use crate::presence::PresenceColor;
use crate::viewport::GridSize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub board_id: String,
    pub width: u32,
    pub height: u32,
    /// CSS hex colors; empty means the default palette.
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default = "fresh_participant_id")]
    pub self_id: String,
    #[serde(default = "default_name")]
    pub self_name: String,
    #[serde(default = "default_self_color")]
    pub self_color: PresenceColor,
    #[serde(default = "default_scale")]
    pub initial_scale: f64,
    #[serde(default = "default_paint_cooldown")]
    pub paint_cooldown_ms: u64,
    #[serde(default = "default_rate_limited_cooldown")]
    pub rate_limited_cooldown_ms: u64,
    #[serde(default = "default_tick")]
    pub cooldown_tick_ms: u64,
    #[serde(default = "default_presence_interval")]
    pub presence_interval_ms: u64,
    #[serde(default = "default_minimap")]
    pub minimap_width: u32,
    #[serde(default = "default_minimap")]
    pub minimap_height: u32,
}

impl EngineConfig {
    /// Config for a board with every tunable at its default.
    #[must_use]
    pub fn new(board_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            board_id: board_id.into(),
            width,
            height,
            palette: Vec::new(),
            self_id: fresh_participant_id(),
            self_name: default_name(),
            self_color: default_self_color(),
            initial_scale: DEFAULT_SCALE,
            paint_cooldown_ms: PAINT_COOLDOWN_MS,
            rate_limited_cooldown_ms: RATE_LIMITED_COOLDOWN_MS,
            cooldown_tick_ms: COOLDOWN_TICK_MS,
            presence_interval_ms: PRESENCE_INTERVAL_MS,
            minimap_width: MINIMAP_SIZE_PX,
            minimap_height: MINIMAP_SIZE_PX,
        }
    }

    /// Parse and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or a zero-sized grid.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyGrid`] when either dimension is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid { width: self.width, height: self.height });
        }
        Ok(())
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }

    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::from_css(&self.palette)
    }
}

fn fresh_participant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_name() -> String {
    "user".to_owned()
}

fn default_self_color() -> PresenceColor {
    PresenceColor::Palette(1)
}

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

fn default_paint_cooldown() -> u64 {
    PAINT_COOLDOWN_MS
}

fn default_rate_limited_cooldown() -> u64 {
    RATE_LIMITED_COOLDOWN_MS
}

fn default_tick() -> u64 {
    COOLDOWN_TICK_MS
}

fn default_presence_interval() -> u64 {
    PRESENCE_INTERVAL_MS
}

fn default_minimap() -> u32 {
    MINIMAP_SIZE_PX
}
