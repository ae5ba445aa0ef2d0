//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed scale, in screen pixels per cell.
pub const MIN_SCALE: f64 = 4.0;

/// Largest allowed scale, in screen pixels per cell.
pub const MAX_SCALE: f64 = 40.0;

/// Below this scale each wheel notch changes the scale by 1; at or above it, by 2.
pub const COARSE_ZOOM_THRESHOLD: f64 = 16.0;

/// Scale a fresh session opens at.
pub const DEFAULT_SCALE: f64 = 12.0;

// ── Rendering ───────────────────────────────────────────────────

/// Grid lines are only drawn at or above this scale.
pub const GRID_LINE_MIN_SCALE: f64 = 8.0;

/// Presence name tags are only drawn at or above this scale.
pub const PRESENCE_LABEL_MIN_SCALE: f64 = 10.0;

/// Page background behind the board.
pub const BACKGROUND_COLOR: &str = "#0f172a";

/// Color of a cell nobody has painted yet.
pub const UNPAINTED_COLOR: &str = "#111827";

/// Grid line stroke.
pub const GRID_LINE_COLOR: &str = "rgba(255,255,255,0.06)";

/// Fill drawn over the hovered cell.
pub const HOVER_COLOR: &str = "rgba(255,255,255,0.25)";

/// Stroke of the minimap viewport rectangle.
pub const MINIMAP_VIEWPORT_COLOR: &str = "#f8fafc";

/// Gap between the minimap and the bottom-right corner of the canvas, in CSS pixels.
pub const MINIMAP_MARGIN_PX: f64 = 12.0;

// ── Admission ───────────────────────────────────────────────────

/// Cooldown armed after a paint the authority accepted.
pub const PAINT_COOLDOWN_MS: u64 = 2000;

/// Cooldown armed after the authority rejected a paint for rate limiting.
pub const RATE_LIMITED_COOLDOWN_MS: u64 = 1500;

/// Interval at which the host ticks the cooldown down.
pub const COOLDOWN_TICK_MS: u64 = 100;

// ── Presence ────────────────────────────────────────────────────

/// Minimum gap between two outbound self-presence publishes.
pub const PRESENCE_INTERVAL_MS: u64 = 150;

// ── Minimap ─────────────────────────────────────────────────────

/// Default minimap width in CSS pixels.
pub const MINIMAP_SIZE_PX: u32 = 160;
