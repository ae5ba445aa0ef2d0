//! Viewport transform: screen pixels ↔ grid cells, pan and stepped zoom.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{COARSE_ZOOM_THRESHOLD, DEFAULT_SCALE, MAX_SCALE, MIN_SCALE};

/// A point in screen space (CSS pixels relative to the canvas).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Integer cell coordinates. May lie outside the grid; check with [`GridSize::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Board dimensions in cells. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `pos` addresses a cell of this grid.
    #[must_use]
    pub fn contains(&self, pos: GridPos) -> bool {
        u32::try_from(pos.x).is_ok_and(|x| x < self.width) && u32::try_from(pos.y).is_ok_and(|y| y < self.height)
    }

    /// Row-major index of an in-bounds cell.
    #[must_use]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let (x, y) = (pos.x.unsigned_abs() as usize, pos.y.unsigned_abs() as usize);
        Some(y * self.width as usize + x)
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Half-open range of cells `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellRange {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// One wheel notch, toward or away from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Map a vertical wheel delta to a direction. Scrolling up (negative) zooms in.
    #[must_use]
    pub fn from_wheel(dy: f64) -> Option<Self> {
        if dy < 0.0 {
            Some(Self::In)
        } else if dy > 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }
}

/// Scale after one notch in `direction`, clamped to `[MIN_SCALE, MAX_SCALE]`.
#[must_use]
pub fn stepped_scale(scale: f64, direction: ZoomDirection) -> f64 {
    let step = if scale < COARSE_ZOOM_THRESHOLD { 1.0 } else { 2.0 };
    let next = match direction {
        ZoomDirection::In => scale + step,
        ZoomDirection::Out => scale - step,
    };
    next.clamp(MIN_SCALE, MAX_SCALE)
}

/// Pan/zoom state.
///
/// `scale` is screen pixels per cell. `offset_x` / `offset_y` is the screen
/// position of the top-left corner of cell (0, 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: DEFAULT_SCALE, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl Viewport {
    /// Build a viewport; `scale` is clamped into range.
    #[must_use]
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self { scale: scale.clamp(MIN_SCALE, MAX_SCALE), offset_x, offset_y }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Cell under a screen point: `floor((screen - offset) / scale)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn screen_to_grid(&self, screen: Point) -> GridPos {
        GridPos {
            x: ((screen.x - self.offset_x) / self.scale).floor() as i32,
            y: ((screen.y - self.offset_y) / self.scale).floor() as i32,
        }
    }

    /// Screen position of a cell's top-left corner.
    #[must_use]
    pub fn grid_to_screen(&self, pos: GridPos) -> Point {
        Point {
            x: f64::from(pos.x) * self.scale + self.offset_x,
            y: f64::from(pos.y) * self.scale + self.offset_y,
        }
    }

    /// Zoom one notch keeping the grid point under `anchor` fixed on screen.
    ///
    /// Returns `false` (and changes nothing) when the scale is already at the limit.
    pub fn zoom_at(&mut self, anchor: Point, direction: ZoomDirection) -> bool {
        let old = self.scale;
        let next = stepped_scale(old, direction);
        if (next - old).abs() < f64::EPSILON {
            return false;
        }
        let grid_x = (anchor.x - self.offset_x) / old;
        let grid_y = (anchor.y - self.offset_y) / old;
        self.scale = next;
        self.offset_x = anchor.x - grid_x * next;
        self.offset_y = anchor.y - grid_y * next;
        true
    }

    /// Shift by a screen-space delta. Panning off the grid is allowed.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Put the center of `pos` at the center of a `viewport_w × viewport_h` viewport,
    /// optionally switching scale first.
    pub fn center_on(&mut self, pos: GridPos, scale: Option<f64>, viewport_w: f64, viewport_h: f64) {
        if let Some(scale) = scale {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        self.offset_x = viewport_w * 0.5 - (f64::from(pos.x) + 0.5) * self.scale;
        self.offset_y = viewport_h * 0.5 - (f64::from(pos.y) + 0.5) * self.scale;
    }

    /// Center the whole grid in the viewport.
    pub fn center_grid(&mut self, grid: GridSize, viewport_w: f64, viewport_h: f64) {
        self.offset_x = (viewport_w - f64::from(grid.width) * self.scale) * 0.5;
        self.offset_y = (viewport_h - f64::from(grid.height) * self.scale) * 0.5;
    }

    /// Cells at least partly visible in a `viewport_w × viewport_h` viewport, clamped to the grid.
    #[must_use]
    pub fn visible_cells(&self, viewport_w: f64, viewport_h: f64, grid: GridSize) -> CellRange {
        let clamp_x = |v: f64| clamp_cell(v, grid.width);
        let clamp_y = |v: f64| clamp_cell(v, grid.height);
        CellRange {
            x0: clamp_x(((0.0 - self.offset_x) / self.scale).floor()),
            y0: clamp_y(((0.0 - self.offset_y) / self.scale).floor()),
            x1: clamp_x(((viewport_w - self.offset_x) / self.scale).ceil()),
            y1: clamp_y(((viewport_h - self.offset_y) / self.scale).ceil()),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_cell(v: f64, limit: u32) -> u32 {
    v.clamp(0.0, f64::from(limit)) as u32
}
