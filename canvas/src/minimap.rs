//! Minimap: a downsampled view of the raster buffer with the main viewport outlined.
//!
//! The minimap owns no pixels. The renderer scales the same off-screen raster
//! image used for the main view into the minimap box, so the two can never show
//! different boards.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use crate::consts::MINIMAP_MARGIN_PX;
use crate::viewport::{GridPos, GridSize, Point, Viewport};

/// Axis-aligned rectangle in minimap-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimap {
    pub width: f64,
    pub height: f64,
}

impl Minimap {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: f64::from(width), height: f64::from(height) }
    }

    /// Minimap pixels per cell.
    #[must_use]
    pub fn scale(&self, grid: GridSize) -> f64 {
        (self.width / f64::from(grid.width)).min(self.height / f64::from(grid.height))
    }

    /// Size of the downsampled board inside the minimap box.
    #[must_use]
    pub fn image_rect(&self, grid: GridSize) -> MapRect {
        let s = self.scale(grid);
        MapRect { x: 0.0, y: 0.0, w: f64::from(grid.width) * s, h: f64::from(grid.height) * s }
    }

    /// Screen position of the minimap's top-left corner: bottom-right of the canvas.
    #[must_use]
    pub fn origin(&self, viewport_w: f64, viewport_h: f64) -> Point {
        Point::new(
            viewport_w - self.width - MINIMAP_MARGIN_PX,
            viewport_h - self.height - MINIMAP_MARGIN_PX,
        )
    }

    /// Convert a screen point to minimap-local coordinates if it falls on the minimap.
    #[must_use]
    pub fn local_point(&self, screen: Point, viewport_w: f64, viewport_h: f64) -> Option<Point> {
        let origin = self.origin(viewport_w, viewport_h);
        let local = Point::new(screen.x - origin.x, screen.y - origin.y);
        let inside = (0.0..self.width).contains(&local.x) && (0.0..self.height).contains(&local.y);
        inside.then_some(local)
    }

    /// The main viewport's visible grid region, in minimap pixels, clamped to the board.
    #[must_use]
    pub fn viewport_rect(&self, viewport: &Viewport, viewport_w: f64, viewport_h: f64, grid: GridSize) -> MapRect {
        let s = self.scale(grid);
        let gw = f64::from(grid.width);
        let gh = f64::from(grid.height);
        let scale = viewport.scale();
        let x0 = (-viewport.offset_x / scale).clamp(0.0, gw);
        let y0 = (-viewport.offset_y / scale).clamp(0.0, gh);
        let x1 = ((viewport_w - viewport.offset_x) / scale).clamp(0.0, gw);
        let y1 = ((viewport_h - viewport.offset_y) / scale).clamp(0.0, gh);
        MapRect { x: x0 * s, y: y0 * s, w: (x1 - x0) * s, h: (y1 - y0) * s }
    }

    /// Cell under a minimap-local point, clamped into the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_at(&self, local: Point, grid: GridSize) -> GridPos {
        let s = self.scale(grid);
        let max_x = f64::from(grid.width) - 1.0;
        let max_y = f64::from(grid.height) - 1.0;
        GridPos::new(
            (local.x / s).floor().clamp(0.0, max_x) as i32,
            (local.y / s).floor().clamp(0.0, max_y) as i32,
        )
    }
}
