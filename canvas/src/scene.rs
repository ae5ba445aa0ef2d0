//! Scene plan: the ordered layers of one redraw.
//!
//! Building the plan is pure so that layer order and culling are testable
//! natively. [`crate::render`] walks the plan against a 2D context.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use crate::consts::GRID_LINE_MIN_SCALE;
use crate::engine::{EngineCore, SessionStatus};
use crate::minimap::MapRect;
use crate::presence::show_labels;
use crate::viewport::{CellRange, GridPos, GridSize, Point, Viewport};

/// A remote participant's cursor, resolved for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceMark {
    pub pos: GridPos,
    /// CSS color of the outline and label.
    pub color: String,
    pub name: String,
}

/// One drawing step, back to front.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Background,
    /// The raster image scaled onto the board area.
    Raster { grid: GridSize },
    /// Cell borders, only for the visible range.
    GridLines { range: CellRange },
    Hover(GridPos),
    Presence { marks: Vec<PresenceMark>, labels: bool },
    /// Minimap panel in screen space: the whole raster plus the current view box.
    Minimap { origin: Point, image: MapRect, view: MapRect },
    /// Centered status text (loading, failure, reconnecting).
    Status(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub viewport: Viewport,
    pub layers: Vec<Layer>,
}

impl RenderPlan {
    /// Whether any layer matches `pred`.
    #[must_use]
    pub fn has(&self, pred: impl Fn(&Layer) -> bool) -> bool {
        self.layers.iter().any(pred)
    }
}

/// Build the layer list for the current engine state.
#[must_use]
pub fn plan(core: &EngineCore) -> RenderPlan {
    let viewport = core.viewport();
    let mut layers = vec![Layer::Background];

    match core.status() {
        SessionStatus::Loading => {
            layers.push(Layer::Status("Loading board…".to_owned()));
            return RenderPlan { viewport, layers };
        }
        SessionStatus::Failed(reason) => {
            layers.push(Layer::Status(format!("Could not load board: {reason}")));
            return RenderPlan { viewport, layers };
        }
        SessionStatus::Closed => return RenderPlan { viewport, layers },
        SessionStatus::Ready | SessionStatus::Disconnected => {}
    }

    let grid = core.raster().grid();
    let (vw, vh) = core.viewport_size();
    layers.push(Layer::Raster { grid });

    if viewport.scale() >= GRID_LINE_MIN_SCALE {
        let range = viewport.visible_cells(vw, vh, grid);
        if !range.is_empty() {
            layers.push(Layer::GridLines { range });
        }
    }

    if let Some(pos) = core.hover() {
        layers.push(Layer::Hover(pos));
    }

    let palette = core.raster().palette();
    let marks: Vec<PresenceMark> = core
        .presence()
        .visible(grid)
        .into_iter()
        .map(|entry| PresenceMark { pos: entry.pos(), color: entry.color.to_css(palette), name: entry.name.clone() })
        .collect();
    if !marks.is_empty() {
        layers.push(Layer::Presence { marks, labels: show_labels(viewport.scale()) });
    }

    let minimap = core.minimap();
    layers.push(Layer::Minimap {
        origin: minimap.origin(vw, vh),
        image: minimap.image_rect(grid),
        view: minimap.viewport_rect(&viewport, vw, vh, grid),
    });

    if *core.status() == SessionStatus::Disconnected {
        layers.push(Layer::Status("Reconnecting…".to_owned()));
    }

    RenderPlan { viewport, layers }
}
