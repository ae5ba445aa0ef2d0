//! Rendering: draws a [`RenderPlan`] to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a finished plan plus the off-screen raster canvas and produces
//! pixels. It does not mutate any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render_frame`]) handles the result.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{
    BACKGROUND_COLOR, GRID_LINE_COLOR, HOVER_COLOR, MINIMAP_VIEWPORT_COLOR, UNPAINTED_COLOR,
};
use crate::minimap::MapRect;
use crate::scene::{Layer, PresenceMark, RenderPlan};
use crate::viewport::{CellRange, GridPos, GridSize, Point, Viewport};

/// Presence outline width in CSS pixels.
const PRESENCE_OUTLINE_PX: f64 = 2.0;
/// Name tag font size in CSS pixels.
const LABEL_FONT_PX: f64 = 11.0;
/// Padding around name tag text.
const LABEL_PAD_PX: f64 = 3.0;

/// Draw every layer of `plan`, back to front.
///
/// `viewport_w` and `viewport_h` are in CSS pixels. `dpr` is the device pixel ratio.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    raster: &HtmlCanvasElement,
    plan: &RenderPlan,
    viewport_w: f64,
    viewport_h: f64,
    dpr: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.set_image_smoothing_enabled(false);

    let vp = &plan.viewport;
    for layer in &plan.layers {
        match layer {
            Layer::Background => {
                ctx.set_fill_style_str(BACKGROUND_COLOR);
                ctx.fill_rect(0.0, 0.0, viewport_w, viewport_h);
            }
            Layer::Raster { grid } => draw_raster(ctx, raster, vp, *grid)?,
            Layer::GridLines { range } => draw_grid_lines(ctx, vp, *range),
            Layer::Hover(pos) => {
                let p = vp.grid_to_screen(*pos);
                ctx.set_fill_style_str(HOVER_COLOR);
                ctx.fill_rect(p.x, p.y, vp.scale(), vp.scale());
            }
            Layer::Presence { marks, labels } => {
                for mark in marks {
                    draw_presence(ctx, vp, mark, *labels)?;
                }
            }
            Layer::Minimap { origin, image, view } => draw_minimap(ctx, raster, *origin, *image, *view)?,
            Layer::Status(text) => draw_status(ctx, text, viewport_w, viewport_h)?,
        }
    }
    Ok(())
}

fn draw_raster(
    ctx: &CanvasRenderingContext2d,
    raster: &HtmlCanvasElement,
    vp: &Viewport,
    grid: GridSize,
) -> Result<(), JsValue> {
    let w = f64::from(grid.width) * vp.scale();
    let h = f64::from(grid.height) * vp.scale();
    // Backdrop for cells the image hasn't been uploaded for yet.
    ctx.set_fill_style_str(UNPAINTED_COLOR);
    ctx.fill_rect(vp.offset_x, vp.offset_y, w, h);
    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(raster, vp.offset_x, vp.offset_y, w, h)
}

#[allow(clippy::cast_possible_wrap)]
fn draw_grid_lines(ctx: &CanvasRenderingContext2d, vp: &Viewport, range: CellRange) {
    let top_left = vp.grid_to_screen(GridPos::new(range.x0 as i32, range.y0 as i32));
    let bottom_right = vp.grid_to_screen(GridPos::new(range.x1 as i32, range.y1 as i32));

    ctx.set_stroke_style_str(GRID_LINE_COLOR);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for gx in range.x0..=range.x1 {
        let x = vp.grid_to_screen(GridPos::new(gx as i32, 0)).x.round() + 0.5;
        ctx.move_to(x, top_left.y);
        ctx.line_to(x, bottom_right.y);
    }
    for gy in range.y0..=range.y1 {
        let y = vp.grid_to_screen(GridPos::new(0, gy as i32)).y.round() + 0.5;
        ctx.move_to(top_left.x, y);
        ctx.line_to(bottom_right.x, y);
    }
    ctx.stroke();
}

fn draw_presence(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    mark: &PresenceMark,
    labels: bool,
) -> Result<(), JsValue> {
    let p = vp.grid_to_screen(mark.pos);
    let s = vp.scale();

    ctx.set_stroke_style_str(&mark.color);
    ctx.set_line_width(PRESENCE_OUTLINE_PX);
    ctx.stroke_rect(p.x + 1.0, p.y + 1.0, s - 2.0, s - 2.0);

    if !labels || mark.name.is_empty() {
        return Ok(());
    }

    ctx.set_font(&format!("{LABEL_FONT_PX:.0}px sans-serif"));
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    let text_w = ctx.measure_text(&mark.name)?.width();
    let tag_x = p.x + s + LABEL_PAD_PX;
    let tag_y = p.y - LABEL_FONT_PX - LABEL_PAD_PX * 2.0;

    ctx.set_fill_style_str(&mark.color);
    ctx.fill_rect(tag_x, tag_y, text_w + LABEL_PAD_PX * 2.0, LABEL_FONT_PX + LABEL_PAD_PX * 2.0);
    ctx.set_fill_style_str(BACKGROUND_COLOR);
    ctx.fill_text(&mark.name, tag_x + LABEL_PAD_PX, tag_y + LABEL_PAD_PX)
}

fn draw_minimap(
    ctx: &CanvasRenderingContext2d,
    raster: &HtmlCanvasElement,
    origin: Point,
    image: MapRect,
    view: MapRect,
) -> Result<(), JsValue> {
    ctx.save();
    ctx.translate(origin.x, origin.y)?;

    ctx.set_fill_style_str(BACKGROUND_COLOR);
    ctx.fill_rect(image.x, image.y, image.w, image.h);
    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(raster, image.x, image.y, image.w, image.h)?;

    ctx.set_stroke_style_str(MINIMAP_VIEWPORT_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(view.x + 0.5, view.y + 0.5, (view.w - 1.0).max(1.0), (view.h - 1.0).max(1.0));

    ctx.restore();
    Ok(())
}

fn draw_status(ctx: &CanvasRenderingContext2d, text: &str, viewport_w: f64, viewport_h: f64) -> Result<(), JsValue> {
    ctx.set_font("14px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(MINIMAP_VIEWPORT_COLOR);
    ctx.fill_text(text, viewport_w * 0.5, viewport_h * 0.5)
}
