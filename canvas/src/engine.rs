use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::config::EngineConfig;
use crate::error::{PaintError, SessionError};
use crate::input::{Button, Gesture, InputState, Modifiers, WheelDelta, classify};
use crate::minimap::Minimap;
use crate::paint::{Cooldown, PaintLedger, PaintPhase, PaintTicket};
use crate::presence::{PresenceEntry, PresenceOverlay, PresenceUpdate};
use crate::raster::{Cell, RasterBuffer};
use crate::render;
use crate::scene::{self, RenderPlan};
use crate::scheduler::FrameScheduler;
use crate::share::ShareLink;
use crate::viewport::{GridPos, Point, Viewport, ZoomDirection};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Host cursor while dragging the board.
pub const CURSOR_PANNING: &str = "grabbing";
/// Host cursor otherwise.
pub const CURSOR_DEFAULT: &str = "crosshair";

/// Actions returned from engine operations for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Register a next-frame callback. Emitted at most once per pending frame.
    RenderNeeded,
    /// Send this paint to the admission authority and report back with the ticket.
    SubmitPaint { ticket: PaintTicket, board_id: String, cell: Cell },
    /// An in-flight paint reached its final state.
    PaintSettled { ticket: PaintTicket, phase: PaintPhase },
    /// Publish our cursor on the presence channel.
    PublishPresence(PresenceUpdate),
    /// The user asked to share the location under the pointer.
    ShareLocation(ShareLink),
    /// The paint cooldown changed; the palette UI shows it.
    CooldownChanged { remaining_ms: u64 },
    /// Non-fatal message for the user.
    Notice(String),
    /// The session moved to a new lifecycle state.
    StatusChanged(SessionStatus),
    /// CSS cursor for the canvas element.
    SetCursor(String),
}

/// Lifecycle of one board session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Waiting for the initial snapshot.
    #[default]
    Loading,
    /// Snapshot applied; live.
    Ready,
    /// The snapshot could not be loaded. Nothing of the board is shown.
    Failed(String),
    /// The live feed dropped; the last known picture stays up.
    Disconnected,
    /// The session was torn down.
    Closed,
}

impl SessionStatus {
    /// Whether the board (and input on it) should be shown in this state.
    #[must_use]
    pub fn shows_board(&self) -> bool {
        matches!(self, Self::Ready | Self::Disconnected)
    }
}

/// Board state and every rule that does not need a browser: viewport, raster,
/// presence, gestures, paint admission and redraw scheduling.
///
/// Every mutation goes through the methods below; each returns the [`Action`]s
/// the host must carry out. [`Engine`] wraps it for the canvas element.
pub struct EngineCore {
    config: EngineConfig,
    viewport: Viewport,
    raster: RasterBuffer,
    presence: PresenceOverlay,
    input: InputState,
    hover: Option<GridPos>,
    cooldown: Cooldown,
    ledger: PaintLedger,
    scheduler: FrameScheduler,
    minimap: Minimap,
    status: SessionStatus,
    selected_color: u16,
    viewport_width: f64,
    viewport_height: f64,
    dpr: f64,
    placed: bool,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let grid = config.grid();
        let palette = config.palette();
        Self {
            viewport: Viewport::new(config.initial_scale, 0.0, 0.0),
            raster: RasterBuffer::new(grid, palette),
            presence: PresenceOverlay::new(config.self_id.clone(), config.presence_interval_ms),
            input: InputState::default(),
            hover: None,
            cooldown: Cooldown::default(),
            ledger: PaintLedger::new(),
            scheduler: FrameScheduler::new(),
            minimap: Minimap::new(config.minimap_width, config.minimap_height),
            status: SessionStatus::Loading,
            selected_color: 0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            placed: false,
            config,
        }
    }

    // --- Viewport ---

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    ///
    /// The first call with a real size centers the board on screen.
    pub fn set_viewport(&mut self, width: f64, height: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        self.dpr = dpr.max(1.0);
        if !self.placed && self.viewport_width > 0.0 && self.viewport_height > 0.0 {
            self.viewport.center_grid(self.config.grid(), self.viewport_width, self.viewport_height);
            self.placed = true;
        }
        let mut actions = Vec::new();
        self.invalidate(&mut actions);
        actions
    }

    /// Center the view on a cell, optionally at a given scale.
    pub fn center_on(&mut self, pos: GridPos, scale: Option<f64>) -> Vec<Action> {
        self.viewport.center_on(pos, scale, self.viewport_width, self.viewport_height);
        self.placed = true;
        let mut actions = Vec::new();
        self.invalidate(&mut actions);
        actions
    }

    /// Restore a location from a share-link query string. Unparsable links are ignored.
    pub fn restore_link(&mut self, query: &str) -> Vec<Action> {
        match ShareLink::from_query(query) {
            Some((pos, scale)) => self.center_on(pos, scale),
            None => {
                log::debug!("share link ignored: {query:?}");
                Vec::new()
            }
        }
    }

    // --- Palette ---

    /// Choose the color for the next paint. Clamped into the palette.
    pub fn set_color(&mut self, index: u16) {
        self.selected_color = self.raster.palette().clamp_index(index);
    }

    // --- Session lifecycle / sync ---

    /// Enter the loading state (new or restarted session).
    pub fn begin_loading(&mut self) -> Vec<Action> {
        self.set_status(SessionStatus::Loading)
    }

    /// Rebuild the raster from a full snapshot and go live.
    pub fn load_snapshot(&mut self, cells: Vec<Cell>) -> Vec<Action> {
        let total = cells.len();
        let applied = self.raster.rebuild(cells);
        self.ledger.clear();
        log::info!("board {}: snapshot applied ({applied}/{total} cells)", self.config.board_id);
        let mut actions = self.set_status(SessionStatus::Ready);
        self.invalidate(&mut actions);
        actions
    }

    /// The snapshot could not be loaded: blank the board and show the failure.
    pub fn snapshot_failed(&mut self, err: &SessionError) -> Vec<Action> {
        log::warn!("board {}: {err}", self.config.board_id);
        self.raster.rebuild(Vec::new());
        self.ledger.clear();
        self.set_status(SessionStatus::Failed(err.to_string()))
    }

    /// Apply one event from the live mutation feed. Last write wins.
    pub fn apply_mutation(&mut self, cell: Cell) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(write) = self.raster.write_cell(cell) else {
            log::debug!("mutation out of bounds: ({}, {})", cell.x, cell.y);
            return actions;
        };
        self.ledger.supersede(cell.pos());
        if write.changed {
            self.invalidate(&mut actions);
        }
        actions
    }

    /// Replace the presence set with a fresh snapshot.
    pub fn apply_presence(&mut self, snapshot: HashMap<String, PresenceEntry>) -> Vec<Action> {
        self.presence.apply_snapshot(snapshot);
        let mut actions = Vec::new();
        self.invalidate(&mut actions);
        actions
    }

    /// Transport hook: the live feed dropped. Reconnecting is the transport's job.
    pub fn feed_disconnected(&mut self) -> Vec<Action> {
        if self.status != SessionStatus::Ready {
            return Vec::new();
        }
        log::warn!("board {}: live feed disconnected", self.config.board_id);
        self.set_status(SessionStatus::Disconnected)
    }

    /// Transport hook: the live feed is back.
    pub fn feed_reconnected(&mut self) -> Vec<Action> {
        if self.status != SessionStatus::Disconnected {
            return Vec::new();
        }
        log::info!("board {}: live feed reconnected", self.config.board_id);
        self.set_status(SessionStatus::Ready)
    }

    /// Tear down: forget in-flight paints and peers.
    pub fn close(&mut self) -> Vec<Action> {
        self.ledger.clear();
        self.presence.clear();
        self.input = InputState::Idle;
        self.hover = None;
        self.set_status(SessionStatus::Closed)
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.status.shows_board() {
            return actions;
        }

        if button == Button::Primary
            && let Some(local) = self.minimap.local_point(screen_pt, self.viewport_width, self.viewport_height)
        {
            self.input = InputState::MinimapDrag;
            self.minimap_navigate(local, &mut actions);
            return actions;
        }

        match classify(button, modifiers) {
            Gesture::Pan => {
                self.input = InputState::Panning { last_screen: screen_pt };
                actions.push(Action::SetCursor(CURSOR_PANNING.to_owned()));
            }
            Gesture::Paint => {
                let pos = self.viewport.screen_to_grid(screen_pt);
                self.paint_attempt(pos, now_ms, &mut actions);
            }
            Gesture::Share => {
                let pos = self.viewport.screen_to_grid(screen_pt);
                if self.config.grid().contains(pos) {
                    actions.push(Action::ShareLocation(ShareLink {
                        x: pos.x,
                        y: pos.y,
                        scale: self.viewport.scale(),
                    }));
                }
            }
        }
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.status.shows_board() {
            return actions;
        }
        match self.input {
            InputState::Panning { last_screen } => {
                self.viewport.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen_pt };
                self.hover_at(screen_pt);
                self.invalidate(&mut actions);
            }
            InputState::MinimapDrag => {
                let origin = self.minimap.origin(self.viewport_width, self.viewport_height);
                let local = Point::new(screen_pt.x - origin.x, screen_pt.y - origin.y);
                self.minimap_navigate(local, &mut actions);
            }
            InputState::Idle => {
                if self.hover_at(screen_pt) {
                    self.invalidate(&mut actions);
                }
                if let Some(pos) = self.hover {
                    self.publish_cursor(pos, now_ms, &mut actions);
                }
            }
        }
        actions
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button) -> Vec<Action> {
        let mut actions = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Panning { .. } => actions.push(Action::SetCursor(CURSOR_DEFAULT.to_owned())),
            InputState::MinimapDrag | InputState::Idle => {}
        }
        actions
    }

    /// The pointer left the canvas: drop the hover highlight.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.hover.take().is_some() {
            self.invalidate(&mut actions);
        }
        actions
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.status.shows_board() {
            return actions;
        }
        let Some(direction) = ZoomDirection::from_wheel(delta.dy) else {
            return actions;
        };
        if self.viewport.zoom_at(screen_pt, direction) {
            self.hover_at(screen_pt);
            self.invalidate(&mut actions);
        }
        actions
    }

    // --- Admission ---

    /// Advance the cooldown by `elapsed_ms` (the host ticks on a fixed interval).
    pub fn tick_cooldown(&mut self, elapsed_ms: u64) -> Vec<Action> {
        if self.cooldown.tick(elapsed_ms) {
            vec![Action::CooldownChanged { remaining_ms: self.cooldown.remaining_ms() }]
        } else {
            Vec::new()
        }
    }

    /// Settle an in-flight paint with the authority's answer.
    pub fn resolve_paint(&mut self, ticket: PaintTicket, result: Result<(), PaintError>) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(paint) = self.ledger.settle(&ticket) else {
            log::debug!("paint {ticket}: already settled or unknown");
            return actions;
        };

        match result {
            Ok(()) => {
                self.ledger.accepted(&paint);
                self.cooldown.arm(self.config.paint_cooldown_ms);
                actions.push(Action::CooldownChanged { remaining_ms: self.cooldown.remaining_ms() });
                actions.push(Action::PaintSettled { ticket, phase: PaintPhase::Confirmed });
            }
            Err(err) => {
                let still_ours = !paint.superseded && self.raster.get(paint.pos) == Some(paint.color_index);
                if still_ours && self.raster.restore(paint.pos, paint.prior) {
                    self.invalidate(&mut actions);
                }
                if let PaintError::RateLimited { retry_after_ms } = err {
                    log::info!("paint {ticket}: rate limited");
                    let ms = retry_after_ms.unwrap_or(0).max(self.config.rate_limited_cooldown_ms);
                    self.cooldown.arm(ms);
                    actions.push(Action::CooldownChanged { remaining_ms: self.cooldown.remaining_ms() });
                } else {
                    log::warn!("paint {ticket}: {err}");
                    actions.push(Action::Notice(err.to_string()));
                }
                actions.push(Action::PaintSettled { ticket, phase: PaintPhase::RolledBack });
            }
        }
        actions
    }

    // --- Frames ---

    /// Called from the frame callback. Returns whether a redraw should run now.
    pub fn begin_frame(&mut self) -> bool {
        self.scheduler.begin_frame()
    }

    /// The host failed to register a frame callback.
    pub fn frame_request_failed(&mut self) {
        self.scheduler.frame_request_failed();
    }

    /// Number of redraws performed so far.
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.scheduler.frames_drawn()
    }

    /// Whether the raster changed since the last upload; resets the flag.
    pub fn take_raster_dirty(&mut self) -> bool {
        self.raster.take_dirty()
    }

    /// Layers for the next redraw.
    #[must_use]
    pub fn render_plan(&self) -> RenderPlan {
        scene::plan(self)
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    #[must_use]
    pub fn raster(&self) -> &RasterBuffer {
        &self.raster
    }

    #[must_use]
    pub fn presence(&self) -> &PresenceOverlay {
        &self.presence
    }

    #[must_use]
    pub fn minimap(&self) -> Minimap {
        self.minimap
    }

    #[must_use]
    pub fn hover(&self) -> Option<GridPos> {
        self.hover
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn cooldown_remaining_ms(&self) -> u64 {
        self.cooldown.remaining_ms()
    }

    #[must_use]
    pub fn pending_paints(&self) -> usize {
        self.ledger.len()
    }

    #[must_use]
    pub fn selected_color(&self) -> u16 {
        self.selected_color
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Our own presence entry, as announced when joining the channel.
    #[must_use]
    pub fn self_entry(&self) -> PresenceEntry {
        PresenceEntry {
            participant_id: self.config.self_id.clone(),
            x: 0,
            y: 0,
            color: self.config.self_color.clone(),
            name: self.config.self_name.clone(),
        }
    }

    // --- Internals ---

    fn paint_attempt(&mut self, pos: GridPos, now_ms: f64, actions: &mut Vec<Action>) {
        if self.cooldown.is_active() {
            log::debug!("paint ignored: cooldown {} ms", self.cooldown.remaining_ms());
            return;
        }
        let cell = Cell::new(pos.x, pos.y, self.selected_color);
        let Some(write) = self.raster.write_cell(cell) else {
            return;
        };
        let ticket = self.ledger.begin(pos, cell.color_index, write.prior, now_ms);
        if write.changed {
            self.invalidate(actions);
        }
        actions.push(Action::SubmitPaint { ticket, board_id: self.config.board_id.clone(), cell });
    }

    fn minimap_navigate(&mut self, local: Point, actions: &mut Vec<Action>) {
        let pos = self.minimap.cell_at(local, self.config.grid());
        self.viewport.center_on(pos, None, self.viewport_width, self.viewport_height);
        // The pointer is over the minimap, not the board.
        self.hover = None;
        self.invalidate(actions);
    }

    /// Point the hover highlight at the cell under `screen_pt`. Returns whether it moved.
    fn hover_at(&mut self, screen_pt: Point) -> bool {
        let pos = self.viewport.screen_to_grid(screen_pt);
        let hover = self.config.grid().contains(pos).then_some(pos);
        let moved = hover != self.hover;
        self.hover = hover;
        moved
    }

    fn publish_cursor(&mut self, pos: GridPos, now_ms: f64, actions: &mut Vec<Action>) {
        let update = PresenceUpdate {
            x: pos.x,
            y: pos.y,
            color: self.config.self_color.clone(),
            name: self.config.self_name.clone(),
        };
        if let Some(update) = self.presence.publish_self(now_ms, update) {
            actions.push(Action::PublishPresence(update));
        }
    }

    fn set_status(&mut self, status: SessionStatus) -> Vec<Action> {
        if self.status == status {
            return Vec::new();
        }
        self.status = status.clone();
        let mut actions = vec![Action::StatusChanged(status)];
        self.invalidate(&mut actions);
        actions
    }

    fn invalidate(&mut self, actions: &mut Vec<Action>) {
        if self.scheduler.request_redraw() {
            actions.push(Action::RenderNeeded);
        }
    }
}

/// The full canvas engine. Wraps a shared `EngineCore` and owns the browser canvases.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    raster_canvas: HtmlCanvasElement,
    raster_ctx: CanvasRenderingContext2d,
    core: Rc<RefCell<EngineCore>>,
}

impl Engine {
    /// Create an engine bound to `canvas`, plus the off-screen raster canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there is no document or a 2D context cannot be obtained.
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Result<Self, JsValue> {
        let grid = config.grid();
        let ctx = context_2d(&canvas)?;
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let raster_canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(JsValue::from)?;
        raster_canvas.set_width(grid.width);
        raster_canvas.set_height(grid.height);
        let raster_ctx = context_2d(&raster_canvas)?;
        Ok(Self { canvas, ctx, raster_canvas, raster_ctx, core: Rc::new(RefCell::new(EngineCore::new(config))) })
    }

    /// Shared handle to the core, for the sync session.
    #[must_use]
    pub fn core(&self) -> Rc<RefCell<EngineCore>> {
        Rc::clone(&self.core)
    }

    // --- Viewport ---

    /// Update viewport dimensions and resize the backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let actions = self.core.borrow_mut().set_viewport(width_css, height_css, dpr);
        let dpr = self.core.borrow().dpr();
        self.canvas.set_width((width_css * dpr).floor().max(1.0) as u32);
        self.canvas.set_height((height_css * dpr).floor().max(1.0) as u32);
        actions
    }

    /// Jump to a share-link location.
    pub fn restore_link(&mut self, query: &str) -> Vec<Action> {
        self.core.borrow_mut().restore_link(query)
    }

    // --- Delegated input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.borrow_mut().on_pointer_down(screen_pt, button, modifiers, js_sys::Date::now())
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.borrow_mut().on_pointer_move(screen_pt, js_sys::Date::now())
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.borrow_mut().on_pointer_up(screen_pt, button)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.borrow_mut().on_pointer_leave()
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.borrow_mut().on_wheel(screen_pt, delta)
    }

    pub fn set_color(&mut self, index: u16) {
        self.core.borrow_mut().set_color(index);
    }

    pub fn tick_cooldown(&mut self, elapsed_ms: u64) -> Vec<Action> {
        self.core.borrow_mut().tick_cooldown(elapsed_ms)
    }

    // --- Render ---

    /// Draw one frame if anything changed since the last one.
    pub fn render_frame(&mut self) {
        let mut core = self.core.borrow_mut();
        if !core.begin_frame() {
            return;
        }
        if core.take_raster_dirty() {
            if let Err(err) = self.upload_raster(&core) {
                log::warn!("raster upload failed: {err:?}");
            }
        }
        let plan = core.render_plan();
        let (w, h) = core.viewport_size();
        if let Err(err) = render::draw(&self.ctx, &self.raster_canvas, &plan, w, h, core.dpr()) {
            log::warn!("render failed: {err:?}");
        }
    }

    fn upload_raster(&self, core: &EngineCore) -> Result<(), JsValue> {
        let grid = core.raster().grid();
        let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(core.raster().rgba()), grid.width, grid.height)?;
        self.raster_ctx.put_image_data(&image, 0.0, 0.0)
    }
}

/// Schedule `engine` to draw on the next animation frame.
///
/// Call whenever an operation returned [`Action::RenderNeeded`]. Falls back to a
/// synchronous draw when no frame callback can be registered.
pub fn request_frame(engine: &Rc<RefCell<Engine>>) {
    let Some(window) = web_sys::window() else {
        fallback_frame(engine);
        return;
    };

    let engine_for_cb = Rc::clone(engine);
    let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let holder_for_cb = Rc::clone(&holder);
    let cb = Closure::wrap(Box::new(move |_ts: f64| {
        engine_for_cb.borrow_mut().render_frame();
        holder_for_cb.borrow_mut().take();
    }) as Box<dyn FnMut(f64)>);

    if window.request_animation_frame(cb.as_ref().unchecked_ref()).is_ok() {
        *holder.borrow_mut() = Some(cb);
    } else {
        fallback_frame(engine);
    }
}

fn fallback_frame(engine: &Rc<RefCell<Engine>>) {
    let mut engine = engine.borrow_mut();
    engine.core.borrow_mut().frame_request_failed();
    engine.render_frame();
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
