//! Browser host: binds one canvas element to one board session.
//!
//! The page forwards DOM events here and receives user-facing actions
//! (notices, cooldown, share requests, cursor, status) through its UI callback.
//! Frame requests, paint submissions, presence publishes and the cooldown tick
//! are handled here.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlCanvasElement;

use crate::config::EngineConfig;
use crate::engine::{Action, Engine, request_frame};
use crate::input::{Button, Modifiers, WheelDelta};
use crate::sync::{ActionSink, BoardService, Session};
use crate::viewport::Point;

/// Receives every action the page itself must show.
pub type UiCallback = Rc<dyn Fn(&Action)>;

pub struct BoardHost<S: BoardService + 'static> {
    engine: Rc<RefCell<Engine>>,
    session: Rc<Session<S>>,
    ui: UiCallback,
    cooldown_timer: Option<Interval>,
}

impl<S: BoardService + 'static> BoardHost<S> {
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context or there is no document.
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig, service: Rc<S>, ui: UiCallback) -> Result<Self, JsValue> {
        let tick_ms = config.cooldown_tick_ms;
        let engine = Rc::new(RefCell::new(Engine::new(canvas, config)?));
        let core = engine.borrow().core();

        let sink: ActionSink = {
            let engine = Rc::clone(&engine);
            let ui = Rc::clone(&ui);
            Rc::new(move |actions: Vec<Action>| deliver(&engine, &ui, actions))
        };
        let session = Rc::new(Session::new(core, service, sink));

        let cooldown_timer = {
            let engine = Rc::clone(&engine);
            let ui = Rc::clone(&ui);
            Interval::new(u32::try_from(tick_ms).unwrap_or(u32::MAX), move || {
                let actions = engine.borrow_mut().tick_cooldown(tick_ms);
                deliver(&engine, &ui, actions);
            })
        };

        Ok(Self { engine, session, ui, cooldown_timer: Some(cooldown_timer) })
    }

    /// Load the board in the background.
    pub fn start(&self) {
        let session = Rc::clone(&self.session);
        spawn_local(async move {
            if let Err(err) = session.start().await {
                log::warn!("session start failed: {err}");
            }
        });
    }

    /// Jump to a location from the page URL's query string.
    pub fn restore_link(&self, query: &str) {
        let actions = self.engine.borrow_mut().restore_link(query);
        self.dispatch(actions);
    }

    pub fn resize(&self, width_css: f64, height_css: f64, dpr: f64) {
        let actions = self.engine.borrow_mut().set_viewport(width_css, height_css, dpr);
        self.dispatch(actions);
    }

    pub fn pointer_down(&self, screen_pt: Point, button: Button, modifiers: Modifiers) {
        let actions = self.engine.borrow_mut().on_pointer_down(screen_pt, button, modifiers);
        self.dispatch(actions);
    }

    pub fn pointer_move(&self, screen_pt: Point) {
        let actions = self.engine.borrow_mut().on_pointer_move(screen_pt);
        self.dispatch(actions);
    }

    pub fn pointer_up(&self, screen_pt: Point, button: Button) {
        let actions = self.engine.borrow_mut().on_pointer_up(screen_pt, button);
        self.dispatch(actions);
    }

    pub fn pointer_leave(&self) {
        let actions = self.engine.borrow_mut().on_pointer_leave();
        self.dispatch(actions);
    }

    pub fn wheel(&self, screen_pt: Point, delta: WheelDelta) {
        let actions = self.engine.borrow_mut().on_wheel(screen_pt, delta);
        self.dispatch(actions);
    }

    pub fn set_color(&self, index: u16) {
        self.engine.borrow_mut().set_color(index);
    }

    /// Hook for the transport when the live feed drops.
    #[must_use]
    pub fn disconnect_hook(&self) -> impl Fn() + use<S> {
        self.session.disconnect_hook()
    }

    /// Hook for the transport when the live feed is back.
    #[must_use]
    pub fn reconnect_hook(&self) -> impl Fn() + use<S> {
        self.session.reconnect_hook()
    }

    /// Leave the board: stop the cooldown tick and close the session.
    pub fn close(&mut self) {
        drop(self.cooldown_timer.take());
        self.session.close();
    }

    fn dispatch(&self, actions: Vec<Action>) {
        let mut rest = Vec::new();
        for action in self.session.route(actions) {
            match action {
                Action::SubmitPaint { ticket, cell, .. } => spawn_local(self.session.submit_paint(ticket, cell)),
                other => rest.push(other),
            }
        }
        deliver(&self.engine, &self.ui, rest);
    }
}

fn deliver(engine: &Rc<RefCell<Engine>>, ui: &UiCallback, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::RenderNeeded => request_frame(engine),
            other => ui(&other),
        }
    }
}
