//! Board session: wires an [`EngineCore`] to the backend that owns the board.
//!
//! The backend is abstracted by [`BoardService`] so the session logic runs
//! against an in-memory mock in tests and against the real transport in the
//! browser. Start-up order is fixed: fetch the snapshot, rebuild the raster,
//! then open the live mutation feed and the presence channel. Events from the
//! feed and presence snapshots are pushed into the core as they arrive; the
//! actions they produce go to the host through the [`ActionSink`].

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::cell::{Cell as Flag, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use crate::engine::{Action, EngineCore};
use crate::error::{PaintError, SessionError};
use crate::paint::PaintTicket;
use crate::presence::{PresenceEntry, PresenceUpdate};
use crate::raster::Cell;

/// Core shared between the engine wrapper and the session callbacks.
pub type SharedCore = Rc<RefCell<EngineCore>>;

/// Where actions produced by asynchronous events go (frame requests, notices, ...).
pub type ActionSink = Rc<dyn Fn(Vec<Action>)>;

/// Callback receiving each event of the live mutation feed.
pub type MutationHandler = Box<dyn FnMut(Cell)>;

/// Callback receiving each full presence snapshot, keyed by participant id.
pub type PresenceHandler = Box<dyn FnMut(HashMap<String, PresenceEntry>)>;

/// A live subscription. Dropping the handle without cancelling is allowed but leaks the stream.
pub trait Subscription {
    fn cancel(&mut self);
}

/// Presence channel handle: a subscription we can also publish our cursor on.
pub trait PresenceChannel: Subscription {
    fn publish(&mut self, update: &PresenceUpdate);
}

/// Board backend: snapshot source, admission authority, and realtime channels.
#[async_trait::async_trait(?Send)]
pub trait BoardService {
    /// Every painted cell of the board.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Snapshot`] on network or authorization failure.
    async fn fetch_snapshot(&self, board_id: &str) -> Result<Vec<Cell>, SessionError>;

    /// Ask the authority to admit one paint.
    ///
    /// # Errors
    ///
    /// Returns a [`PaintError`] describing why the paint was refused.
    async fn submit_paint(&self, board_id: &str, cell: Cell) -> Result<(), PaintError>;

    /// Open the live mutation feed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Subscribe`] if the feed cannot be opened.
    fn subscribe_mutations(
        &self,
        board_id: &str,
        on_event: MutationHandler,
    ) -> Result<Box<dyn Subscription>, SessionError>;

    /// Join the presence channel announcing `self_entry`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Subscribe`] if the channel cannot be joined.
    fn subscribe_presence(
        &self,
        board_id: &str,
        self_entry: PresenceEntry,
        on_snapshot: PresenceHandler,
    ) -> Result<Box<dyn PresenceChannel>, SessionError>;
}

/// One open board: the core plus its backend handles.
///
/// Every method takes `&self` so the host can keep the session in an `Rc`
/// and drive it from event handlers and spawned futures alike.
pub struct Session<S: BoardService + 'static> {
    core: SharedCore,
    service: Rc<S>,
    sink: ActionSink,
    feed: RefCell<Option<Box<dyn Subscription>>>,
    presence: RefCell<Option<Box<dyn PresenceChannel>>>,
    closed: Flag<bool>,
}

impl<S: BoardService + 'static> Session<S> {
    #[must_use]
    pub fn new(core: SharedCore, service: Rc<S>, sink: ActionSink) -> Self {
        Self {
            core,
            service,
            sink,
            feed: RefCell::new(None),
            presence: RefCell::new(None),
            closed: Flag::new(false),
        }
    }

    #[must_use]
    pub fn core(&self) -> &SharedCore {
        &self.core
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Load the board and go live.
    ///
    /// Actions produced along the way are delivered through the sink.
    ///
    /// # Errors
    ///
    /// Returns the snapshot or subscription failure; the core shows it as its
    /// status (`Failed` for the snapshot, `Disconnected` for a channel).
    pub async fn start(&self) -> Result<(), SessionError> {
        if self.closed.get() {
            return Err(SessionError::Closed);
        }
        let board_id = self.core.borrow().config().board_id.clone();
        let actions = self.core.borrow_mut().begin_loading();
        self.emit(actions);

        log::info!("board {board_id}: fetching snapshot");
        let cells = match self.service.fetch_snapshot(&board_id).await {
            Ok(cells) => cells,
            Err(err) => {
                let actions = self.core.borrow_mut().snapshot_failed(&err);
                self.emit(actions);
                return Err(err);
            }
        };
        let actions = self.core.borrow_mut().load_snapshot(cells);
        self.emit(actions);

        if let Err(err) = self.open_feed(&board_id).and_then(|()| self.open_presence(&board_id)) {
            // Keep the loaded picture up, but not as live.
            self.cancel_subscriptions();
            let actions = self.core.borrow_mut().feed_disconnected();
            self.emit(actions);
            return Err(err);
        }
        Ok(())
    }

    fn open_feed(&self, board_id: &str) -> Result<(), SessionError> {
        let core = Rc::clone(&self.core);
        let sink = Rc::clone(&self.sink);
        let on_event: MutationHandler = Box::new(move |cell| {
            let actions = core.borrow_mut().apply_mutation(cell);
            sink(actions);
        });
        let feed = self.service.subscribe_mutations(board_id, on_event).inspect_err(|err| {
            log::warn!("board {board_id}: {err}");
        })?;
        *self.feed.borrow_mut() = Some(feed);
        Ok(())
    }

    fn open_presence(&self, board_id: &str) -> Result<(), SessionError> {
        let core = Rc::clone(&self.core);
        let sink = Rc::clone(&self.sink);
        let self_entry = self.core.borrow().self_entry();
        let on_snapshot: PresenceHandler = Box::new(move |snapshot| {
            let actions = core.borrow_mut().apply_presence(snapshot);
            sink(actions);
        });
        let channel = self.service.subscribe_presence(board_id, self_entry, on_snapshot).inspect_err(|err| {
            log::warn!("board {board_id}: {err}");
        })?;
        *self.presence.borrow_mut() = Some(channel);
        Ok(())
    }

    /// Carry out the actions only the session can handle and hand back the rest.
    ///
    /// Presence publishes go straight out on the channel. Everything else,
    /// including [`Action::SubmitPaint`] (see [`Session::submit_paint`]), is
    /// returned for the host.
    pub fn route(&self, actions: Vec<Action>) -> Vec<Action> {
        let mut rest = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::PublishPresence(update) => self.publish(&update),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Publish our cursor on the presence channel, if joined.
    pub fn publish(&self, update: &PresenceUpdate) {
        if let Some(channel) = self.presence.borrow_mut().as_mut() {
            channel.publish(update);
        }
    }

    /// Submit a paint and settle it in the core when the authority answers.
    ///
    /// The returned future owns everything it needs, so the host can spawn it.
    pub fn submit_paint(&self, ticket: PaintTicket, cell: Cell) -> impl Future<Output = ()> + use<S> {
        let core = Rc::clone(&self.core);
        let service = Rc::clone(&self.service);
        let sink = Rc::clone(&self.sink);
        let board_id = self.core.borrow().config().board_id.clone();
        async move {
            let result = service.submit_paint(&board_id, cell).await;
            let actions = core.borrow_mut().resolve_paint(ticket, result);
            sink(actions);
        }
    }

    /// Hook for the transport: call when the live feed drops.
    #[must_use]
    pub fn disconnect_hook(&self) -> impl Fn() + use<S> {
        let core = Rc::clone(&self.core);
        let sink = Rc::clone(&self.sink);
        move || {
            let actions = core.borrow_mut().feed_disconnected();
            sink(actions);
        }
    }

    /// Hook for the transport: call when the live feed is back.
    #[must_use]
    pub fn reconnect_hook(&self) -> impl Fn() + use<S> {
        let core = Rc::clone(&self.core);
        let sink = Rc::clone(&self.sink);
        move || {
            let actions = core.borrow_mut().feed_reconnected();
            sink(actions);
        }
    }

    /// Cancel both subscriptions and stop the core. Calling twice is a no-op.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.cancel_subscriptions();
        let actions = self.core.borrow_mut().close();
        self.emit(actions);
        log::info!("board {}: session closed", self.core.borrow().config().board_id);
    }

    fn cancel_subscriptions(&self) {
        if let Some(mut feed) = self.feed.take() {
            feed.cancel();
        }
        if let Some(mut channel) = self.presence.take() {
            channel.cancel();
        }
    }

    fn emit(&self, actions: Vec<Action>) {
        if !actions.is_empty() {
            (self.sink)(actions);
        }
    }
}

impl<S: BoardService + 'static> Drop for Session<S> {
    fn drop(&mut self) {
        self.cancel_subscriptions();
    }
}
