//! Paint admission: the client-side cooldown gate and in-flight optimistic writes.
//!
//! Each optimistic write lives in the [`PaintLedger`] from the moment it is
//! applied locally until the authority answers. Its lifecycle is
//! `Applied → Confirmed` (nothing to do: the write is already visible) or
//! `Applied → RolledBack` (restore what the cell showed before). A newer write
//! to the same cell, local or remote, marks the entry superseded so that a
//! late rollback cannot clobber fresher data.
//!
//! Local paints stacked on one cell form a chain: the newer write inherits the
//! older one's prior, since the older color was never accepted. Once the older
//! paint is accepted its color becomes the newer write's prior.

#[cfg(test)]
#[path = "paint_test.rs"]
mod paint_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::viewport::GridPos;

/// Correlates a submitted paint with its eventual answer.
pub type PaintTicket = Uuid;

/// Countdown gating new paint attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    remaining_ms: u64,
}

impl Cooldown {
    #[must_use]
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0
    }

    /// Start (or extend) the cooldown to at least `ms`.
    pub fn arm(&mut self, ms: u64) {
        self.remaining_ms = self.remaining_ms.max(ms);
    }

    /// Count down by `elapsed_ms`, saturating at zero. Returns whether the value changed.
    pub fn tick(&mut self, elapsed_ms: u64) -> bool {
        let next = self.remaining_ms.saturating_sub(elapsed_ms);
        let changed = next != self.remaining_ms;
        self.remaining_ms = next;
        changed
    }
}

/// An optimistic write awaiting the authority's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPaint {
    pub ticket: PaintTicket,
    pub pos: GridPos,
    pub color_index: u16,
    pub issued_at_ms: f64,
    /// What the cell showed before the optimistic write (`None` = unpainted).
    pub prior: Option<u16>,
    /// A newer write landed on the same cell after this one.
    pub superseded: bool,
    /// Unresolved local paint this one was stacked on.
    pub stacked_on: Option<PaintTicket>,
}

/// Final state of a resolved paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintPhase {
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone, Default)]
pub struct PaintLedger {
    pending: HashMap<PaintTicket, PendingPaint>,
}

impl PaintLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an optimistic write that has just been applied.
    ///
    /// `prior` is what the cell showed. If that is an unresolved local paint
    /// still on top, its own prior is inherited instead.
    pub fn begin(&mut self, pos: GridPos, color_index: u16, prior: Option<u16>, now_ms: f64) -> PaintTicket {
        let under = self
            .pending
            .values()
            .find(|p| p.pos == pos && !p.superseded && Some(p.color_index) == prior)
            .map(|p| (p.ticket, p.prior));
        let (prior, stacked_on) = match under {
            Some((ticket, inherited)) => (inherited, Some(ticket)),
            None => (prior, None),
        };
        self.supersede(pos);
        let ticket = Uuid::new_v4();
        self.pending.insert(
            ticket,
            PendingPaint { ticket, pos, color_index, issued_at_ms: now_ms, prior, superseded: false, stacked_on },
        );
        ticket
    }

    /// The authority accepted `paint`: paints stacked on it now roll back to its color.
    pub fn accepted(&mut self, paint: &PendingPaint) {
        for above in self.pending.values_mut().filter(|p| p.stacked_on == Some(paint.ticket)) {
            above.prior = Some(paint.color_index);
            above.stacked_on = None;
        }
    }

    /// A write from elsewhere landed on `pos`.
    pub fn supersede(&mut self, pos: GridPos) {
        for paint in self.pending.values_mut().filter(|p| p.pos == pos) {
            paint.superseded = true;
        }
    }

    /// Remove and return an in-flight paint. `None` for unknown or already-settled tickets.
    pub fn settle(&mut self, ticket: &PaintTicket) -> Option<PendingPaint> {
        self.pending.remove(ticket)
    }

    #[must_use]
    pub fn get(&self, ticket: &PaintTicket) -> Option<&PendingPaint> {
        self.pending.get(ticket)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
