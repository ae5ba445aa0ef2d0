//! Frame scheduler: dirty flag plus a single outstanding next-frame callback.
//!
//! Any number of [`FrameScheduler::request_redraw`] calls between two display
//! frames collapse into one redraw. The browser side ([`crate::engine::Engine`])
//! registers a `requestAnimationFrame` callback only when `request_redraw`
//! returns `true`, and calls [`FrameScheduler::begin_frame`] from inside it.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;

#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    dirty: bool,
    frame_pending: bool,
    frames: u64,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the picture stale. Returns `true` when the caller must register a
    /// next-frame callback (none is outstanding yet).
    pub fn request_redraw(&mut self) -> bool {
        self.dirty = true;
        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// Called from the frame callback. Returns whether a redraw should run.
    pub fn begin_frame(&mut self) -> bool {
        self.frame_pending = false;
        if !std::mem::replace(&mut self.dirty, false) {
            return false;
        }
        self.frames += 1;
        true
    }

    /// The host could not register a frame callback; allow the next request to try again.
    pub fn frame_request_failed(&mut self) {
        self.frame_pending = false;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Number of redraws performed so far.
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }
}
