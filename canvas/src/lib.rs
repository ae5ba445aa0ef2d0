//! Client engine for a shared pixel board.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It keeps a
//! local raster of the board, paints optimistically and rolls back what the
//! admission authority refuses, merges the live mutation feed last-write-wins,
//! shows other participants' cursors, and draws everything (plus a minimap)
//! to a canvas at most once per display frame. The host page wires DOM events
//! to [`host::BoardHost`] and shows the returned [`engine::Action`]s; the
//! backend sits behind [`sync::BoardService`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`host`] | Browser glue: DOM events in, frames/paints/timers out |
//! | [`sync`] | Board session: snapshot, live feed, presence channel, paint round trip |
//! | [`viewport`] | Pan/zoom state and screen ↔ grid conversions |
//! | [`raster`] | Per-cell color buffer with an `ImageData`-ready RGBA mirror |
//! | [`palette`] | Board palette parsing and lookup |
//! | [`paint`] | Cooldown gate and the ledger of in-flight optimistic paints |
//! | [`presence`] | Remote cursors and throttled self-publishing |
//! | [`minimap`] | Minimap geometry and navigation |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`scheduler`] | Redraw coalescing onto animation frames |
//! | [`scene`] | Pure layer plan for one redraw |
//! | [`render`] | Draws a layer plan |
//! | [`share`] | Share-link encoding |
//! | [`config`] | Host-supplied engine configuration |
//! | [`error`] | Error types |
//! | [`consts`] | Shared constants (zoom limits, colors, timings) |

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod host;
pub mod input;
pub mod minimap;
pub mod paint;
pub mod palette;
pub mod presence;
pub mod raster;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod share;
pub mod sync;
pub mod viewport;

/// Route `log` records to the browser console and panics to `console.error`.
///
/// Call once at startup; later calls only re-install the panic hook.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) { log::Level::Debug } else { log::Level::Info };
    if console_log::init_with_level(level).is_err() {
        log::debug!("console logger already installed");
    }
}
