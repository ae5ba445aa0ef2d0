//! Raster buffer: the authoritative color of every cell on the board.
//!
//! One entry per cell, row-major, plus an RGBA mirror of the same data laid out
//! exactly like browser `ImageData` (one pixel per cell). The renderer uploads
//! the mirror to an off-screen canvas whenever [`RasterBuffer::take_dirty`]
//! reports a change, then scales that single image onto the screen and the
//! minimap with smoothing disabled.
//!
//! There is no history and no ordering metadata: whichever write reaches a cell
//! last is what the cell shows.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use serde::{Deserialize, Serialize};

use crate::consts::UNPAINTED_COLOR;
use crate::palette::{Palette, Rgb};
use crate::viewport::{GridPos, GridSize};

/// One painted cell, as carried by snapshots and the mutation feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    /// Index into the board palette.
    #[serde(rename = "color_idx")]
    pub color_index: u16,
}

impl Cell {
    #[must_use]
    pub fn new(x: i32, y: i32, color_index: u16) -> Self {
        Self { x, y, color_index }
    }

    #[must_use]
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// Result of an in-bounds write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWrite {
    /// Value the cell held before the write (`None` = unpainted).
    pub prior: Option<u16>,
    /// Whether the visible value changed.
    pub changed: bool,
}

/// Dense per-cell color store with an RGBA mirror.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    grid: GridSize,
    palette: Palette,
    cells: Vec<Option<u16>>,
    rgba: Vec<u8>,
    painted: usize,
    dirty: bool,
}

impl RasterBuffer {
    /// Create an all-unpainted buffer.
    #[must_use]
    pub fn new(grid: GridSize, palette: Palette) -> Self {
        let count = grid.cell_count();
        let mut buffer = Self {
            grid,
            palette,
            cells: vec![None; count],
            rgba: vec![0; count * 4],
            painted: 0,
            dirty: true,
        };
        buffer.fill_unpainted();
        buffer
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Clear everything and repopulate from a full snapshot.
    ///
    /// Out-of-bounds cells are skipped. When a snapshot names the same cell twice
    /// the later entry wins. Returns the number of cells applied.
    pub fn rebuild<I>(&mut self, cells: I) -> usize
    where
        I: IntoIterator<Item = Cell>,
    {
        self.cells.fill(None);
        self.painted = 0;
        self.fill_unpainted();

        let mut applied = 0;
        let mut skipped = 0;
        for cell in cells {
            if self.write_cell(cell).is_some() {
                applied += 1;
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!("raster: snapshot contained {skipped} out-of-bounds cells");
        }
        self.dirty = true;
        applied
    }

    /// Overwrite one cell unconditionally. Returns `None` when out of bounds.
    ///
    /// Writing the value a cell already holds is a no-op.
    pub fn write_cell(&mut self, cell: Cell) -> Option<CellWrite> {
        let idx = self.grid.index_of(cell.pos())?;
        let prior = self.cells[idx];
        if prior == Some(cell.color_index) {
            return Some(CellWrite { prior, changed: false });
        }
        if prior.is_none() {
            self.painted += 1;
        }
        self.cells[idx] = Some(cell.color_index);
        let rgb = self.palette.color(cell.color_index);
        self.put_pixel(idx, rgb);
        Some(CellWrite { prior, changed: true })
    }

    /// Return a cell to the unpainted state. Returns whether anything changed.
    pub fn clear_cell(&mut self, pos: GridPos) -> bool {
        let Some(idx) = self.grid.index_of(pos) else {
            return false;
        };
        if self.cells[idx].take().is_none() {
            return false;
        }
        self.painted -= 1;
        self.put_pixel(idx, unpainted_rgb());
        true
    }

    /// Restore a cell to a previously observed value.
    pub fn restore(&mut self, pos: GridPos, value: Option<u16>) -> bool {
        match value {
            Some(color_index) => self
                .write_cell(Cell { x: pos.x, y: pos.y, color_index })
                .is_some_and(|w| w.changed),
            None => self.clear_cell(pos),
        }
    }

    /// Current value of a cell; `None` when unpainted or out of bounds.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<u16> {
        self.grid.index_of(pos).and_then(|idx| self.cells[idx])
    }

    /// Number of cells holding a color.
    #[must_use]
    pub fn painted_count(&self) -> usize {
        self.painted
    }

    /// RGBA bytes, `width * height * 4`, row-major.
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Whether the RGBA mirror changed since the last call; resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn put_pixel(&mut self, idx: usize, rgb: Rgb) {
        let base = idx * 4;
        self.rgba[base..base + 4].copy_from_slice(&[rgb.r, rgb.g, rgb.b, 255]);
        self.dirty = true;
    }

    fn fill_unpainted(&mut self) {
        let rgb = unpainted_rgb();
        for px in self.rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.r, rgb.g, rgb.b, 255]);
        }
        self.dirty = true;
    }
}

impl PartialEq for RasterBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.cells == other.cells && self.rgba == other.rgba
    }
}

fn unpainted_rgb() -> Rgb {
    Rgb::parse_hex(UNPAINTED_COLOR).unwrap_or(Rgb { r: 0x11, g: 0x18, b: 0x27 })
}
