//! Board palette: parsed CSS hex colors addressed by index.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

/// Palette used when the board does not provide a usable one.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#000000", "#ffffff", "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff",
];

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rgb` or `#rrggbb` (leading `#` optional, case-insensitive).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        let digits = hex.chars().map(|c| c.to_digit(16)).collect::<Option<Vec<u32>>>()?;
        // Hex digits are < 16, so the narrowing is lossless.
        let d = |i: usize| digits[i] as u8;
        match digits.len() {
            3 => Some(Self { r: d(0) * 17, g: d(1) * 17, b: d(2) * 17 }),
            6 => Some(Self { r: d(0) * 16 + d(1), g: d(2) * 16 + d(3), b: d(4) * 16 + d(5) }),
            _ => None,
        }
    }

    /// `#rrggbb` form, suitable for canvas fill styles.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Ordered, non-empty list of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_css::<&str>(&[])
    }
}

impl Palette {
    /// Build from CSS hex strings. Unparsable entries are skipped; if nothing
    /// usable remains the default palette is used.
    #[must_use]
    pub fn from_css<S: AsRef<str>>(colors: &[S]) -> Self {
        let mut parsed = Vec::with_capacity(colors.len());
        for raw in colors {
            match Rgb::parse_hex(raw.as_ref()) {
                Some(rgb) => parsed.push(rgb),
                None => log::warn!("palette: skipping unparsable color {:?}", raw.as_ref()),
            }
        }
        if parsed.is_empty() {
            parsed = DEFAULT_PALETTE.iter().filter_map(|c| Rgb::parse_hex(c)).collect();
        }
        Self { colors: parsed }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for an index. Indices past the end wrap around.
    #[must_use]
    pub fn color(&self, index: u16) -> Rgb {
        match self.colors.len() {
            0 => Rgb { r: 0, g: 0, b: 0 },
            n => self.colors[usize::from(index) % n],
        }
    }

    /// Clamp a requested selection into range.
    #[must_use]
    pub fn clamp_index(&self, index: u16) -> u16 {
        let last = u16::try_from(self.colors.len().saturating_sub(1)).unwrap_or(u16::MAX);
        index.min(last)
    }
}
