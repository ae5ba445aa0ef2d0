//! Share links: a board location encoded as a URL query string.

#[cfg(test)]
#[path = "share_test.rs"]
mod share_test;

use serde::{Deserialize, Serialize};

use crate::viewport::GridPos;

/// A cell plus the zoom it was viewed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub x: i32,
    pub y: i32,
    pub scale: f64,
}

impl ShareLink {
    #[must_use]
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }

    /// `x=..&y=..&zoom=..`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("x={}&y={}&zoom={}", self.x, self.y, self.scale)
    }

    /// Parse a query string (leading `?` optional). Unknown keys are ignored;
    /// `x` and `y` are required, `zoom` is optional.
    #[must_use]
    pub fn from_query(query: &str) -> Option<(GridPos, Option<f64>)> {
        let mut x = None;
        let mut y = None;
        let mut zoom = None;
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "x" => {
                    if let Ok(v) = value.parse::<i32>() {
                        x = Some(v);
                    }
                }
                "y" => {
                    if let Ok(v) = value.parse::<i32>() {
                        y = Some(v);
                    }
                }
                "zoom" => {
                    if let Ok(z) = value.parse::<f64>() {
                        zoom = z.is_finite().then_some(z);
                    }
                }
                _ => {}
            }
        }
        Some((GridPos::new(x?, y?), zoom))
    }
}
