//! The placefile text format.
//!
//! Line-oriented, consumed as-is by the plotting tool:
//!
//! ```text
//! Title: NWS Active Warnings 2024-05-06T23:25:00.000Z
//! Refresh: 3
//! Threshold: 999
//! Color: 255 0 0
//! Line: 4, 0, "Headline\n\nDescription"
//! 35.25,-97.5
//! 35.25,-97
//! End:
//! ```
//!

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::warn;

use crate::{Point2D, Rgb, Rgba};

/// Default threshold, meaning "always visible" for any sane zoom.
pub const DEFAULT_THRESHOLD: u32 = 999;

/// Default refresh interval for clients
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(3 * 60);

/// What the document can draw.
///
#[derive(Clone, Debug, PartialEq)]
pub enum StyledGeometry {
    Line {
        width: u32,
        color: Option<Rgb>,
        hover: Option<String>,
        points: Vec<Point2D>,
    },
    Polygon {
        color: Rgba,
        points: Vec<Point2D>,
    },
}

/// A complete placefile, ready to be serialized with `to_string()`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PlacefileDocument {
    pub title: String,
    pub refresh: Duration,
    pub threshold: u32,
    pub default_color: Option<Rgb>,
    pub geometry: Vec<StyledGeometry>,
}

impl PlacefileDocument {
    /// Whole minutes and remaining seconds of the refresh interval.
    ///
    pub fn refresh_parts(&self) -> (u64, u64) {
        let total = self.refresh.as_secs();
        (total / 60, total % 60)
    }

    /// Number of lines in the document.
    ///
    pub fn lines(&self) -> usize {
        self.geometry
            .iter()
            .filter(|g| matches!(g, StyledGeometry::Line { .. }))
            .count()
    }
}

impl Default for PlacefileDocument {
    fn default() -> Self {
        PlacefileDocument {
            title: String::new(),
            refresh: DEFAULT_REFRESH,
            threshold: DEFAULT_THRESHOLD,
            default_color: None,
            geometry: vec![],
        }
    }
}

/// Hover text is quoted on a single line so newlines become a literal `\n`.
///
fn escape(s: &str) -> String {
    s.replace('\n', "\\n")
}

fn points(out: &mut Vec<String>, points: &[Point2D]) {
    out.extend(points.iter().map(|p| p.to_string()));
}

impl Display for PlacefileDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = vec![format!("Title: {}", self.title)];

        let (mins, secs) = self.refresh_parts();
        if mins > 0 {
            out.push(format!("Refresh: {mins}"));
        }
        if secs > 0 {
            out.push(format!("RefreshSeconds: {secs}"));
        }
        if self.threshold > 0 {
            out.push(format!("Threshold: {}", self.threshold));
        }
        if let Some(color) = &self.default_color {
            out.push(format!("Color: {color}"));
        }

        for geo in &self.geometry {
            match geo {
                StyledGeometry::Line {
                    width,
                    color,
                    hover,
                    points: pts,
                } => {
                    if let Some(color) = color.or(self.default_color) {
                        out.push(format!("Color: {color}"));
                    }
                    match hover {
                        Some(hover) => out.push(format!("Line: {width}, 0, \"{}\"", escape(hover))),
                        None => out.push(format!("Line: {width}, 0")),
                    }
                    points(&mut out, pts);
                    out.push("End:".to_string());
                }
                StyledGeometry::Polygon { color, points: pts } => {
                    let Some(first) = pts.first() else {
                        warn!("skipping polygon without points");
                        continue;
                    };
                    out.push(format!("Polygon: {first}, {color}"));
                    points(&mut out, pts);
                    out.push("End:".to_string());
                }
            }
        }
        write!(f, "{}", out.join("\n"))
    }
}
