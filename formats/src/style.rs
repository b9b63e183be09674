//! How an alert is drawn: stroke colour, line width and hover text.
//!
//! Rules, in order:
//!
//! - base colour from the event category table, white for anything unknown,
//! - width 8 instead of 4 for an observed, confirmed tornado,
//! - PDS/"large and extremely dangerous" wording forces (255, 0, 100), otherwise
//!   "TORNADO EMERGENCY" forces (255, 0, 255).
//!

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{AlertProperties, Certainty, EventCategory};

/// Default line width
pub const BASE_WIDTH: u32 = 4;
/// Line width for confirmed tornadoes
pub const CONFIRMED_WIDTH: u32 = 8;

/// Colour used for PDS and "large and extremely dangerous" wording.
pub const PDS_COLOR: Rgb = Rgb::new(255, 0, 100);
/// Colour used for tornado emergencies.
pub const EMERGENCY_COLOR: Rgb = Rgb::new(255, 0, 255);
/// Colour for unmapped categories.
pub const DEFAULT_COLOR: Rgb = Rgb::new(255, 255, 255);

static PDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)particularly dangerous situation|large and extremely dangerous")
        .expect("static regex")
});

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Add an alpha channel, for polygons.
    ///
    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// Placefile colours are space-separated.
///
impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Rgb::new(value[0], value[1], value[2])
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Polygon colours are comma-separated.
///
impl Display for Rgba {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}, {}", self.r, self.g, self.b, self.a)
    }
}

impl EventCategory {
    /// Base colour for the category.
    ///
    pub fn color(&self) -> Rgb {
        match self {
            EventCategory::TornadoWarning => Rgb::new(255, 0, 0),
            EventCategory::SevereThunderstormWarning => Rgb::new(255, 255, 0),
            EventCategory::FloodWarning => Rgb::new(0, 255, 0),
            EventCategory::SpecialWeatherStatement => Rgb::new(255, 255, 204),
            _ => DEFAULT_COLOR,
        }
    }
}

/// Result of applying the rules to one alert.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub color: Rgb,
    pub width: u32,
    pub hover: String,
}

impl From<&AlertProperties> for Style {
    fn from(p: &AlertProperties) -> Self {
        let width = if p.event.starts_with("Tornado")
            && p.certainty == Certainty::Observed
            && p.description.contains("confirmed tornado")
        {
            CONFIRMED_WIDTH
        } else {
            BASE_WIDTH
        };

        let color = if PDS.is_match(&p.description) {
            PDS_COLOR
        } else if p.description.contains("TORNADO EMERGENCY") {
            EMERGENCY_COLOR
        } else {
            p.category().color()
        };
        trace!("event={} color={color} width={width}", p.event);

        Style {
            color,
            width,
            hover: format!("{}\n\n{}", p.headline, p.description),
        }
    }
}
