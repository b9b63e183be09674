//! Turn a feed into a placefile.
//!

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    AlertCollection, AlertFeature, PlacefileDocument, Point2D, Rgb, StyledGeometry, Style,
    DEFAULT_REFRESH, DEFAULT_THRESHOLD,
};

/// Caller-supplied document parameters, anything left out gets the default.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BuildOptions {
    pub title: Option<String>,
    pub refresh: Option<Duration>,
    pub threshold: Option<u32>,
    pub default_color: Option<Rgb>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    pub fn refresh(mut self, refresh: Duration) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn default_color(mut self, color: Rgb) -> Self {
        self.default_color = Some(color);
        self
    }
}

/// Title used when none is given.
///
pub fn default_title(now: DateTime<Utc>) -> String {
    format!(
        "NWS Active Warnings {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Convert one feature into a line.
///
/// All rings are merged into a single line and every `[lon, lat]` pair becomes a point with
/// `x = lat` and `y = lon`.
///
fn feature_to_line(feature: &AlertFeature) -> Option<StyledGeometry> {
    let geometry = feature.geometry.as_ref()?;

    let rings = match geometry.rings(&feature.id) {
        Ok(rings) => rings,
        Err(e) => {
            warn!("{e}, skipping");
            return None;
        }
    };

    let mut sum = Point2D::default();
    let points: Vec<Point2D> = rings
        .into_iter()
        .flatten()
        .map(|[lon, lat]| {
            let p = Point2D::new(lat, lon);
            sum.add(&p);
            p
        })
        .collect();

    // Not drawn yet, kept for point markers.
    let n = points.len() as f64;
    let centroid = Point2D::new(sum.x / n, sum.y / n);
    trace!("id={} points={} centroid={centroid}", feature.id, points.len());

    let style = Style::from(&feature.properties);
    Some(StyledGeometry::Line {
        width: style.width,
        color: Some(style.color),
        hover: Some(style.hover),
        points,
    })
}

/// Build the document, `None` when the feed has no feature list at all.
///
#[tracing::instrument(skip(alerts))]
pub fn build(alerts: &AlertCollection, opts: &BuildOptions) -> Option<PlacefileDocument> {
    let features = alerts.features.as_ref()?;

    let geometry: Vec<StyledGeometry> = features
        .iter()
        .filter(|f| f.geometry.is_some())
        .filter_map(feature_to_line)
        .collect();
    debug!("{} features, {} lines", features.len(), geometry.len());

    Some(PlacefileDocument {
        title: opts
            .title
            .clone()
            .unwrap_or_else(|| default_title(Utc::now())),
        refresh: opts.refresh.unwrap_or(DEFAULT_REFRESH),
        threshold: opts.threshold.unwrap_or(DEFAULT_THRESHOLD),
        default_color: opts.default_color,
        geometry,
    })
}

/// Build and serialize in one go; the empty marker renders as `""`.
///
pub fn render(alerts: &AlertCollection, opts: &BuildOptions) -> String {
    build(alerts, opts)
        .map(|doc| doc.to_string())
        .unwrap_or_default()
}
