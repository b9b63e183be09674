//! Active alerts as delivered by the NWS API (`application/geo+json`).
//!
//! Only the fields we need for rendering are typed; the rest of the payload is ignored.  Every
//! feature is decoded on its own so one odd record does not take the whole feed down.
//!

use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::EnumString;
use tracing::{trace, warn};

use crate::FormatError;

/// The whole feed.
///
/// `features` being `None` is the "nothing to render" marker (empty or malformed feed), which
/// is different from a feed with an empty feature list.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AlertCollection {
    pub features: Option<Vec<AlertFeature>>,
}

impl AlertCollection {
    /// Decode a raw JSON payload.  Only invalid JSON is an error.
    ///
    #[tracing::instrument(skip(input))]
    pub fn from_json(input: &str) -> Result<Self, FormatError> {
        let value: Value = serde_json::from_str(input)?;
        Ok(Self::from_value(value))
    }

    /// Extract features from an already parsed payload.
    ///
    pub fn from_value(value: Value) -> Self {
        let features = match value {
            Value::Object(mut obj) => match obj.remove("features") {
                Some(Value::Array(list)) => list,
                _ => return AlertCollection::default(),
            },
            _ => return AlertCollection::default(),
        };
        trace!("{} raw features", features.len());

        let features = features
            .into_iter()
            .enumerate()
            .filter_map(|(n, f)| match serde_json::from_value::<AlertFeature>(f) {
                Ok(f) => Some(f),
                Err(e) => {
                    warn!("skipping undecodable feature #{n}: {e}");
                    None
                }
            })
            .collect();
        AlertCollection {
            features: Some(features),
        }
    }

    /// `true` when there is nothing to render at all.
    ///
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_none()
    }

    /// Number of features, 0 for the empty marker.
    ///
    #[inline]
    pub fn len(&self) -> usize {
        self.features.as_ref().map_or(0, |f| f.len())
    }
}

impl From<Vec<AlertFeature>> for AlertCollection {
    fn from(value: Vec<AlertFeature>) -> Self {
        AlertCollection {
            features: Some(value),
        }
    }
}

/// One alert.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AlertFeature {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: AlertProperties,
}

/// Raw GeoJSON geometry; coordinates are only checked when asked for.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// A ring is a list of `[longitude, latitude]` pairs.
///
pub type Ring = Vec<[f64; 2]>;

impl Geometry {
    /// Build a polygon geometry from rings, mostly for tests and tools.
    ///
    pub fn polygon(rings: &[Ring]) -> Self {
        Geometry {
            kind: "Polygon".to_string(),
            coordinates: serde_json::json!(rings),
        }
    }

    /// Validate coordinates as a list of rings of `[lon, lat]` pairs.
    ///
    /// Fails if the shape is wrong, if any pair is not exactly two numbers or if there is no
    /// point at all.
    ///
    pub fn rings(&self, id: &str) -> Result<Vec<Ring>, FormatError> {
        let bad = |what: &str| FormatError::MalformedGeometry(id.to_string(), what.to_string());

        let rings = self.coordinates.as_array().ok_or_else(|| bad("not a list of rings"))?;
        let rings = rings
            .iter()
            .map(|ring| {
                ring.as_array()
                    .ok_or_else(|| bad("ring is not a list"))?
                    .iter()
                    .map(|pair| match pair.as_array().map(|p| p.as_slice()) {
                        Some([lon, lat]) => match (lon.as_f64(), lat.as_f64()) {
                            (Some(lon), Some(lat)) => Ok([lon, lat]),
                            _ => Err(bad("non numeric coordinate")),
                        },
                        _ => Err(bad("coordinate is not a pair")),
                    })
                    .collect::<Result<Ring, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        if rings.iter().all(|r| r.is_empty()) {
            return Err(bad("no points"));
        }
        Ok(rings)
    }
}

/// Alert properties, see <https://www.weather.gov/documentation/services-web-api>.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient")]
    pub area_desc: String,
    #[serde(default, deserialize_with = "lenient")]
    pub message_type: MessageType,
    #[serde(default, deserialize_with = "lenient")]
    pub sent: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub effective: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub onset: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub expires: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub ends: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient")]
    pub certainty: Certainty,
    #[serde(default, deserialize_with = "lenient")]
    pub urgency: Urgency,
    #[serde(default, deserialize_with = "lenient")]
    pub event: String,
    #[serde(default, deserialize_with = "lenient")]
    pub instruction: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub headline: String,
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: Parameters,
}

impl AlertProperties {
    /// Map the free-form event name into our closed set.
    ///
    #[inline]
    pub fn category(&self) -> EventCategory {
        EventCategory::from_str(&self.event).unwrap_or_default()
    }
}

/// The few parameters we care about.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Parameters {
    #[serde(rename = "NWSheadline", default, deserialize_with = "lenient")]
    pub nws_headline: Vec<String>,
    #[serde(rename = "eventEndingTime", default, deserialize_with = "lenient")]
    pub event_ending_time: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    Actual,
    Exercise,
    System,
    Test,
    Draft,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MessageType {
    Alert,
    Update,
    Cancel,
    Ack,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Certainty {
    Observed,
    Likely,
    Possible,
    Unlikely,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Past,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Event categories we know about.  Anything else is `Other`.
///
#[derive(Clone, Copy, Debug, Default, EnumString, Eq, PartialEq, strum::Display, strum::VariantNames)]
pub enum EventCategory {
    #[strum(serialize = "Tornado Warning")]
    TornadoWarning,
    #[strum(serialize = "Severe Thunderstorm Warning")]
    SevereThunderstormWarning,
    #[strum(serialize = "Flood Warning")]
    FloodWarning,
    #[strum(serialize = "Special Weather Statement")]
    SpecialWeatherStatement,
    #[strum(serialize = "Tornado Watch")]
    TornadoWatch,
    #[strum(serialize = "Severe Thunderstorm Watch")]
    SevereThunderstormWatch,
    #[default]
    Other,
}

/// The NWS API happily sends `null` for text fields and sometimes odd values elsewhere.  We only
/// read these fields, so anything we can not make sense of becomes the default value instead of
/// taking the whole feature down.
///
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
