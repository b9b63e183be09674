use strum::EnumString;

/// How the daemon runs.
///
/// - `Production`: slow cadence, documents are served over HTTP,
/// - `Development`: fast cadence, documents are dumped into a file.
///
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    EnumString,
    Eq,
    PartialEq,
    strum::Display,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl Mode {
    #[inline]
    pub fn is_dev(&self) -> bool {
        *self == Mode::Development
    }
}
