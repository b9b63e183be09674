//! Daemon configuration, stored in `wxplace.hcl`.
//!
//! ```hcl
//! version = 1
//! port    = 3525
//! refresh = 180
//!
//! feed {
//!   user_agent = "(wxplace, me@example.net)"
//! }
//! ```
//!

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use wxplace_common::{IntoConfig, Versioned};
use wxplace_engine::{Mode, DEF_TICK};
use wxplace_formats::{BuildOptions, DEFAULT_REFRESH, DEFAULT_THRESHOLD};
use wxplace_sources::{FeedConfig, DEF_SNAPSHOT};

use crate::Status;

/// Current version
pub const CVERSION: usize = 1;

/// Default listening address
pub const DEF_LISTEN: &str = "0.0.0.0";
/// Default listening port
pub const DEF_PORT: u16 = 3525;
/// Refresh cadence in development mode
pub const DEF_DEV_REFRESH: u64 = 60;
/// Where development mode writes the placefile
pub const DEF_DUMP: &str = "placefile.pl";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct WxConfig {
    /// Version of the file format
    pub version: usize,
    pub listen: String,
    pub port: u16,
    /// Seconds between two fetches in production
    pub refresh: u64,
    /// Seconds between two fetches in development
    pub dev_refresh: u64,
    /// Milliseconds between two checks of the cache
    pub tick: u64,
    pub threshold: u32,
    /// Fixed title, a timestamped one otherwise
    pub title: Option<String>,
    /// Raw feed kept across restarts
    pub snapshot: PathBuf,
    /// Development mode output
    pub dump: PathBuf,
    pub feed: FeedConfig,
}

impl Default for WxConfig {
    fn default() -> Self {
        WxConfig {
            version: CVERSION,
            listen: DEF_LISTEN.to_string(),
            port: DEF_PORT,
            refresh: DEFAULT_REFRESH.as_secs(),
            dev_refresh: DEF_DEV_REFRESH,
            tick: DEF_TICK.as_millis() as u64,
            threshold: DEFAULT_THRESHOLD,
            title: None,
            snapshot: PathBuf::from(DEF_SNAPSHOT),
            dump: PathBuf::from(DEF_DUMP),
            feed: FeedConfig::default(),
        }
    }
}

impl Versioned for WxConfig {
    fn version(&self) -> usize {
        self.version
    }
}

impl IntoConfig for WxConfig {
    const FILENAME: &'static str = "wxplace.hcl";
}

impl WxConfig {
    /// Refresh cadence for the given mode.
    ///
    pub fn refresh_for(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Production => Duration::from_secs(self.refresh),
            Mode::Development => Duration::from_secs(self.dev_refresh),
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick)
    }

    /// Reject values the daemon can not run with.
    ///
    pub fn check(&self) -> Result<(), Status> {
        if self.version != CVERSION {
            return Err(Status::BadFileVersion(self.version, CVERSION));
        }
        if self.tick == 0 {
            return Err(Status::BadTick(self.tick));
        }
        Ok(())
    }

    /// Where to listen, the CLI wins over the file.
    ///
    pub fn addr(&self, listen: Option<IpAddr>, port: Option<u16>) -> Result<SocketAddr, Status> {
        let ip = match listen {
            Some(ip) => ip,
            None => self
                .listen
                .parse::<IpAddr>()
                .map_err(|_| Status::BadListen(self.listen.clone()))?,
        };
        Ok(SocketAddr::new(ip, port.unwrap_or(self.port)))
    }

    pub fn build_options(&self) -> BuildOptions {
        let opts = BuildOptions::new().threshold(self.threshold);
        match &self.title {
            Some(title) => opts.title(title),
            None => opts,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use wxplace_common::ConfigFile;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = WxConfig::default();

        assert_eq!(CVERSION, cfg.version());
        assert_eq!(Duration::from_secs(180), cfg.refresh_for(Mode::Production));
        assert_eq!(Duration::from_secs(60), cfg.refresh_for(Mode::Development));
        assert_eq!(Duration::from_millis(250), cfg.tick());
        assert_eq!("0.0.0.0:3525", cfg.addr(None, None).unwrap().to_string());
        assert_eq!(PathBuf::from("alerts.json"), cfg.snapshot);
        assert_eq!(PathBuf::from("placefile.pl"), cfg.dump);
        assert_eq!(4, cfg.feed.events.len());
    }

    #[test]
    fn test_config_parse() {
        let data = r##"
version = 1
listen = "127.0.0.1"
port = 8080
refresh = 240
title = "Warnings"

feed {
  base_url = "http://localhost:9000"
  events = ["Tornado Warning"]
}
"##;
        let cfg = ConfigFile::<WxConfig>::parse(data).unwrap();

        assert_eq!("127.0.0.1:8080", cfg.addr(None, None).unwrap().to_string());
        assert_eq!(Duration::from_secs(240), cfg.refresh_for(Mode::Production));
        assert_eq!(Duration::from_secs(60), cfg.refresh_for(Mode::Development));
        assert_eq!("http://localhost:9000", cfg.feed.base_url);
        assert_eq!(vec!["Tornado Warning".to_string()], cfg.feed.events);
        assert_eq!("/alerts/active", cfg.feed.route);

        let opts = cfg.build_options();
        assert_eq!(Some("Warnings".to_string()), opts.title);
        assert_eq!(Some(999), opts.threshold);
    }

    #[test]
    fn test_config_sample() {
        let cfg = ConfigFile::<WxConfig>::parse(include_str!("../../wxplace.hcl")).unwrap();

        assert_eq!(
            WxConfig {
                feed: FeedConfig {
                    timeout: Some(30),
                    ..Default::default()
                },
                ..Default::default()
            },
            cfg
        );
    }

    #[rstest]
    #[case(None, None, "0.0.0.0:3525")]
    #[case(Some("::1"), None, "[::1]:3525")]
    #[case(None, Some(80), "0.0.0.0:80")]
    #[case(Some("10.0.0.1"), Some(80), "10.0.0.1:80")]
    fn test_config_addr(#[case] ip: Option<&str>, #[case] port: Option<u16>, #[case] res: &str) {
        let cfg = WxConfig::default();
        let ip = ip.map(|s| s.parse::<IpAddr>().unwrap());

        assert_eq!(res, cfg.addr(ip, port).unwrap().to_string());
    }

    #[rstest]
    #[case("version = 1", true)]
    #[case("version = 2", false)]
    #[case("version = 1\ntick = 0", false)]
    #[case("version = 1\ntick = 1", true)]
    fn test_config_check(#[case] data: &str, #[case] ok: bool) {
        let cfg = ConfigFile::<WxConfig>::parse(data).unwrap();
        assert_eq!(ok, cfg.check().is_ok());
    }

    #[test]
    fn test_config_zero_tick() {
        let cfg = WxConfig {
            tick: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.check(), Err(Status::BadTick(0))));
    }

    #[test]
    fn test_config_bad_listen() {
        let cfg = WxConfig {
            listen: "nowhere".to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.addr(None, None), Err(Status::BadListen(_))));
    }
}
