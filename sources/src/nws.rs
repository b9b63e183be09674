//! National Weather Service alert feed.
//!
//! A single `GET` on `/alerts/active` filtered by event name, returning GeoJSON.  The API
//! requires a `User-Agent` identifying the caller.
//!

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{FetchError, Fetchable};

/// Default API endpoint
pub const DEF_BASE_URL: &str = "https://api.weather.gov";
/// Who we are, override with a real contact
pub const DEF_USER_AGENT: &str = "(wxplace, wxplace@localhost)";
/// Where active alerts live
pub const DEF_ROUTE: &str = "/alerts/active";
/// What we ask for
pub const DEF_EVENTS: &[&str] = &[
    "Severe Thunderstorm Warning",
    "Tornado Warning",
    "Flood Warning",
    "Special Weather Statement",
];

/// Feed parameters, usually the `feed` block of the configuration file.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base site url
    pub base_url: String,
    /// Add this to `base_url` to fetch data
    pub route: String,
    /// Event categories to request
    pub events: Vec<String>,
    /// Contact string, mandatory for the NWS API
    pub user_agent: String,
    /// Request timeout in seconds, none by default
    pub timeout: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: DEF_BASE_URL.to_string(),
            route: DEF_ROUTE.to_string(),
            events: DEF_EVENTS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEF_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

/// NWS client/source struct.
///
#[derive(Clone, Debug)]
pub struct NwsFeed {
    /// Full URL including the query string
    url: String,
    user_agent: String,
    client: Client,
}

impl NwsFeed {
    #[tracing::instrument]
    pub fn new(cfg: &FeedConfig) -> Result<Self, FetchError> {
        trace!("nws::new");

        if cfg.base_url.is_empty() {
            return Err(FetchError::BadParam("base_url".to_string()));
        }
        if cfg.user_agent.is_empty() {
            return Err(FetchError::BadParam("user_agent".to_string()));
        }

        let mut client = Client::builder();
        if let Some(secs) = cfg.timeout {
            client = client.timeout(Duration::from_secs(secs));
        }
        let client = client
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(NwsFeed {
            url: Self::url(cfg),
            user_agent: cfg.user_agent.clone(),
            client,
        })
    }

    /// `{base_url}{route}?event=A,B,C` with each event name percent-encoded.
    ///
    fn url(cfg: &FeedConfig) -> String {
        let base = format!("{}{}", cfg.base_url.trim_end_matches('/'), cfg.route);
        if cfg.events.is_empty() {
            return base;
        }
        let events = cfg
            .events
            .iter()
            .map(|e| utf8_percent_encode(e, NON_ALPHANUMERIC).to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!("{base}?event={events}")
    }
}

#[async_trait]
impl Fetchable for NwsFeed {
    #[inline]
    fn name(&self) -> String {
        self.url.clone()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self) -> Result<String, FetchError> {
        trace!("Fetching {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/geo+json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!("status={status}");
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), self.url.clone()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!("{} bytes", body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use rstest::rstest;

    use super::*;

    fn setup(server: &MockServer) -> FeedConfig {
        FeedConfig {
            base_url: server.base_url(),
            user_agent: "(test, test@example.net)".to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(DEF_BASE_URL, &["Tornado Warning", "Flood Warning"], "https://api.weather.gov/alerts/active?event=Tornado%20Warning,Flood%20Warning")]
    #[case("http://localhost/", &[], "http://localhost/alerts/active")]
    #[case("http://localhost", &["A&B"], "http://localhost/alerts/active?event=A%26B")]
    fn test_feed_url(#[case] base_url: &str, #[case] events: &[&str], #[case] url: &str) {
        let cfg = FeedConfig {
            base_url: base_url.to_string(),
            events: events.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        assert_eq!(url, NwsFeed::url(&cfg));
    }

    #[test]
    fn test_feed_config_hcl() {
        let cfg: FeedConfig = hcl::from_str(
            r#"
            user_agent = "(me, me@example.net)"
            events = ["Tornado Warning"]
            timeout = 10
            "#,
        )
        .unwrap();
        assert_eq!(DEF_BASE_URL, cfg.base_url);
        assert_eq!(DEF_ROUTE, cfg.route);
        assert_eq!(vec!["Tornado Warning".to_string()], cfg.events);
        assert_eq!(Some(10), cfg.timeout);
    }

    #[test]
    fn test_feed_bad_params() {
        let cfg = FeedConfig {
            user_agent: "".to_string(),
            ..Default::default()
        };
        assert!(matches!(NwsFeed::new(&cfg), Err(FetchError::BadParam(_))));
    }

    #[tokio::test]
    async fn test_feed_fetch_ok() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/alerts/active")
                    .query_param("event", DEF_EVENTS.join(","))
                    .header("accept", "application/geo+json")
                    .header("user-agent", "(test, test@example.net)");
                then.status(200).body("{\"features\": []}");
            })
            .await;

        let feed = NwsFeed::new(&setup(&server)).unwrap();
        let body = feed.fetch().await;
        m.assert_async().await;
        assert_eq!("{\"features\": []}", body.unwrap());
    }

    #[tokio::test]
    async fn test_feed_fetch_status() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET).path("/alerts/active");
                then.status(503).body("busy");
            })
            .await;

        let feed = NwsFeed::new(&setup(&server)).unwrap();
        let res = feed.fetch().await;
        m.assert_async().await;
        assert!(matches!(res, Err(FetchError::Status(503, _))));
    }

    #[tokio::test]
    async fn test_feed_fetch_transport() {
        let cfg = FeedConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Some(2),
            ..Default::default()
        };
        let feed = NwsFeed::new(&cfg).unwrap();
        assert!(matches!(feed.fetch().await, Err(FetchError::Transport(_))));
    }
}
