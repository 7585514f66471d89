//! Remote asset fetching.
//!
//! The optimizer only sees `fetch(url) -> Option<bytes>`: a failed request is
//! an absent result, never an error.

use std::time::Duration;

use crate::debug;

/// Timeout for a single loader asset download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Option<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self(url)
    }
}

/// Never fetches; every asset comes from the cache or the bundled copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetch;

impl Fetch for NoFetch {
    fn fetch(&self, _url: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Blocking HTTP(S) client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Option<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("deferhtml/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .inspect_err(|e| debug!("fetch"; "cannot build http client: {}", e))
            .ok()?;
        Some(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let url = if let Some(rest) = url.strip_prefix("//") {
            format!("https://{rest}")
        } else {
            url.to_string()
        };

        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                debug!("fetch"; "{} failed: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            debug!("fetch"; "{} returned {}", url, response.status());
            return None;
        }
        let body = response.bytes().ok()?.to_vec();
        debug!("fetch"; "{} ({} bytes)", url, body.len());
        Some(body)
    }
}
