//! Client configuration.

use std::time::Duration;

/// URL template for JSON API calls; `{}` receives the `/`-joined path.
pub const API_URL_TEMPLATE: &str = "https://7gogo.jp/api/{}";

/// URL template for public talk pages; `{}` receives the public identifier.
pub const PAGE_URL_TEMPLATE: &str = "http://7gogo.jp/lp/{}";

/// The API rejects batch lookups with more identifiers than this.
pub const MAX_BATCH_SIZE: usize = 5;

/// Runtime configuration for an [`ApiClient`](crate::ApiClient).
///
/// [`ClientConfig::default`] never reads the environment. Binaries that want
/// overrides call [`ClientConfig::from_env`]:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `NANAGOGO_API_URL` | `https://7gogo.jp/api/{}` | API URL template |
/// | `NANAGOGO_PAGE_URL` | `http://7gogo.jp/lp/{}` | Public page URL template |
/// | `NANAGOGO_BATCH_SIZE` | `5` | Ids per batch request, clamped to 1..=5 |
/// | `NANAGOGO_TIMEOUT_SECS` | (absent) | Per-request timeout |
/// | `NANAGOGO_USER_AGENT` | `nanagogo/<version>` | `User-Agent` header |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Template containing a single `{}` placeholder for the API path.
    pub api_url: String,

    /// Template containing a single `{}` placeholder for a public page id.
    pub page_url: String,

    /// Number of identifiers sent per batch request. Values outside
    /// `1..=MAX_BATCH_SIZE` are clamped by [`ClientConfig::batch_size`].
    pub batch_size: usize,

    /// Request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,

    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL_TEMPLATE.into(),
            page_url: PAGE_URL_TEMPLATE.into(),
            batch_size: MAX_BATCH_SIZE,
            timeout: None,
            user_agent: concat!("nanagogo/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    /// Populate config from environment variables, applying defaults where
    /// absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let batch_size = std::env::var("NANAGOGO_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.batch_size);

        let timeout = std::env::var("NANAGOGO_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            api_url: std::env::var("NANAGOGO_API_URL").unwrap_or(defaults.api_url),
            page_url: std::env::var("NANAGOGO_PAGE_URL").unwrap_or(defaults.page_url),
            batch_size,
            timeout,
            user_agent: std::env::var("NANAGOGO_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    /// Config pointing both templates at another host, e.g. a local mock.
    ///
    /// `base` is a scheme + authority such as `http://127.0.0.1:4000`; the
    /// API lives under `/api/` and pages under `/lp/`.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_url: format!("{base}/api/{{}}"),
            page_url: format!("{base}/lp/{{}}"),
            ..Self::default()
        }
    }

    /// Effective batch size, clamped to `[1, MAX_BATCH_SIZE]`.
    pub fn batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}
