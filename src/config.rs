use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.adyo.co.za";
pub const DEFAULT_ANALYTICS_API_BASE: &str = "https://analytics.adyo.co.za";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which of the two Adyo APIs a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Api {
    #[default]
    Primary,
    Analytics,
}

/// Base URL plus version segment, e.g. `https://api.adyo.co.za` + `v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub version: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: version.into(),
        }
    }
}

/// Runtime configuration for the Adyo client.
/// Owned by whoever builds the client; nothing is read from globals after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub api: Endpoint,
    pub analytics: Endpoint,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api: Endpoint::new(DEFAULT_API_BASE, DEFAULT_API_VERSION),
            analytics: Endpoint::new(DEFAULT_ANALYTICS_API_BASE, DEFAULT_API_VERSION),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Point both APIs at the same base URL. Mostly useful against a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api.base_url = base_url.clone();
        self.analytics.base_url = base_url;
        self
    }

    pub fn endpoint(&self, api: Api) -> &Endpoint {
        match api {
            Api::Primary => &self.api,
            Api::Analytics => &self.analytics,
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - ADYO_API_KEY (no default; requests fail as unauthorized without it)
    /// - ADYO_API_BASE (default: https://api.adyo.co.za)
    /// - ADYO_API_VERSION (default: v1)
    /// - ADYO_ANALYTICS_API_BASE (default: https://analytics.adyo.co.za)
    /// - ADYO_ANALYTICS_API_VERSION (default: v1)
    /// - ADYO_HTTP_TIMEOUT_SECS (default: 30)
    /// - ADYO_USER_AGENT (default: adyo-rs/<version>)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_key = lookup("ADYO_API_KEY").filter(|k| !k.is_empty());
        let api = Endpoint {
            base_url: lookup("ADYO_API_BASE").unwrap_or(defaults.api.base_url),
            version: lookup("ADYO_API_VERSION").unwrap_or(defaults.api.version),
        };
        let analytics = Endpoint {
            base_url: lookup("ADYO_ANALYTICS_API_BASE").unwrap_or(defaults.analytics.base_url),
            version: lookup("ADYO_ANALYTICS_API_VERSION").unwrap_or(defaults.analytics.version),
        };
        let timeout_secs = lookup("ADYO_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let user_agent = lookup("ADYO_USER_AGENT").unwrap_or(defaults.user_agent);

        Self {
            api_key,
            api,
            analytics,
            user_agent,
            timeout_secs,
        }
    }
}

fn default_user_agent() -> String {
    format!("adyo-rs/{}", env!("CARGO_PKG_VERSION"))
}
