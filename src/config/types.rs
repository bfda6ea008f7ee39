use crate::site::SiteDefinition;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main settings structure for Part-Scout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub proxy: ProxySettings,
    pub logging: LoggingSettings,
    pub email: EmailSettings,

    /// Additional site definitions (`[[site]]` tables)
    #[serde(rename = "site")]
    pub sites: Vec<SiteDefinition>,
}

impl Settings {
    /// Every configured credential, for masking
    pub fn secrets(&self) -> Vec<String> {
        let mut secrets = self.proxy.secrets();
        secrets.extend(self.email.secrets());
        secrets
    }
}

/// Request pacing and batching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperSettings {
    /// Maximum number of identifiers processed concurrently
    pub concurrency_limit: u32,

    /// Number of identifiers read and checkpointed together
    pub chunk_size: usize,

    /// Polite delay after each successful request (milliseconds)
    pub request_delay_ms: u64,

    /// Attempts per request before giving up
    pub max_retries: u32,

    /// Verify TLS certificates
    pub verify_ssl: bool,

    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: 3,
            chunk_size: 500,
            request_delay_ms: 150,
            max_retries: 3,
            verify_ssl: true,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ScraperSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Proxy configuration
///
/// Credentials usually come from `PROXY_USERNAME` / `PROXY_PASSWORD`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxySettings {
    /// Proxy host and port, without scheme or credentials
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            host: "rp.proxyscrape.com:6060".to_string(),
            username: None,
            password: None,
        }
    }
}

impl ProxySettings {
    /// Returns the credentials when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// The proxy is only used when credentials are available
    pub fn is_enabled(&self) -> bool {
        self.credentials().is_some() && !self.host.trim().is_empty()
    }

    /// Values that must never appear in logs or result files
    pub fn secrets(&self) -> Vec<String> {
        [&self.username, &self.password]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level for this crate's diagnostics (e.g. "info", "debug")
    pub level: Option<String>,

    /// Optional file receiving a copy of every log line
    pub file: Option<PathBuf>,
}

/// Run summary email configuration
///
/// Credentials usually come from `EMAIL_USER` / `EMAIL_PASS`; the sender
/// address is the SMTP username.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmailSettings {
    /// Send the summary after every run that is not a dry run
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,

    /// Implicit TLS; plain SMTP when false
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Recipient; defaults to the sender
    pub notify_to: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            use_tls: true,
            username: None,
            password: None,
            notify_to: None,
        }
    }
}

impl EmailSettings {
    /// Returns the credentials when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn recipient(&self) -> Option<&str> {
        self.notify_to
            .as_deref()
            .filter(|to| !to.trim().is_empty())
            .or(self.username.as_deref())
            .filter(|to| !to.trim().is_empty())
    }

    pub fn secrets(&self) -> Vec<String> {
        self.password
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }
}
