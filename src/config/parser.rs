use crate::config::types::Settings;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads and parses a settings file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Returns
///
/// * `Ok(Settings)` - Successfully loaded and validated settings
/// * `Err(ConfigError)` - Failed to load, parse, or validate the settings
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use part_scout::config::load_config;
///
/// let settings = load_config(Path::new("part-scout.toml")).unwrap();
/// println!("Concurrency: {}", settings.scraper.concurrency_limit);
/// ```
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    // Read the settings file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let settings: Settings = toml::from_str(&content)?;

    // Validate the settings
    validate(&settings)?;

    Ok(settings)
}

/// Computes a SHA-256 hash of the settings file content
///
/// Logged at startup so runs can be tied to the exact settings they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a settings file and returns both the settings and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Settings, String), ConfigError> {
    let settings = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}

/// Loads settings from an optional file, `.env` and the process environment
///
/// Environment variables take precedence over the file. The returned hash is
/// present when a settings file was used.
pub fn load_settings(path: Option<&Path>) -> Result<(Settings, Option<String>), ConfigError> {
    let (mut settings, hash) = match path {
        Some(path) => {
            let (settings, hash) = load_config_with_hash(path)?;
            (settings, Some(hash))
        }
        None => (Settings::default(), None),
    };

    if let Ok(env_path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", env_path.display());
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;

    Ok((settings, hash))
}

/// Overrides settings with values from the environment
///
/// `lookup` returns the value of an environment variable, if set. Numeric
/// values that fail to parse are ignored with a warning.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let scraper = &mut settings.scraper;
    override_parsed(&lookup, "CONCURRENCY_LIMIT", &mut scraper.concurrency_limit);
    override_parsed(&lookup, "CHUNKSIZE", &mut scraper.chunk_size);
    override_parsed(&lookup, "REQUEST_DELAY_MS", &mut scraper.request_delay_ms);
    override_parsed(&lookup, "MAX_RETRIES", &mut scraper.max_retries);
    if let Some(value) = lookup("VERIFY_SSL") {
        scraper.verify_ssl = parse_flag(&value);
    }

    let proxy = &mut settings.proxy;
    if let Some(host) = lookup("PROXY_HOST").filter(|v| !v.trim().is_empty()) {
        proxy.host = host;
    }
    if let Some(username) = lookup("PROXY_USERNAME") {
        proxy.username = Some(username);
    }
    if let Some(password) = lookup("PROXY_PASSWORD") {
        proxy.password = Some(password);
    }

    let email = &mut settings.email;
    if let Some(value) = lookup("EMAIL_NOTIFICATIONS_ENABLED") {
        email.enabled = parse_flag(&value);
    }
    if let Some(server) = lookup("EMAIL_SMTP_SERVER").filter(|v| !v.trim().is_empty()) {
        email.smtp_server = server;
    }
    override_parsed(&lookup, "EMAIL_SMTP_PORT", &mut email.smtp_port);
    if let Some(username) = lookup("EMAIL_USER") {
        email.username = Some(username);
    }
    if let Some(password) = lookup("EMAIL_PASS") {
        email.password = Some(password);
    }
    if let Some(to) = lookup("EMAIL_NOTIFY_TO") {
        email.notify_to = Some(to);
    }

    let logging = &mut settings.logging;
    if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
        logging.level = Some(level);
    }
    if let Some(file) = lookup("LOG_FILE").filter(|v| !v.trim().is_empty()) {
        logging.file = Some(PathBuf::from(file));
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring {}: '{}' is not a valid number", name, raw),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
