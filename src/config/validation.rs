use crate::config::types::{EmailSettings, ScraperSettings, Settings};
use crate::ConfigError;

/// Validates the entire settings structure
///
/// Site definitions are validated when they are compiled into the registry.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_scraper_settings(&settings.scraper)?;
    validate_logging_level(settings.logging.level.as_deref())?;
    validate_email_settings(&settings.email)?;
    Ok(())
}

/// Validates scraper settings
fn validate_scraper_settings(config: &ScraperSettings) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency-limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk-size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got timeout-secs={} connect-timeout-secs={}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the SMTP endpoint when notifications are on
///
/// Missing credentials are not fatal: the run still happens and the send
/// fails with a warning.
fn validate_email_settings(config: &EmailSettings) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }
    if config.smtp_server.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email smtp-server must not be empty".to_string(),
        ));
    }
    if config.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "email smtp-port must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates the optional log level name
fn validate_logging_level(level: Option<&str>) -> Result<(), ConfigError> {
    let Some(level) = level else {
        return Ok(());
    };
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
        other => Err(ConfigError::Validation(format!(
            "logging level must be one of trace, debug, info, warn, error, off; got '{}'",
            other
        ))),
    }
}
