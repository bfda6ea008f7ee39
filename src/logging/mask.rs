//! Secret masking for log lines and error text

use regex::{Captures, Regex};
use std::sync::LazyLock;

const MASK: &str = "***";

/// Environment variables whose values are always treated as secrets
const SECRET_ENV_VARS: [&str; 6] = [
    "PROXY_USERNAME",
    "PROXY_PASSWORD",
    "EMAIL_USER",
    "EMAIL_PASS",
    "API_KEY",
    "API_TOKEN",
];

static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)api[_-]?key[=: ]+([\w-]+)",
        r"(?i)token[=: ]+([\w-]+)",
        r"(?i)password[=: ]+([\w-]+)",
        r"(?i)pass[=: ]+([\w-]+)",
        r"(?i)secret[=: ]+([\w-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("secret pattern is valid"))
    .collect()
});

/// Replaces known secrets and `key=value` style credentials with `***`
#[derive(Debug, Clone, Default)]
pub struct SecretMask {
    secrets: Vec<String>,
}

impl SecretMask {
    /// Creates a mask for the given secret values (empty values are ignored)
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut secrets: Vec<String> = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        // Longest first so a secret containing another is masked whole
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        secrets.dedup();
        Self { secrets }
    }

    /// Creates a mask from the given secrets plus the well-known secret env vars
    pub fn with_env_secrets<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let from_env = SECRET_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok());
        let combined: Vec<String> = secrets.into_iter().map(Into::into).chain(from_env).collect();
        Self::new(combined)
    }

    /// Returns the message with every secret masked
    pub fn mask(&self, message: &str) -> String {
        let mut masked = message.to_string();
        for secret in &self.secrets {
            if masked.contains(secret.as_str()) {
                masked = masked.replace(secret.as_str(), MASK);
            }
        }
        for pattern in SECRET_PATTERNS.iter() {
            masked = pattern
                .replace_all(&masked, |caps: &Captures| caps[0].replace(&caps[1], MASK))
                .into_owned();
        }
        masked
    }
}
