//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::fetch::{FailurePolicy, FetchOptions};
use crate::mail::gmail::{DEFAULT_API_BASE, GmailConfig};
use crate::mail::ListQuery;

pub const ENV_ACCESS_TOKEN: &str = "MAILSTASH_ACCESS_TOKEN";
pub const ENV_STORE_DIR: &str = "MAILSTASH_STORE_DIR";
pub const ENV_API_BASE: &str = "MAILSTASH_API_BASE";
pub const ENV_USER_ID: &str = "MAILSTASH_USER_ID";
pub const ENV_QUERY: &str = "MAILSTASH_QUERY";
pub const ENV_LABEL_IDS: &str = "MAILSTASH_LABEL_IDS";
pub const ENV_PAGE_SIZE: &str = "MAILSTASH_PAGE_SIZE";
pub const ENV_MAX_PAGES: &str = "MAILSTASH_MAX_PAGES";
pub const ENV_SKIP_FAILURES: &str = "MAILSTASH_SKIP_FAILURES";
pub const ENV_TIMEOUT_SECS: &str = "MAILSTASH_TIMEOUT_SECS";

/// Everything a fetch or load needs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory holding one JSON file per message.
    pub store_dir: PathBuf,
    pub api_base: String,
    pub user_id: String,
    /// Only required for fetching; loading works without it.
    pub access_token: Option<SecretString>,
    pub query: Option<String>,
    pub label_ids: Vec<String>,
    pub page_size: Option<u32>,
    pub max_pages: Option<u32>,
    pub skip_failures: bool,
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("emails"),
            api_base: DEFAULT_API_BASE.to_string(),
            user_id: "me".to_string(),
            access_token: None,
            query: None,
            label_ids: Vec::new(),
            page_size: None,
            max_pages: None,
            skip_failures: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FetchConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Store directory alone, for commands that only read records.
    ///
    /// Fetch-only keys are not parsed, so a bad `MAILSTASH_PAGE_SIZE` cannot
    /// break `load` or `show`.
    pub fn store_dir_from_env() -> PathBuf {
        Self::store_dir_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn store_dir_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        lookup(ENV_STORE_DIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default().store_dir)
    }

    /// Build config from any key lookup. Unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let label_ids = get(ENV_LABEL_IDS)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let request_timeout = match get(ENV_TIMEOUT_SECS) {
            Some(v) => Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &v)?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            store_dir: Self::store_dir_from_lookup(&lookup),
            api_base: get(ENV_API_BASE).unwrap_or(defaults.api_base),
            user_id: get(ENV_USER_ID).unwrap_or(defaults.user_id),
            access_token: get(ENV_ACCESS_TOKEN).map(SecretString::from),
            query: get(ENV_QUERY),
            label_ids,
            page_size: get(ENV_PAGE_SIZE)
                .map(|v| parse_number(ENV_PAGE_SIZE, &v))
                .transpose()?,
            max_pages: get(ENV_MAX_PAGES)
                .map(|v| parse_number(ENV_MAX_PAGES, &v))
                .transpose()?,
            skip_failures: get(ENV_SKIP_FAILURES)
                .map(|v| parse_flag(ENV_SKIP_FAILURES, &v))
                .transpose()?
                .unwrap_or(false),
            request_timeout,
        })
    }

    /// Gmail connection settings. Fails if no access token is configured.
    pub fn gmail_config(&self) -> Result<GmailConfig, ConfigError> {
        let token = self
            .access_token
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar(ENV_ACCESS_TOKEN.to_string()))?;
        let mut config = GmailConfig::new(token);
        config.base_url = self.api_base.clone();
        config.user_id = self.user_id.clone();
        config.request_timeout = self.request_timeout;
        Ok(config)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            query: ListQuery {
                query: self.query.clone(),
                label_ids: self.label_ids.clone(),
                max_results: self.page_size,
                include_spam_trash: false,
            },
            max_pages: self.max_pages,
            failure_policy: if self.skip_failures {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Abort
            },
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{value:?}: {e}"),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value:?} is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<FetchConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FetchConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("emails"));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.user_id, "me");
        assert!(config.access_token.is_none());
        assert!(!config.skip_failures);
        assert_eq!(config.fetch_options().failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn reads_all_keys() {
        let config = from_pairs(&[
            (ENV_ACCESS_TOKEN, "ya29.token"),
            (ENV_STORE_DIR, "/tmp/mail"),
            (ENV_API_BASE, "http://localhost:8080"),
            (ENV_USER_ID, "alice@example.com"),
            (ENV_QUERY, "newer_than:7d"),
            (ENV_LABEL_IDS, "INBOX, STARRED ,,"),
            (ENV_PAGE_SIZE, "250"),
            (ENV_MAX_PAGES, "4"),
            (ENV_SKIP_FAILURES, "true"),
            (ENV_TIMEOUT_SECS, "5"),
        ])
        .unwrap();

        assert_eq!(config.store_dir, PathBuf::from("/tmp/mail"));
        assert_eq!(config.label_ids, vec!["INBOX", "STARRED"]);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let gmail = config.gmail_config().unwrap();
        assert_eq!(gmail.base_url, "http://localhost:8080");
        assert_eq!(gmail.user_id, "alice@example.com");
        assert_eq!(gmail.access_token.expose_secret(), "ya29.token");

        let options = config.fetch_options();
        assert_eq!(options.query.query.as_deref(), Some("newer_than:7d"));
        assert_eq!(options.query.max_results, Some(250));
        assert_eq!(options.max_pages, Some(4));
        assert_eq!(options.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = from_pairs(&[(ENV_ACCESS_TOKEN, "   "), (ENV_QUERY, "")]).unwrap();
        assert!(config.access_token.is_none());
        assert!(config.query.is_none());
    }

    #[test]
    fn gmail_config_requires_token() {
        let err = from_pairs(&[]).unwrap().gmail_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == ENV_ACCESS_TOKEN));
    }

    #[test]
    fn invalid_number_rejected() {
        let err = from_pairs(&[(ENV_PAGE_SIZE, "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_PAGE_SIZE));
    }

    #[test]
    fn store_dir_ignores_fetch_only_keys() {
        let map: HashMap<&str, &str> =
            HashMap::from([(ENV_STORE_DIR, " /var/mail "), (ENV_PAGE_SIZE, "lots"), (ENV_MAX_PAGES, "-1")]);
        let lookup = |key: &str| map.get(key).map(|v| v.to_string());

        assert!(FetchConfig::from_lookup(lookup).is_err());
        assert_eq!(FetchConfig::store_dir_from_lookup(lookup), PathBuf::from("/var/mail"));
        assert_eq!(FetchConfig::store_dir_from_lookup(|_| None), PathBuf::from("emails"));
    }

    #[test]
    fn invalid_flag_rejected() {
        assert!(from_pairs(&[(ENV_SKIP_FAILURES, "maybe")]).is_err());
        assert!(!from_pairs(&[(ENV_SKIP_FAILURES, "0")]).unwrap().skip_failures);
    }
}
