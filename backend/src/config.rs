//! Environment configuration.
//!
//! | Variable                       | Meaning                                       |
//! |--------------------------------|-----------------------------------------------|
//! | `DOCIMPORT_MEDIA_COLLECTION`   | asset collection every URL is resolved into   |
//! | `DOCIMPORT_ALLOWED_MIME_TYPES` | comma-separated allow-list for asset URLs     |
//! | `DOCIMPORT_DEFAULT_LOCALE`     | locale used when a run names none             |
//! | `DOCIMPORT_DEBUG`              | progress and per-row error logging            |
//! | `DOCIMPORT_STORE_URL`          | base URL of a remote document API             |
//! | `DOCIMPORT_AUTHORIZATION`      | `Authorization` header sent to that API       |
//!
//! A `.env` file in the working directory is loaded first. CLI flags override
//! whatever is found here.

use std::env;

use crate::error::ConfigError;

pub const ENV_MEDIA_COLLECTION: &str = "DOCIMPORT_MEDIA_COLLECTION";
pub const ENV_ALLOWED_MIME_TYPES: &str = "DOCIMPORT_ALLOWED_MIME_TYPES";
pub const ENV_DEFAULT_LOCALE: &str = "DOCIMPORT_DEFAULT_LOCALE";
pub const ENV_DEBUG: &str = "DOCIMPORT_DEBUG";
pub const ENV_STORE_URL: &str = "DOCIMPORT_STORE_URL";
pub const ENV_AUTHORIZATION: &str = "DOCIMPORT_AUTHORIZATION";

/// Where asset URLs end up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaConfig {
    /// Collection used for every asset, overriding the field's own target.
    pub collection: Option<String>,
    /// Accepted content types. Empty accepts everything.
    pub allowed_mime_types: Vec<String>,
}

/// Import configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportConfig {
    pub media: MediaConfig,
    pub default_locale: Option<String>,
    pub debug: bool,
    pub store_url: Option<String>,
    pub authorization: Option<String>,
}

impl ImportConfig {
    /// Load from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load from any variable source. Blank values count as unset.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let allowed_mime_types = match get(ENV_ALLOWED_MIME_TYPES) {
            Some(list) => parse_mime_types(&list)?,
            None => Vec::new(),
        };
        let debug = match get(ENV_DEBUG) {
            Some(flag) => parse_flag(ENV_DEBUG, &flag)?,
            None => false,
        };

        Ok(Self {
            media: MediaConfig {
                collection: get(ENV_MEDIA_COLLECTION),
                allowed_mime_types,
            },
            default_locale: get(ENV_DEFAULT_LOCALE),
            debug,
            store_url: get(ENV_STORE_URL),
            authorization: get(ENV_AUTHORIZATION),
        })
    }
}

fn parse_mime_types(list: &str) -> Result<Vec<String>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            if m.contains('/') {
                Ok(m.to_lowercase())
            } else {
                Err(ConfigError::InvalidValue {
                    key: ENV_ALLOWED_MIME_TYPES.to_string(),
                    message: format!("'{}' is not a MIME type", m),
                })
            }
        })
        .collect()
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ImportConfig, ConfigError> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ImportConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment() {
        assert_eq!(load(&[]).unwrap(), ImportConfig::default());
    }

    #[test]
    fn test_full_environment() {
        let config = load(&[
            (ENV_MEDIA_COLLECTION, "media"),
            (ENV_ALLOWED_MIME_TYPES, "image/png, Image/JPEG,,"),
            (ENV_DEFAULT_LOCALE, "fr"),
            (ENV_DEBUG, "yes"),
            (ENV_STORE_URL, "http://localhost:3000"),
            (ENV_AUTHORIZATION, "users API-Key abc"),
        ])
        .unwrap();

        assert_eq!(config.media.collection.as_deref(), Some("media"));
        assert_eq!(config.media.allowed_mime_types, vec!["image/png", "image/jpeg"]);
        assert_eq!(config.default_locale.as_deref(), Some("fr"));
        assert!(config.debug);
        assert_eq!(config.store_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.authorization.as_deref(), Some("users API-Key abc"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[(ENV_MEDIA_COLLECTION, "  "), (ENV_DEBUG, "")]).unwrap();
        assert_eq!(config.media.collection, None);
        assert!(!config.debug);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[(ENV_DEBUG, "maybe")]).unwrap_err();
        assert!(err.to_string().contains(ENV_DEBUG));

        let err = load(&[(ENV_ALLOWED_MIME_TYPES, "image/png,pdf")]).unwrap_err();
        assert!(err.to_string().contains("'pdf' is not a MIME type"));
    }
}
