//! Runtime configuration.
//!
//! Values come from the process environment, after an optional `.env` file
//! has been loaded with `dotenvy`. Every key is optional.
//!
//! | Variable | Default |
//! |---|---|
//! | `REBATE_BASE_DIR` | `.` |
//! | `REBATE_UPLOAD_DIR` | `<base>/uploads` |
//! | `REBATE_OUTPUT_DIR` | `<base>/output` |
//! | `REBATE_LOG_DIR` | `<base>/logs` |
//! | `REBATE_HOST` | `0.0.0.0` |
//! | `REBATE_PORT` | `8000` |
//! | `REBATE_MAX_UPLOAD_BYTES` | `20971520` |
//! | `REBATE_GROUP_ORDER` | `first-seen` |
//! | `REBATE_LOG_MAX_BYTES` | `2000000` |
//! | `REBATE_LOG_BACKUPS` | `5` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::transform::GroupOrder;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_LOG_MAX_BYTES: u64 = 2_000_000;
pub const DEFAULT_LOG_BACKUPS: usize = 5;

/// Server and pipeline configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Request body limit for `/api/process`.
    pub max_upload_bytes: usize,
    pub group_order: GroupOrder,
    /// Size at which `app.log` is rotated.
    pub log_max_bytes: u64,
    /// Rotated files kept (`app.log.1` .. `app.log.N`).
    pub log_backups: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_base_dir(".")
    }
}

impl AppConfig {
    /// Defaults rooted at `base`.
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            upload_dir: base.join("uploads"),
            output_dir: base.join("output"),
            log_dir: base.join("logs"),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            group_order: GroupOrder::default(),
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_backups: DEFAULT_LOG_BACKUPS,
        }
    }

    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by [`AppConfig::from_env`]
    /// and by tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("REBATE_BASE_DIR").unwrap_or_else(|| ".".to_string());
        let mut config = Self::with_base_dir(base);

        if let Some(dir) = lookup("REBATE_UPLOAD_DIR") {
            config.upload_dir = dir.into();
        }
        if let Some(dir) = lookup("REBATE_OUTPUT_DIR") {
            config.output_dir = dir.into();
        }
        if let Some(dir) = lookup("REBATE_LOG_DIR") {
            config.log_dir = dir.into();
        }
        if let Some(host) = lookup("REBATE_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "REBATE_PORT")? {
            config.port = port;
        }
        if let Some(limit) = parse_var(&lookup, "REBATE_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = limit;
        }
        if let Some(order) = parse_var(&lookup, "REBATE_GROUP_ORDER")? {
            config.group_order = order;
        }
        if let Some(max) = parse_var(&lookup, "REBATE_LOG_MAX_BYTES")? {
            config.log_max_bytes = max;
        }
        if let Some(backups) = parse_var(&lookup, "REBATE_LOG_BACKUPS")? {
            config.log_backups = backups;
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.upload_dir, Path::new("./uploads"));
        assert_eq!(config.group_order, GroupOrder::FirstSeen);
        assert_eq!(config.log_backups, 5);
    }

    #[test]
    fn test_base_dir_and_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("REBATE_BASE_DIR", "/srv/rebates"),
            ("REBATE_OUTPUT_DIR", "/tmp/out"),
            ("REBATE_PORT", "9100"),
            ("REBATE_GROUP_ORDER", "lexical"),
        ]))
        .unwrap();

        assert_eq!(config.upload_dir, Path::new("/srv/rebates/uploads"));
        assert_eq!(config.log_dir, Path::new("/srv/rebates/logs"));
        assert_eq!(config.output_dir, Path::new("/tmp/out"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.group_order, GroupOrder::Lexical);
    }

    #[test]
    fn test_invalid_value_reports_key() {
        let err = AppConfig::from_lookup(lookup(&[("REBATE_PORT", "eighty")])).unwrap_err();
        match err {
            ConfigError::Invalid { key, value } => {
                assert_eq!(key, "REBATE_PORT");
                assert_eq!(value, "eighty");
            }
        }
    }
}
