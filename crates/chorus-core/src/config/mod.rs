//! Proxy configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: serde field defaults on [`AppConfig`]
//! 2. **Config file**: YAML file passed to [`AppConfig::from_file`]
//! 3. **Environment variables**: `CHORUS__*` env vars override specific fields
//!
//! # Validation
//!
//! [`AppConfig::validate`] runs once at startup: an empty worker list, a
//! non-HTTP worker URI, a `^` inside a URI, or a zero port/timeout are all
//! fatal. The selection mode is a closed enum, so an unrecognized
//! `select_worker_mode` string already fails deserialization.
//!
//! # Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 5000
//! request_timeout_seconds: 30
//! workers:
//!   - http://127.0.0.1:5001
//!   - http://127.0.0.1:5002
//! select_worker_mode: most_of_all
//! cache_all_jsonrpc_methods: true
//! ```

use crate::{cache::CachePolicy, upstream::SelectionMode};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Root proxy configuration.
///
/// The method-list fields `jsonrpc_query_methods`, `open_methods_whitelist`
/// and `cache_jsonrpc_methods_whitelist` are accepted and retained but not
/// consulted by any decision; they are part of the accepted surface so that
/// existing config files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP listener binds to. Defaults to `0.0.0.0`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP listener binds to. Must be greater than 0. Defaults to `5000`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Ceiling on collecting worker replies, in seconds. Defaults to `30`.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Ordered list of upstream worker URIs. Cannot be empty.
    #[serde(default)]
    pub workers: Vec<String>,

    /// Declared but unused method list, retained for config compatibility.
    #[serde(default)]
    pub jsonrpc_query_methods: Vec<String>,

    /// Declared but unused flag, retained for config compatibility.
    #[serde(default)]
    pub open_methods_whitelist: bool,

    /// Memoize every method's responses.
    #[serde(default)]
    pub cache_all_jsonrpc_methods: bool,

    /// Memoize all methods except those in the blacklist.
    ///
    /// The wire name spells `black_list` while the list below spells
    /// `blacklist`; the inconsistency is part of the accepted surface.
    #[serde(default, rename = "cache_json_rpc_methods_with_black_list")]
    pub cache_jsonrpc_methods_with_blacklist: bool,

    /// Declared but unused list; whitelist-based caching is not wired in.
    #[serde(default)]
    pub cache_jsonrpc_methods_whitelist: Vec<String>,

    /// Methods excluded from memoization when blacklist mode is on.
    #[serde(default)]
    pub cache_jsonrpc_methods_blacklist: Vec<String>,

    /// How workers are chosen per request. Defaults to `only_first`.
    #[serde(default)]
    pub select_worker_mode: SelectionMode,

    /// Optional file that mirrors the process log output.
    #[serde(default)]
    pub logpath: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout_seconds(),
            workers: Vec::new(),
            jsonrpc_query_methods: Vec::new(),
            open_methods_whitelist: false,
            cache_all_jsonrpc_methods: false,
            cache_jsonrpc_methods_with_blacklist: false,
            cache_jsonrpc_methods_whitelist: Vec::new(),
            cache_jsonrpc_methods_blacklist: Vec::new(),
            select_worker_mode: SelectionMode::default(),
            logpath: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables with the `CHORUS__` prefix can override any
    /// field (e.g. `CHORUS__PORT=8080`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if a
    /// field fails to deserialize, including an unrecognized
    /// `select_worker_mode` string.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(true))
            .add_source(Environment::with_prefix("CHORUS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers.is_empty() {
            return Err("No workers configured".to_string());
        }

        for worker in &self.workers {
            if !worker.starts_with("http") {
                return Err(format!("Invalid worker URI {worker}: expected an http(s) endpoint"));
            }
            // '^' joins worker URI and request body in cache keys
            if worker.contains('^') {
                return Err(format!("Invalid worker URI {worker}: '^' is reserved"));
            }
        }

        if self.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        if self.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Returns the reply-collection deadline as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Returns the `host:port` string the HTTP listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Derives the method-cacheability policy from the cache flags.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            cache_all: self.cache_all_jsonrpc_methods,
            blacklist_enabled: self.cache_jsonrpc_methods_with_blacklist,
            blacklist: self.cache_jsonrpc_methods_blacklist.clone(),
        }
    }
}
