//! # drivegate Configuration
//!
//! A minimal, transport-agnostic configuration store based on string
//! keys and values. Applications layer defaults, `.env` files and the
//! process environment into one `GateConfig`, then take an immutable
//! snapshot to read typed values from.
//!
//! ## Setting and reading values
//! ```rust
//! use drivegate_core::GateConfig;
//! let mut config = GateConfig::new();
//!
//! config.set("http.port", "3030");
//! config.set("site.protected_routes", "/private, /Team Docs");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_usize("http.port"), Some(3030));
//! assert_eq!(snapshot.get_list("site.protected_routes"), vec!["/private", "/Team Docs"]);
//! ```
//!
//! ## Environment overrides
//! `load_env` copies prefixed variables into the store:
//!
//! ```bash
//! export DRIVEGATE__DELIVERY__PROXY_THRESHOLD_BYTES=1048576
//! ```
//!
//! becomes `delivery.proxy_threshold_bytes`.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct GateConfig {
    values: HashMap<String, String>,
}

impl GateConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only when it is not present yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Load every `prefix`ed variable from the process environment.
    ///
    /// `DRIVEGATE__DRIVE__BASE_DIRECTORY` with prefix `DRIVEGATE__` → `drive.base_directory`
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> GateConfigSnapshot {
        GateConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GateConfigSnapshot {
    map: HashMap<String, String>,
}

impl GateConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Raw value; blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }

    /// Comma-separated list, trimmed, empty entries dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
