//! Container configuration.
//!
//! Built once when the function starts and shared read-only between
//! invocations (see [`crate::ProxyHandler::new`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process-wide translation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Charset appended to response `Content-Type` headers that lack one.
    pub default_charset: Option<String>,

    /// Filesystem roots the static short-circuit may serve from.
    pub valid_file_paths: Vec<PathBuf>,

    /// Split `a,b,c` query values into three values.
    pub expand_comma_query_values: bool,

    /// Remove `service_base_path` from incoming paths before dispatch.
    pub strip_base_path: bool,

    pub service_base_path: Option<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_charset: None,
            valid_file_paths: Vec::new(),
            expand_comma_query_values: true,
            strip_base_path: false,
            service_base_path: None,
        }
    }
}

impl ContainerConfig {
    /// Read settings from `CONTAINER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ContainerConfig::from_env`], reading variables through `lookup`.
    ///
    /// - `CONTAINER_DEFAULT_CHARSET`: charset for responses without one
    /// - `CONTAINER_STATIC_PATHS`: static roots, separated like `PATH`
    /// - `CONTAINER_EXPAND_QUERY_COMMAS`: `false`/`0` keeps `a,b` as one value
    /// - `CONTAINER_BASE_PATH`: prefix stripped from request paths
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(charset) = lookup("CONTAINER_DEFAULT_CHARSET").filter(|v| !v.is_empty()) {
            config = config.with_default_charset(charset);
        }
        if let Some(paths) = lookup("CONTAINER_STATIC_PATHS") {
            config
                .valid_file_paths
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(expand) = lookup("CONTAINER_EXPAND_QUERY_COMMAS") {
            config.expand_comma_query_values =
                !matches!(expand.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no");
        }
        if let Some(base) = lookup("CONTAINER_BASE_PATH").filter(|v| !v.is_empty()) {
            config = config.with_base_path(base);
        }
        config
    }

    pub fn with_default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = Some(charset.into());
        self
    }

    /// Allow static files under `path` to be served directly.
    pub fn with_valid_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.valid_file_paths.push(path.into());
        self
    }

    pub fn with_comma_expansion(mut self, expand: bool) -> Self {
        self.expand_comma_query_values = expand;
        self
    }

    /// Strip `base_path` (e.g. `/api`) from request paths.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        let trimmed = base_path.trim_end_matches('/');
        self.service_base_path = Some(if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        });
        self.strip_base_path = true;
        self
    }

    /// Returns `path` with the configured base path removed.
    ///
    /// Paths outside the base path are returned untouched. The result always
    /// starts with `/`.
    pub fn strip_base<'a>(&self, path: &'a str) -> &'a str {
        let base = match (&self.service_base_path, self.strip_base_path) {
            (Some(base), true) if !base.is_empty() && base != "/" => base,
            _ => return path,
        };
        match path.strip_prefix(base.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }

    /// Whether the static short-circuit is enabled at all.
    pub fn serves_static_files(&self) -> bool {
        !self.valid_file_paths.is_empty()
    }
}
