//! Exporter configuration consumed by the collector.
//!
//! The daemon owns argument parsing; this module only holds the validated
//! values and rejects the combinations the collector cannot work with.

use std::fmt;
use std::str::FromStr;

/// Configuration errors raised before any status file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The OpenVPN version selector is not one of the supported values.
    UnsupportedVersion(String),
    /// No status paths were configured.
    NoStatusPaths,
    /// A status path entry is empty (e.g. a trailing comma in the list).
    EmptyStatusPath(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedVersion(v) => write!(
                f,
                "unsupported OpenVPN version {:?}, supported versions are 2.3 and 2.4",
                v
            ),
            ConfigError::NoStatusPaths => write!(f, "at least one status path must be configured"),
            ConfigError::EmptyStatusPath(idx) => write!(f, "status path #{} is empty", idx + 1),
        }
    }
}

impl std::error::Error for ConfigError {}

/// OpenVPN release line whose status-file columns the label sets follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenVpnVersion {
    #[default]
    V2_3,
    V2_4,
}

impl OpenVpnVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            OpenVpnVersion::V2_3 => "2.3",
            OpenVpnVersion::V2_4 => "2.4",
        }
    }
}

impl FromStr for OpenVpnVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2.3" => Ok(OpenVpnVersion::V2_3),
            "2.4" => Ok(OpenVpnVersion::V2_4),
            other => Err(ConfigError::UnsupportedVersion(other.to_string())),
        }
    }
}

impl fmt::Display for OpenVpnVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one exporter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Status files to read on every pass. The path string doubles as the
    /// `status_path` label value.
    pub status_paths: Vec<String>,
    /// Collapse per-connection labels down to the common name.
    pub ignore_individuals: bool,
    pub version: OpenVpnVersion,
}

impl ExporterConfig {
    pub fn new(status_paths: Vec<String>, ignore_individuals: bool, version: OpenVpnVersion) -> Self {
        Self {
            status_paths,
            ignore_individuals,
            version,
        }
    }

    /// Checks the configuration before a collector is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_paths.is_empty() {
            return Err(ConfigError::NoStatusPaths);
        }
        if let Some(idx) = self.status_paths.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyStatusPath(idx));
        }
        Ok(())
    }
}
