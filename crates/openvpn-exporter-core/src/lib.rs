//! openvpn-exporter-core — OpenVPN status-file interpretation.
//!
//! Provides:
//! - `config` — exporter configuration and validation
//! - `catalog` — metric descriptors and per-section schemas
//! - `collector` — format detection, status parsers and the collection driver

pub mod catalog;
pub mod collector;
pub mod config;

/// Crate version, reported by the daemon at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
