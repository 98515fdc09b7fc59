//! Status-file collection for OpenVPN.
//!
//! Reads the status files written by OpenVPN clients and servers and turns
//! them into metric observations, with support for mocking the filesystem in
//! tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Collector                           │
//! │   for each status path:                                      │
//! │   ┌──────────────┐   ┌──────────────────────────────────┐    │
//! │   │    detect    │──▶│ ClientStatusParser               │    │
//! │   │ (first bytes)│   │ ServerV2Parser (comma / tab)     │    │
//! │   └──────┬───────┘   │ ServerV4Parser                   │    │
//! │          │           └───────────────┬──────────────────┘    │
//! │   ┌──────▼──────┐                    │ Observation stream    │
//! │   │  FileSystem │ (trait)    ┌───────▼───────┐               │
//! │   └──────┬──────┘            │  MetricSink   │ (trait)       │
//! └──────────┼───────────────────┴───────────────┴───────────────┘
//!            │
//!     ┌──────┴───────┬───────────────┐
//!     │              │               │
//! ┌───▼────┐   ┌─────▼─────┐   ┌─────▼─────┐
//! │ RealFs │   │  MockFs   │   │ Scenarios │
//! └────────┘   └───────────┘   └───────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use openvpn_exporter_core::collector::{Collector, RealFs};
//!
//! let collector = Collector::new(RealFs::new(), &config);
//! collector.collect(&mut sink);
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use openvpn_exporter_core::collector::mock::scenarios::{CLIENT_PATH, SERVER_V2_PATH};
//! use openvpn_exporter_core::collector::status::Observation;
//! use openvpn_exporter_core::collector::{Collector, MockFs};
//! use openvpn_exporter_core::config::{ExporterConfig, OpenVpnVersion};
//!
//! let config = ExporterConfig::new(
//!     vec![CLIENT_PATH.to_string(), SERVER_V2_PATH.to_string()],
//!     false,
//!     OpenVpnVersion::V2_3,
//! );
//! let collector = Collector::new(MockFs::openvpn_fleet(), &config);
//! let mut observations: Vec<Observation> = Vec::new();
//! let summary = collector.collect(&mut observations);
//! assert_eq!(summary.sources_up, 2);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod status;
pub mod traits;

pub use collector::{CollectError, CollectSummary, Collector, MetricSink};
pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
