//! Mock filesystem and status-file scenarios for tests.

mod filesystem;
pub mod scenarios;

pub use filesystem::MockFs;
