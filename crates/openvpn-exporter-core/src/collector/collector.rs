//! Collection driver: reads every configured status file and forwards the
//! resulting observations to a [`MetricSink`].

use std::fmt;
use std::io::{self, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::catalog::{MetricCatalog, MetricDescriptor, MetricId};
use crate::collector::status::{self, Observation, ParseError};
use crate::collector::traits::FileSystem;
use crate::config::ExporterConfig;

/// Receiver of instantiated metrics, typically a metrics registry.
pub trait MetricSink {
    /// Records one observation of `descriptor`.
    ///
    /// `labels` are ordered like `descriptor.label_names`.
    fn emit(&mut self, descriptor: &MetricDescriptor, labels: &[String], value: f64);
}

impl MetricSink for Vec<Observation> {
    fn emit(&mut self, descriptor: &MetricDescriptor, labels: &[String], value: f64) {
        self.push(Observation::new(descriptor.id, labels.to_vec(), value));
    }
}

/// Failure to collect a single status source.
#[derive(Debug)]
pub enum CollectError {
    /// The status file could not be opened or read.
    Open { path: String, source: io::Error },
    /// The status file content could not be interpreted.
    Parse { path: String, source: ParseError },
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Open { path, source } => {
                write!(f, "failed to open status file {}: {}", path, source)
            }
            CollectError::Parse { path, source } => {
                write!(f, "failed to parse status file {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Open { source, .. } => Some(source),
            CollectError::Parse { source, .. } => Some(source),
        }
    }
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub sources_up: usize,
    pub sources_down: usize,
    /// Observations forwarded to the sink, liveness gauges included.
    pub observations: usize,
    pub duration: Duration,
}

/// Reads status files and turns them into metrics.
///
/// The collector itself holds no per-pass state; every call to
/// [`Collector::collect`] starts from scratch, so concurrent passes over a
/// shared collector do not interfere.
pub struct Collector<F: FileSystem> {
    fs: F,
    catalog: MetricCatalog,
    status_paths: Vec<String>,
}

impl<F: FileSystem> Collector<F> {
    /// Creates a collector for an already validated configuration.
    pub fn new(fs: F, config: &ExporterConfig) -> Self {
        Self {
            fs,
            catalog: MetricCatalog::new(config.ignore_individuals, config.version),
            status_paths: config.status_paths.clone(),
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn status_paths(&self) -> &[String] {
        &self.status_paths
    }

    /// Configured paths that do not currently exist.
    pub fn missing_paths(&self) -> Vec<&str> {
        self.status_paths
            .iter()
            .filter(|p| !self.fs.exists(Path::new(p.as_str())))
            .map(String::as_str)
            .collect()
    }

    /// Runs one pass over all configured sources.
    ///
    /// Every source gets an `up` gauge: 1 when its file was read to the end,
    /// 0 otherwise. A failing source never stops the others.
    pub fn collect<S: MetricSink>(&self, sink: &mut S) -> CollectSummary {
        let start = Instant::now();
        let mut summary = CollectSummary::default();
        let up = self.catalog.descriptor(MetricId::Up);

        for path in &self.status_paths {
            let mut counting = CountingSink {
                inner: &mut *sink,
                count: 0,
            };
            let result = self.collect_source(path, &mut counting);
            summary.observations += counting.count;

            let value = match result {
                Ok(()) => {
                    summary.sources_up += 1;
                    1.0
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to scrape status file");
                    summary.sources_down += 1;
                    0.0
                }
            };
            sink.emit(up, std::slice::from_ref(path), value);
            summary.observations += 1;
        }

        summary.duration = start.elapsed();
        debug!(
            up = summary.sources_up,
            down = summary.sources_down,
            observations = summary.observations,
            elapsed_ms = summary.duration.as_millis() as u64,
            "collection pass finished"
        );
        summary
    }

    /// Reads one status file, emitting observations as they are parsed.
    ///
    /// On error, observations emitted before the failing line stay emitted.
    pub fn collect_source<S: MetricSink>(&self, path: &str, sink: &mut S) -> Result<(), CollectError> {
        let file = self.fs.open(Path::new(path)).map_err(|source| CollectError::Open {
            path: path.to_string(),
            source,
        })?;

        let parse_err = |source| CollectError::Parse {
            path: path.to_string(),
            source,
        };
        for observation in status::observe(BufReader::new(file), &self.catalog, path).map_err(parse_err)? {
            let observation = observation.map_err(parse_err)?;
            sink.emit(
                self.catalog.descriptor(observation.metric),
                &observation.labels,
                observation.value,
            );
        }
        Ok(())
    }
}

struct CountingSink<'s, S> {
    inner: &'s mut S,
    count: usize,
}

impl<S: MetricSink> MetricSink for CountingSink<'_, S> {
    fn emit(&mut self, descriptor: &MetricDescriptor, labels: &[String], value: f64) {
        self.count += 1;
        self.inner.emit(descriptor, labels, value);
    }
}
