//! Prometheus registry fed by the collector.

use std::collections::{HashMap, HashSet};

use prometheus::{CounterVec, Encoder as _, GaugeVec, Opts, Registry, TextEncoder};
use tracing::{debug, warn};

use openvpn_exporter_core::catalog::{MetricDescriptor, MetricId, ValueKind};
use openvpn_exporter_core::collector::MetricSink;

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

/// Per-scrape registry. Metric families are created on first emission so
/// that descriptors nobody observed are not exported.
pub(crate) struct RegistrySink {
    registry: Registry,
    families: HashMap<MetricId, Family>,
    emitted: HashSet<(MetricId, Vec<String>)>,
}

impl RegistrySink {
    pub(crate) fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    fn family(&mut self, descriptor: &MetricDescriptor) -> Result<&Family, prometheus::Error> {
        if !self.families.contains_key(&descriptor.id) {
            let opts = Opts::new(descriptor.name.as_str(), descriptor.help);
            let family = match descriptor.kind {
                ValueKind::Gauge => {
                    let vec = GaugeVec::new(opts, &descriptor.label_names)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Gauge(vec)
                }
                ValueKind::Counter => {
                    let vec = CounterVec::new(opts, &descriptor.label_names)?;
                    self.registry.register(Box::new(vec.clone()))?;
                    Family::Counter(vec)
                }
            };
            self.families.insert(descriptor.id, family);
        }
        self.families
            .get(&descriptor.id)
            .ok_or_else(|| prometheus::Error::Msg(format!("{} not registered", descriptor.name)))
    }

    fn record(
        &mut self,
        descriptor: &MetricDescriptor,
        labels: &[String],
        value: f64,
    ) -> Result<(), prometheus::Error> {
        let values: Vec<&str> = labels.iter().map(String::as_str).collect();
        match self.family(descriptor)? {
            Family::Gauge(vec) => vec.get_metric_with_label_values(&values)?.set(value),
            Family::Counter(vec) => {
                if value.is_nan() || value < 0.0 {
                    warn!(metric = %descriptor.name, value, "dropping invalid counter value");
                    return Ok(());
                }
                vec.get_metric_with_label_values(&values)?.inc_by(value);
            }
        }
        Ok(())
    }

    /// Number of metric families registered so far.
    pub(crate) fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub(crate) fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = String::new();
        encoder.encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    pub(crate) fn content_type() -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl MetricSink for RegistrySink {
    fn emit(&mut self, descriptor: &MetricDescriptor, labels: &[String], value: f64) {
        // A status path listed twice yields the same label tuple twice; the
        // first reading wins.
        if !self.emitted.insert((descriptor.id, labels.to_vec())) {
            debug!(metric = %descriptor.name, labels = ?labels, "duplicate observation dropped");
            return;
        }
        if let Err(e) = self.record(descriptor, labels, value) {
            warn!(metric = %descriptor.name, error = %e, "failed to record metric");
        }
    }
}
