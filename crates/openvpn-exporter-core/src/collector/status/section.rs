//! Row handling shared by the two server layouts.

use std::collections::{HashMap, VecDeque};
use std::iter;

use tracing::debug;

use super::dedup::DedupTracker;
use super::{Observation, ParseError, parse_number};
use crate::catalog::{MetricCatalog, MetricId, Section};

/// Transient state of one server-file parse: declared headers, dedup history
/// and the connected-client tally.
pub(crate) struct SectionRows<'a> {
    catalog: &'a MetricCatalog,
    source: String,
    headers: HashMap<Section, Vec<String>>,
    dedup: DedupTracker,
    connected_clients: u64,
}

impl<'a> SectionRows<'a> {
    pub(crate) fn new(catalog: &'a MetricCatalog, source: &str) -> Self {
        Self {
            catalog,
            source: source.to_string(),
            headers: HashMap::new(),
            dedup: DedupTracker::new(),
            connected_clients: 0,
        }
    }

    /// Sets the column list for `section`, replacing any earlier header.
    pub(crate) fn declare_header(&mut self, section: Section, columns: &[&str]) {
        self.headers
            .insert(section, columns.iter().map(|c| c.to_string()).collect());
    }

    pub(crate) fn count_client(&mut self) {
        self.connected_clients += 1;
    }

    pub(crate) fn update_time(&self, timestamp: f64) -> Observation {
        Observation::new(MetricId::StatusUpdateTime, vec![self.source.clone()], timestamp)
    }

    /// Maps one data row onto the section schema and emits its observations.
    ///
    /// `values` holds the row's fields without any leading section key.
    pub(crate) fn emit_row(
        &mut self,
        section: Section,
        values: &[&str],
        out: &mut VecDeque<Observation>,
    ) -> Result<(), ParseError> {
        let columns = self
            .headers
            .get(&section)
            .ok_or(ParseError::HeaderNotDeclared(section))?;
        if values.len() != columns.len() {
            return Err(ParseError::ColumnCountMismatch {
                section,
                expected: columns.len(),
                found: values.len(),
            });
        }

        let row: HashMap<&str, &str> = columns
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();

        let schema = self.catalog.schema(section);
        let labels: Vec<String> = iter::once(self.source.clone())
            .chain(
                schema
                    .label_columns
                    .iter()
                    .map(|column| row.get(column).copied().unwrap_or_default().to_string()),
            )
            .collect();

        for field in &schema.fields {
            let Some(raw) = row.get(field.column) else {
                continue;
            };
            if self.dedup.seen(field.metric, &labels) {
                debug!(
                    column = field.column,
                    labels = ?labels,
                    "metric entry with same labels"
                );
                continue;
            }
            let value = parse_number(raw)?;
            out.push_back(Observation::new(field.metric, labels.clone(), value));
            self.dedup.record(field.metric, &labels);
        }
        Ok(())
    }

    /// Emits the connected-client tally.
    pub(crate) fn finish(&mut self, out: &mut VecDeque<Observation>) {
        out.push_back(Observation::new(
            MetricId::ServerConnectedClients,
            vec![self.source.clone()],
            self.connected_clients as f64,
        ));
    }
}
