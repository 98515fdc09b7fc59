//! Metric catalog: descriptor identities, their metadata and the per-section
//! column schemas used by the server parsers.
//!
//! Descriptors are built once per [`MetricCatalog`] and never change. The label
//! names of the per-client and per-route descriptors depend on the
//! ignore-individuals mode and the configured OpenVPN version, see
//! [`label_sets`].

use std::fmt;

use crate::config::OpenVpnVersion;

const NAMESPACE: &str = "openvpn";

/// Label carrying the status-source identifier.
pub const STATUS_PATH_LABEL: &str = "status_path";

/// Value kind of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Cumulative, monotonically non-decreasing value.
    Counter,
    /// Point-in-time value.
    Gauge,
}

/// Every metric the exporter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricId {
    Up,
    StatusUpdateTime,
    ServerConnectedClients,
    ClientTunTapReadBytes,
    ClientTunTapWriteBytes,
    ClientTcpUdpReadBytes,
    ClientTcpUdpWriteBytes,
    ClientAuthReadBytes,
    ClientPreCompressBytes,
    ClientPostCompressBytes,
    ClientPreDecompressBytes,
    ClientPostDecompressBytes,
    ServerClientReceivedBytes,
    ServerClientSentBytes,
    ServerRouteLastReference,
}

impl MetricId {
    pub const ALL: [MetricId; 15] = [
        MetricId::Up,
        MetricId::StatusUpdateTime,
        MetricId::ServerConnectedClients,
        MetricId::ClientTunTapReadBytes,
        MetricId::ClientTunTapWriteBytes,
        MetricId::ClientTcpUdpReadBytes,
        MetricId::ClientTcpUdpWriteBytes,
        MetricId::ClientAuthReadBytes,
        MetricId::ClientPreCompressBytes,
        MetricId::ClientPostCompressBytes,
        MetricId::ClientPreDecompressBytes,
        MetricId::ClientPostDecompressBytes,
        MetricId::ServerClientReceivedBytes,
        MetricId::ServerClientSentBytes,
        MetricId::ServerRouteLastReference,
    ];

    /// Maps a key of the client statistics file to its traffic counter.
    ///
    /// Returns `None` for anything that is not one of the nine traffic keys.
    pub fn from_client_key(key: &str) -> Option<MetricId> {
        match key {
            "TUN/TAP read bytes" => Some(MetricId::ClientTunTapReadBytes),
            "TUN/TAP write bytes" => Some(MetricId::ClientTunTapWriteBytes),
            "TCP/UDP read bytes" => Some(MetricId::ClientTcpUdpReadBytes),
            "TCP/UDP write bytes" => Some(MetricId::ClientTcpUdpWriteBytes),
            "Auth read bytes" => Some(MetricId::ClientAuthReadBytes),
            "pre-compress bytes" => Some(MetricId::ClientPreCompressBytes),
            "post-compress bytes" => Some(MetricId::ClientPostCompressBytes),
            "pre-decompress bytes" => Some(MetricId::ClientPreDecompressBytes),
            "post-decompress bytes" => Some(MetricId::ClientPostDecompressBytes),
            _ => None,
        }
    }

    /// (subsystem, name, help, kind)
    fn meta(self) -> (&'static str, &'static str, &'static str, ValueKind) {
        use ValueKind::*;
        match self {
            MetricId::Up => (
                "",
                "up",
                "Whether scraping OpenVPN's metrics was successful.",
                Gauge,
            ),
            MetricId::StatusUpdateTime => (
                "",
                "status_update_time_seconds",
                "UNIX timestamp at which the OpenVPN statistics were updated.",
                Gauge,
            ),
            MetricId::ServerConnectedClients => (
                "",
                "server_connected_clients",
                "Number Of Connected Clients",
                Gauge,
            ),
            MetricId::ClientTunTapReadBytes => (
                "client",
                "tun_tap_read_bytes_total",
                "Total amount of TUN/TAP traffic read, in bytes.",
                Counter,
            ),
            MetricId::ClientTunTapWriteBytes => (
                "client",
                "tun_tap_write_bytes_total",
                "Total amount of TUN/TAP traffic written, in bytes.",
                Counter,
            ),
            MetricId::ClientTcpUdpReadBytes => (
                "client",
                "tcp_udp_read_bytes_total",
                "Total amount of TCP/UDP traffic read, in bytes.",
                Counter,
            ),
            MetricId::ClientTcpUdpWriteBytes => (
                "client",
                "tcp_udp_write_bytes_total",
                "Total amount of TCP/UDP traffic written, in bytes.",
                Counter,
            ),
            MetricId::ClientAuthReadBytes => (
                "client",
                "auth_read_bytes_total",
                "Total amount of authentication traffic read, in bytes.",
                Counter,
            ),
            MetricId::ClientPreCompressBytes => (
                "client",
                "pre_compress_bytes_total",
                "Total amount of data before compression, in bytes.",
                Counter,
            ),
            MetricId::ClientPostCompressBytes => (
                "client",
                "post_compress_bytes_total",
                "Total amount of data after compression, in bytes.",
                Counter,
            ),
            MetricId::ClientPreDecompressBytes => (
                "client",
                "pre_decompress_bytes_total",
                "Total amount of data before decompression, in bytes.",
                Counter,
            ),
            MetricId::ClientPostDecompressBytes => (
                "client",
                "post_decompress_bytes_total",
                "Total amount of data after decompression, in bytes.",
                Counter,
            ),
            MetricId::ServerClientReceivedBytes => (
                "server",
                "client_received_bytes_total",
                "Amount of data received over a connection on the VPN server, in bytes.",
                Counter,
            ),
            MetricId::ServerClientSentBytes => (
                "server",
                "client_sent_bytes_total",
                "Amount of data sent over a connection on the VPN server, in bytes.",
                Counter,
            ),
            MetricId::ServerRouteLastReference => (
                "server",
                "route_last_reference_time_seconds",
                "Time at which a route was last referenced, in seconds.",
                Gauge,
            ),
        }
    }
}

/// Immutable metric identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub id: MetricId,
    /// Fully qualified name, e.g. `openvpn_client_auth_read_bytes_total`.
    pub name: String,
    pub help: &'static str,
    pub label_names: Vec<&'static str>,
    pub kind: ValueKind,
}

impl MetricDescriptor {
    fn new(id: MetricId, label_names: &[&'static str]) -> Self {
        let (subsystem, name, help, kind) = id.meta();
        Self {
            id,
            name: fq_name(subsystem, name),
            help,
            label_names: label_names.to_vec(),
            kind,
        }
    }
}

fn fq_name(subsystem: &str, name: &str) -> String {
    if subsystem.is_empty() {
        format!("{}_{}", NAMESPACE, name)
    } else {
        format!("{}_{}_{}", NAMESPACE, subsystem, name)
    }
}

/// Row-bearing section of a server status file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ClientList,
    RoutingTable,
}

impl Section {
    /// Section named by the leading field of a server-v2 row or `HEADER` line.
    pub fn from_key(key: &str) -> Option<Section> {
        match key {
            "CLIENT_LIST" => Some(Section::ClientList),
            "ROUTING_TABLE" => Some(Section::RoutingTable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::ClientList => "CLIENT_LIST",
            Section::RoutingTable => "ROUTING_TABLE",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A descriptor whose value is read from a named column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub column: &'static str,
    pub metric: MetricId,
}

/// Which columns of a section become labels and which become values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSchema {
    pub label_columns: &'static [&'static str],
    pub fields: Vec<SchemaField>,
}

/// Label names and label columns for the two server sections.
///
/// The label name lists start with `status_path`; the column lists do not,
/// since that value comes from the source identifier rather than the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSets {
    pub client_labels: &'static [&'static str],
    pub client_label_columns: &'static [&'static str],
    pub routing_labels: &'static [&'static str],
    pub routing_label_columns: &'static [&'static str],
}

const COLLAPSED: LabelSets = LabelSets {
    client_labels: &[STATUS_PATH_LABEL, "common_name"],
    client_label_columns: &["Common Name"],
    routing_labels: &[STATUS_PATH_LABEL, "common_name"],
    routing_label_columns: &["Common Name"],
};

const ROUTING_LABELS: &[&str] = &[STATUS_PATH_LABEL, "common_name", "real_address", "virtual_address"];
const ROUTING_LABEL_COLUMNS: &[&str] = &["Common Name", "Real Address", "Virtual Address"];

/// Returns the label sets for the given mode and version.
///
/// With `ignore_individuals` both sections collapse to the source identifier
/// plus the common name, keeping label cardinality bounded by the number of
/// distinct certificates.
pub fn label_sets(ignore_individuals: bool, version: OpenVpnVersion) -> LabelSets {
    if ignore_individuals {
        return COLLAPSED;
    }
    match version {
        OpenVpnVersion::V2_3 => LabelSets {
            client_labels: &[
                STATUS_PATH_LABEL,
                "common_name",
                "connection_time",
                "real_address",
                "virtual_address",
                "username",
            ],
            client_label_columns: &[
                "Common Name",
                "Connected Since (time_t)",
                "Real Address",
                "Virtual Address",
                "Username",
            ],
            routing_labels: ROUTING_LABELS,
            routing_label_columns: ROUTING_LABEL_COLUMNS,
        },
        OpenVpnVersion::V2_4 => LabelSets {
            client_labels: &[STATUS_PATH_LABEL, "common_name", "connection_time", "real_address"],
            client_label_columns: &["Common Name", "Connected Since", "Real Address"],
            routing_labels: ROUTING_LABELS,
            routing_label_columns: ROUTING_LABEL_COLUMNS,
        },
    }
}

/// Registry of all descriptors plus the server section schemas.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    descriptors: Vec<MetricDescriptor>,
    client_list: SectionSchema,
    routing_table: SectionSchema,
}

impl MetricCatalog {
    pub fn new(ignore_individuals: bool, version: OpenVpnVersion) -> Self {
        let labels = label_sets(ignore_individuals, version);

        let descriptors = MetricId::ALL
            .iter()
            .map(|&id| {
                let names: &[&'static str] = match id {
                    MetricId::ServerClientReceivedBytes | MetricId::ServerClientSentBytes => {
                        labels.client_labels
                    }
                    MetricId::ServerRouteLastReference => labels.routing_labels,
                    _ => &[STATUS_PATH_LABEL],
                };
                MetricDescriptor::new(id, names)
            })
            .collect();

        Self {
            descriptors,
            client_list: SectionSchema {
                label_columns: labels.client_label_columns,
                fields: vec![
                    SchemaField {
                        column: "Bytes Received",
                        metric: MetricId::ServerClientReceivedBytes,
                    },
                    SchemaField {
                        column: "Bytes Sent",
                        metric: MetricId::ServerClientSentBytes,
                    },
                ],
            },
            routing_table: SectionSchema {
                label_columns: labels.routing_label_columns,
                fields: vec![SchemaField {
                    column: "Last Ref (time_t)",
                    metric: MetricId::ServerRouteLastReference,
                }],
            },
        }
    }

    pub fn descriptor(&self, id: MetricId) -> &MetricDescriptor {
        // `descriptors` is built from `MetricId::ALL`, whose order matches the
        // enum discriminants.
        &self.descriptors[id as usize]
    }

    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    pub fn schema(&self, section: Section) -> &SectionSchema {
        match section {
            Section::ClientList => &self.client_list,
            Section::RoutingTable => &self.routing_table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup_matches_id() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_3);
        for id in MetricId::ALL {
            assert_eq!(catalog.descriptor(id).id, id);
        }
    }

    #[test]
    fn test_descriptor_names() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_3);
        assert_eq!(catalog.descriptor(MetricId::Up).name, "openvpn_up");
        assert_eq!(
            catalog.descriptor(MetricId::StatusUpdateTime).name,
            "openvpn_status_update_time_seconds"
        );
        assert_eq!(
            catalog.descriptor(MetricId::ServerConnectedClients).name,
            "openvpn_server_connected_clients"
        );
        assert_eq!(
            catalog.descriptor(MetricId::ClientTunTapReadBytes).name,
            "openvpn_client_tun_tap_read_bytes_total"
        );
        assert_eq!(
            catalog.descriptor(MetricId::ServerRouteLastReference).name,
            "openvpn_server_route_last_reference_time_seconds"
        );
    }

    #[test]
    fn test_value_kinds() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let counters = catalog
            .descriptors()
            .iter()
            .filter(|d| d.kind == ValueKind::Counter)
            .count();
        // nine client traffic counters plus received/sent
        assert_eq!(counters, 11);
        assert_eq!(catalog.descriptor(MetricId::ServerRouteLastReference).kind, ValueKind::Gauge);
    }

    #[test]
    fn test_client_key_mapping() {
        assert_eq!(
            MetricId::from_client_key("TUN/TAP read bytes"),
            Some(MetricId::ClientTunTapReadBytes)
        );
        assert_eq!(
            MetricId::from_client_key("post-decompress bytes"),
            Some(MetricId::ClientPostDecompressBytes)
        );
        assert_eq!(MetricId::from_client_key("tun/tap read bytes"), None);
        assert_eq!(MetricId::from_client_key("Updated"), None);

        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_3);
        let mapped = MetricId::ALL
            .iter()
            .filter(|id| catalog.descriptor(**id).name.starts_with("openvpn_client_"))
            .count();
        assert_eq!(mapped, 9);
    }

    #[test]
    fn test_label_sets_v2_3() {
        let sets = label_sets(false, OpenVpnVersion::V2_3);
        assert_eq!(sets.client_labels.len(), sets.client_label_columns.len() + 1);
        assert_eq!(sets.routing_labels.len(), sets.routing_label_columns.len() + 1);
        assert!(sets.client_label_columns.contains(&"Connected Since (time_t)"));
        assert!(sets.client_labels.contains(&"username"));
    }

    #[test]
    fn test_label_sets_v2_4() {
        let sets = label_sets(false, OpenVpnVersion::V2_4);
        assert_eq!(sets.client_labels, &["status_path", "common_name", "connection_time", "real_address"]);
        assert_eq!(sets.client_label_columns, &["Common Name", "Connected Since", "Real Address"]);
        assert_eq!(sets.routing_label_columns, &["Common Name", "Real Address", "Virtual Address"]);
    }

    #[test]
    fn test_label_sets_collapsed() {
        for version in [OpenVpnVersion::V2_3, OpenVpnVersion::V2_4] {
            let sets = label_sets(true, version);
            assert_eq!(sets.client_labels, &["status_path", "common_name"]);
            assert_eq!(sets.routing_labels, &["status_path", "common_name"]);
            assert_eq!(sets.client_label_columns, &["Common Name"]);
            assert_eq!(sets.routing_label_columns, &["Common Name"]);
        }
    }

    #[test]
    fn test_catalog_applies_label_sets() {
        let catalog = MetricCatalog::new(true, OpenVpnVersion::V2_3);
        assert_eq!(
            catalog.descriptor(MetricId::ServerClientSentBytes).label_names,
            vec!["status_path", "common_name"]
        );
        assert_eq!(catalog.descriptor(MetricId::Up).label_names, vec!["status_path"]);
        assert_eq!(catalog.schema(Section::ClientList).fields.len(), 2);
        assert_eq!(
            catalog.schema(Section::RoutingTable).fields[0].column,
            "Last Ref (time_t)"
        );
    }

    #[test]
    fn test_section_keys() {
        assert_eq!(Section::from_key("CLIENT_LIST"), Some(Section::ClientList));
        assert_eq!(Section::from_key("ROUTING_TABLE"), Some(Section::RoutingTable));
        assert_eq!(Section::from_key("GLOBAL_STATS"), None);
        assert_eq!(Section::RoutingTable.to_string(), "ROUTING_TABLE");
    }
}
