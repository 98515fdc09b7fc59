//! Parser for server status files with titled sections and inline column
//! headers (status version 1).
//!
//! ```text
//! OpenVPN CLIENT LIST
//! Updated,Thu Apr 13 15:48:22 2017
//! Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
//! bob,198.51.100.7:1194,4096,8192,Thu Apr 13 14:01:40 2017
//! ROUTING TABLE
//! Virtual Address,Common Name,Real Address,Last Ref
//! 10.8.0.10,bob,198.51.100.7:1194,Thu Apr 13 15:48:02 2017
//! GLOBAL STATS
//! Max bcast/mcast queue length,1
//! END
//! ```

use std::collections::VecDeque;

use super::section::SectionRows;
use super::{Observation, ParseError, StatusParser, parse_updated_time};
use crate::catalog::{MetricCatalog, Section};

/// Section the scanner is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    Rows(Section),
    GlobalStats,
}

pub struct ServerV4Parser<'a> {
    position: Position,
    rows: SectionRows<'a>,
}

impl<'a> ServerV4Parser<'a> {
    pub fn new(catalog: &'a MetricCatalog, source: &str) -> Self {
        Self {
            position: Position::Start,
            rows: SectionRows::new(catalog, source),
        }
    }
}

impl StatusParser for ServerV4Parser<'_> {
    fn interpret_line(
        &mut self,
        line: &str,
        out: &mut VecDeque<Observation>,
    ) -> Result<(), ParseError> {
        let fields: Vec<&str> = line.split(',').collect();
        match fields.as_slice() {
            ["END"] => {}
            ["OpenVPN CLIENT LIST", ..] => self.position = Position::Rows(Section::ClientList),
            ["GLOBAL STATS"] => self.position = Position::GlobalStats,
            ["ROUTING TABLE"] => self.position = Position::Rows(Section::RoutingTable),
            ["Virtual Address", ..] if fields.len() > 2 => {
                self.rows.declare_header(Section::RoutingTable, &fields);
            }
            ["Common Name", ..] if fields.len() > 2 => {
                self.rows.declare_header(Section::ClientList, &fields);
            }
            ["Updated", value] => {
                let updated = parse_updated_time(value)?.and_utc();
                out.push_back(self.rows.update_time(updated.timestamp() as f64));
            }
            _ => match self.position {
                Position::Rows(section) => {
                    if section == Section::ClientList {
                        self.rows.count_client();
                    }
                    self.rows.emit_row(section, &fields, out)?;
                }
                Position::GlobalStats => {}
                Position::Start => return Err(ParseError::UnsupportedKey(fields[0].to_string())),
            },
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut VecDeque<Observation>) {
        self.rows.finish(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetricId;
    use crate::collector::mock::scenarios::SERVER_V4_STATUS;
    use crate::collector::status::Observations;
    use crate::config::OpenVpnVersion;
    use chrono::NaiveDate;

    const SRC: &str = "server4.status";

    fn parse(catalog: &MetricCatalog, input: &str) -> Vec<Result<Observation, ParseError>> {
        Observations::new(
            std::io::Cursor::new(input.to_string()),
            ServerV4Parser::new(catalog, SRC),
        )
        .collect()
    }

    fn parse_ok(catalog: &MetricCatalog, input: &str) -> Vec<Observation> {
        parse(catalog, input)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        std::iter::once(SRC)
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn updated_utc() -> f64 {
        NaiveDate::from_ymd_opt(2017, 4, 13)
            .unwrap()
            .and_hms_opt(15, 48, 22)
            .unwrap()
            .and_utc()
            .timestamp() as f64
    }

    #[test]
    fn test_server_v4_fixture() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let client = labels(&["bob", "Thu Apr 13 14:01:40 2017", "198.51.100.7:1194"]);
        // the v1 routing table has no "Last Ref (time_t)" column
        assert_eq!(
            parse_ok(&catalog, SERVER_V4_STATUS),
            vec![
                Observation::new(MetricId::StatusUpdateTime, labels(&[]), updated_utc()),
                Observation::new(MetricId::ServerClientReceivedBytes, client.clone(), 4096.0),
                Observation::new(MetricId::ServerClientSentBytes, client, 8192.0),
                Observation::new(MetricId::ServerConnectedClients, labels(&[]), 1.0),
            ]
        );
    }

    #[test]
    fn test_server_v4_updated_is_utc() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let obs = parse_ok(&catalog, "OpenVPN CLIENT LIST\nUpdated,Thu Apr 13 15:48:22 2017\n");
        assert_eq!(obs[0].value, 1492098502.0);
    }

    #[test]
    fn test_server_v4_ignore_individuals() {
        let catalog = MetricCatalog::new(true, OpenVpnVersion::V2_4);
        let obs = parse_ok(&catalog, SERVER_V4_STATUS);
        assert_eq!(obs[1].labels, labels(&["bob"]));
        assert_eq!(obs[2].labels, labels(&["bob"]));
    }

    #[test]
    fn test_server_v4_route_with_time_t_column() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let input = "\
OpenVPN CLIENT LIST
ROUTING TABLE
Virtual Address,Common Name,Real Address,Last Ref,Last Ref (time_t)
10.8.0.10,bob,198.51.100.7:1194,Thu Apr 13 15:48:02 2017,1492098482
END
";
        let obs = parse_ok(&catalog, input);
        assert_eq!(
            obs[0],
            Observation::new(
                MetricId::ServerRouteLastReference,
                labels(&["bob", "198.51.100.7:1194", "10.8.0.10"]),
                1492098482.0
            )
        );
        assert_eq!(obs[1].value, 0.0);
    }

    #[test]
    fn test_server_v4_global_stats_rows_are_skipped() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let obs = parse_ok(
            &catalog,
            "OpenVPN CLIENT LIST\nGLOBAL STATS\nMax bcast/mcast queue length,1\nanything at all\nEND\n",
        );
        assert_eq!(
            obs,
            vec![Observation::new(MetricId::ServerConnectedClients, labels(&[]), 0.0)]
        );
    }

    #[test]
    fn test_server_v4_client_list_title_with_extra_fields() {
        let catalog = MetricCatalog::new(true, OpenVpnVersion::V2_4);
        let input = "\
OpenVPN CLIENT LIST,extra
Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
bob,1.1.1.1:1,1,2,now
END
";
        assert_eq!(
            parse_ok(&catalog, input),
            vec![
                Observation::new(MetricId::ServerClientReceivedBytes, labels(&["bob"]), 1.0),
                Observation::new(MetricId::ServerClientSentBytes, labels(&["bob"]), 2.0),
                Observation::new(MetricId::ServerConnectedClients, labels(&[]), 1.0),
            ]
        );
    }

    #[test]
    fn test_server_v4_row_before_header() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let got = parse(&catalog, "OpenVPN CLIENT LIST\nbob,1.1.1.1:1,1,2,now\n");
        assert!(matches!(
            got.as_slice(),
            [Err(ParseError::HeaderNotDeclared(Section::ClientList))]
        ));
    }

    #[test]
    fn test_server_v4_column_count_mismatch() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let input = "\
OpenVPN CLIENT LIST
Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
bob,1.1.1.1:1,1,2
";
        let got = parse(&catalog, input);
        assert!(matches!(
            got.as_slice(),
            [Err(ParseError::ColumnCountMismatch { expected: 5, found: 4, .. })]
        ));
    }

    #[test]
    fn test_server_v4_unsupported_key_outside_sections() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let got = parse(&catalog, "something,else\n");
        assert!(matches!(got.as_slice(), [Err(ParseError::UnsupportedKey(k))] if k == "something"));
    }

    #[test]
    fn test_server_v4_malformed_timestamp() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let got = parse(&catalog, "OpenVPN CLIENT LIST\nUpdated,2017-04-13T15:48:22Z\n");
        assert!(matches!(got.as_slice(), [Err(ParseError::MalformedTimestamp { .. })]));
    }

    #[test]
    fn test_server_v4_malformed_number_skips_tally() {
        let catalog = MetricCatalog::new(false, OpenVpnVersion::V2_4);
        let input = "\
OpenVPN CLIENT LIST
Updated,Thu Apr 13 15:48:22 2017
Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
bob,1.1.1.1:1,abc,2,now
END
";
        let got = parse(&catalog, input);
        assert_eq!(got.len(), 2);
        assert!(matches!(&got[0], Ok(o) if o.metric == MetricId::StatusUpdateTime));
        assert!(matches!(&got[1], Err(ParseError::MalformedNumber { .. })));
    }

    #[test]
    fn test_server_v4_duplicate_common_names_collapse() {
        let catalog = MetricCatalog::new(true, OpenVpnVersion::V2_4);
        let input = "\
OpenVPN CLIENT LIST
Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since
bob,1.1.1.1:1,1,2,now
bob,2.2.2.2:2,3,4,later
END
";
        let obs = parse_ok(&catalog, input);
        let sent: Vec<f64> = obs
            .iter()
            .filter(|o| o.metric == MetricId::ServerClientSentBytes)
            .map(|o| o.value)
            .collect();
        assert_eq!(sent, vec![2.0]);
        assert_eq!(obs.last().unwrap().value, 2.0);
    }
}
