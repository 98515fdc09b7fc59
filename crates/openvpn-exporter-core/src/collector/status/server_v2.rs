//! Parser for server status files that declare their columns with `HEADER`
//! directives (status versions 2 and 3; the latter is tab separated).
//!
//! ```text
//! TITLE,OpenVPN 2.3.10 x86_64-pc-linux-gnu
//! TIME,Thu Apr 13 15:48:20 2017,1492091300
//! HEADER,CLIENT_LIST,Common Name,Real Address,...
//! CLIENT_LIST,alice,203.0.113.10:51234,...
//! HEADER,ROUTING_TABLE,Virtual Address,Common Name,...
//! ROUTING_TABLE,10.8.0.6,alice,...
//! GLOBAL_STATS,Max bcast/mcast queue length,0
//! END
//! ```

use std::collections::VecDeque;

use super::section::SectionRows;
use super::{Observation, ParseError, StatusParser, parse_number};
use crate::catalog::{MetricCatalog, Section};

pub struct ServerV2Parser<'a> {
    separator: char,
    rows: SectionRows<'a>,
}

impl<'a> ServerV2Parser<'a> {
    pub fn new(catalog: &'a MetricCatalog, source: &str, separator: char) -> Self {
        Self {
            separator,
            rows: SectionRows::new(catalog, source),
        }
    }
}

impl StatusParser for ServerV2Parser<'_> {
    fn interpret_line(
        &mut self,
        line: &str,
        out: &mut VecDeque<Observation>,
    ) -> Result<(), ParseError> {
        let fields: Vec<&str> = line.split(self.separator).collect();
        match fields.as_slice() {
            ["END"] => {}
            ["GLOBAL_STATS", ..] => {}
            ["HEADER", section, columns @ ..] if !columns.is_empty() => {
                // Headers of sections without a schema are accepted and dropped.
                if let Some(section) = Section::from_key(section) {
                    self.rows.declare_header(section, columns);
                }
            }
            ["TIME", _, epoch] => {
                let updated = parse_number(epoch)?;
                out.push_back(self.rows.update_time(updated));
            }
            ["TITLE", _] => {}
            [key, values @ ..] => {
                let section =
                    Section::from_key(key).ok_or_else(|| ParseError::UnsupportedKey(key.to_string()))?;
                if section == Section::ClientList {
                    self.rows.count_client();
                }
                self.rows.emit_row(section, values, out)?;
            }
            [] => return Err(ParseError::UnsupportedKey(String::new())),
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut VecDeque<Observation>) {
        self.rows.finish(out);
    }
}
