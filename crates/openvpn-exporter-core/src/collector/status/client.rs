//! Parser for the client statistics layout.
//!
//! ```text
//! OpenVPN STATISTICS
//! Updated,Thu Apr 13 15:48:27 2017
//! TUN/TAP read bytes,153789941
//! ...
//! END
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};

use super::{Observation, ParseError, StatusParser, parse_number, parse_updated_time};
use crate::catalog::MetricId;

/// Flat `key,value` scanner. The `Updated` time is local time.
pub struct ClientStatusParser {
    source: String,
}

impl ClientStatusParser {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }
}

impl StatusParser for ClientStatusParser {
    fn interpret_line(
        &mut self,
        line: &str,
        out: &mut VecDeque<Observation>,
    ) -> Result<(), ParseError> {
        let fields: Vec<&str> = line.split(',').collect();
        match fields.as_slice() {
            ["END"] | ["OpenVPN STATISTICS"] => {}
            ["Updated", value] => {
                let naive = parse_updated_time(value)?;
                let updated = resolve_local(&Local, &naive).ok_or_else(|| {
                    ParseError::MalformedTimestamp {
                        value: value.to_string(),
                    }
                })?;
                out.push_back(Observation::new(
                    MetricId::StatusUpdateTime,
                    vec![self.source.clone()],
                    updated.timestamp() as f64,
                ));
            }
            [key, value] => {
                let metric = MetricId::from_client_key(key)
                    .ok_or_else(|| ParseError::UnsupportedKey(key.to_string()))?;
                out.push_back(Observation::new(
                    metric,
                    vec![self.source.clone()],
                    parse_number(value)?,
                ));
            }
            _ => return Err(ParseError::UnsupportedKey(fields[0].to_string())),
        }
        Ok(())
    }
}

/// Maps a wall-clock time onto `tz`.
///
/// An ambiguous time takes the earlier instant. A time skipped by a forward
/// transition is read with the offset in effect before the transition.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Some(t),
        LocalResult::None => {
            let day_before = naive.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.from_local_datetime(&day_before).earliest()?.offset().fix();
            let utc = naive.checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc().into()))?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}
