//! Status-file interpretation: format detection and the per-format parsers.
//!
//! Each parser is a [`StatusParser`] that interprets one line at a time.
//! [`Observations`] wraps a parser and a line source into a lazy, one-shot
//! iterator: observations are yielded as soon as the line producing them has
//! been read, so a fatal error halfway through a file still leaves everything
//! before it emitted.

pub mod client;
pub mod dedup;
pub mod detect;
mod section;
pub mod server_v2;
pub mod server_v4;

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Split};

use chrono::NaiveDateTime;

use crate::catalog::{MetricCatalog, MetricId, Section};

pub use client::ClientStatusParser;
pub use dedup::DedupTracker;
pub use detect::{PEEK_LEN, StatusFormat, detect};
pub use server_v2::ServerV2Parser;
pub use server_v4::ServerV4Parser;

/// One metric reading: descriptor identity, label values and numeric value.
///
/// `labels` always has as many entries as the descriptor has label names.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: MetricId,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    pub fn new(metric: MetricId, labels: Vec<String>, value: f64) -> Self {
        Self {
            metric,
            labels,
            value,
        }
    }
}

/// Error that aborts the parse of a single status source.
#[derive(Debug)]
pub enum ParseError {
    /// The leading bytes match none of the known layouts.
    UnrecognizedFormat { prefix: String },
    /// A line's leading token is not recognized in its context.
    UnsupportedKey(String),
    /// A section row appeared before the section's header.
    HeaderNotDeclared(Section),
    /// A section row has a different number of fields than its header.
    ColumnCountMismatch {
        section: Section,
        expected: usize,
        found: usize,
    },
    MalformedTimestamp { value: String },
    MalformedNumber { value: String },
    /// Reading the source failed mid-stream.
    Io(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnrecognizedFormat { prefix } => {
                write!(f, "unexpected file contents: {:?}", prefix)
            }
            ParseError::UnsupportedKey(key) => write!(f, "unsupported key: {:?}", key),
            ParseError::HeaderNotDeclared(section) => {
                write!(f, "{} should be preceded by its header", section)
            }
            ParseError::ColumnCountMismatch {
                section,
                expected,
                found,
            } => write!(
                f,
                "header for {} describes {} columns, row has {}",
                section, expected, found
            ),
            ParseError::MalformedTimestamp { value } => {
                write!(f, "failed to parse updated time: {:?}", value)
            }
            ParseError::MalformedNumber { value } => {
                write!(f, "failed to parse numeric value: {:?}", value)
            }
            ParseError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

/// Line-oriented interpreter for one status layout.
pub trait StatusParser {
    /// Interprets one line, pushing any observations it yields onto `out`.
    ///
    /// Observations pushed before an error is returned are still delivered.
    fn interpret_line(&mut self, line: &str, out: &mut VecDeque<Observation>)
    -> Result<(), ParseError>;

    /// Called once after the last line when no error occurred.
    fn finish(&mut self, _out: &mut VecDeque<Observation>) {}
}

/// Lazy stream of observations from one status source.
///
/// Yields `Ok` items until the source is exhausted, or a single `Err` after
/// which the stream is fused.
pub struct Observations<R, P> {
    lines: Split<R>,
    parser: P,
    pending: VecDeque<Observation>,
    error: Option<ParseError>,
    done: bool,
}

impl<R: BufRead, P: StatusParser> Observations<R, P> {
    pub fn new(reader: R, parser: P) -> Self {
        Self {
            lines: reader.split(b'\n'),
            parser,
            pending: VecDeque::new(),
            error: None,
            done: false,
        }
    }
}

impl<R: BufRead, P: StatusParser> Iterator for Observations<R, P> {
    type Item = Result<Observation, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(obs) = self.pending.pop_front() {
                return Some(Ok(obs));
            }
            if let Some(err) = self.error.take() {
                return Some(Err(err));
            }
            if self.done {
                return None;
            }
            match self.lines.next() {
                Some(Ok(mut raw)) => {
                    if raw.last() == Some(&b'\r') {
                        raw.pop();
                    }
                    // Common names and usernames are not guaranteed to be UTF-8.
                    let line = String::from_utf8_lossy(&raw);
                    if let Err(e) = self.parser.interpret_line(&line, &mut self.pending) {
                        self.error = Some(e);
                        self.done = true;
                    }
                }
                Some(Err(e)) => {
                    self.error = Some(ParseError::Io(e));
                    self.done = true;
                }
                None => {
                    self.parser.finish(&mut self.pending);
                    self.done = true;
                }
            }
        }
    }
}

/// Stream over any of the supported layouts.
pub type StatusObservations<'a, R> = Observations<R, AnyParser<'a>>;

/// The parser selected by [`detect`].
pub enum AnyParser<'a> {
    Client(ClientStatusParser),
    ServerV2(ServerV2Parser<'a>),
    ServerV4(ServerV4Parser<'a>),
}

impl<'a> AnyParser<'a> {
    pub fn for_format(format: StatusFormat, catalog: &'a MetricCatalog, source: &str) -> Self {
        match format {
            StatusFormat::Client => AnyParser::Client(ClientStatusParser::new(source)),
            StatusFormat::ServerV2Comma | StatusFormat::ServerV2Tab => {
                AnyParser::ServerV2(ServerV2Parser::new(catalog, source, format.separator()))
            }
            StatusFormat::ServerV4 => AnyParser::ServerV4(ServerV4Parser::new(catalog, source)),
        }
    }
}

impl StatusParser for AnyParser<'_> {
    fn interpret_line(
        &mut self,
        line: &str,
        out: &mut VecDeque<Observation>,
    ) -> Result<(), ParseError> {
        match self {
            AnyParser::Client(p) => p.interpret_line(line, out),
            AnyParser::ServerV2(p) => p.interpret_line(line, out),
            AnyParser::ServerV4(p) => p.interpret_line(line, out),
        }
    }

    fn finish(&mut self, out: &mut VecDeque<Observation>) {
        match self {
            AnyParser::Client(p) => p.finish(out),
            AnyParser::ServerV2(p) => p.finish(out),
            AnyParser::ServerV4(p) => p.finish(out),
        }
    }
}

/// Detects the layout of `reader` and returns the matching observation stream.
///
/// Detection only peeks into the buffer, so the parser sees the file from its
/// first byte.
pub fn observe<'a, R: BufRead>(
    mut reader: R,
    catalog: &'a MetricCatalog,
    source: &str,
) -> Result<StatusObservations<'a, R>, ParseError> {
    let format = detect(reader.fill_buf()?)?;
    Ok(Observations::new(
        reader,
        AnyParser::for_format(format, catalog, source),
    ))
}

/// Parses a float the way status files write numbers.
pub(crate) fn parse_number(value: &str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|_| ParseError::MalformedNumber {
        value: value.to_string(),
    })
}

/// Parses the `Wed Jun 30 21:49:08 1993` convention used by `Updated` lines.
///
/// The weekday must be a valid abbreviation but is not checked against the
/// date.
pub(crate) fn parse_updated_time(value: &str) -> Result<NaiveDateTime, ParseError> {
    const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

    let malformed = || ParseError::MalformedTimestamp {
        value: value.to_string(),
    };
    let (weekday, rest) = value.split_once(' ').ok_or_else(malformed)?;
    if !WEEKDAYS.contains(&weekday) {
        return Err(malformed());
    }
    NaiveDateTime::parse_from_str(rest.trim_start(), "%b %e %H:%M:%S %Y").map_err(|_| malformed())
}
