//! Status layout detection from the leading bytes of a file.

use super::ParseError;

/// Number of leading bytes inspected.
///
/// The server-v4 marker is truncated to `OpenVPN CLIENT LIS` to fit.
pub const PEEK_LEN: usize = 18;

/// Interpretation strategy chosen for a status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// Server status, `HEADER` directives, comma separated.
    ServerV2Comma,
    /// Server status, `HEADER` directives, tab separated.
    ServerV2Tab,
    /// Client statistics.
    Client,
    /// Server status with titled sections and inline headers.
    ServerV4,
}

impl StatusFormat {
    pub fn separator(self) -> char {
        match self {
            StatusFormat::ServerV2Tab => '\t',
            _ => ',',
        }
    }
}

const MARKERS: [(&[u8], StatusFormat); 4] = [
    (b"TITLE,", StatusFormat::ServerV2Comma),
    (b"TITLE\t", StatusFormat::ServerV2Tab),
    (b"OpenVPN STATISTICS", StatusFormat::Client),
    (b"OpenVPN CLIENT LIS", StatusFormat::ServerV4),
];

/// Picks the layout for a buffer holding the start of a status file.
///
/// Only the first [`PEEK_LEN`] bytes are considered.
pub fn detect(buf: &[u8]) -> Result<StatusFormat, ParseError> {
    let head = &buf[..buf.len().min(PEEK_LEN)];
    MARKERS
        .iter()
        .find(|(marker, _)| head.starts_with(marker))
        .map(|&(_, format)| format)
        .ok_or_else(|| ParseError::UnrecognizedFormat {
            prefix: String::from_utf8_lossy(head).into_owned(),
        })
}
