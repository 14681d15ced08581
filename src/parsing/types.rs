use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

/// Display name and file suffixes a decoder advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserInfo {
    pub name: &'static str,
    pub suffixes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    FileNotFound,
    Unreadable,
    UnsupportedFormat,
    MalformedStructure,
    UnitConversionFailure,
    Configuration,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseErrorKind::FileNotFound => "file not found",
            ParseErrorKind::Unreadable => "file unreadable",
            ParseErrorKind::UnsupportedFormat => "unsupported format",
            ParseErrorKind::MalformedStructure => "malformed structure",
            ParseErrorKind::UnitConversionFailure => "invalid numeric value",
            ParseErrorKind::Configuration => "parser configuration",
        };
        f.write_str(label)
    }
}

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Failure of a single parse call. Every kind is terminal for that call.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::MalformedStructure, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::UnsupportedFormat, message)
    }

    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ParseErrorKind::FileNotFound,
            _ => ParseErrorKind::Unreadable,
        };
        Self::new(kind, format!("failed to read '{}'", path.display())).with_cause(err)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a trimmed numeric literal, naming the field in the error.
pub fn parse_number<T>(raw: &str, field: &str) -> ParseResult<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    raw.trim().parse::<T>().map_err(|err| {
        ParseError::new(
            ParseErrorKind::UnitConversionFailure,
            format!("invalid value '{}' for {field}", raw.trim()),
        )
        .with_cause(err)
    })
}

/// Decode UTF-8 text content, tolerating a leading byte order mark.
pub fn decode_text(bytes: &[u8]) -> ParseResult<&str> {
    let text = std::str::from_utf8(bytes).map_err(|err| {
        ParseError::new(ParseErrorKind::Unreadable, "content is not valid UTF-8").with_cause(err)
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse an XML schema date-time. Zoned values are normalized to UTC.
pub fn parse_iso_datetime(raw: &str) -> ParseResult<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Ok(zoned.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(|err| {
        ParseError::malformed(format!("invalid timestamp '{raw}'")).with_cause(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_errors_carry_field_name() {
        let err = parse_number::<i32>(" 12x", "Interval").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnitConversionFailure);
        assert!(err.message.contains("Interval"));
        assert!(err.cause.is_some());
    }

    #[test]
    fn parses_zoned_and_local_timestamps() {
        let zoned = parse_iso_datetime("2010-05-01T10:00:00+02:00").unwrap();
        let local = parse_iso_datetime("2010-05-01T08:00:00.000").unwrap();
        assert_eq!(zoned, local);
        assert!(parse_iso_datetime("yesterday").is_err());
    }

    #[test]
    fn strips_byte_order_mark() {
        assert_eq!(decode_text("\u{feff}[Params]".as_bytes()).unwrap(), "[Params]");
    }
}
