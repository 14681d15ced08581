//! Garmin FIT activity files (`.fit`).

pub mod accumulator;
pub mod devices;
pub mod messages;

use std::collections::HashSet;
use std::io::Cursor;

use fitparser::de::{DecodeOption, from_reader_with_options};
use tracing::debug;

use super::types::{ParseError, ParseResult, ParserInfo};
use super::ExerciseParser;
use crate::model::Exercise;
use accumulator::FitAccumulator;
use messages::FitMessage;

static INFO: ParserInfo = ParserInfo {
    name: "Garmin FIT",
    suffixes: &["fit"],
};

pub struct FitParser;

impl ExerciseParser for FitParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        // legacy fields stay next to their enhanced expansion
        let options: HashSet<DecodeOption> = [DecodeOption::KeepCompositeFields].into();
        let mut cursor = Cursor::new(bytes);
        let records = from_reader_with_options(&mut cursor, &options)
            .map_err(|err| ParseError::malformed(format!("failed to decode FIT data: {err}")))?;
        debug!(records = records.len(), "decoded fit records");

        let mut accumulator = FitAccumulator::new();
        for message in records.iter().filter_map(FitMessage::from_record) {
            accumulator.push(message);
        }
        accumulator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::types::ParseErrorKind;

    #[test]
    fn garbage_is_malformed() {
        let err = FitParser.decode(b"definitely not a fit file").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }
}
