//! Polar Personal Trainer export (`.ped`). Only the first exercise of the
//! calendar is read and it carries summary values only.

use chrono::NaiveDateTime;

use super::summary::average_speed_kmh;
use super::types::{ParseError, ParseResult, ParserInfo, parse_number};
use super::xml::{child, child_number, parse_document, required_child, required_text};
use super::ExerciseParser;
use crate::model::{Exercise, ExerciseSpeed, FileType, RecordingMode};

static INFO: ParserInfo = ParserInfo {
    name: "Polar Personal Trainer Export Data",
    suffixes: &["ped"],
};

pub struct PedParser;

impl ExerciseParser for PedParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let document = parse_document(bytes)?;
        let calendar = required_child(document.root_element(), "calendar-items")?;
        let element = child(calendar, "exercise")
            .ok_or_else(|| ParseError::malformed("no exercise in calendar items"))?;

        let mut exercise = Exercise::new(FileType::PolarPed);
        exercise.device_name = Some("Polar PED".to_string());
        exercise.recording_mode = RecordingMode {
            heart_rate: true,
            speed: true,
            ..RecordingMode::default()
        };

        let time = required_text(element, "time")?;
        exercise.date_time = Some(
            NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S%.f").map_err(|err| {
                ParseError::malformed(format!("invalid exercise time '{time}'")).with_cause(err)
            })?,
        );

        let result = required_child(element, "result")?;
        let seconds = duration_seconds(required_text(result, "duration")?)?;
        exercise.duration = Some(seconds * 10);

        let distance = parse_number::<f64>(required_text(result, "distance")?, "distance")? as i32;
        exercise.speed = Some(ExerciseSpeed {
            speed_avg: average_speed_kmh(distance as f64 / 1000.0, seconds as f64),
            speed_max: 0.0,
            distance,
        });

        exercise.energy = Some(child_number(result, "calories")?.unwrap_or(0));
        let heart_rate = child(result, "heart-rate");
        let heart_rate_value = |name: &str| -> ParseResult<u16> {
            match heart_rate {
                Some(node) => Ok(child_number(node, name)?.unwrap_or(0)),
                None => Ok(0),
            }
        };
        exercise.heart_rate_avg = Some(heart_rate_value("average")?);
        exercise.heart_rate_max = Some(heart_rate_value("maximum")?);

        Ok(exercise)
    }
}

/// Durations are written as `h`, `hh:mm` or `hh:mm:ss`.
fn duration_seconds(raw: &str) -> ParseResult<u32> {
    let normalized = match raw.len() {
        0..=2 => format!("{raw}:00:00"),
        5 => format!("{raw}:00"),
        _ => raw.to_string(),
    };
    let parts: Vec<&str> = normalized.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(ParseError::malformed(format!("invalid duration '{raw}'")));
    };
    let seconds = parse_number::<f64>(seconds, "duration")? as u32;
    Ok(parse_number::<u32>(hours, "duration")? * 3600
        + parse_number::<u32>(minutes, "duration")? * 60
        + seconds)
}
