//! Polar RS200SD session export (`.xml`), summary and laps only.

use chrono::{NaiveDate, NaiveDateTime};
use roxmltree::Node;
use tracing::debug;

use super::types::{ParseError, ParseResult, ParserInfo};
use super::xml::{children, parse_document, required_child, required_number, required_text};
use super::ExerciseParser;
use crate::model::{
    Exercise, ExerciseSpeed, FileType, HeartRateLimit, Lap, LapSpeed, RecordingMode,
};

static INFO: ParserInfo = ParserInfo {
    name: "Polar RS200SD",
    suffixes: &["xml"],
};

pub struct Rs200sdParser;

impl ExerciseParser for Rs200sdParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let document = parse_document(bytes)?;
        let session = required_child(document.root_element(), "session_data")?;

        let mut exercise = Exercise::new(FileType::PolarRs200sd);
        exercise.device_name = Some("Polar RS200".to_string());
        exercise.recording_mode = RecordingMode {
            heart_rate: true,
            ..RecordingMode::default()
        };
        exercise.date_time = Some(start_time(session)?);

        let summary = required_child(session, "summary")?;
        exercise.duration = Some((required_number::<f64>(summary, "length")? * 10.0) as u32);
        exercise.heart_rate_avg = Some(required_number(summary, "avg_hr")?);
        exercise.heart_rate_max = Some(required_number(summary, "max_hr")?);
        exercise.energy = Some(required_number(summary, "calories")?);
        let max_set_hr: u32 = required_number(summary, "max_set_hr")?;

        let sportzones = required_child(session, "sportzones")?;
        for zone in children(sportzones, "sportzone") {
            let percent = |name: &str| -> ParseResult<u16> {
                Ok((required_number::<u32>(zone, name)? * max_set_hr / 100) as u16)
            };
            exercise.heart_rate_limits.push(HeartRateLimit {
                lower_heart_rate: percent("low_percent")?,
                upper_heart_rate: percent("high_percent")?,
                time_below: None,
                time_within: required_number::<f64>(zone, "time_on")? as u32,
                time_above: None,
                is_absolute_range: true,
            });
        }

        let has_pace_data = required_text(session, "has_pace_data")?.eq_ignore_ascii_case("true");
        let distance: i32 = required_number(summary, "total_distance")?;
        if has_pace_data && distance > 0 {
            exercise.recording_mode.speed = true;
            exercise.speed = Some(ExerciseSpeed {
                speed_avg: pace_to_speed(required_number(summary, "avg_pace")?),
                speed_max: pace_to_speed(required_number(summary, "max_pace")?),
                distance,
            });
        } else if has_pace_data {
            debug!("pace data flagged without distance, speed disabled");
        }

        let laps = required_child(session, "laps")?;
        let mut parsed = children(laps, "lap")
            .map(|lap| parse_lap(lap, has_pace_data))
            .collect::<ParseResult<Vec<Lap>>>()?;

        // written newest first
        parsed.reverse();
        let mut accumulated = 0;
        for speed in parsed.iter_mut().filter_map(|lap| lap.speed.as_mut()) {
            speed.distance += accumulated;
            accumulated = speed.distance;
        }
        exercise.laps = parsed;

        Ok(exercise)
    }
}

fn start_time(session: Node<'_, '_>) -> ParseResult<NaiveDateTime> {
    let part = |name: &str| required_number::<u32>(session, name);
    let date = NaiveDate::from_ymd_opt(
        required_number::<i32>(session, "year")?,
        part("month")?,
        part("day")?,
    )
    .ok_or_else(|| ParseError::malformed("invalid session date"))?;
    date.and_hms_opt(part("start_hour")?, part("start_minute")?, part("start_second")?)
        .ok_or_else(|| ParseError::malformed("invalid session start time"))
}

fn parse_lap(lap: Node<'_, '_>, has_pace_data: bool) -> ParseResult<Lap> {
    let speed = if has_pace_data {
        Some(LapSpeed {
            speed_end: pace_to_speed(required_number(lap, "end_pace")?),
            speed_avg: pace_to_speed(required_number(lap, "avg_pace")?),
            distance: required_number(lap, "lap_length")?,
            cadence: None,
        })
    } else {
        None
    };

    Ok(Lap {
        time_split: (required_number::<f64>(lap, "lap_end_time")? * 10.0) as u32,
        heart_rate_split: Some(required_number(lap, "end_hr")?),
        heart_rate_avg: Some(required_number(lap, "avg_hr")?),
        heart_rate_max: Some(required_number(lap, "max_hr")?),
        speed,
        ..Lap::default()
    })
}

/// Seconds per kilometer to km/h. A non-positive pace means no movement.
pub fn pace_to_speed(pace: f64) -> f64 {
    if pace > 0.0 { 3600.0 / pace } else { 0.0 }
}
