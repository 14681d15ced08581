//! TopoGrafix GPX 1.1 tracks (`.gpx`).
//!
//! GPX only stores positions. Distances come from the haversine formula and
//! speed from consecutive timestamps.

use chrono::NaiveDateTime;
use roxmltree::Node;
use tracing::debug;

use super::summary::{
    altitude_summary, average_speed_kmh, haversine_distance, heart_rate_avg_max, max_sample_speed,
};
use super::types::{ParseError, ParseResult, ParserInfo, parse_iso_datetime, parse_number};
use super::xml::{child, child_text, children, descendant, parse_document, path, text};
use super::ExerciseParser;
use crate::model::{
    Exercise, ExerciseSpeed, FileType, Position, RecordingInterval, RecordingMode, Sample,
};

static INFO: ParserInfo = ParserInfo {
    name: "TopoGrafix GPX",
    suffixes: &["gpx"],
};

pub struct GpxParser;

struct Trackpoint {
    position: Position,
    elevation: Option<f64>,
    time: Option<NaiveDateTime>,
    heart_rate: Option<u16>,
}

impl ExerciseParser for GpxParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let document = parse_document(bytes)?;
        let gpx = document.root_element();
        if gpx.tag_name().name() != "gpx" {
            return Err(ParseError::malformed("root element is not <gpx>"));
        }

        let mut exercise = Exercise::new(FileType::TopoGrafixGpx);
        exercise.device_name = gpx.attribute("creator").map(str::to_string);
        exercise.recording_interval = Some(RecordingInterval::Dynamic);
        exercise.recording_mode = RecordingMode {
            location: true,
            ..RecordingMode::default()
        };

        let trackpoints = children(gpx, "trk")
            .flat_map(|trk| children(trk, "trkseg"))
            .flat_map(|segment| children(segment, "trkpt"))
            .map(parse_trackpoint)
            .collect::<ParseResult<Vec<Trackpoint>>>()?;

        // metadata may hold the save time instead of the start
        let metadata_time = path(gpx, &["metadata", "time"])
            .and_then(text)
            .map(parse_iso_datetime)
            .transpose()?;
        let start = metadata_time
            .into_iter()
            .chain(trackpoints.iter().filter_map(|tp| tp.time))
            .min();
        exercise.date_time = start;

        exercise.samples = trackpoints
            .iter()
            .map(|tp| Sample {
                timestamp: tp
                    .time
                    .zip(start)
                    .map(|(time, start)| (time - start).num_milliseconds()),
                heart_rate: tp.heart_rate,
                altitude: tp.elevation.map(|ele| ele.round() as i16),
                position: Some(tp.position),
                ..Sample::default()
            })
            .collect();
        exercise.recording_mode.altitude = exercise.samples.iter().any(|s| s.altitude.is_some());
        exercise.recording_mode.heart_rate =
            exercise.samples.iter().any(|s| s.heart_rate.is_some());

        derive_distance_and_speed(&mut exercise);

        if exercise.recording_mode.altitude {
            exercise.altitude = altitude_summary(&exercise.samples);
        }
        let last_timestamp = exercise.samples.last().and_then(|s| s.timestamp);
        if let Some(last) = last_timestamp.filter(|&ts| ts > 0) {
            exercise.duration = Some((last / 100) as u32);
        }
        if exercise.recording_mode.speed {
            if let Some(last) = exercise.samples.last() {
                let distance = last.distance.unwrap_or(0);
                let seconds = (last.timestamp.unwrap_or(0) as f64 / 1000.0).round();
                exercise.speed = Some(ExerciseSpeed {
                    speed_avg: average_speed_kmh(distance as f64 / 1000.0, seconds),
                    speed_max: max_sample_speed(&exercise.samples).unwrap_or(0.0),
                    distance,
                });
            }
        }
        if let Some((avg, max)) = heart_rate_avg_max(&exercise.samples) {
            exercise.heart_rate_avg = Some(avg);
            exercise.heart_rate_max = Some(max);
        }

        debug!(trackpoints = trackpoints.len(), "parsed gpx track");
        Ok(exercise)
    }
}

fn parse_trackpoint(node: Node<'_, '_>) -> ParseResult<Trackpoint> {
    let coordinate = |name: &str| -> ParseResult<f64> {
        let raw = node
            .attribute(name)
            .ok_or_else(|| ParseError::malformed(format!("trkpt without '{name}'")))?;
        parse_number(raw, name)
    };

    Ok(Trackpoint {
        position: Position::new(coordinate("lat")?, coordinate("lon")?),
        elevation: child_text(node, "ele")
            .map(|raw| parse_number(raw, "ele"))
            .transpose()?,
        time: child_text(node, "time").map(parse_iso_datetime).transpose()?,
        heart_rate: extension_heart_rate(node)?,
    })
}

/// Heart rate from the Garmin TrackPointExtension, or a bare `bpm` or `hr`
/// extension element, in that order.
fn extension_heart_rate(node: Node<'_, '_>) -> ParseResult<Option<u16>> {
    let Some(extensions) = child(node, "extensions") else {
        return Ok(None);
    };
    let raw = child(extensions, "TrackPointExtension")
        .and_then(|ext| child_text(ext, "hr"))
        .or_else(|| child_text(extensions, "bpm"))
        .or_else(|| child_text(extensions, "hr"))
        .or_else(|| descendant(extensions, "hr").and_then(text));
    raw.map(|value| parse_number(value, "heart rate")).transpose()
}

/// Cumulative haversine distances and per-sample speed. Without any usable
/// timestamp the track is position-only and both stay unset.
fn derive_distance_and_speed(exercise: &mut Exercise) {
    let mut total = 0.0;
    let mut previous: Option<(Position, Option<i64>)> = None;
    let mut has_speed = false;

    for sample in &mut exercise.samples {
        let Some(position) = sample.position else {
            continue;
        };
        let (step, speed) = match previous {
            Some((previous_position, previous_time)) => {
                let step = haversine_distance(previous_position, position);
                let speed = match (previous_time, sample.timestamp) {
                    (Some(before), Some(now)) if now != before => {
                        has_speed = true;
                        3600.0 * step / (now - before) as f64
                    }
                    _ => 0.0,
                };
                (step, speed)
            }
            None => (0.0, 0.0),
        };
        total += step;
        sample.distance = Some(total.round() as i32);
        sample.speed = Some(speed);
        previous = Some((position, sample.timestamp));
    }

    exercise.recording_mode.speed = has_speed;
    if !has_speed {
        for sample in &mut exercise.samples {
            sample.speed = None;
            sample.distance = None;
        }
    }
}
