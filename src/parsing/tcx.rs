//! Garmin Training Center Database v2 (`.tcx`).
//!
//! Session totals are not trusted. Duration, distance and energy are summed
//! from the laps, and each lap duration is recomputed from its last
//! trackpoint. Pauses between laps are removed from sample timestamps.

use chrono::NaiveDateTime;
use roxmltree::Node;

use super::summary::{
    CadenceAverage, altitude_summary, average_speed_kmh, cadence_summary,
    time_weighted_heart_rate,
};
use super::types::{ParseError, ParseResult, ParserInfo, parse_iso_datetime, parse_number};
use super::xml::{
    child, child_number, child_text, children, parse_document, path, required_text, text,
};
use super::ExerciseParser;
use crate::model::{
    Exercise, ExerciseAltitude, ExerciseSpeed, FileType, Lap, LapAltitude,
    LapSpeed, Position, RecordingInterval, RecordingMode, Sample,
};

static INFO: ParserInfo = ParserInfo {
    name: "Garmin TCX",
    suffixes: &["tcx"],
};

pub struct TcxParser;

impl ExerciseParser for TcxParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let document = parse_document(bytes)?;
        let activity = path(document.root_element(), &["Activities", "Activity"])
            .ok_or_else(|| ParseError::malformed("missing Activities/Activity"))?;

        let mut builder = TcxBuilder::new(parse_iso_datetime(required_text(activity, "Id")?)?);
        if let Some(sport) = activity.attribute("Sport") {
            builder.exercise.exercise_type = Some(sport.to_string());
        }
        for lap in children(activity, "Lap") {
            builder.add_lap(lap)?;
        }

        // always a Garmin device, the creator is missing in some exports
        builder.exercise.device_name = path(activity, &["Creator", "Name"])
            .and_then(text)
            .map(|name| format!("Garmin {name}"));

        Ok(builder.finish())
    }
}

struct TcxBuilder {
    exercise: Exercise,
    start: NaiveDateTime,
    gap_millis: i64,
    last_trackpoint: Option<NaiveDateTime>,
    lap_ascents: Vec<f64>,
}

fn millis_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_milliseconds()
}

impl TcxBuilder {
    fn new(start: NaiveDateTime) -> Self {
        let mut exercise = Exercise::new(FileType::GarminTcx);
        exercise.date_time = Some(start);
        exercise.recording_interval = Some(RecordingInterval::Dynamic);
        exercise.recording_mode = RecordingMode {
            speed: true,
            ..RecordingMode::default()
        };
        exercise.duration = Some(0);
        exercise.energy = Some(0);
        exercise.speed = Some(ExerciseSpeed::default());

        Self {
            exercise,
            start,
            gap_millis: 0,
            last_trackpoint: None,
            lap_ascents: Vec::new(),
        }
    }

    fn add_lap(&mut self, element: Node<'_, '_>) -> ParseResult<()> {
        let lap_start = element
            .attribute("StartTime")
            .ok_or_else(|| ParseError::malformed("Lap without StartTime"))
            .and_then(parse_iso_datetime)?;
        if let Some(previous) = self.last_trackpoint {
            self.gap_millis += millis_between(previous, lap_start);
        }

        let trackpoints: Vec<Node> = children(element, "Track")
            .flat_map(|track| children(track, "Trackpoint"))
            .collect();
        let last_time = match trackpoints.last() {
            Some(last) => parse_iso_datetime(required_text(*last, "Time")?)?,
            None => return Err(ParseError::malformed("Lap without trackpoints")),
        };

        let lap_seconds = millis_between(lap_start, last_time) as f64 / 1000.0;
        let lap_distance: f64 =
            parse_number(required_text(element, "DistanceMeters")?, "DistanceMeters")?;

        let duration = self.exercise.duration.unwrap_or(0) + (lap_seconds * 10.0).round() as u32;
        self.exercise.duration = Some(duration);
        let total_distance = match self.exercise.speed.as_mut() {
            Some(speed) => {
                speed.distance += lap_distance.round() as i32;
                speed.distance
            }
            None => 0,
        };
        let calories: u32 = parse_number(required_text(element, "Calories")?, "Calories")?;
        self.exercise.energy = Some(self.exercise.energy.unwrap_or(0) + calories);

        let mut lap = Lap {
            time_split: duration,
            heart_rate_avg: heart_rate_value(element, "AverageHeartRateBpm")?,
            heart_rate_max: heart_rate_value(element, "MaximumHeartRateBpm")?,
            speed: Some(LapSpeed {
                speed_avg: average_speed_kmh(lap_distance / 1000.0, lap_seconds.round()),
                distance: total_distance,
                ..LapSpeed::default()
            }),
            ..Lap::default()
        };
        if lap.heart_rate_avg.is_some() {
            self.exercise.recording_mode.heart_rate = true;
        }
        if let Some(max) = lap.heart_rate_max {
            let current = self.exercise.heart_rate_max.unwrap_or(0);
            self.exercise.heart_rate_max = Some(current.max(max));
        }

        let mut previous_distance: Option<(NaiveDateTime, f64)> = None;
        let mut previous_altitude: Option<f64> = None;
        let mut ascent = 0.0;

        for trackpoint in trackpoints {
            let time = parse_iso_datetime(required_text(trackpoint, "Time")?)?;
            self.last_trackpoint = Some(time);

            let mut sample = Sample {
                timestamp: Some(millis_between(self.start, time) - self.gap_millis),
                ..Sample::default()
            };

            if let Some(position) = child(trackpoint, "Position") {
                self.exercise.recording_mode.location = true;
                sample.position = Some(Position::new(
                    parse_number(required_text(position, "LatitudeDegrees")?, "LatitudeDegrees")?,
                    parse_number(required_text(position, "LongitudeDegrees")?, "LongitudeDegrees")?,
                ));
            }

            if let Some(heart_rate) = heart_rate_value(trackpoint, "HeartRateBpm")? {
                self.exercise.recording_mode.heart_rate = true;
                sample.heart_rate = Some(heart_rate);
                lap.heart_rate_split = Some(heart_rate);
            }

            // some trackpoints carry no distance
            if let Some(distance) = child_number::<f64>(trackpoint, "DistanceMeters")? {
                sample.distance = Some(distance.round() as i32);
                let speed = match previous_distance {
                    Some((previous_time, previous)) => {
                        let millis = millis_between(previous_time, time);
                        if millis > 0 {
                            3600.0 * (distance - previous).max(0.0) / millis as f64
                        } else {
                            0.0
                        }
                    }
                    None => 0.0,
                };
                previous_distance = Some((time, distance));
                sample.speed = Some(speed);

                if let Some(lap_speed) = lap.speed.as_mut() {
                    lap_speed.speed_end = speed;
                }
                if let Some(summary) = self.exercise.speed.as_mut() {
                    summary.speed_max = summary.speed_max.max(speed);
                }
            }

            if let Some(altitude) = child_number::<f64>(trackpoint, "AltitudeMeters")? {
                self.exercise.recording_mode.altitude = true;
                sample.altitude = Some(altitude.round() as i16);
                if let Some(previous) = previous_altitude.filter(|previous| altitude > *previous) {
                    ascent += altitude - previous;
                }
                previous_altitude = Some(altitude);
                lap.altitude = Some(LapAltitude {
                    altitude: altitude.round() as i16,
                    ascent: 0,
                    descent: None,
                });
            }

            if let Some(cadence) = trackpoint_cadence(trackpoint)? {
                self.exercise.recording_mode.cadence = true;
                sample.cadence = Some(cadence);
                if let Some(lap_speed) = lap.speed.as_mut() {
                    lap_speed.cadence = Some(cadence);
                }
            }

            self.exercise.samples.push(sample);
        }

        if let Some(altitude) = lap.altitude.as_mut() {
            altitude.ascent = ascent.round() as i32;
        }
        self.lap_ascents.push(ascent);
        lap.position_split = self.exercise.samples.last().and_then(|s| s.position);
        self.exercise.laps.push(lap);
        Ok(())
    }

    fn finish(mut self) -> Exercise {
        let exercise = &mut self.exercise;
        let duration = exercise.duration.unwrap_or(0);
        if let Some(speed) = exercise.speed.as_mut() {
            speed.speed_avg =
                average_speed_kmh(speed.distance as f64 / 1000.0, (duration as f64 / 10.0).round());
        }

        let mut previous_split = 0;
        let weighted: Vec<(u32, u16)> = exercise
            .laps
            .iter()
            .filter_map(|lap| {
                let lap_duration = lap.time_split - previous_split;
                previous_split = lap.time_split;
                lap.heart_rate_avg.map(|hr| (lap_duration, hr))
            })
            .collect();
        exercise.heart_rate_avg = time_weighted_heart_rate(&weighted);

        if exercise.recording_mode.altitude {
            // lap ascents are summed at full precision per lap
            exercise.altitude = altitude_summary(&exercise.samples).map(|summary| ExerciseAltitude {
                ascent: self.lap_ascents.iter().map(|a| a.round() as i32).sum(),
                ..summary
            });
        }
        if exercise.recording_mode.cadence {
            exercise.cadence = cadence_summary(&exercise.samples, CadenceAverage::Pedaling);
        }

        self.exercise
    }
}

fn heart_rate_value(node: Node<'_, '_>, name: &str) -> ParseResult<Option<u16>> {
    match child(node, name) {
        Some(element) => Ok(Some(parse_number(required_text(element, "Value")?, name)?)),
        None => Ok(None),
    }
}

/// Cycling cadence, or the running cadence extension when absent.
fn trackpoint_cadence(trackpoint: Node<'_, '_>) -> ParseResult<Option<u16>> {
    if let Some(raw) = child_text(trackpoint, "Cadence") {
        return parse_number(raw, "Cadence").map(Some);
    }
    path(trackpoint, &["Extensions", "TPX"])
        .map(|tpx| child_number(tpx, "RunCadence"))
        .transpose()
        .map(Option::flatten)
}
