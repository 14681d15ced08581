//! Builds an exercise from buffered FIT messages.
//!
//! Laps reference samples by time and the session start is only known once
//! the session message arrives, usually at the end of the file. Messages are
//! therefore collected first and cross-referenced in [`FitAccumulator::finish`].

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::devices::{device_name, readable_name};
use super::messages::{
    DeviceInfoMessage, FitMessage, HeartRateZonesMessage, LapMessage, RecordMessage, SessionMessage,
};
use crate::model::{
    Exercise, ExerciseAltitude, ExerciseCadence, ExercisePower, ExerciseSpeed, FileType,
    HeartRateLimit, Lap, LapAltitude, LapPower, LapSpeed, LapTemperature, RecordingInterval, Sample,
};
use crate::parsing::summary::{
    CadenceAverage, altitude_summary, average_speed_kmh, cadence_summary, closest_sample,
    fill_heart_rate_from_samples, max_sample_speed, temperature_summary,
};
use crate::parsing::types::{ParseError, ParseResult};
use crate::units::mps_to_kmh;

#[derive(Debug, Default)]
pub struct FitAccumulator {
    session: Option<SessionMessage>,
    laps: Vec<LapMessage>,
    /// Timestamps are absolute epoch milliseconds until [`Self::finish`].
    samples: Vec<Sample>,
    device_info: Option<DeviceInfoMessage>,
    heart_rate_zones: Option<HeartRateZonesMessage>,
}

fn epoch_millis(time: NaiveDateTime) -> i64 {
    time.and_utc().timestamp_millis()
}

impl FitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: FitMessage) {
        match message {
            // multisport files carry one session per sport, the last one wins
            FitMessage::Session(session) => self.session = Some(session),
            FitMessage::Lap(lap) => self.laps.push(lap),
            FitMessage::Record(record) => self.samples.push(sample(record)),
            FitMessage::Length(length) => {
                let end = length.start_time.zip(length.total_elapsed_time);
                match (self.samples.last_mut(), end) {
                    (Some(last), Some((start, elapsed))) => {
                        last.timestamp = Some(epoch_millis(start) + (elapsed * 1000.0).round() as i64);
                    }
                    _ => warn!("skipping length message without preceding sample"),
                }
            }
            FitMessage::DeviceInfo(info) => {
                // the first complete entry describes the recording device, later ones sensors
                if self.device_info.is_none() && info.manufacturer.is_some() && info.product.is_some() {
                    self.device_info = Some(info);
                }
            }
            FitMessage::HeartRateZones(zones) => self.heart_rate_zones = Some(zones),
        }
    }

    pub fn finish(self) -> ParseResult<Exercise> {
        let session = self
            .session
            .ok_or_else(|| ParseError::malformed("FIT stream contains no exercise session"))?;
        let start = session
            .start_time
            .ok_or_else(|| ParseError::malformed("FIT session without start time"))?;
        let start_millis = epoch_millis(start);

        let mut exercise = Exercise::new(FileType::GarminFit);
        exercise.date_time = Some(start);
        exercise.recording_interval = Some(RecordingInterval::Dynamic);
        apply_session(&mut exercise, &session);

        if let Some(info) = self.device_info {
            if let (Some(manufacturer), Some(product)) = (&info.manufacturer, &info.product) {
                exercise.device_name = device_name(manufacturer, product, info.software_version);
                if exercise.device_name.is_none() {
                    warn!(manufacturer = %manufacturer, product = ?product, "unknown fit product");
                }
            }
        }

        exercise.samples = self.samples;
        for sample in &mut exercise.samples {
            if let Some(timestamp) = sample.timestamp.as_mut() {
                *timestamp -= start_millis;
            }
        }
        let mode = &mut exercise.recording_mode;
        for sample in &exercise.samples {
            mode.heart_rate |= sample.heart_rate.is_some();
            mode.location |= sample.position.is_some();
            mode.temperature |= sample.temperature.is_some();
        }
        if let Some(zones) = self.heart_rate_zones.filter(|_| exercise.recording_mode.heart_rate) {
            apply_heart_rate_zones(&mut exercise, &zones);
        }

        exercise.laps = self
            .laps
            .iter()
            .filter_map(|lap| {
                let split = lap.timestamp?;
                let time_split = ((epoch_millis(split) - start_millis) / 100).max(0) as u32;
                Some(build_lap(lap, time_split))
            })
            .collect();
        complete_laps(&mut exercise);

        fill_missing_average_speeds(&mut exercise);
        if !exercise.samples.is_empty() {
            complete_from_samples(&mut exercise);
        }

        debug!(
            samples = exercise.samples.len(),
            laps = exercise.laps.len(),
            "finished fit exercise"
        );
        Ok(exercise)
    }
}

fn sample(record: RecordMessage) -> Sample {
    Sample {
        timestamp: record.timestamp.map(epoch_millis),
        heart_rate: record.heart_rate,
        altitude: record
            .enhanced_altitude
            .or(record.altitude)
            .map(|altitude| altitude.round() as i16),
        speed: record.enhanced_speed.or(record.speed).map(mps_to_kmh),
        cadence: record.cadence,
        distance: record.distance.map(|distance| distance.round() as i32),
        temperature: record.temperature,
        power: record.power,
        position: record.position,
    }
}

fn apply_session(exercise: &mut Exercise, session: &SessionMessage) {
    let mode = &mut exercise.recording_mode;
    exercise.duration = session
        .total_timer_time
        .map(|seconds| (seconds * 10.0).round() as u32);
    exercise.exercise_type = session.sport.as_deref().map(|sport| {
        match session.sub_sport.as_deref().filter(|sub| *sub != "generic") {
            Some(sub) => format!("{} ({})", readable_name(sport), readable_name(sub)),
            None => readable_name(sport),
        }
    });

    if session.avg_heart_rate.is_some() || session.max_heart_rate.is_some() {
        mode.heart_rate = true;
        exercise.heart_rate_avg = session.avg_heart_rate;
        exercise.heart_rate_max = session.max_heart_rate;
    }
    exercise.energy = session.total_calories;

    if let Some(distance) = session.total_distance {
        mode.speed = true;
        // a missing average is computed once laps and duration are known
        exercise.speed = Some(ExerciseSpeed {
            speed_avg: session.avg_speed.map(mps_to_kmh).unwrap_or(0.0),
            speed_max: session.max_speed.map(mps_to_kmh).unwrap_or(0.0),
            distance: distance.round() as i32,
        });
    }
    if session.start_position.is_some() {
        mode.location = true;
    }
    if let Some(ascent) = session.total_ascent {
        mode.altitude = true;
        exercise.altitude = Some(ExerciseAltitude {
            ascent: ascent as i32,
            descent: session.total_descent.unwrap_or(ascent) as i32,
            ..ExerciseAltitude::default()
        });
    }
    if let Some(avg) = session.avg_cadence {
        mode.cadence = true;
        exercise.cadence = Some(ExerciseCadence {
            cadence_avg: avg,
            cadence_max: session.max_cadence.unwrap_or(avg),
            total_cycles: session.total_cycles,
        });
    }
    if let Some(avg) = session.avg_power {
        mode.power = true;
        exercise.power = Some(ExercisePower {
            power_avg: avg,
            power_max: session.max_power,
            power_normalized: session.normalized_power,
        });
    }

    // below, one entry per zone, above; zone bounds are not part of the session
    let times = &session.time_in_hr_zone;
    if times.len() >= 3 {
        let zones = times.len() - 2;
        exercise.heart_rate_limits = (0..zones)
            .map(|zone| HeartRateLimit {
                lower_heart_rate: 0,
                upper_heart_rate: 0,
                time_below: (zone == 0).then(|| times[0].round() as u32),
                time_within: times[zone + 1].round() as u32,
                time_above: (zone == zones - 1).then(|| times[times.len() - 1].round() as u32),
                is_absolute_range: false,
            })
            .collect();
    }
}

fn apply_heart_rate_zones(exercise: &mut Exercise, zones: &HeartRateZonesMessage) {
    let bounds = &zones.boundaries;
    let times = &zones.times;
    if bounds.len() < 2 || times.len() != bounds.len() + 1 {
        debug!(
            boundaries = bounds.len(),
            times = times.len(),
            "ignoring inconsistent heart rate zones"
        );
        return;
    }

    let count = bounds.len() - 1;
    exercise.heart_rate_limits = (0..count)
        .map(|zone| HeartRateLimit {
            lower_heart_rate: bounds[zone],
            upper_heart_rate: bounds[zone + 1],
            time_below: (zone == 0).then(|| times[0].round() as u32),
            time_within: times[zone + 1].round() as u32,
            time_above: (zone == count - 1).then(|| times[times.len() - 1].round() as u32),
            is_absolute_range: true,
        })
        .collect();
}

fn build_lap(message: &LapMessage, time_split: u32) -> Lap {
    Lap {
        time_split,
        heart_rate_avg: message.avg_heart_rate,
        heart_rate_max: message.max_heart_rate,
        speed: message.total_distance.map(|distance| LapSpeed {
            speed_end: 0.0,
            speed_avg: message.avg_speed.map(mps_to_kmh).unwrap_or(0.0),
            distance: distance.round() as i32,
            cadence: None,
        }),
        altitude: message.total_ascent.map(|ascent| LapAltitude {
            altitude: 0,
            ascent: ascent as i32,
            descent: message.total_descent.map(i32::from),
        }),
        power: message.avg_power.map(|avg| LapPower {
            power_avg: avg,
            power_max: message.max_power,
            power_normalized: message.normalized_power,
        }),
        position_split: message.end_position,
        ..Lap::default()
    }
}

/// Lap distances become cumulative. Split values come from the sample
/// closest to the lap end.
fn complete_laps(exercise: &mut Exercise) {
    let temperature = exercise.recording_mode.temperature;
    let mut distance_sum = 0;

    for lap in &mut exercise.laps {
        if let Some(speed) = lap.speed.as_mut() {
            distance_sum += speed.distance;
            speed.distance = distance_sum;
        }

        let Some(sample) = closest_sample(&exercise.samples, lap.time_split as i64 * 100) else {
            continue;
        };
        lap.heart_rate_split = sample.heart_rate;
        if let Some(speed) = lap.speed.as_mut() {
            speed.speed_end = sample.speed.unwrap_or(0.0);
            speed.cadence = sample.cadence;
        }
        if let (Some(altitude), Some(value)) = (lap.altitude.as_mut(), sample.altitude) {
            altitude.altitude = value;
        }
        if temperature {
            lap.temperature = sample
                .temperature
                .map(|temperature| LapTemperature { temperature });
        }
    }
}

/// Some devices (e.g. Forerunner 910XT) omit average speeds.
fn fill_missing_average_speeds(exercise: &mut Exercise) {
    if let (Some(speed), Some(duration)) = (exercise.speed.as_mut(), exercise.duration) {
        if speed.speed_avg == 0.0 {
            speed.speed_avg = average_speed_kmh(
                speed.distance as f64 / 1000.0,
                (duration as f64 / 10.0).round(),
            );
        }
    }

    // lap distances are cumulative at this point, as are split times
    for lap in &mut exercise.laps {
        if let Some(speed) = lap.speed.as_mut().filter(|speed| speed.speed_avg == 0.0) {
            speed.speed_avg = average_speed_kmh(
                speed.distance as f64 / 1000.0,
                (lap.time_split as f64 / 10.0).round(),
            );
        }
    }
}

/// Summary values the session left out, computed from samples.
fn complete_from_samples(exercise: &mut Exercise) {
    if let Some(from_samples) = altitude_summary(&exercise.samples) {
        exercise.recording_mode.altitude = true;
        exercise.altitude = Some(match exercise.altitude.take() {
            Some(session) => ExerciseAltitude {
                ascent: session.ascent,
                descent: session.descent,
                ..from_samples
            },
            None => from_samples,
        });
    }
    if exercise.recording_mode.temperature {
        exercise.temperature = temperature_summary(&exercise.samples);
    }
    if let Some(speed) = exercise.speed.as_mut() {
        if speed.speed_max < 0.01 {
            speed.speed_max = max_sample_speed(&exercise.samples).unwrap_or(0.0);
        }
    }
    fill_heart_rate_from_samples(exercise);
    if exercise.cadence.is_none() {
        if let Some(cadence) = cadence_summary(&exercise.samples, CadenceAverage::Pedaling) {
            exercise.recording_mode.cadence = true;
            exercise.cadence = Some(cadence);
        }
    }
}
