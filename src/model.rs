//! Canonical exercise model produced by every decoder.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Source format an exercise was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    PolarHrm,
    PolarPed,
    PolarRs200sd,
    GarminTcx,
    GarminFit,
    TopoGrafixGpx,
    SmartsyncCsv,
}

/// Nominal time between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordingInterval {
    /// Fixed interval in seconds.
    Fixed(u16),
    /// Every sample carries its own timestamp.
    Dynamic,
}

/// Data categories the source file actually recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordingMode {
    pub heart_rate: bool,
    pub speed: bool,
    pub altitude: bool,
    pub cadence: bool,
    pub power: bool,
    pub temperature: bool,
    pub location: bool,
    pub interval_exercise: bool,
    pub bike_number: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExerciseSpeed {
    /// km/h
    pub speed_avg: f64,
    /// km/h
    pub speed_max: f64,
    /// meters
    pub distance: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExerciseCadence {
    pub cadence_avg: u16,
    pub cadence_max: u16,
    pub total_cycles: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExerciseAltitude {
    pub altitude_min: i16,
    pub altitude_avg: i16,
    pub altitude_max: i16,
    pub ascent: i32,
    pub descent: i32,
}

/// Temperatures in degrees Celsius.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExerciseTemperature {
    pub temperature_min: i16,
    pub temperature_avg: i16,
    pub temperature_max: i16,
}

/// Power in watts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExercisePower {
    pub power_avg: u16,
    pub power_max: Option<u16>,
    pub power_normalized: Option<u16>,
}

/// Heart rate zone boundaries with the time spent below, within and above it.
///
/// Values are kept exactly as the source provides them, including duplicated
/// or zeroed entries some Polar monitors write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeartRateLimit {
    pub lower_heart_rate: u16,
    pub upper_heart_rate: u16,
    /// seconds
    pub time_below: Option<u32>,
    /// seconds
    pub time_within: u32,
    /// seconds
    pub time_above: Option<u32>,
    /// `false` when the bounds are percentages of the maximum heart rate.
    pub is_absolute_range: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LapSpeed {
    /// Speed at the end of the lap in km/h.
    pub speed_end: f64,
    /// km/h
    pub speed_avg: f64,
    /// Distance from the exercise start in meters.
    pub distance: i32,
    pub cadence: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LapAltitude {
    pub altitude: i16,
    pub ascent: i32,
    pub descent: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LapTemperature {
    pub temperature: i16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LapPower {
    pub power_avg: u16,
    pub power_max: Option<u16>,
    pub power_normalized: Option<u16>,
}

/// A marked split. `time_split` is elapsed time from the exercise start in
/// tenths of a second, not the lap duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lap {
    pub time_split: u32,
    pub heart_rate_split: Option<u16>,
    pub heart_rate_avg: Option<u16>,
    pub heart_rate_max: Option<u16>,
    pub speed: Option<LapSpeed>,
    pub altitude: Option<LapAltitude>,
    pub temperature: Option<LapTemperature>,
    pub power: Option<LapPower>,
    pub position_split: Option<Position>,
}

/// One measurement point. Every field is optional since devices drop
/// different subsets mid-stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sample {
    /// Milliseconds since the exercise start.
    pub timestamp: Option<i64>,
    pub heart_rate: Option<u16>,
    /// meters
    pub altitude: Option<i16>,
    /// km/h
    pub speed: Option<f64>,
    pub cadence: Option<u16>,
    /// Meters from the exercise start.
    pub distance: Option<i32>,
    /// Celsius
    pub temperature: Option<i16>,
    /// watts
    pub power: Option<u16>,
    pub position: Option<Position>,
}

/// A fully normalized workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub file_type: FileType,
    pub device_name: Option<String>,
    pub date_time: Option<NaiveDateTime>,
    pub exercise_type: Option<String>,
    pub recording_mode: RecordingMode,
    /// Tenths of a second.
    pub duration: Option<u32>,
    pub recording_interval: Option<RecordingInterval>,
    pub heart_rate_avg: Option<u16>,
    pub heart_rate_max: Option<u16>,
    pub speed: Option<ExerciseSpeed>,
    pub cadence: Option<ExerciseCadence>,
    pub altitude: Option<ExerciseAltitude>,
    pub temperature: Option<ExerciseTemperature>,
    pub power: Option<ExercisePower>,
    /// kcal
    pub energy: Option<u32>,
    /// km
    pub odometer: Option<i32>,
    pub heart_rate_limits: Vec<HeartRateLimit>,
    pub laps: Vec<Lap>,
    pub samples: Vec<Sample>,
}

impl Exercise {
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            device_name: None,
            date_time: None,
            exercise_type: None,
            recording_mode: RecordingMode::default(),
            duration: None,
            recording_interval: None,
            heart_rate_avg: None,
            heart_rate_max: None,
            speed: None,
            cadence: None,
            altitude: None,
            temperature: None,
            power: None,
            energy: None,
            odometer: None,
            heart_rate_limits: Vec::new(),
            laps: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Rescale integrated sample distances so the last sample matches the
    /// recorded exercise distance.
    ///
    /// Only applied when the samples cover the whole duration at the fixed
    /// recording interval. With gaps in the recording the estimate is left
    /// untouched.
    pub fn repair_samples(&mut self) {
        let Some(recorded) = self.speed.as_ref().map(|speed| speed.distance) else {
            return;
        };
        let (Some(duration), Some(RecordingInterval::Fixed(interval))) =
            (self.duration, self.recording_interval)
        else {
            return;
        };
        if recorded <= 0 || interval == 0 || self.samples.is_empty() {
            return;
        }

        let expected = (duration / 10 / interval as u32) as usize;
        if self.samples.len() < expected {
            return;
        }

        let Some(estimated) = self.samples.last().and_then(|sample| sample.distance) else {
            return;
        };
        if estimated <= 0 {
            return;
        }

        let ratio = recorded as f64 / estimated as f64;
        for sample in &mut self.samples {
            if let Some(distance) = sample.distance.as_mut() {
                *distance = (*distance as f64 * ratio).round() as i32;
            }
        }
        if let Some(last) = self.samples.last_mut() {
            last.distance = Some(recorded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_with_distances(distances: &[i32], recorded: i32) -> Exercise {
        let mut exercise = Exercise::new(FileType::PolarHrm);
        exercise.duration = Some(distances.len() as u32 * 50);
        exercise.recording_interval = Some(RecordingInterval::Fixed(5));
        exercise.speed = Some(ExerciseSpeed {
            distance: recorded,
            ..ExerciseSpeed::default()
        });
        exercise.samples = distances
            .iter()
            .map(|distance| Sample {
                distance: Some(*distance),
                ..Sample::default()
            })
            .collect();
        exercise
    }

    #[test]
    fn repair_rescales_to_recorded_distance() {
        let mut exercise = exercise_with_distances(&[0, 33, 66, 99], 120);
        exercise.repair_samples();

        let distances: Vec<_> = exercise.samples.iter().map(|s| s.distance).collect();
        assert_eq!(distances, vec![Some(0), Some(40), Some(80), Some(120)]);
    }

    #[test]
    fn repair_makes_last_sample_exact() {
        let mut exercise = exercise_with_distances(&[0, 7, 14, 21, 29], 31);
        exercise.repair_samples();

        assert_eq!(exercise.samples.last().and_then(|s| s.distance), Some(31));
    }

    #[test]
    fn repair_skips_when_samples_missing() {
        let mut exercise = exercise_with_distances(&[0, 33, 66, 99], 120);
        exercise.duration = Some(1000);
        exercise.repair_samples();

        assert_eq!(exercise.samples.last().and_then(|s| s.distance), Some(99));
    }

    #[test]
    fn repair_skips_dynamic_interval() {
        let mut exercise = exercise_with_distances(&[0, 33, 66, 99], 120);
        exercise.recording_interval = Some(RecordingInterval::Dynamic);
        exercise.repair_samples();

        assert_eq!(exercise.samples[1].distance, Some(33));
    }
}
