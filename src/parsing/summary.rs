//! Derived values for formats that do not store them reliably.

use crate::model::{
    Exercise, ExerciseAltitude, ExerciseCadence, ExerciseTemperature, Lap, Position, Sample,
};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Average speed in km/h for a distance in kilometers over a duration in
/// seconds. Zero duration yields zero.
pub fn average_speed_kmh(distance_km: f64, duration_seconds: f64) -> f64 {
    if distance_km <= 0.0 || duration_seconds <= 0.0 {
        return 0.0;
    }
    distance_km / (duration_seconds / 3600.0)
}

/// Fill `speed_avg` of every lap from the distance and whole seconds since
/// the previous lap.
pub fn compute_lap_average_speeds(laps: &mut [Lap]) {
    let mut previous_distance = 0;
    let mut previous_split = 0;
    for lap in laps.iter_mut() {
        let Some(speed) = lap.speed.as_mut() else {
            continue;
        };
        let distance = speed.distance - previous_distance;
        let tenths = lap.time_split.saturating_sub(previous_split);
        speed.speed_avg =
            average_speed_kmh(distance as f64 / 1000.0, (tenths as f64 / 10.0).round());
        previous_distance = speed.distance;
        previous_split = lap.time_split;
    }
}

/// Integrate per-sample speed over a fixed interval into distances.
///
/// Each sample receives the distance covered before it, truncated to whole
/// meters.
pub fn integrate_sample_distances(samples: &mut [Sample], interval_seconds: u16) {
    let mut accumulated = 0.0;
    for sample in samples.iter_mut() {
        sample.distance = Some(accumulated as i32);
        accumulated += sample.speed.unwrap_or(0.0) * interval_seconds as f64 / 3.6;
    }
}

pub fn max_sample_speed(samples: &[Sample]) -> Option<f64> {
    samples
        .iter()
        .filter_map(|sample| sample.speed)
        .reduce(f64::max)
}

/// Average and maximum heart rate of all samples carrying one.
pub fn heart_rate_avg_max(samples: &[Sample]) -> Option<(u16, u16)> {
    let rates: Vec<u16> = samples.iter().filter_map(|s| s.heart_rate).collect();
    let max = rates.iter().copied().max()?;
    let avg = rates.iter().map(|&hr| hr as f64).sum::<f64>() / rates.len() as f64;
    Some((avg.round() as u16, max))
}

/// Fill missing exercise heart rate average and maximum from samples.
pub fn fill_heart_rate_from_samples(exercise: &mut Exercise) {
    if let Some((avg, max)) = heart_rate_avg_max(&exercise.samples) {
        exercise.heart_rate_avg.get_or_insert(avg);
        exercise.heart_rate_max.get_or_insert(max);
    }
}

/// Total ascent and descent over consecutive sample altitudes.
pub fn ascent_descent(samples: &[Sample]) -> (i32, i32) {
    let altitudes: Vec<i32> = samples
        .iter()
        .filter_map(|s| s.altitude.map(i32::from))
        .collect();
    altitudes
        .windows(2)
        .fold((0, 0), |(ascent, descent), window| match window {
            [first, second] if second > first => (ascent + (second - first), descent),
            [first, second] => (ascent, descent + (first - second)),
            _ => (ascent, descent),
        })
}

pub fn altitude_summary(samples: &[Sample]) -> Option<ExerciseAltitude> {
    let altitudes: Vec<i16> = samples.iter().filter_map(|s| s.altitude).collect();
    let min = altitudes.iter().copied().min()?;
    let max = altitudes.iter().copied().max()?;
    let avg = altitudes.iter().map(|&a| a as f64).sum::<f64>() / altitudes.len() as f64;
    let (ascent, descent) = ascent_descent(samples);
    Some(ExerciseAltitude {
        altitude_min: min,
        altitude_avg: avg.round() as i16,
        altitude_max: max,
        ascent,
        descent,
    })
}

/// Which samples count towards the cadence average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceAverage {
    /// Every sample carrying a cadence, Polar monitors report it this way.
    AllSamples,
    /// Only non-zero values, coasting does not drag the average down.
    Pedaling,
}

pub fn cadence_summary(samples: &[Sample], average: CadenceAverage) -> Option<ExerciseCadence> {
    let cadences: Vec<u16> = samples.iter().filter_map(|s| s.cadence).collect();
    let max = cadences.iter().copied().max()?;
    let counted: Vec<f64> = cadences
        .iter()
        .filter(|&&c| average == CadenceAverage::AllSamples || c > 0)
        .map(|&c| c as f64)
        .collect();
    let avg = if counted.is_empty() {
        0.0
    } else {
        counted.iter().sum::<f64>() / counted.len() as f64
    };
    Some(ExerciseCadence {
        cadence_avg: avg.round() as u16,
        cadence_max: max,
        total_cycles: None,
    })
}

pub fn temperature_summary(samples: &[Sample]) -> Option<ExerciseTemperature> {
    temperature_stats(samples.iter().filter_map(|s| s.temperature))
}

/// Temperature summary for formats that only store one value per lap.
pub fn lap_temperature_summary(laps: &[Lap]) -> Option<ExerciseTemperature> {
    temperature_stats(
        laps.iter()
            .filter_map(|lap| lap.temperature.as_ref().map(|t| t.temperature)),
    )
}

fn temperature_stats(values: impl Iterator<Item = i16>) -> Option<ExerciseTemperature> {
    let temperatures: Vec<i16> = values.collect();
    let min = temperatures.iter().copied().min()?;
    let max = temperatures.iter().copied().max()?;
    let avg = temperatures.iter().map(|&t| t as f64).sum::<f64>() / temperatures.len() as f64;
    Some(ExerciseTemperature {
        temperature_min: min,
        temperature_avg: avg.round() as i16,
        temperature_max: max,
    })
}

/// Mean of lap heart rate averages weighted by lap duration in tenths.
pub fn time_weighted_heart_rate(laps: &[(u32, u16)]) -> Option<u16> {
    let (weighted, total) = laps
        .iter()
        .fold((0.0, 0u64), |(weighted, total), &(duration, hr)| {
            (weighted + duration as f64 * hr as f64, total + duration as u64)
        });
    if total == 0 {
        return None;
    }
    Some((weighted / total as f64).round() as u16)
}

/// Great-circle distance in meters.
pub fn haversine_distance(from: Position, to: Position) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Sample whose timestamp is closest to `timestamp_ms`. Samples without a
/// timestamp are ignored.
pub fn closest_sample(samples: &[Sample], timestamp_ms: i64) -> Option<&Sample> {
    samples
        .iter()
        .filter_map(|sample| sample.timestamp.map(|ts| (ts, sample)))
        .min_by_key(|(ts, _)| (ts - timestamp_ms).abs())
        .map(|(_, sample)| sample)
}
