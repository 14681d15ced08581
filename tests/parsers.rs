use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use rustytrack::model::{Exercise, FileType, HeartRateLimit, RecordingInterval};
use rustytrack::parsing::{ParseErrorKind, parse_file};
use rustytrack::units::{feet_to_meter, miles_to_km};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, mo, d).and_then(|date| date.and_hms_opt(h, mi, s))
}

fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() < tolerance
}

/// FIT time of 2021-09-08 01:46:40 UTC.
const FIT_START: u32 = 1_000_000_000;

const ENUM: u8 = 0x00;
const UINT8: u8 = 0x02;
const UINT16: u8 = 0x84;
const UINT32: u8 = 0x86;

/// Writes little-endian FIT messages, numeric fields only.
#[derive(Default)]
struct FitWriter {
    data: Vec<u8>,
    sizes: HashMap<u8, Vec<usize>>,
}

impl FitWriter {
    /// Fields are `(field number, base type)` pairs.
    fn define(&mut self, local: u8, global: u16, fields: &[(u8, u8)]) {
        self.data.extend([0x40 | local, 0, 0]);
        self.data.extend(global.to_le_bytes());
        self.data.push(fields.len() as u8);
        let mut sizes = Vec::new();
        for &(number, base_type) in fields {
            let size = match base_type {
                ENUM | UINT8 => 1,
                UINT16 => 2,
                _ => 4,
            };
            self.data.extend([number, size as u8, base_type]);
            sizes.push(size);
        }
        self.sizes.insert(local, sizes);
    }

    fn message(&mut self, local: u8, values: &[u32]) {
        self.data.push(local);
        for (value, &size) in values.iter().zip(&self.sizes[&local]) {
            self.data.extend(&value.to_le_bytes()[..size]);
        }
    }

    /// Header without its own CRC, so the trailing CRC covers it.
    fn finish(&self) -> Vec<u8> {
        let mut file = vec![14, 0x10];
        file.extend(2132u16.to_le_bytes());
        file.extend((self.data.len() as u32).to_le_bytes());
        file.extend(b".FIT");
        file.extend([0, 0]);
        file.extend(&self.data);
        let crc = fit_crc(&file);
        file.extend(crc.to_le_bytes());
        file
    }
}

fn fit_crc(data: &[u8]) -> u16 {
    const CRC_TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    data.iter().fold(0u16, |crc, byte| {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        let mut crc = (crc >> 4) & 0x0FFF;
        crc ^= tmp ^ CRC_TABLE[(byte & 0xF) as usize];
        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
    })
}

/// A 20 second Forerunner 910XT run whose records carry a legacy speed of
/// 5 m/s next to an enhanced speed of 5.5 m/s.
fn forerunner_run(dir: &Path) -> PathBuf {
    let mut fit = FitWriter::default();
    fit.define(0, 0, &[(0, ENUM), (1, UINT16), (2, UINT16), (4, UINT32)]);
    fit.message(0, &[4, 1, 1328, FIT_START]);
    fit.define(1, 23, &[(253, UINT32), (2, UINT16), (4, UINT16), (5, UINT16)]);
    fit.message(1, &[FIT_START, 1, 1328, 250]);
    fit.define(2, 20, &[(253, UINT32), (3, UINT8), (5, UINT32), (6, UINT16), (73, UINT32)]);
    for (second, heart_rate, centimeters) in [(0, 140, 0), (10, 150, 5_000), (20, 160, 10_000)] {
        fit.message(2, &[FIT_START + second, heart_rate, centimeters, 5_000, 5_500]);
    }
    fit.define(3, 19, &[(253, UINT32), (2, UINT32), (8, UINT32), (9, UINT32)]);
    fit.message(3, &[FIT_START + 20, FIT_START, 20_000, 10_000]);
    fit.define(
        4,
        18,
        &[
            (253, UINT32),
            (2, UINT32),
            (5, ENUM),
            (6, ENUM),
            (8, UINT32),
            (9, UINT32),
            (16, UINT8),
            (17, UINT8),
        ],
    );
    fit.message(4, &[FIT_START + 20, FIT_START, 1, 0, 20_000, 10_000, 150, 160]);

    let path = dir.join("forerunner-run.fit");
    std::fs::write(&path, fit.finish()).unwrap();
    path
}

#[test]
fn hrm_metric_cycling_summary() {
    let exercise = parse_file(fixture("cycling-metric.hrm")).expect("fixture should parse");

    assert_eq!(exercise.file_type, FileType::PolarHrm);
    assert_eq!(exercise.date_time, datetime(2010, 5, 1, 9, 53, 21));
    assert_eq!(exercise.duration, Some(43_950));
    assert_eq!(exercise.recording_interval, Some(RecordingInterval::Fixed(15)));
    assert!(exercise.recording_mode.speed);
    assert!(exercise.recording_mode.cadence);
    assert!(exercise.recording_mode.altitude);
    assert!(!exercise.recording_mode.power);

    assert_eq!(exercise.heart_rate_avg, Some(138));
    assert_eq!(exercise.heart_rate_max, Some(150));
    assert_eq!(exercise.odometer, Some(12_345));

    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 34_500);
    assert!(close(speed.speed_avg, 28.265625, 1e-9));
    assert!(close(speed.speed_max, 32.0, 1e-9));

    let altitude = exercise.altitude.as_ref().unwrap();
    assert_eq!(altitude.altitude_min, 450);
    assert_eq!(altitude.altitude_avg, 480);
    assert_eq!(altitude.altitude_max, 610);
    assert_eq!(altitude.ascent, 520);

    // the stopped sample counts towards the average
    let cadence = exercise.cadence.as_ref().unwrap();
    assert_eq!((cadence.cadence_avg, cadence.cadence_max), (75, 95));

    assert!(exercise.recording_mode.temperature);
    let temperature = exercise.temperature.as_ref().unwrap();
    assert_eq!(
        (temperature.temperature_min, temperature.temperature_avg, temperature.temperature_max),
        (21, 22, 22)
    );

    let distances: Vec<_> = exercise.samples.iter().filter_map(|s| s.distance).collect();
    assert_eq!(distances, vec![0, 104, 220, 345, 345, 479]);
    let timestamps: Vec<_> = exercise.samples.iter().filter_map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 15_000, 30_000, 45_000, 60_000, 75_000]);
}

#[test]
fn hrm_laps_and_limits() {
    let exercise = parse_file(fixture("cycling-metric.hrm")).unwrap();

    assert_eq!(exercise.laps.len(), 2);
    let first = &exercise.laps[0];
    assert_eq!(first.time_split, 15_300);
    assert_eq!(first.heart_rate_split, Some(142));
    assert_eq!(first.heart_rate_avg, Some(138));
    assert_eq!(first.heart_rate_max, Some(165));
    let first_speed = first.speed.as_ref().unwrap();
    assert_eq!(first_speed.distance, 12_100);
    assert_eq!(first_speed.cadence, Some(88));
    assert!(close(first_speed.speed_end, 28.5, 1e-9));
    assert!(close(first_speed.speed_avg, 28.4706, 1e-3));
    assert_eq!(first.altitude.as_ref().map(|a| a.altitude), Some(450));
    assert_eq!(first.temperature.as_ref().map(|t| t.temperature), Some(21));

    let second = &exercise.laps[1];
    assert_eq!(second.time_split, 43_950);
    let second_speed = second.speed.as_ref().unwrap();
    // clamped to the trip distance
    assert_eq!(second_speed.distance, 34_500);
    assert!(close(second_speed.speed_avg, 28.1466, 1e-3));

    assert_eq!(exercise.heart_rate_limits.len(), 3);
    assert_eq!(
        exercise.heart_rate_limits[0],
        HeartRateLimit {
            lower_heart_rate: 120,
            upper_heart_rate: 160,
            time_below: Some(595),
            time_within: 2000,
            time_above: Some(1800),
            is_absolute_range: true,
        }
    );
    assert_eq!(exercise.heart_rate_limits[1], exercise.heart_rate_limits[0]);
    assert_eq!(exercise.heart_rate_limits[2].upper_heart_rate, 0);
    assert_eq!(exercise.heart_rate_limits[2].time_below, Some(4395));
}

#[test]
fn hrm_imperial_matches_metric_after_conversion() {
    let metric = parse_file(fixture("cycling-metric.hrm")).unwrap();
    let imperial = parse_file(fixture("cycling-imperial.hrm")).unwrap();

    assert_eq!(imperial.date_time, datetime(2010, 5, 1, 14, 5, 33));
    assert_eq!(imperial.odometer, metric.odometer);

    let metric_altitude = metric.altitude.as_ref().unwrap();
    let imperial_altitude = imperial.altitude.as_ref().unwrap();
    assert_eq!(imperial_altitude.ascent, metric_altitude.ascent);
    assert_eq!(imperial_altitude.altitude_avg, metric_altitude.altitude_avg);
    assert_eq!(imperial_altitude.altitude_max, metric_altitude.altitude_max);
    assert_eq!(imperial_altitude.altitude_min, metric_altitude.altitude_min);
    assert_eq!(feet_to_meter(1706), imperial_altitude.ascent);

    let metric_speed = metric.speed.as_ref().unwrap();
    let imperial_speed = imperial.speed.as_ref().unwrap();
    assert_eq!(imperial_speed.distance, 34_440);
    assert!((imperial_speed.distance - metric_speed.distance).abs() <= 100);
    assert!(close(imperial_speed.speed_avg, miles_to_km(2248.0 / 128.0), 1e-9));
    assert!(close(imperial_speed.speed_avg, metric_speed.speed_avg, 0.01));

    let altitudes: Vec<_> = imperial.samples.iter().filter_map(|s| s.altitude).collect();
    assert_eq!(altitudes, vec![450, 470, 500, 520, 480, 460]);

    let temperatures: Vec<_> = imperial
        .laps
        .iter()
        .filter_map(|lap| lap.temperature.as_ref().map(|t| t.temperature))
        .collect();
    assert_eq!(temperatures, vec![21, 23]);
    assert_eq!(
        imperial.laps[1].speed.as_ref().map(|s| s.distance),
        Some(34_440)
    );
}

#[test]
fn hrm_repair_makes_last_distance_exact() {
    let exercise = parse_file(fixture("running-short.hrm")).unwrap();

    assert_eq!(exercise.duration, Some(600));
    assert_eq!(exercise.samples.len(), 12);
    assert!(exercise.laps.is_empty());
    let recorded = exercise.speed.as_ref().unwrap().distance;
    assert_eq!(recorded, 300);
    assert_eq!(exercise.samples.last().and_then(|s| s.distance), Some(recorded));
    assert_eq!(exercise.samples[1].distance, Some(27));
    assert_eq!(exercise.altitude, None);
}

#[test]
fn ped_reads_first_exercise() {
    let exercise = parse_file(fixture("running.ped")).unwrap();

    assert_eq!(exercise.file_type, FileType::PolarPed);
    assert_eq!(exercise.date_time, datetime(2012, 3, 22, 18, 5, 0));
    assert_eq!(exercise.duration, Some(27_000));
    assert_eq!(exercise.energy, Some(612));
    assert_eq!(exercise.heart_rate_avg, Some(151));
    assert_eq!(exercise.heart_rate_max, Some(178));
    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 9000);
    assert!(close(speed.speed_avg, 12.0, 1e-9));
    assert!(exercise.samples.is_empty());
}

#[test]
fn rs200sd_laps_are_chronological_and_cumulative() {
    let exercise = parse_file(fixture("rs200sd.xml")).unwrap();

    assert_eq!(exercise.device_name.as_deref(), Some("Polar RS200"));
    assert_eq!(exercise.date_time, datetime(2006, 7, 14, 17, 32, 8));
    assert_eq!(exercise.duration, Some(18_000));
    assert_eq!(exercise.heart_rate_avg, Some(148));
    assert_eq!(exercise.energy, Some(420));

    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 5000);
    assert!(close(speed.speed_avg, 10.0, 1e-9));
    assert!(close(speed.speed_max, 12.0, 1e-9));

    let splits: Vec<_> = exercise.laps.iter().map(|lap| lap.time_split).collect();
    assert_eq!(splits, vec![3600, 10_800, 18_000]);
    let distances: Vec<_> = exercise
        .laps
        .iter()
        .filter_map(|lap| lap.speed.as_ref().map(|s| s.distance))
        .collect();
    assert_eq!(distances, vec![1000, 3000, 5000]);
    let end_speeds: Vec<_> = exercise
        .laps
        .iter()
        .filter_map(|lap| lap.speed.as_ref().map(|s| s.speed_end))
        .collect();
    assert!(close(end_speeds[0], 3600.0 / 340.0, 1e-9));
    assert_eq!(end_speeds[1], 0.0);
    assert!(close(end_speeds[2], 11.25, 1e-9));

    let bounds: Vec<_> = exercise
        .heart_rate_limits
        .iter()
        .map(|limit| (limit.lower_heart_rate, limit.upper_heart_rate, limit.time_within))
        .collect();
    assert_eq!(bounds, vec![(95, 114, 120), (114, 133, 600), (133, 152, 1080)]);
}

#[test]
fn rs200sd_without_distance_has_no_speed() {
    let exercise = parse_file(fixture("rs200sd-no-distance.xml")).unwrap();

    assert!(!exercise.recording_mode.speed);
    assert_eq!(exercise.speed, None);
    assert!(exercise.laps.iter().all(|lap| lap.speed.is_none()));
}

#[test]
fn tcx_removes_pause_between_laps() {
    let exercise = parse_file(fixture("two-laps-with-pause.tcx")).unwrap();

    assert_eq!(exercise.device_name.as_deref(), Some("Garmin Forerunner 305"));
    assert_eq!(exercise.exercise_type.as_deref(), Some("Running"));
    assert_eq!(exercise.date_time, datetime(2009, 8, 2, 10, 0, 0));
    assert_eq!(exercise.duration, Some(650));
    assert_eq!(exercise.energy, Some(30));
    assert!(exercise.recording_mode.location);

    let timestamps: Vec<i64> = exercise.samples.iter().filter_map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 10_000, 20_000, 25_000, 45_000, 65_000]);
    assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(
        *timestamps.last().unwrap(),
        exercise.duration.unwrap() as i64 * 100
    );

    let splits: Vec<_> = exercise.laps.iter().map(|lap| lap.time_split).collect();
    assert_eq!(splits, vec![200, 650]);
}

#[test]
fn tcx_summaries() {
    let exercise = parse_file(fixture("two-laps-with-pause.tcx")).unwrap();

    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 300);
    assert!(close(speed.speed_max, 18.0, 1e-9));
    assert!(close(speed.speed_avg, 0.3 / (65.0 / 3600.0), 1e-9));

    let speeds: Vec<f64> = exercise.samples.iter().filter_map(|s| s.speed).collect();
    let expected = [0.0, 18.0, 18.0, 0.0, 18.0, 18.0];
    assert!(speeds.iter().zip(expected).all(|(a, b)| close(*a, b, 1e-9)));

    assert_eq!(exercise.heart_rate_avg, Some(147));
    assert_eq!(exercise.heart_rate_max, Some(162));

    let altitude = exercise.altitude.as_ref().unwrap();
    assert_eq!(
        (altitude.altitude_min, altitude.altitude_avg, altitude.altitude_max),
        (100, 104, 110)
    );
    assert_eq!((altitude.ascent, altitude.descent), (12, 4));

    let cadence = exercise.cadence.as_ref().unwrap();
    assert_eq!((cadence.cadence_avg, cadence.cadence_max), (88, 92));

    let lap = &exercise.laps[1];
    assert_eq!(lap.heart_rate_split, Some(160));
    assert_eq!(lap.speed.as_ref().map(|s| s.distance), Some(300));
    assert_eq!(lap.speed.as_ref().and_then(|s| s.cadence), Some(92));
    assert_eq!(lap.altitude.as_ref().map(|a| (a.altitude, a.ascent)), Some((108, 8)));
    assert!(lap.position_split.is_some());
}

#[test]
fn gpx_derives_distance_and_speed() {
    let exercise = parse_file(fixture("with-heart-rate.gpx")).unwrap();

    assert_eq!(exercise.device_name.as_deref(), Some("Garmin Oregon 450"));
    // the metadata time is when the file was saved
    assert_eq!(exercise.date_time, datetime(2011, 6, 5, 8, 0, 0));
    assert_eq!(exercise.duration, Some(1200));

    let timestamps: Vec<_> = exercise.samples.iter().filter_map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 60_000, 60_000, 120_000]);
    let distances: Vec<_> = exercise.samples.iter().filter_map(|s| s.distance).collect();
    assert_eq!(distances, vec![0, 100, 100, 200]);
    let speeds: Vec<f64> = exercise.samples.iter().filter_map(|s| s.speed).collect();
    assert_eq!(speeds[0], 0.0);
    assert!(close(speeds[1], 6.0045, 1e-3));
    assert_eq!(speeds[2], 0.0);

    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 200);
    assert!(close(speed.speed_avg, 6.0, 1e-9));
    assert_eq!(exercise.heart_rate_avg, Some(110));
    assert_eq!(exercise.heart_rate_max, Some(122));

    let altitude = exercise.altitude.as_ref().unwrap();
    assert_eq!(
        (altitude.altitude_min, altitude.altitude_avg, altitude.altitude_max),
        (209, 212, 214)
    );
    assert_eq!((altitude.ascent, altitude.descent), (4, 5));
}

#[test]
fn gpx_without_timestamps_has_no_speed() {
    let exercise = parse_file(fixture("without-timestamps.gpx")).unwrap();

    assert!(!exercise.recording_mode.speed);
    assert!(exercise.recording_mode.location);
    assert_eq!(exercise.date_time, None);
    assert_eq!(exercise.speed, None);
    assert_eq!(exercise.samples.len(), 3);
    assert!(exercise.samples.iter().all(|s| s.speed.is_none() && s.distance.is_none()));
    assert!(exercise.samples.iter().all(|s| s.position.is_some()));
}

#[test]
fn smartsync_heart_rate_only() {
    let exercise = parse_file(fixture("heart-rate.csv")).unwrap();

    assert_eq!(exercise.file_type, FileType::SmartsyncCsv);
    assert_eq!(exercise.date_time, datetime(2007, 7, 23, 9, 4, 30));
    assert_eq!(exercise.duration, Some(400));
    assert_eq!(exercise.recording_interval, Some(RecordingInterval::Fixed(10)));
    assert_eq!(exercise.heart_rate_avg, Some(124));
    assert_eq!(exercise.heart_rate_max, Some(140));
    assert!(!exercise.recording_mode.speed);
    let timestamps: Vec<_> = exercise.samples.iter().filter_map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 10_000, 20_000, 30_000, 40_000]);
}

#[test]
fn fit_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let exercise = parse_file(forerunner_run(dir.path())).expect("fit stream should parse");

    assert_eq!(exercise.file_type, FileType::GarminFit);
    assert_eq!(exercise.device_name.as_deref(), Some("Garmin Forerunner 910XT (SW 2.5)"));
    assert_eq!(exercise.exercise_type.as_deref(), Some("Running"));
    assert_eq!(exercise.date_time, datetime(2021, 9, 8, 1, 46, 40));
    assert_eq!(exercise.duration, Some(200));
    assert_eq!(exercise.recording_interval, Some(RecordingInterval::Dynamic));
    assert_eq!(exercise.heart_rate_avg, Some(150));
    assert_eq!(exercise.heart_rate_max, Some(160));

    let timestamps: Vec<_> = exercise.samples.iter().filter_map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 10_000, 20_000]);
    let distances: Vec<_> = exercise.samples.iter().filter_map(|s| s.distance).collect();
    assert_eq!(distances, vec![0, 50, 100]);
    for sample in &exercise.samples {
        assert!(close(sample.speed.unwrap(), 19.8, 1e-9), "{:?}", sample.speed);
    }

    // the session has no speeds, so they come from the distance and the samples
    let speed = exercise.speed.as_ref().unwrap();
    assert_eq!(speed.distance, 100);
    assert!(close(speed.speed_avg, 18.0, 1e-9));
    assert!(close(speed.speed_max, 19.8, 1e-9));

    assert_eq!(exercise.laps.len(), 1);
    let lap = &exercise.laps[0];
    assert_eq!(lap.time_split, 200);
    assert_eq!(lap.heart_rate_split, Some(160));
    let lap_speed = lap.speed.as_ref().unwrap();
    assert_eq!(lap_speed.distance, 100);
    assert!(close(lap_speed.speed_avg, 18.0, 1e-9));
    assert!(close(lap_speed.speed_end, 19.8, 1e-9));

    assert!(exercise.recording_mode.heart_rate);
    assert!(!exercise.recording_mode.altitude);
}

#[test]
fn parsing_twice_yields_equal_exercises() {
    for name in [
        "cycling-metric.hrm",
        "running.ped",
        "rs200sd.xml",
        "two-laps-with-pause.tcx",
        "with-heart-rate.gpx",
        "heart-rate.csv",
    ] {
        let first = parse_file(fixture(name)).unwrap();
        let second = parse_file(fixture(name)).unwrap();
        assert_eq!(first, second, "{name}");
    }

    let dir = tempfile::tempdir().unwrap();
    let fit = forerunner_run(dir.path());
    assert_eq!(parse_file(&fit).unwrap(), parse_file(&fit).unwrap());
}

#[test]
fn recording_mode_matches_summaries() {
    for name in [
        "cycling-imperial.hrm",
        "cycling-metric.hrm",
        "running-short.hrm",
        "running.ped",
        "rs200sd.xml",
        "rs200sd-no-distance.xml",
        "two-laps-with-pause.tcx",
        "with-heart-rate.gpx",
        "without-timestamps.gpx",
        "heart-rate.csv",
    ] {
        check_recording_mode(name, &parse_file(fixture(name)).unwrap());
    }

    let dir = tempfile::tempdir().unwrap();
    check_recording_mode("forerunner-run.fit", &parse_file(forerunner_run(dir.path())).unwrap());
}

fn check_recording_mode(name: &str, exercise: &Exercise) {
    let mode = &exercise.recording_mode;
    assert_eq!(mode.speed, exercise.speed.is_some(), "{name} speed");
    assert_eq!(mode.altitude, exercise.altitude.is_some(), "{name} altitude");
    assert_eq!(mode.cadence, exercise.cadence.is_some(), "{name} cadence");
    assert_eq!(mode.temperature, exercise.temperature.is_some(), "{name} temperature");
    assert_eq!(mode.power, exercise.power.is_some(), "{name} power");
}

#[test]
fn missing_files_are_reported_for_every_format() {
    let dir = tempfile::tempdir().unwrap();
    for suffix in ["hrm", "ped", "xml", "tcx", "fit", "gpx", "csv"] {
        let path = dir.path().join(format!("missing.{suffix}"));
        let err = parse_file(&path).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FileNotFound, "{suffix}");
    }
}

#[test]
fn upper_case_suffix_dispatches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("HEART-RATE.CSV");
    std::fs::copy(fixture("heart-rate.csv"), &path).unwrap();

    let exercise = parse_file(&path).unwrap();
    assert_eq!(exercise.file_type, FileType::SmartsyncCsv);
}

#[test]
fn malformed_content_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.hrm");
    std::fs::write(&path, "[Params]\nVersion=106\n").unwrap();

    let err = parse_file(&path).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    assert!(err.message.contains("broken.hrm"));
}
