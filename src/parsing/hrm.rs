//! Polar HRM block-text files.
//!
//! The file is a list of `[Name]` blocks, each a run of lines up to the next
//! blank line or block marker. Imperial values are converted to metric while
//! reading.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::summary::{
    CadenceAverage, altitude_summary, cadence_summary, compute_lap_average_speeds,
    heart_rate_avg_max, integrate_sample_distances, lap_temperature_summary, max_sample_speed,
};
use super::types::{ParseError, ParseResult, ParserInfo, decode_text, parse_number};
use super::ExerciseParser;
use crate::model::{
    Exercise, ExerciseAltitude, ExerciseSpeed, FileType, HeartRateLimit, Lap, LapAltitude,
    LapSpeed, LapTemperature, RecordingInterval, RecordingMode, Sample,
};
use crate::units::{fahrenheit_to_celsius, feet_to_meter, miles_to_km, miles_to_km_rounded};

static INFO: ParserInfo = ParserInfo {
    name: "Polar HRM",
    suffixes: &["hrm"],
};

pub struct HrmParser;

impl ExerciseParser for HrmParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let content = HrmContent::new(decode_text(bytes)?);
        let mut exercise = Exercise::new(FileType::PolarHrm);
        exercise.device_name = Some("Polar HRM".to_string());

        let units = parse_params(&content, &mut exercise)?;
        parse_laps(&content, &mut exercise, units)?;
        parse_heart_rate_limits(&content, &mut exercise)?;
        parse_trip(&content, &mut exercise, units)?;
        parse_samples(&content, &mut exercise, units)?;
        compute_lap_average_speeds(&mut exercise.laps);
        // laps carry the only temperatures an HRM file has
        if exercise.recording_mode.temperature {
            exercise.temperature = lap_temperature_summary(&exercise.laps);
        }

        Ok(exercise)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Units {
    Metric,
    Imperial,
}

impl Units {
    fn altitude(self, value: i32) -> i32 {
        match self {
            Units::Metric => value,
            Units::Imperial => feet_to_meter(value),
        }
    }

    fn distance(self, value: i32) -> i32 {
        match self {
            Units::Metric => value,
            Units::Imperial => miles_to_km_rounded(value),
        }
    }
}

struct HrmContent<'a> {
    lines: Vec<&'a str>,
}

impl<'a> HrmContent<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    /// Lines of the named block. A required block that is missing or empty
    /// is a structural error.
    fn block(&self, name: &str, required: bool) -> ParseResult<Vec<&'a str>> {
        let marker = format!("[{name}]");
        let lines: Vec<&str> = self
            .lines
            .iter()
            .skip_while(|line| !line.starts_with(&marker))
            .skip(1)
            .take_while(|line| !line.trim().is_empty() && !line.starts_with('['))
            .copied()
            .collect();

        if required && lines.is_empty() {
            return Err(ParseError::malformed(format!("missing block [{name}]")));
        }
        Ok(lines)
    }
}

fn value<'a>(block: &[&'a str], name: &str) -> ParseResult<&'a str> {
    block
        .iter()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix('='))
        .map(str::trim)
        .ok_or_else(|| ParseError::malformed(format!("missing value '{name}' in [Params]")))
}

/// Split `h:mm:ss.t` or `hh:mm:ss.t` into its four parts.
fn parse_clock(raw: &str, field: &str) -> ParseResult<[u32; 4]> {
    let parts: Vec<&str> = raw.trim().split([':', '.']).collect();
    let [hours, minutes, seconds, tenths] = parts.as_slice() else {
        return Err(ParseError::malformed(format!("invalid time '{raw}' for {field}")));
    };
    Ok([
        parse_number(hours, field)?,
        parse_number(minutes, field)?,
        parse_number(seconds, field)?,
        parse_number(tenths, field)?,
    ])
}

fn clock_to_tenths([hours, minutes, seconds, tenths]: [u32; 4]) -> u32 {
    hours * 36_000 + minutes * 600 + seconds * 10 + tenths
}

fn columns<'a>(line: &'a str, expected: usize, what: &str) -> ParseResult<Vec<&'a str>> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() != expected {
        return Err(ParseError::malformed(format!(
            "expected {expected} columns in {what}, found {}",
            parts.len()
        )));
    }
    Ok(parts)
}

fn parse_params(content: &HrmContent, exercise: &mut Exercise) -> ParseResult<Units> {
    let params = content.block("Params", true)?;

    let version = value(&params, "Version")?;
    if version != "106" && version != "107" {
        return Err(ParseError::malformed(format!(
            "unsupported HRM version '{version}', expected 106 or 107"
        )));
    }

    // S720 and later write 9 mode characters instead of 8
    let smode: Vec<char> = value(&params, "SMode")?.chars().collect();
    if smode.len() < 8 {
        return Err(ParseError::malformed("SMode needs at least 8 characters"));
    }
    let flag = |index: usize| smode[index] == '1';
    exercise.recording_mode = RecordingMode {
        heart_rate: true,
        speed: flag(0),
        cadence: flag(1),
        altitude: flag(2),
        power: flag(3),
        temperature: flag(2),
        ..RecordingMode::default()
    };
    if exercise.recording_mode.speed {
        exercise.speed = Some(ExerciseSpeed::default());
    }
    let units = if smode[7] == '0' {
        Units::Metric
    } else {
        Units::Imperial
    };

    let date = value(&params, "Date")?;
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|err| {
        ParseError::malformed(format!("invalid date '{date}'")).with_cause(err)
    })?;
    let [hour, minute, second, _] = parse_clock(value(&params, "StartTime")?, "StartTime")?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ParseError::malformed("StartTime out of range"))?;
    exercise.date_time = Some(NaiveDateTime::new(date, time));

    exercise.duration = Some(clock_to_tenths(parse_clock(value(&params, "Length")?, "Length")?));
    exercise.recording_interval = Some(RecordingInterval::Fixed(parse_number(
        value(&params, "Interval")?,
        "Interval",
    )?));

    Ok(units)
}

fn parse_laps(content: &HrmContent, exercise: &mut Exercise, units: Units) -> ParseResult<()> {
    // empty for monitors without lap support
    let block = content.block("IntTimes", false)?;
    if block.len() % 5 != 0 {
        return Err(ParseError::malformed("[IntTimes] needs 5 lines per lap"));
    }

    let mode = exercise.recording_mode.clone();
    let mut distance_accumulated = 0;

    for group in block.chunks(5) {
        let mut lap = Lap::default();

        let first = columns(group[0], 5, "lap line 1")?;
        lap.time_split = clock_to_tenths(parse_clock(first[0], "lap split time")?);
        lap.heart_rate_split = Some(parse_number(first[1], "lap heart rate")?);
        lap.heart_rate_avg = Some(parse_number(first[3], "lap heart rate average")?);
        lap.heart_rate_max = Some(parse_number(first[4], "lap heart rate maximum")?);

        let second = columns(group[1], 6, "lap line 2")?;
        if mode.speed {
            let speed = parse_number::<i32>(second[3], "lap speed")? as f64 / 10.0;
            let speed_end = match units {
                Units::Metric => speed,
                Units::Imperial => miles_to_km(speed),
            };
            let cadence = if mode.cadence {
                Some(parse_number(second[4], "lap cadence")?)
            } else {
                None
            };
            lap.speed = Some(LapSpeed {
                speed_end,
                cadence,
                ..LapSpeed::default()
            });
        }
        if mode.altitude {
            let altitude = units.altitude(parse_number(second[5], "lap altitude")?);
            lap.altitude = Some(LapAltitude {
                altitude: altitude as i16,
                ..LapAltitude::default()
            });
        }

        let fourth = columns(group[3], 6, "lap line 4")?;
        if let Some(speed) = lap.speed.as_mut() {
            // stored per lap; imperial files use the same scale here
            distance_accumulated += parse_number::<i32>(fourth[1], "lap distance")?;
            speed.distance = distance_accumulated;
        }
        if mode.altitude {
            let raw = parse_number::<i32>(fourth[3], "lap temperature")? / 10;
            let temperature = match units {
                Units::Metric => raw as i16,
                Units::Imperial => fahrenheit_to_celsius(raw as i16),
            };
            lap.temperature = Some(LapTemperature { temperature });
        }

        exercise.laps.push(lap);
    }
    Ok(())
}

fn parse_heart_rate_limits(content: &HrmContent, exercise: &mut Exercise) -> ParseResult<()> {
    // 6 lines on RCX3 exports, 7 or 8 elsewhere
    let block = content.block("Summary-123", true)?;
    if block.len() < 6 {
        return Err(ParseError::malformed("[Summary-123] needs at least 6 lines"));
    }

    // the second and third range are often copies or zero, kept as written
    for pair in block[..6].chunks(2) {
        let times = columns(pair[0], 6, "heart rate limit times")?;
        let bounds = columns(pair[1], 4, "heart rate limit bounds")?;
        exercise.heart_rate_limits.push(HeartRateLimit {
            upper_heart_rate: parse_number(bounds[1], "upper heart rate")?,
            lower_heart_rate: parse_number(bounds[2], "lower heart rate")?,
            time_above: Some(parse_number(times[2], "time above")?),
            time_within: parse_number(times[3], "time within")?,
            time_below: Some(parse_number(times[4], "time below")?),
            is_absolute_range: true,
        });
    }
    Ok(())
}

fn parse_trip(content: &HrmContent, exercise: &mut Exercise, units: Units) -> ParseResult<()> {
    // missing on S410 and S610
    let block = content.block("Trip", false)?;
    if block.len() != 8 {
        debug!(lines = block.len(), "no usable [Trip] block");
        return Ok(());
    }
    let number = |index: usize, field: &str| parse_number::<i32>(block[index], field);

    if let Some(speed) = exercise.speed.as_mut() {
        // maximum speed in [Trip] is unreliable, taken from samples later
        speed.distance = units.distance(number(0, "trip distance")? * 100);
        let speed_avg = number(5, "trip average speed")? as f64 / 128.0;
        speed.speed_avg = match units {
            Units::Metric => speed_avg,
            Units::Imperial => miles_to_km(speed_avg),
        };

        // some firmware writes lap distances beyond the exercise total
        let total = speed.distance;
        for lap_speed in exercise.laps.iter_mut().filter_map(|lap| lap.speed.as_mut()) {
            lap_speed.distance = lap_speed.distance.min(total);
        }
    }

    if exercise.recording_mode.altitude {
        exercise.altitude = Some(ExerciseAltitude {
            ascent: units.altitude(number(1, "trip ascent")?),
            altitude_avg: units.altitude(number(3, "trip average altitude")?) as i16,
            altitude_max: units.altitude(number(4, "trip maximum altitude")?) as i16,
            ..ExerciseAltitude::default()
        });
    }

    exercise.odometer = Some(units.distance(number(7, "odometer")?));
    Ok(())
}

fn parse_samples(content: &HrmContent, exercise: &mut Exercise, units: Units) -> ParseResult<()> {
    let block = content.block("HRData", true)?;
    let mode = exercise.recording_mode.clone();
    let interval = match exercise.recording_interval {
        Some(RecordingInterval::Fixed(seconds)) => seconds,
        _ => 0,
    };

    for (index, line) in block.iter().enumerate() {
        let mut fields = line.split('\t');
        let mut sample = Sample {
            timestamp: Some(index as i64 * interval as i64 * 1000),
            ..Sample::default()
        };

        let heart_rate = fields
            .next()
            .ok_or_else(|| ParseError::malformed("empty sample line"))?;
        sample.heart_rate = Some(parse_number(heart_rate, "sample heart rate")?);

        // columns follow the order speed, cadence, altitude for enabled streams
        if mode.speed {
            if let Some(raw) = fields.next() {
                let speed_x10 = units.distance(parse_number(raw, "sample speed")?);
                sample.speed = Some(speed_x10 as f64 / 10.0);
            }
        }
        if mode.cadence {
            if let Some(raw) = fields.next() {
                sample.cadence = Some(parse_number(raw, "sample cadence")?);
            }
        }
        if mode.altitude {
            if let Some(raw) = fields.next() {
                sample.altitude = Some(units.altitude(parse_number(raw, "sample altitude")?) as i16);
            }
        }

        exercise.samples.push(sample);
    }

    if mode.speed {
        integrate_sample_distances(&mut exercise.samples, interval);
        let speed_max = max_sample_speed(&exercise.samples).unwrap_or(0.0);
        if let Some(speed) = exercise.speed.as_mut() {
            speed.speed_max = speed_max.max(0.0);
        }
    }

    if let Some((avg, max)) = heart_rate_avg_max(&exercise.samples) {
        exercise.heart_rate_avg = Some(avg);
        exercise.heart_rate_max = Some(max);
    }

    if mode.altitude {
        if let Some(from_samples) = altitude_summary(&exercise.samples) {
            if let Some(altitude) = exercise.altitude.as_mut() {
                altitude.altitude_min = from_samples.altitude_min;
            } else {
                exercise.altitude = Some(from_samples);
            }
        }
    }

    if mode.cadence {
        exercise.cadence = cadence_summary(&exercise.samples, CadenceAverage::AllSamples);
    }

    exercise.repair_samples();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ParseErrorKind;

    #[test]
    fn clock_accepts_one_or_two_digit_hours() {
        assert_eq!(parse_clock("1:13:15.0", "Length").unwrap(), [1, 13, 15, 0]);
        assert_eq!(parse_clock("13:05:00.4", "Length").unwrap(), [13, 5, 0, 4]);
        assert_eq!(clock_to_tenths([1, 13, 15, 0]), 43_950);
        assert!(parse_clock("13:05", "StartTime").is_err());
    }

    #[test]
    fn block_ends_at_blank_line_or_next_marker() {
        let content = HrmContent::new("[A]\n1\n2\n\n3\n[B]\nx\n[C]\ny");
        assert_eq!(content.block("A", true).unwrap(), vec!["1", "2"]);
        assert_eq!(content.block("B", true).unwrap(), vec!["x"]);
        assert!(content.block("D", false).unwrap().is_empty());
        assert!(content.block("D", true).is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let text = "[Params]\nVersion=105\nSMode=000000000\n\n[HRData]\n100\n";
        let err = HrmParser.decode(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
        assert!(err.message.contains("105"));
    }
}
