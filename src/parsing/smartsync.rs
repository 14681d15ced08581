//! Oregon Scientific Smartsync heart rate export (`.csv`).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::summary::heart_rate_avg_max;
use super::types::{ParseError, ParseResult, ParserInfo, decode_text, parse_number};
use super::ExerciseParser;
use crate::model::{Exercise, FileType, RecordingInterval, RecordingMode, Sample};

static INFO: ParserInfo = ParserInfo {
    name: "Smartsync CSV",
    suffixes: &["csv"],
};

pub struct SmartsyncParser;

impl ExerciseParser for SmartsyncParser {
    fn info(&self) -> &'static ParserInfo {
        &INFO
    }

    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let mut date = None;
        let mut time = None;
        let mut interval = None;
        let mut heart_rates = Vec::new();

        for line in decode_text(bytes)?.lines().map(str::trim_end) {
            if let Some(value) = line.strip_prefix(',') {
                heart_rates.push(parse_number::<u16>(value, "heart rate")?);
            } else if let Some(value) = line.strip_prefix("Date,") {
                date = Some(NaiveDate::parse_from_str(value.trim(), "%m/%d/%Y").map_err(|err| {
                    ParseError::malformed(format!("invalid date '{value}'")).with_cause(err)
                })?);
            } else if let Some(value) = line.strip_prefix("Time,") {
                // h:mm:ss or hh:mm:ss
                time = Some(NaiveTime::parse_from_str(value.trim(), "%H:%M:%S").map_err(|err| {
                    ParseError::malformed(format!("invalid start time '{value}'")).with_cause(err)
                })?);
            } else if let Some(value) = line.strip_prefix("SamplingRate,") {
                interval = Some(parse_number::<u16>(value, "SamplingRate")?);
            }
        }

        let interval =
            interval.ok_or_else(|| ParseError::malformed("missing SamplingRate line"))?;

        let mut exercise = Exercise::new(FileType::SmartsyncCsv);
        exercise.device_name = Some("Oregon Scientific Smartsync".to_string());
        exercise.recording_mode = RecordingMode {
            heart_rate: true,
            ..RecordingMode::default()
        };
        exercise.recording_interval = Some(RecordingInterval::Fixed(interval));
        let start = time.or_else(|| NaiveTime::from_hms_opt(12, 0, 0));
        exercise.date_time = date
            .zip(start)
            .map(|(date, start)| NaiveDateTime::new(date, start));
        exercise.duration =
            Some(heart_rates.len().saturating_sub(1) as u32 * interval as u32 * 10);

        exercise.samples = heart_rates
            .iter()
            .enumerate()
            .map(|(index, &heart_rate)| Sample {
                timestamp: Some(index as i64 * interval as i64 * 1000),
                heart_rate: Some(heart_rate),
                ..Sample::default()
            })
            .collect();
        if let Some((avg, max)) = heart_rate_avg_max(&exercise.samples) {
            exercise.heart_rate_avg = Some(avg);
            exercise.heart_rate_max = Some(max);
        }

        Ok(exercise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_time_defaults_to_noon() {
        let csv = "Name,Test\nDate,03/14/2008\nSamplingRate,2\nHeartRate\n,80\n,90\n";
        let exercise = SmartsyncParser.decode(csv.as_bytes()).unwrap();
        assert_eq!(
            exercise.date_time,
            NaiveDate::from_ymd_opt(2008, 3, 14).and_then(|d| d.and_hms_opt(12, 0, 0))
        );
        assert_eq!(exercise.duration, Some(20));
    }

    #[test]
    fn sampling_rate_is_required() {
        let err = SmartsyncParser.decode(b",80\n,90\n").unwrap_err();
        assert!(err.message.contains("SamplingRate"));
    }
}
