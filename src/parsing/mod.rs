pub mod fit;
pub mod gpx;
pub mod hrm;
pub mod ped;
pub mod rs200sd;
pub mod smartsync;
pub mod summary;
pub mod tcx;
pub mod types;
pub mod xml;

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use tracing::debug;

use crate::model::Exercise;

pub use types::{ParseError, ParseErrorKind, ParseResult, ParserInfo};

/// A decoder for one exercise file format.
///
/// Implementors only provide [`ExerciseParser::decode`]; reading the file and
/// keeping the recording mode consistent with the decoded data is shared.
pub trait ExerciseParser: Send + Sync {
    fn info(&self) -> &'static ParserInfo;

    /// Build an exercise from the complete file content.
    fn decode(&self, bytes: &[u8]) -> ParseResult<Exercise>;

    fn parse_bytes(&self, bytes: &[u8]) -> ParseResult<Exercise> {
        let mut exercise = self.decode(bytes)?;
        enforce_recording_mode(&mut exercise);
        debug!(
            parser = self.info().name,
            samples = exercise.samples.len(),
            laps = exercise.laps.len(),
            "decoded exercise"
        );
        Ok(exercise)
    }

    fn parse(&self, path: &Path) -> ParseResult<Exercise> {
        let bytes = std::fs::read(path).map_err(|err| ParseError::from_io(err, path))?;
        self.parse_bytes(&bytes).map_err(|mut err| {
            err.message = format!("{} ({})", err.message, path.display());
            err
        })
    }
}

/// Keep the recording mode and the decoded values consistent.
///
/// A set flag needs its exercise summary, so speed, altitude, cadence,
/// temperature and power flags without one are cleared first. Every summary,
/// sample field or lap field whose flag is unset is then dropped.
pub fn enforce_recording_mode(exercise: &mut Exercise) {
    let mode = &mut exercise.recording_mode;
    mode.speed &= exercise.speed.is_some();
    mode.altitude &= exercise.altitude.is_some();
    mode.cadence &= exercise.cadence.is_some();
    mode.temperature &= exercise.temperature.is_some();
    mode.power &= exercise.power.is_some();
    let mode = mode.clone();

    if !mode.heart_rate {
        exercise.heart_rate_avg = None;
        exercise.heart_rate_max = None;
    }
    if !mode.speed {
        exercise.speed = None;
    }
    if !mode.altitude {
        exercise.altitude = None;
    }
    if !mode.cadence {
        exercise.cadence = None;
    }
    if !mode.temperature {
        exercise.temperature = None;
    }
    if !mode.power {
        exercise.power = None;
    }

    for sample in &mut exercise.samples {
        if !mode.heart_rate {
            sample.heart_rate = None;
        }
        if !mode.speed {
            sample.speed = None;
            sample.distance = None;
        }
        if !mode.altitude {
            sample.altitude = None;
        }
        if !mode.cadence {
            sample.cadence = None;
        }
        if !mode.temperature {
            sample.temperature = None;
        }
        if !mode.power {
            sample.power = None;
        }
        if !mode.location {
            sample.position = None;
        }
    }

    for lap in &mut exercise.laps {
        if !mode.heart_rate {
            lap.heart_rate_split = None;
            lap.heart_rate_avg = None;
            lap.heart_rate_max = None;
        }
        if !mode.speed {
            lap.speed = None;
        } else if !mode.cadence {
            if let Some(speed) = lap.speed.as_mut() {
                speed.cadence = None;
            }
        }
        if !mode.altitude {
            lap.altitude = None;
        }
        if !mode.temperature {
            lap.temperature = None;
        }
        if !mode.power {
            lap.power = None;
        }
        if !mode.location {
            lap.position_split = None;
        }
    }
}

/// Immutable lookup of decoders by file suffix.
pub struct Registry {
    parsers: Vec<Box<dyn ExerciseParser>>,
    by_suffix: HashMap<String, usize>,
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(vec![
        Box::new(hrm::HrmParser),
        Box::new(ped::PedParser),
        Box::new(rs200sd::Rs200sdParser),
        Box::new(tcx::TcxParser),
        Box::new(fit::FitParser),
        Box::new(gpx::GpxParser),
        Box::new(smartsync::SmartsyncParser),
    ])
    .unwrap_or_else(|err| panic!("built-in parsers must not share suffixes: {err}"))
});

impl Registry {
    /// Register decoders. Two decoders claiming the same suffix is a
    /// configuration error.
    pub fn new(parsers: Vec<Box<dyn ExerciseParser>>) -> ParseResult<Self> {
        let mut by_suffix = HashMap::new();
        for (index, parser) in parsers.iter().enumerate() {
            let info = parser.info();
            for suffix in info.suffixes {
                let key = suffix.to_ascii_lowercase();
                if let Some(previous) = by_suffix.insert(key, index) {
                    return Err(ParseError::new(
                        ParseErrorKind::Configuration,
                        format!(
                            "suffix '{suffix}' claimed by both '{}' and '{}'",
                            parsers[previous].info().name,
                            info.name
                        ),
                    ));
                }
            }
        }
        Ok(Self { parsers, by_suffix })
    }

    /// Registry of all decoders shipped with the crate.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn infos(&self) -> Vec<&'static ParserInfo> {
        self.parsers.iter().map(|parser| parser.info()).collect()
    }

    /// Select the decoder for a filename by its extension, ignoring case.
    pub fn parser_for(&self, filename: &str) -> ParseResult<&dyn ExerciseParser> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ParseError::unsupported(format!("'{filename}' has no file extension"))
            })?;

        self.by_suffix
            .get(&extension)
            .map(|&index| self.parsers[index].as_ref())
            .ok_or_else(|| {
                ParseError::unsupported(format!("no parser for '.{extension}' files ({filename})"))
            })
    }

    pub fn parse_file(&self, path: &Path) -> ParseResult<Exercise> {
        let filename = path.to_string_lossy();
        self.parser_for(&filename)?.parse(path)
    }

    /// Parse content already in memory, using `filename` only for dispatch.
    pub fn parse_bytes(&self, filename: &str, bytes: &[u8]) -> ParseResult<Exercise> {
        self.parser_for(filename)?.parse_bytes(bytes)
    }
}

/// Parse an exercise file with the built-in decoders.
pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Exercise> {
    Registry::builtin().parse_file(path.as_ref())
}

/// Parse in-memory content with the built-in decoders.
pub fn parse_bytes(filename: &str, bytes: &[u8]) -> ParseResult<Exercise> {
    Registry::builtin().parse_bytes(filename, bytes)
}
