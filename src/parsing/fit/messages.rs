//! Typed views of the FIT messages an exercise is built from.
//!
//! `fitparser` hands out loosely typed fields. Everything the accumulator
//! needs is pulled out here so it never touches raw [`Value`]s.

use chrono::NaiveDateTime;
use fitparser::profile::MesgNum;
use fitparser::{FitDataField, FitDataRecord, Value};

use super::devices::ProductId;
use crate::model::Position;
use crate::units::semicircle_to_degree;

/// Global number of the heart rate zone message newer Garmin devices write.
pub const HEART_RATE_ZONES_MESG_NUM: u16 = 216;
const ZONE_TIMES_FIELD: u8 = 2;
const ZONE_BOUNDARIES_FIELD: u8 = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum FitMessage {
    Session(SessionMessage),
    Lap(LapMessage),
    Record(RecordMessage),
    Length(LengthMessage),
    DeviceInfo(DeviceInfoMessage),
    HeartRateZones(HeartRateZonesMessage),
}

/// Speeds are m/s and distances meters, as stored in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMessage {
    pub start_time: Option<NaiveDateTime>,
    /// seconds
    pub total_timer_time: Option<f64>,
    pub avg_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub total_calories: Option<u32>,
    pub total_distance: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub start_position: Option<Position>,
    pub total_ascent: Option<u16>,
    pub total_descent: Option<u16>,
    pub avg_cadence: Option<u16>,
    pub max_cadence: Option<u16>,
    pub total_cycles: Option<u32>,
    pub avg_power: Option<u16>,
    pub max_power: Option<u16>,
    pub normalized_power: Option<u16>,
    /// Seconds below, within each zone and above, in that order.
    pub time_in_hr_zone: Vec<f64>,
    pub sport: Option<String>,
    pub sub_sport: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapMessage {
    /// End of the lap.
    pub timestamp: Option<NaiveDateTime>,
    pub avg_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub total_distance: Option<f64>,
    pub avg_speed: Option<f64>,
    pub total_ascent: Option<u16>,
    pub total_descent: Option<u16>,
    pub end_position: Option<Position>,
    pub avg_power: Option<u16>,
    pub max_power: Option<u16>,
    pub normalized_power: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMessage {
    pub timestamp: Option<NaiveDateTime>,
    pub heart_rate: Option<u16>,
    pub distance: Option<f64>,
    pub speed: Option<f64>,
    pub enhanced_speed: Option<f64>,
    pub altitude: Option<f64>,
    pub enhanced_altitude: Option<f64>,
    pub cadence: Option<u16>,
    pub power: Option<u16>,
    pub temperature: Option<i16>,
    pub position: Option<Position>,
}

/// A pool swimming length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LengthMessage {
    pub start_time: Option<NaiveDateTime>,
    /// seconds
    pub total_elapsed_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInfoMessage {
    pub manufacturer: Option<String>,
    pub product: Option<ProductId>,
    pub software_version: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartRateZonesMessage {
    /// Zone boundaries in bpm, one more than the number of zones.
    pub boundaries: Vec<u16>,
    /// Seconds below, within each zone and above.
    pub times: Vec<f64>,
}

impl FitMessage {
    /// Map a decoded record, `None` for messages that carry no exercise data.
    pub fn from_record(record: &FitDataRecord) -> Option<Self> {
        let fields = Fields(record.fields());
        let message = match record.kind() {
            MesgNum::Session => FitMessage::Session(session(&fields)),
            MesgNum::Lap => FitMessage::Lap(lap(&fields)),
            MesgNum::Record => FitMessage::Record(record_message(&fields)),
            MesgNum::Length => FitMessage::Length(LengthMessage {
                start_time: fields.timestamp("start_time"),
                total_elapsed_time: fields.number("total_elapsed_time"),
            }),
            MesgNum::DeviceInfo => FitMessage::DeviceInfo(device_info(&fields)),
            kind if kind.as_u16() == HEART_RATE_ZONES_MESG_NUM => {
                FitMessage::HeartRateZones(heart_rate_zones(&fields)?)
            }
            _ => return None,
        };
        Some(message)
    }
}

fn session(fields: &Fields<'_>) -> SessionMessage {
    SessionMessage {
        start_time: fields.timestamp("start_time").or_else(|| fields.timestamp("timestamp")),
        total_timer_time: fields.number("total_timer_time"),
        avg_heart_rate: fields.unsigned("avg_heart_rate"),
        max_heart_rate: fields.unsigned("max_heart_rate"),
        total_calories: fields.unsigned("total_calories"),
        total_distance: fields.number("total_distance"),
        avg_speed: fields.enhanced("enhanced_avg_speed", "avg_speed"),
        max_speed: fields.enhanced("enhanced_max_speed", "max_speed"),
        start_position: fields.position("start_position_lat", "start_position_long"),
        total_ascent: fields.unsigned("total_ascent"),
        total_descent: fields.unsigned("total_descent"),
        avg_cadence: fields
            .first_number(&["avg_cadence", "avg_running_cadence"])
            .map(|value| value.round() as u16),
        max_cadence: fields
            .first_number(&["max_cadence", "max_running_cadence"])
            .map(|value| value.round() as u16),
        total_cycles: fields
            .first_number(&["total_cycles", "total_strides", "total_strokes"])
            .map(|value| value.round() as u32),
        avg_power: fields.unsigned("avg_power"),
        max_power: fields.unsigned("max_power"),
        normalized_power: fields.unsigned("normalized_power"),
        time_in_hr_zone: fields.numbers("time_in_hr_zone"),
        sport: fields.text("sport"),
        sub_sport: fields.text("sub_sport"),
    }
}

fn lap(fields: &Fields<'_>) -> LapMessage {
    LapMessage {
        timestamp: fields.timestamp("timestamp"),
        avg_heart_rate: fields.unsigned("avg_heart_rate"),
        max_heart_rate: fields.unsigned("max_heart_rate"),
        total_distance: fields.number("total_distance"),
        avg_speed: fields.enhanced("enhanced_avg_speed", "avg_speed"),
        total_ascent: fields.unsigned("total_ascent"),
        total_descent: fields.unsigned("total_descent"),
        end_position: fields.position("end_position_lat", "end_position_long"),
        avg_power: fields.unsigned("avg_power"),
        max_power: fields.unsigned("max_power"),
        normalized_power: fields.unsigned("normalized_power"),
    }
}

fn record_message(fields: &Fields<'_>) -> RecordMessage {
    RecordMessage {
        timestamp: fields.timestamp("timestamp"),
        heart_rate: fields.unsigned("heart_rate"),
        distance: fields.number("distance"),
        speed: fields.number("speed"),
        enhanced_speed: fields.enhanced("enhanced_speed", "speed"),
        altitude: fields.number("altitude"),
        enhanced_altitude: fields.enhanced("enhanced_altitude", "altitude"),
        cadence: fields.unsigned("cadence"),
        power: fields.unsigned("power"),
        temperature: fields.number("temperature").map(|value| value.round() as i16),
        position: fields.position("position_lat", "position_long"),
    }
}

fn device_info(fields: &Fields<'_>) -> DeviceInfoMessage {
    // the product field is renamed after the manufacturer, e.g. garmin_product
    let product = fields
        .0
        .iter()
        .find(|field| field.name().ends_with("product") && field.name() != "product_name")
        .and_then(|field| match field.value() {
            Value::String(name) => Some(ProductId::Name(name.clone())),
            value => as_f64(value).map(|code| ProductId::Code(code as u16)),
        });

    DeviceInfoMessage {
        manufacturer: fields.text("manufacturer"),
        product,
        software_version: fields.number("software_version"),
    }
}

/// Zone messages referring to a single lap are skipped, only the session
/// totals are of interest.
fn heart_rate_zones(fields: &Fields<'_>) -> Option<HeartRateZonesMessage> {
    if fields.text("reference_mesg").as_deref() == Some("lap") {
        return None;
    }
    let boundaries = fields
        .by_number(ZONE_BOUNDARIES_FIELD)
        .map(|field| values(field.value()))
        .unwrap_or_default()
        .into_iter()
        .map(|bpm| bpm.round() as u16)
        .collect();
    // profiles that know the message already scale the times to seconds
    let times = fields
        .by_number(ZONE_TIMES_FIELD)
        .map(|field| {
            let scale = if field.name() == "time_in_hr_zone" { 1.0 } else { 1000.0 };
            values(field.value()).into_iter().map(|time| time / scale).collect()
        })
        .unwrap_or_default();
    Some(HeartRateZonesMessage { boundaries, times })
}

struct Fields<'a>(&'a [FitDataField]);

impl<'a> Fields<'a> {
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.0
            .iter()
            .find(|field| field.name() == name)
            .map(|field| field.value())
    }

    fn by_number(&self, number: u8) -> Option<&'a FitDataField> {
        self.0.iter().find(|field| field.number() == number)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(as_f64)
    }

    /// Legacy fields are decoded a second time under their enhanced name, so
    /// a message can carry several enhanced values. The one that is not a
    /// copy of the legacy value is the real one.
    fn enhanced(&self, enhanced: &str, legacy: &str) -> Option<f64> {
        let candidates: Vec<f64> = self
            .0
            .iter()
            .filter(|field| field.name() == enhanced)
            .filter_map(|field| as_f64(field.value()))
            .collect();
        let legacy = self.number(legacy);
        candidates
            .iter()
            .copied()
            .find(|value| Some(*value) != legacy)
            .or(legacy)
            .or_else(|| candidates.first().copied())
    }

    fn first_number(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.number(name))
    }

    fn unsigned<T: TryFrom<u64>>(&self, name: &str) -> Option<T> {
        self.number(name)
            .filter(|value| *value >= 0.0)
            .and_then(|value| T::try_from(value.round() as u64).ok())
    }

    fn numbers(&self, name: &str) -> Vec<f64> {
        self.get(name).map(values).unwrap_or_default()
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn timestamp(&self, name: &str) -> Option<NaiveDateTime> {
        match self.get(name)? {
            Value::Timestamp(time) => Some(time.naive_utc()),
            _ => None,
        }
    }

    fn position(&self, latitude: &str, longitude: &str) -> Option<Position> {
        let latitude = self.number(latitude)?;
        let longitude = self.number(longitude)?;
        Some(Position::new(
            semicircle_to_degree(latitude as i32),
            semicircle_to_degree(longitude as i32),
        ))
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.clone().try_into().ok()
}

fn values(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_f64).collect(),
        single => as_f64(single).into_iter().collect(),
    }
}
