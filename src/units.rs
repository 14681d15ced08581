use serde::{Deserialize, Serialize};

pub const KILOMETER_PER_MILE: f64 = 1.609344;
pub const METER_PER_FOOT: f64 = 0.30479;
const CELSIUS_PER_FAHRENHEIT: f64 = 0.555;
const FAHRENHEIT_OFFSET: f64 = 32.0;
const SEMICIRCLE_TO_DEGREE: f64 = 180.0 / 2_147_483_648.0;

/// Unit system used when rendering an exercise. Parsing always produces metric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn from_form_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "imperial" | "english" => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles * KILOMETER_PER_MILE
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KILOMETER_PER_MILE
}

pub fn miles_to_km_rounded(miles: i32) -> i32 {
    miles_to_km(miles as f64).round() as i32
}

pub fn feet_to_meter(feet: i32) -> i32 {
    (feet as f64 * METER_PER_FOOT).round() as i32
}

pub fn meter_to_feet(meter: i32) -> i32 {
    (meter as f64 / METER_PER_FOOT).round() as i32
}

pub fn fahrenheit_to_celsius(fahrenheit: i16) -> i16 {
    ((fahrenheit as f64 - FAHRENHEIT_OFFSET) * CELSIUS_PER_FAHRENHEIT).round() as i16
}

pub fn celsius_to_fahrenheit(celsius: i16) -> i16 {
    (celsius as f64 / CELSIUS_PER_FAHRENHEIT + FAHRENHEIT_OFFSET).round() as i16
}

/// Meters per second to kilometers per hour.
pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}

/// Garmin semicircles (2^31 = 180 degrees) to degrees.
pub fn semicircle_to_degree(semicircles: i32) -> f64 {
    semicircles as f64 * SEMICIRCLE_TO_DEGREE
}
