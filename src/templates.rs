use crate::model::{Exercise, RecordingInterval};
use crate::units::{UnitSystem, celsius_to_fahrenheit, km_to_miles, meter_to_feet};

const SAMPLE_ROWS: usize = 25;

fn format_duration(tenths: Option<u32>) -> String {
    match tenths {
        Some(total) => {
            let rounded = (total as f64 / 10.0).round() as u64;
            let hours = rounded / 3600;
            let minutes = (rounded % 3600) / 60;
            let seconds = rounded % 60;

            if hours > 0 {
                format!("{}h {:02}m {:02}s", hours, minutes, seconds)
            } else {
                format!("{}m {:02}s", minutes, seconds)
            }
        }
        None => "—".to_string(),
    }
}

fn format_distance(meters: Option<i32>, units: UnitSystem) -> String {
    match (meters, units) {
        (Some(distance), UnitSystem::Imperial) => {
            format!("{:.2} mi", km_to_miles(distance as f64 / 1000.0))
        }
        (Some(distance), UnitSystem::Metric) if distance >= 1000 => {
            format!("{:.2} km", distance as f64 / 1000.0)
        }
        (Some(distance), UnitSystem::Metric) => format!("{} m", distance),
        (None, _) => "—".to_string(),
    }
}

fn format_speed(kmh: Option<f64>, units: UnitSystem) -> String {
    match (kmh, units) {
        (Some(value), UnitSystem::Imperial) => format!("{:.1} mph", km_to_miles(value)),
        (Some(value), UnitSystem::Metric) => format!("{:.1} km/h", value),
        (None, _) => "—".to_string(),
    }
}

/// Running pace for a speed in km/h.
fn format_pace(kmh: Option<f64>, units: UnitSystem) -> String {
    let (per_unit, label) = match units {
        UnitSystem::Metric => (kmh, "min/km"),
        UnitSystem::Imperial => (kmh.map(km_to_miles), "min/mi"),
    };
    match per_unit {
        Some(value) if value > 0.0 => {
            let total_minutes = 60.0 / value;
            let whole_minutes = total_minutes.floor();
            let mut seconds = ((total_minutes - whole_minutes) * 60.0).round();

            // Account for rounding up to the next minute when seconds hit 60.
            let mut minutes = whole_minutes as u64;
            if seconds >= 60.0 {
                minutes += 1;
                seconds = 0.0;
            }

            format!("{}:{:02} {label}", minutes, seconds as u64)
        }
        _ => "—".to_string(),
    }
}

fn format_altitude(meters: Option<i32>, units: UnitSystem) -> String {
    match (meters, units) {
        (Some(value), UnitSystem::Imperial) => format!("{} ft", meter_to_feet(value)),
        (Some(value), UnitSystem::Metric) => format!("{} m", value),
        (None, _) => "—".to_string(),
    }
}

fn format_temperature(celsius: Option<i16>, units: UnitSystem) -> String {
    match (celsius, units) {
        (Some(value), UnitSystem::Imperial) => format!("{} °F", celsius_to_fahrenheit(value)),
        (Some(value), UnitSystem::Metric) => format!("{} °C", value),
        (None, _) => "—".to_string(),
    }
}

fn format_heart_rate(value: Option<u16>) -> String {
    match value {
        Some(hr) if hr > 0 => format!("{} bpm", hr),
        _ => "—".to_string(),
    }
}

fn format_number<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(value) => format!("{value} {unit}").trim_end().to_string(),
        None => "—".to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn summary_card(body: &mut String, label: &str, value: &str) {
    body.push_str(&format!(
        "<div class=\"summary-card\"><p class=\"label\">{label}</p><p class=\"value\">{value}</p></div>"
    ));
}

pub fn render_landing_page() -> String {
    include_str!("../templates/landing.html").to_string()
}

/// HTML fragment with the exercise summary, heart rate zones, laps and the
/// first samples.
pub fn render_exercise(exercise: &Exercise, filename: &str, units: UnitSystem) -> String {
    let mut body = String::new();

    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Exercise Overview</p><h2>{}</h2></div></div>",
        escape_html(filename)
    ));

    body.push_str("<div class=\"summary-grid\">");
    summary_card(
        &mut body,
        "Device",
        &escape_html(exercise.device_name.as_deref().unwrap_or("Unknown")),
    );
    summary_card(
        &mut body,
        "Date",
        &exercise
            .date_time
            .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "—".into()),
    );
    summary_card(
        &mut body,
        "Exercise Type",
        &escape_html(exercise.exercise_type.as_deref().unwrap_or("Unknown")),
    );
    summary_card(&mut body, "Duration", &format_duration(exercise.duration));
    summary_card(
        &mut body,
        "Recording Interval",
        &match exercise.recording_interval {
            Some(RecordingInterval::Fixed(seconds)) => format!("{seconds} s"),
            Some(RecordingInterval::Dynamic) => "dynamic".to_string(),
            None => "—".to_string(),
        },
    );
    summary_card(&mut body, "Heart Rate (avg)", &format_heart_rate(exercise.heart_rate_avg));
    summary_card(&mut body, "Heart Rate (max)", &format_heart_rate(exercise.heart_rate_max));
    summary_card(&mut body, "Energy", &format_number(exercise.energy, "kcal"));

    if let Some(speed) = &exercise.speed {
        summary_card(&mut body, "Distance", &format_distance(Some(speed.distance), units));
        summary_card(&mut body, "Speed (avg)", &format_speed(Some(speed.speed_avg), units));
        summary_card(&mut body, "Speed (max)", &format_speed(Some(speed.speed_max), units));
        summary_card(&mut body, "Pace (avg)", &format_pace(Some(speed.speed_avg), units));
    }
    if let Some(altitude) = &exercise.altitude {
        summary_card(
            &mut body,
            "Altitude (min / avg / max)",
            &format!(
                "{} / {} / {}",
                format_altitude(Some(altitude.altitude_min as i32), units),
                format_altitude(Some(altitude.altitude_avg as i32), units),
                format_altitude(Some(altitude.altitude_max as i32), units)
            ),
        );
        summary_card(&mut body, "Ascent", &format_altitude(Some(altitude.ascent), units));
        summary_card(&mut body, "Descent", &format_altitude(Some(altitude.descent), units));
    }
    if let Some(cadence) = &exercise.cadence {
        summary_card(
            &mut body,
            "Cadence (avg / max)",
            &format!("{} / {} rpm", cadence.cadence_avg, cadence.cadence_max),
        );
    }
    if let Some(temperature) = &exercise.temperature {
        summary_card(
            &mut body,
            "Temperature (min / avg / max)",
            &format!(
                "{} / {} / {}",
                format_temperature(Some(temperature.temperature_min), units),
                format_temperature(Some(temperature.temperature_avg), units),
                format_temperature(Some(temperature.temperature_max), units)
            ),
        );
    }
    if let Some(power) = &exercise.power {
        summary_card(&mut body, "Power (avg)", &format_number(Some(power.power_avg), "W"));
        summary_card(&mut body, "Power (max)", &format_number(power.power_max, "W"));
    }
    if let Some(odometer) = exercise.odometer {
        summary_card(
            &mut body,
            "Odometer",
            &format_distance(Some(odometer.saturating_mul(1000)), units),
        );
    }
    body.push_str("</div>");
    body.push_str("</section>");

    if !exercise.heart_rate_limits.is_empty() {
        body.push_str("<section class=\"results-card\">");
        body.push_str("<div class=\"results-header\"><div><p class=\"eyebrow\">Heart Rate Zones</p><h2>Time in zone</h2></div></div>");
        body.push_str("<div class=\"table-wrapper\"><table><thead><tr><th>Range</th><th>Below</th><th>Within</th><th>Above</th></tr></thead><tbody>");
        for limit in &exercise.heart_rate_limits {
            let unit = if limit.is_absolute_range { "bpm" } else { "%" };
            body.push_str(&format!(
                "<tr><td>{} - {} {unit}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                limit.lower_heart_rate,
                limit.upper_heart_rate,
                format_duration(limit.time_below.map(|s| s * 10)),
                format_duration(Some(limit.time_within * 10)),
                format_duration(limit.time_above.map(|s| s * 10)),
            ));
        }
        body.push_str("</tbody></table></div>");
        body.push_str("</section>");
    }

    if !exercise.laps.is_empty() {
        body.push_str("<section class=\"results-card\">");
        body.push_str(&format!(
            "<div class=\"results-header\"><div><p class=\"eyebrow\">Laps</p><h2>{} laps</h2></div></div>",
            exercise.laps.len()
        ));
        body.push_str("<div class=\"table-wrapper\"><table><thead><tr><th>#</th><th>Split</th><th>Heart Rate (avg / max)</th><th>Distance</th><th>Speed (avg)</th><th>Altitude</th></tr></thead><tbody>");
        for (index, lap) in exercise.laps.iter().enumerate() {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{} / {}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                index + 1,
                format_duration(Some(lap.time_split)),
                format_heart_rate(lap.heart_rate_avg),
                format_heart_rate(lap.heart_rate_max),
                format_distance(lap.speed.as_ref().map(|s| s.distance), units),
                format_speed(lap.speed.as_ref().map(|s| s.speed_avg), units),
                format_altitude(lap.altitude.as_ref().map(|a| a.altitude as i32), units),
            ));
        }
        body.push_str("</tbody></table></div>");
        body.push_str("</section>");
    }

    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Samples</p><h2>Showing the first {} of {} samples</h2></div></div>",
        exercise.samples.len().min(SAMPLE_ROWS),
        exercise.samples.len()
    ));
    body.push_str("<div class=\"table-wrapper\"><table><thead><tr><th>Time</th><th>Heart Rate</th><th>Speed</th><th>Distance</th><th>Altitude</th><th>Cadence</th></tr></thead><tbody>");
    for sample in exercise.samples.iter().take(SAMPLE_ROWS) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            format_duration(sample.timestamp.map(|ms| (ms.max(0) / 100) as u32)),
            format_heart_rate(sample.heart_rate),
            format_speed(sample.speed, units),
            format_distance(sample.distance, units),
            format_altitude(sample.altitude.map(i32::from), units),
            format_number(sample.cadence, ""),
        ));
    }
    body.push_str("</tbody></table></div>");
    body.push_str("</section>");
    body
}
