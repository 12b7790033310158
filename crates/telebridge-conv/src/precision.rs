//! Floating point precision handling
//!
//! Converted readings are published with one decimal place, and whole numbers
//! are emitted as JSON integers (`59`, not `59.0`).

/// Round a value to the specified number of decimal places
pub fn round_to_precision(value: f64, precision: u8) -> f64 {
    if precision == 0 {
        value.round()
    } else {
        let factor = 10_f64.powi(precision as i32);
        (value * factor).round() / factor
    }
}

/// Format a value as a clean JSON number
///
/// Integral values become JSON integers; non-finite values become `null`.
pub fn to_json_number(value: f64) -> serde_json::Value {
    if !value.is_finite() {
        return serde_json::Value::Null;
    }

    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return serde_json::json!(value as i64);
    }

    serde_json::json!(value)
}
