//! Unit normalization and metric-to-imperial conversion table
//!
//! | From | To | Suffix | Formula |
//! |------|----|--------|---------|
//! | °C | °F | `_f` | `C × 9/5 + 32` |
//! | km | mi | `_mi` | `× 0.621371` |
//! | L | gal | `_gal` | `× 0.264172` |
//! | km/L | mpg | `_mpg` | `× 2.35215` |
//!
//! Every converted value is rounded to one decimal place. Conversion is
//! applied once per element; a converted reading is never converted again.

use crate::error::{ConvError, ConvResult};
use crate::precision::round_to_precision;

/// Decimal places for converted readings
const CONVERTED_PRECISION: u8 = 1;

/// One metric-to-imperial conversion pair
#[derive(Debug, Clone, Copy)]
pub struct ConversionRule {
    /// Source unit symbol (normalized)
    pub from_unit: &'static str,
    /// Target unit symbol
    pub to_unit: &'static str,
    /// Suffix appended to the canonical key of the secondary reading
    pub suffix: &'static str,
    convert: fn(f64) -> f64,
}

impl ConversionRule {
    /// Convert a value and round it to one decimal place
    pub fn apply(&self, value: f64) -> f64 {
        round_to_precision((self.convert)(value), CONVERTED_PRECISION)
    }

    /// Word appended to the raw reading name of the secondary reading
    /// (`_mi` → `MI`)
    pub fn name_suffix(&self) -> String {
        self.suffix.trim_start_matches('_').to_uppercase()
    }
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn km_to_miles(km: f64) -> f64 {
    km * 0.621371
}

fn liters_to_gallons(l: f64) -> f64 {
    l * 0.264172
}

fn kmpl_to_mpg(kmpl: f64) -> f64 {
    kmpl * 2.35215
}

/// Process-wide conversion table
pub static CONVERSIONS: [ConversionRule; 4] = [
    ConversionRule {
        from_unit: "°C",
        to_unit: "°F",
        suffix: "_f",
        convert: celsius_to_fahrenheit,
    },
    ConversionRule {
        from_unit: "km",
        to_unit: "mi",
        suffix: "_mi",
        convert: km_to_miles,
    },
    ConversionRule {
        from_unit: "L",
        to_unit: "gal",
        suffix: "_gal",
        convert: liters_to_gallons,
    },
    ConversionRule {
        from_unit: "km/L",
        to_unit: "mpg",
        suffix: "_mpg",
        convert: kmpl_to_mpg,
    },
];

/// Vendor unit spellings and their canonical symbols
static UNIT_ALIASES: &[(&str, &str)] = &[
    ("Cel", "°C"),
    ("KM", "km"),
    ("KPa", "kPa"),
    ("kmple", "km/L"),
    ("kwh", "kWh"),
    ("volts", "V"),
    ("Volts", "V"),
    ("l", "L"),
];

/// Map a vendor unit spelling to its canonical symbol
///
/// Unknown units pass through unchanged.
pub fn normalize_unit(unit: &str) -> &str {
    UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == unit)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(unit)
}

/// Look up the conversion rule for a (normalized) unit
pub fn conversion_for(unit: &str) -> Option<&'static ConversionRule> {
    CONVERSIONS.iter().find(|rule| rule.from_unit == unit)
}

/// Convert a raw value expressed in `unit`
pub fn convert(value: &str, unit: &str) -> ConvResult<f64> {
    let rule = conversion_for(normalize_unit(unit))
        .ok_or_else(|| ConvError::UnknownUnit(unit.to_string()))?;
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConvError::NotNumeric(value.to_string()))?;
    Ok(rule.apply(number))
}
