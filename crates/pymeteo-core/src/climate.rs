//! Derived climate quantities
//!
//! Pure functions turning raw sensor values into the figures the bot
//! reports: sea-level adjusted pressure and dew point. Altitude is also
//! derived here for diagnostics only.

use thiserror_no_std::Error;

use crate::sensors::RawClimate;

/// Empirical ratio between absolute pressure and sea-level pressure at the
/// station (Sorbas, ~409 m). Relative pressure never consults the altitude.
pub const RELATIVE_PRESSURE_FACTOR: f32 = 0.952_679_05;

/// Magnus coefficient `b` (dimensionless).
pub const MAGNUS_B: f32 = 17.62;

/// Magnus coefficient `c` (°C).
pub const MAGNUS_C: f32 = 243.12;

/// Standard sea-level pressure used for the altitude estimate (hPa).
pub const STANDARD_SEA_LEVEL_HPA: f32 = 1013.25;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ClimateError {
    #[error("Dew point undefined for T={temperature_c} °C, RH={relative_humidity_pct} %")]
    DewPointDomain {
        temperature_c: f32,
        relative_humidity_pct: f32,
    },
}

/// Sea-level adjusted pressure in hPa.
pub fn relative_pressure(absolute_pressure_hpa: f32) -> f32 {
    absolute_pressure_hpa / RELATIVE_PRESSURE_FACTOR
}

/// Magnus `gamma` term shared by the dew point formula.
///
/// Returns `None` when the logarithm is undefined (`RH <= 0`).
pub fn magnus_gamma(temperature_c: f32, relative_humidity_pct: f32) -> Option<f32> {
    if relative_humidity_pct.is_nan() || relative_humidity_pct <= 0.0 {
        return None;
    }
    let gamma = (MAGNUS_B * temperature_c) / (MAGNUS_C + temperature_c)
        + libm::logf(relative_humidity_pct / 100.0);
    gamma.is_finite().then_some(gamma)
}

/// Dew point in °C (Magnus formula).
pub fn dew_point(temperature_c: f32, relative_humidity_pct: f32) -> Result<f32, ClimateError> {
    let domain = ClimateError::DewPointDomain {
        temperature_c,
        relative_humidity_pct,
    };

    let gamma = magnus_gamma(temperature_c, relative_humidity_pct).ok_or(domain)?;
    let denominator = MAGNUS_B - gamma;
    if denominator == 0.0 {
        return Err(domain);
    }

    let dew_point = (MAGNUS_C * gamma) / denominator;
    if dew_point.is_finite() {
        Ok(dew_point)
    } else {
        Err(domain)
    }
}

/// Altitude in metres from the international barometric formula.
pub fn altitude_m(absolute_pressure_hpa: f32) -> f32 {
    44_330.0 * (1.0 - libm::powf(absolute_pressure_hpa / STANDARD_SEA_LEVEL_HPA, 0.1903))
}

/// Everything `/clima` reports, computed once per command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSnapshot {
    pub temperature_c: f32,
    pub relative_humidity_pct: f32,
    pub absolute_pressure_hpa: f32,
    pub relative_pressure_hpa: f32,
    pub dew_point_c: f32,
}

impl ClimateSnapshot {
    pub fn compute(raw: &RawClimate) -> Result<Self, ClimateError> {
        Ok(Self {
            temperature_c: raw.temperature_c,
            relative_humidity_pct: raw.relative_humidity_pct,
            absolute_pressure_hpa: raw.absolute_pressure_hpa,
            relative_pressure_hpa: relative_pressure(raw.absolute_pressure_hpa),
            dew_point_c: dew_point(raw.temperature_c, raw.relative_humidity_pct)?,
        })
    }
}
