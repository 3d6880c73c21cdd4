#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Normalized day clock for the living city.
//!
//! A time of day is a value in `0.0..1.0` where `0.0` is midnight, `0.25` is
//! roughly sunrise, `0.5` is noon and `0.75` is roughly sunset. This crate maps
//! that clock to a [`DayPhase`] with a daylight factor, and to sun and moon
//! positions on a circular arc above the skyline.

use std::f64::consts::PI;

use living_city_core::clamp01;
use serde::{Deserialize, Serialize};

/// Night-ness above which vehicle headlights and streetlights switch on.
pub const LIGHTS_ON_NIGHTNESS: f64 = 0.12;

const SUNRISE: f64 = 0.25;
const VISIBLE_ALTITUDE: f64 = 1e-6;

/// Boundaries of the dawn and dusk transitions on the normalized clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseBoundaries {
    /// Start of the dawn blend.
    pub dawn_start: f64,
    /// End of the dawn blend.
    pub dawn_end: f64,
    /// Start of the dusk blend.
    pub dusk_start: f64,
    /// End of the dusk blend.
    pub dusk_end: f64,
}

/// Phase boundaries used by every consumer of the clock.
pub const PHASES: PhaseBoundaries = PhaseBoundaries {
    dawn_start: 0.2,
    dawn_end: 0.3,
    dusk_start: 0.7,
    dusk_end: 0.8,
};

/// Coarse segment of the day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    /// Fully dark.
    Night,
    /// Blending from night into day.
    Dawn,
    /// Fully lit.
    Day,
    /// Blending from day into night.
    Dusk,
}

/// Phase of the day together with progress and daylight factors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    /// Current phase.
    pub phase: DayPhase,
    /// Progress through the current phase in `0.0..=1.0`.
    pub progress: f64,
    /// How lit the scene is in `0.0..=1.0`.
    pub daylight: f64,
}

impl PhaseInfo {
    /// Complement of daylight, used to gate lights.
    #[must_use]
    pub fn nightness(&self) -> f64 {
        clamp01(1.0 - self.daylight)
    }
}

/// Normalized position of a celestial body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    /// Horizontal position in `0.0..=1.0`.
    pub x: f64,
    /// Altitude in `-1.0..=1.0`; positive values are above the horizon.
    pub altitude: f64,
    /// Whether the body is above the horizon.
    pub visible: bool,
}

/// Sun and moon positions for a given time of day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialPositions {
    /// Position of the sun.
    pub sun: CelestialPosition,
    /// Position of the moon, half a day behind the sun.
    pub moon: CelestialPosition,
}

/// Wraps any finite value into `0.0..1.0`; non-finite values map to midnight.
#[must_use]
pub fn normalize_time_of_day(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Converts a normalized time of day to hours on a 24-hour clock.
#[must_use]
pub fn time_of_day_to_hours(time_of_day: f64) -> f64 {
    normalize_time_of_day(time_of_day) * 24.0
}

/// Converts hours on a 24-hour clock to a normalized time of day.
#[must_use]
pub fn hours_to_time_of_day(hours: f64) -> f64 {
    if !hours.is_finite() {
        return 0.0;
    }
    normalize_time_of_day(hours / 24.0)
}

/// Sinusoidal ease that starts and ends with zero slope.
#[must_use]
pub fn ease_in_out_sine(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

fn inv_lerp(from: f64, to: f64, value: f64) -> f64 {
    if (to - from).abs() < f64::EPSILON {
        return 0.0;
    }
    (value - from) / (to - from)
}

/// Resolves the phase of the day and its daylight factor.
#[must_use]
pub fn time_of_day_phase(time_of_day: f64) -> PhaseInfo {
    let t = normalize_time_of_day(time_of_day);
    let PhaseBoundaries {
        dawn_start,
        dawn_end,
        dusk_start,
        dusk_end,
    } = PHASES;

    if t >= dawn_end && t < dusk_start {
        return PhaseInfo {
            phase: DayPhase::Day,
            progress: clamp01(inv_lerp(dawn_end, dusk_start, t)),
            daylight: 1.0,
        };
    }

    if t >= dusk_start && t < dusk_end {
        let progress = clamp01(inv_lerp(dusk_start, dusk_end, t));
        return PhaseInfo {
            phase: DayPhase::Dusk,
            progress,
            daylight: 1.0 - ease_in_out_sine(progress),
        };
    }

    if t >= dawn_start && t < dawn_end {
        let progress = clamp01(inv_lerp(dawn_start, dawn_end, t));
        return PhaseInfo {
            phase: DayPhase::Dawn,
            progress,
            daylight: ease_in_out_sine(progress),
        };
    }

    let progress = if t >= dusk_end {
        clamp01(inv_lerp(dusk_end, 1.0, t))
    } else {
        clamp01(inv_lerp(0.0, dawn_start, t))
    };
    PhaseInfo {
        phase: DayPhase::Night,
        progress,
        daylight: 0.0,
    }
}

/// Night-ness for a time of day: `1 - daylight`, clamped.
#[must_use]
pub fn nightness(time_of_day: f64) -> f64 {
    time_of_day_phase(time_of_day).nightness()
}

/// Whether artificial lights should be on at this time of day.
#[must_use]
pub fn lights_on(time_of_day: f64) -> bool {
    nightness(time_of_day) > LIGHTS_ON_NIGHTNESS
}

fn body_position(time_of_day: f64) -> CelestialPosition {
    let t = normalize_time_of_day(time_of_day);
    let angle = (t - SUNRISE) * PI * 2.0;
    let altitude = angle.sin();
    CelestialPosition {
        x: (1.0 - angle.cos()) / 2.0,
        altitude,
        visible: altitude > VISIBLE_ALTITUDE,
    }
}

/// Position of the sun.
#[must_use]
pub fn sun_position(time_of_day: f64) -> CelestialPosition {
    body_position(time_of_day)
}

/// Position of the moon.
#[must_use]
pub fn moon_position(time_of_day: f64) -> CelestialPosition {
    body_position(time_of_day + 0.5)
}

/// Positions of both celestial bodies.
#[must_use]
pub fn celestial_positions(time_of_day: f64) -> CelestialPositions {
    CelestialPositions {
        sun: sun_position(time_of_day),
        moon: moon_position(time_of_day),
    }
}
