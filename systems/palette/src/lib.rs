#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Colour tables for the living city.
//!
//! Every scheme defines a night and a day palette. The palette for a given
//! time of day is the per-channel interpolation between the two, weighted by
//! the daylight factor of the time-of-day model.

use std::fmt;

use living_city_core::{clamp01, round_half_up, Scheme};
use living_city_system_time_of_day::time_of_day_phase;
use serde::{Deserialize, Serialize};

/// 8-bit RGB triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Formats the colour as a CSS `rgb()` function.
    #[must_use]
    pub fn to_css(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Siren colour for the red half of the light bar.
pub const SIREN_RED: Rgb = Rgb(223, 42, 72);
/// Siren colour for the blue half of the light bar.
pub const SIREN_BLUE: Rgb = Rgb(34, 186, 241);

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let value = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    round_half_up(value).clamp(0.0, 255.0) as u8
}

/// Interpolates two colours channel by channel; `t` is clamped to `0..=1`.
#[must_use]
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = clamp01(t);
    Rgb(
        lerp_channel(a.0, b.0, t),
        lerp_channel(a.1, b.1, t),
        lerp_channel(a.2, b.2, t),
    )
}

/// Named colours used when painting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    /// Sky background.
    pub sky: Rgb,
    /// Street and ground.
    pub ground: Rgb,
    /// Wordmark buildings.
    pub building: Rgb,
    /// Background skyline and muted details.
    pub building_muted: Rgb,
    /// Lit windows and headlights.
    pub window: Rgb,
    /// Car bodies.
    pub car: Rgb,
    /// Stars.
    pub star: Rgb,
    /// Sun.
    pub sun: Rgb,
    /// Moon.
    pub moon: Rgb,
}

impl Palette {
    /// Interpolates every entry of two palettes.
    #[must_use]
    pub fn lerp(&self, other: &Palette, t: f64) -> Palette {
        Palette {
            sky: lerp_rgb(self.sky, other.sky, t),
            ground: lerp_rgb(self.ground, other.ground, t),
            building: lerp_rgb(self.building, other.building, t),
            building_muted: lerp_rgb(self.building_muted, other.building_muted, t),
            window: lerp_rgb(self.window, other.window, t),
            car: lerp_rgb(self.car, other.car, t),
            star: lerp_rgb(self.star, other.star, t),
            sun: lerp_rgb(self.sun, other.sun, t),
            moon: lerp_rgb(self.moon, other.moon, t),
        }
    }
}

/// Night and day palettes of a colour scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemeDefinition {
    /// Scheme described by this definition.
    pub scheme: Scheme,
    /// Human readable name.
    pub label: &'static str,
    /// Palette at full darkness.
    pub night: Palette,
    /// Palette at full daylight.
    pub day: Palette,
}

const STAR: Rgb = Rgb(228, 240, 255);
const MOON: Rgb = Rgb(210, 220, 240);

const CLASSIC: SchemeDefinition = SchemeDefinition {
    scheme: Scheme::Classic,
    label: "Classic",
    night: Palette {
        sky: Rgb(8, 12, 24),
        ground: Rgb(16, 22, 18),
        building: Rgb(38, 54, 78),
        building_muted: Rgb(18, 28, 44),
        window: Rgb(255, 198, 86),
        car: Rgb(90, 110, 132),
        star: STAR,
        sun: Rgb(255, 180, 90),
        moon: MOON,
    },
    day: Palette {
        sky: Rgb(135, 206, 235),
        ground: Rgb(68, 140, 88),
        building: Rgb(28, 44, 68),
        building_muted: Rgb(64, 100, 138),
        window: Rgb(255, 240, 200),
        car: Rgb(56, 86, 112),
        star: STAR,
        sun: Rgb(255, 230, 140),
        moon: MOON,
    },
};

const NOIR: SchemeDefinition = SchemeDefinition {
    scheme: Scheme::Noir,
    label: "Noir",
    night: Palette {
        sky: Rgb(6, 6, 10),
        ground: Rgb(12, 12, 14),
        building: Rgb(66, 70, 82),
        building_muted: Rgb(22, 24, 30),
        window: Rgb(255, 210, 140),
        car: Rgb(96, 98, 108),
        star: STAR,
        sun: Rgb(240, 220, 180),
        moon: MOON,
    },
    day: Palette {
        sky: Rgb(212, 216, 224),
        ground: Rgb(124, 128, 132),
        building: Rgb(28, 32, 40),
        building_muted: Rgb(110, 118, 134),
        window: Rgb(255, 240, 200),
        car: Rgb(84, 86, 96),
        star: STAR,
        sun: Rgb(255, 230, 140),
        moon: MOON,
    },
};

const NEON: SchemeDefinition = SchemeDefinition {
    scheme: Scheme::Neon,
    label: "Neon",
    night: Palette {
        sky: Rgb(10, 6, 28),
        ground: Rgb(18, 12, 38),
        building: Rgb(172, 86, 255),
        building_muted: Rgb(60, 24, 120),
        window: Rgb(54, 255, 214),
        car: Rgb(255, 84, 200),
        star: STAR,
        sun: Rgb(255, 180, 120),
        moon: MOON,
    },
    day: Palette {
        sky: Rgb(154, 224, 255),
        ground: Rgb(98, 200, 168),
        building: Rgb(34, 10, 70),
        building_muted: Rgb(72, 32, 118),
        window: Rgb(120, 255, 232),
        car: Rgb(255, 84, 180),
        star: STAR,
        sun: Rgb(255, 230, 160),
        moon: MOON,
    },
};

/// Looks up the definition of a scheme.
#[must_use]
pub const fn scheme_definition(scheme: Scheme) -> &'static SchemeDefinition {
    match scheme {
        Scheme::Classic => &CLASSIC,
        Scheme::Noir => &NOIR,
        Scheme::Neon => &NEON,
    }
}

/// Palette for a time of day under the given scheme.
#[must_use]
pub fn palette(time_of_day: f64, scheme: Scheme) -> Palette {
    let daylight = time_of_day_phase(time_of_day).daylight;
    let definition = scheme_definition(scheme);
    definition.night.lerp(&definition.day, daylight)
}
