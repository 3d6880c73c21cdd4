//! Wordmark configuration, partial overrides, and boundary validation.
//!
//! A [`Config`] is immutable once built. Hosts change the scene by merging a
//! [`ConfigOverrides`] into the current configuration; the merge validates the
//! complete result and either returns a fresh configuration or rejects the
//! overrides without applying any of them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seed used when the host does not supply one.
pub const DEFAULT_SEED: &str = "markdowntown";

/// Errors raised while parsing or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The seed string was empty.
    #[error("seed must not be empty")]
    EmptySeed,
    /// The normalized time of day fell outside `0.0..=1.0`.
    #[error("timeOfDay must be a finite value within 0..=1, got {value}")]
    TimeOfDayOutOfRange {
        /// Value that was rejected.
        value: f64,
    },
    /// The simulation speed multiplier was not a positive finite number.
    #[error("timeScale must be a positive finite value, got {value}")]
    InvalidTimeScale {
        /// Value that was rejected.
        value: f64,
    },
    /// An integer knob fell outside its permitted range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: u32,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },
    /// A maximum bound was smaller than its paired minimum.
    #[error("{field} must be >= {lower_field}")]
    InvertedRange {
        /// Dotted path of the maximum field.
        field: &'static str,
        /// Dotted path of the minimum field it is compared against.
        lower_field: &'static str,
    },
    /// A named enumeration value was not recognised.
    #[error("unknown {field} `{value}`")]
    UnknownVariant {
        /// Name of the enumeration that failed to parse.
        field: &'static str,
        /// Text that was rejected.
        value: String,
    },
    /// The JSON payload could not be decoded.
    #[error("invalid configuration payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The TOML document could not be decoded.
    #[error("invalid configuration document: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse actor-population preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    /// Fewest actors.
    Sparse,
    /// Default population.
    #[default]
    Normal,
    /// Busiest population.
    Dense,
}

impl Density {
    /// Every density in ascending order.
    pub const ALL: [Density; 3] = [Density::Sparse, Density::Normal, Density::Dense];

    /// Selects the value associated with this density from a three-entry table.
    #[must_use]
    pub fn select<T>(self, sparse: T, normal: T, dense: T) -> T {
        match self {
            Density::Sparse => sparse,
            Density::Normal => normal,
            Density::Dense => dense,
        }
    }

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Density::Sparse => "sparse",
            Density::Normal => "normal",
            Density::Dense => "dense",
        }
    }
}

/// Named day/night color palette pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Blue skies and amber windows.
    #[default]
    Classic,
    /// Desaturated greys.
    Noir,
    /// Saturated violets and cyans.
    Neon,
}

impl Scheme {
    /// Every scheme in presentation order.
    pub const ALL: [Scheme; 3] = [Scheme::Classic, Scheme::Noir, Scheme::Neon];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::Classic => "classic",
            Scheme::Noir => "noir",
            Scheme::Neon => "neon",
        }
    }
}

/// Glyph and asset resolution tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderDetail {
    /// Plain 5x7 glyph cells.
    Standard,
    /// Glyph cells expanded three times with rounded corners.
    #[default]
    Hd,
}

impl RenderDetail {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RenderDetail::Standard => "standard",
            RenderDetail::Hd => "hd",
        }
    }
}

macro_rules! impl_named_enum {
    ($ty:ty, $field:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
                    .ok_or_else(|| ConfigError::UnknownVariant {
                        field: $field,
                        value: value.to_owned(),
                    })
            }
        }
    };
}

impl_named_enum!(Density, "density", [Density::Sparse, Density::Normal, Density::Dense]);
impl_named_enum!(Scheme, "scheme", [Scheme::Classic, Scheme::Noir, Scheme::Neon]);
impl_named_enum!(RenderDetail, "detail", [RenderDetail::Standard, RenderDetail::Hd]);

/// Render tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Resolution multiplier for the whole scene; higher values mean smaller voxels.
    pub voxel_scale: u32,
    /// Multiplier applied to the scene width for banner layouts.
    pub banner_scale: u32,
    /// Glyph resolution tier.
    pub detail: RenderDetail,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            voxel_scale: 3,
            banner_scale: 1,
            detail: RenderDetail::Hd,
        }
    }
}

/// Skyline silhouette tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkylineConfig {
    /// Shortest building height in grid units.
    pub min_height: u32,
    /// Tallest building height in grid units.
    pub max_height: u32,
    /// Narrowest building width in voxels.
    pub min_segment_width: u32,
    /// Widest building width in voxels.
    pub max_segment_width: u32,
}

impl Default for SkylineConfig {
    fn default() -> Self {
        Self {
            min_height: 2,
            max_height: 6,
            min_segment_width: 2,
            max_segment_width: 6,
        }
    }
}

/// Per-kind actor toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorToggles {
    /// Cars driving along the street.
    pub cars: bool,
    /// Box trucks driving along the street.
    pub trucks: bool,
    /// Flickering streetlights.
    pub streetlights: bool,
    /// Pedestrians pacing the sidewalk.
    pub pedestrians: bool,
    /// Dogs accompanying pedestrians.
    pub dogs: bool,
    /// Ambulances triggered by alerts.
    pub ambulance: bool,
    /// Birds crossing the sky.
    pub birds: bool,
    /// Clouds drifting across the sky.
    pub clouds: bool,
}

impl Default for ActorToggles {
    fn default() -> Self {
        Self {
            cars: true,
            trucks: false,
            streetlights: true,
            pedestrians: true,
            dogs: false,
            ambulance: true,
            birds: false,
            clouds: false,
        }
    }
}

/// Complete, validated wordmark configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Seed for every deterministic generator.
    pub seed: String,
    /// Normalized time of day where 0.0 is midnight and 0.5 is noon.
    pub time_of_day: f64,
    /// Simulation speed multiplier.
    pub time_scale: f64,
    /// Actor population preset.
    pub density: Density,
    /// Color palette preset.
    pub scheme: Scheme,
    /// Render tuning knobs.
    pub render: RenderConfig,
    /// Skyline tuning knobs.
    pub skyline: SkylineConfig,
    /// Actor toggles.
    pub actors: ActorToggles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_owned(),
            time_of_day: 0.78,
            time_scale: 0.85,
            density: Density::Normal,
            scheme: Scheme::Classic,
            render: RenderConfig::default(),
            skyline: SkylineConfig::default(),
            actors: ActorToggles::default(),
        }
    }
}

impl Config {
    /// Decodes and validates a complete configuration; missing fields take their defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config = Config::deserialize(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides on top of this configuration and validates the result.
    ///
    /// Nested sections are merged field by field. Nothing is applied when
    /// validation fails.
    pub fn merge(&self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(seed) = &overrides.seed {
            next.seed.clone_from(seed);
        }
        if let Some(time_of_day) = overrides.time_of_day {
            next.time_of_day = time_of_day;
        }
        if let Some(time_scale) = overrides.time_scale {
            next.time_scale = time_scale;
        }
        if let Some(density) = overrides.density {
            next.density = density;
        }
        if let Some(scheme) = overrides.scheme {
            next.scheme = scheme;
        }
        if let Some(render) = &overrides.render {
            render.apply(&mut next.render);
        }
        if let Some(skyline) = &overrides.skyline {
            skyline.apply(&mut next.skyline);
        }
        if let Some(actors) = &overrides.actors {
            actors.apply(&mut next.actors);
        }

        next.validate()?;
        Ok(next)
    }

    /// Returns a copy of the configuration with a different time of day.
    ///
    /// The value is stored as given; callers normalize it first.
    #[must_use]
    pub fn with_time_of_day(&self, time_of_day: f64) -> Self {
        Self {
            time_of_day,
            ..self.clone()
        }
    }

    /// Checks every field against its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed.is_empty() {
            return Err(ConfigError::EmptySeed);
        }
        if !self.time_of_day.is_finite() || !(0.0..=1.0).contains(&self.time_of_day) {
            return Err(ConfigError::TimeOfDayOutOfRange {
                value: self.time_of_day,
            });
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(ConfigError::InvalidTimeScale {
                value: self.time_scale,
            });
        }

        check_range("render.voxelScale", self.render.voxel_scale, 1, 32)?;
        check_range("render.bannerScale", self.render.banner_scale, 1, 32)?;

        let skyline = &self.skyline;
        check_range("skyline.minHeight", skyline.min_height, 1, 32)?;
        check_range("skyline.maxHeight", skyline.max_height, 1, 64)?;
        check_range("skyline.minSegmentWidth", skyline.min_segment_width, 1, 64)?;
        check_range("skyline.maxSegmentWidth", skyline.max_segment_width, 1, 128)?;
        if skyline.max_height < skyline.min_height {
            return Err(ConfigError::InvertedRange {
                field: "skyline.maxHeight",
                lower_field: "skyline.minHeight",
            });
        }
        if skyline.max_segment_width < skyline.min_segment_width {
            return Err(ConfigError::InvertedRange {
                field: "skyline.maxSegmentWidth",
                lower_field: "skyline.minSegmentWidth",
            });
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Partial render section carried by [`ConfigOverrides`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RenderOverrides {
    /// Replacement voxel scale.
    pub voxel_scale: Option<u32>,
    /// Replacement banner scale.
    pub banner_scale: Option<u32>,
    /// Replacement detail tier.
    pub detail: Option<RenderDetail>,
}

impl RenderOverrides {
    fn apply(&self, target: &mut RenderConfig) {
        if let Some(value) = self.voxel_scale {
            target.voxel_scale = value;
        }
        if let Some(value) = self.banner_scale {
            target.banner_scale = value;
        }
        if let Some(value) = self.detail {
            target.detail = value;
        }
    }
}

/// Partial skyline section carried by [`ConfigOverrides`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SkylineOverrides {
    /// Replacement minimum building height.
    pub min_height: Option<u32>,
    /// Replacement maximum building height.
    pub max_height: Option<u32>,
    /// Replacement minimum building width.
    pub min_segment_width: Option<u32>,
    /// Replacement maximum building width.
    pub max_segment_width: Option<u32>,
}

impl SkylineOverrides {
    fn apply(&self, target: &mut SkylineConfig) {
        if let Some(value) = self.min_height {
            target.min_height = value;
        }
        if let Some(value) = self.max_height {
            target.max_height = value;
        }
        if let Some(value) = self.min_segment_width {
            target.min_segment_width = value;
        }
        if let Some(value) = self.max_segment_width {
            target.max_segment_width = value;
        }
    }
}

/// Partial actor toggles carried by [`ConfigOverrides`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActorOverrides {
    /// Replacement car toggle.
    pub cars: Option<bool>,
    /// Replacement truck toggle.
    pub trucks: Option<bool>,
    /// Replacement streetlight toggle.
    pub streetlights: Option<bool>,
    /// Replacement pedestrian toggle.
    pub pedestrians: Option<bool>,
    /// Replacement dog toggle.
    pub dogs: Option<bool>,
    /// Replacement ambulance toggle.
    pub ambulance: Option<bool>,
    /// Replacement bird toggle.
    pub birds: Option<bool>,
    /// Replacement cloud toggle.
    pub clouds: Option<bool>,
}

impl ActorOverrides {
    /// Overrides that switch every actor kind off.
    #[must_use]
    pub const fn all_disabled() -> Self {
        Self {
            cars: Some(false),
            trucks: Some(false),
            streetlights: Some(false),
            pedestrians: Some(false),
            dogs: Some(false),
            ambulance: Some(false),
            birds: Some(false),
            clouds: Some(false),
        }
    }

    fn apply(&self, target: &mut ActorToggles) {
        let pairs = [
            (self.cars, &mut target.cars),
            (self.trucks, &mut target.trucks),
            (self.streetlights, &mut target.streetlights),
            (self.pedestrians, &mut target.pedestrians),
            (self.dogs, &mut target.dogs),
            (self.ambulance, &mut target.ambulance),
            (self.birds, &mut target.birds),
            (self.clouds, &mut target.clouds),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Partial configuration supplied by hosts; unknown fields are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ConfigOverrides {
    /// Replacement seed.
    pub seed: Option<String>,
    /// Replacement time of day.
    pub time_of_day: Option<f64>,
    /// Replacement simulation speed.
    pub time_scale: Option<f64>,
    /// Replacement density preset.
    pub density: Option<Density>,
    /// Replacement palette preset.
    pub scheme: Option<Scheme>,
    /// Replacement render knobs.
    pub render: Option<RenderOverrides>,
    /// Replacement skyline knobs.
    pub skyline: Option<SkylineOverrides>,
    /// Replacement actor toggles.
    pub actors: Option<ActorOverrides>,
}

impl ConfigOverrides {
    /// Decodes overrides from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        Ok(ConfigOverrides::deserialize(value)?)
    }

    /// Decodes overrides from a TOML document.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Sets the seed override.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Sets the density override.
    #[must_use]
    pub fn with_density(mut self, density: Density) -> Self {
        self.density = Some(density);
        self
    }

    /// Sets the time-of-day override.
    #[must_use]
    pub fn with_time_of_day(mut self, time_of_day: f64) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    /// Sets the actor toggle overrides.
    #[must_use]
    pub fn with_actors(mut self, actors: ActorOverrides) -> Self {
        self.actors = Some(actors);
        self
    }

    /// Sets the render overrides.
    #[must_use]
    pub fn with_render(mut self, render: RenderOverrides) -> Self {
        self.render = Some(render);
        self
    }
}
