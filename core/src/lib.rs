#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the living city wordmark engine.
//!
//! This crate defines the vocabulary that connects the procedural generators,
//! the actor systems, the engine and the presentation adapters. Hosts supply a
//! validated [`Config`] and a stream of [`CityEvent`] values; the engine derives
//! a layout, advances its fixed-step clock and publishes [`ActorRect`] values
//! tagged with a [`Tone`] for adapters to paint. Every source of randomness is a
//! [`CityRng`] keyed by a string so that identical seeds always reproduce the
//! same scene.

pub mod config;
pub mod event;
pub mod rng;

use serde::{Deserialize, Serialize};

pub use config::{
    ActorOverrides, ActorToggles, Config, ConfigError, ConfigOverrides, Density, RenderConfig,
    RenderDetail, RenderOverrides, Scheme, SkylineConfig, SkylineOverrides,
};
pub use event::{AlertKind, CityEvent, CityEventKind, ContentKind, EventError, EventType, LoginMethod};
pub use rng::{CityRng, RngError};

/// Accessible label announced for the wordmark and used by static fallbacks.
pub const ACCESSIBLE_LABEL: &str = "mark downtown";

/// Integer-grid axis-aligned rectangle, the atomic drawable unit of the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelRect {
    /// Left edge measured in voxels. Actors may report negative values while entering.
    pub x: i32,
    /// Top edge measured in voxels.
    pub y: i32,
    /// Horizontal extent measured in voxels.
    pub width: i32,
    /// Vertical extent measured in voxels.
    pub height: i32,
}

impl VoxelRect {
    /// Creates a new rectangle from its origin and extents.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge of the rectangle.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge of the rectangle.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Reports whether the rectangle covers no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Paint style attached to every rectangle emitted by an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tone {
    /// Bodies of cars and trucks.
    Car,
    /// Vehicle headlights and streetlight bulbs.
    Headlight,
    /// Ambulance body panels.
    Ambulance,
    /// Red siren lamp and ambulance stripe.
    SirenRed,
    /// Blue siren lamp.
    SirenBlue,
    /// Pedestrians and streetlight posts.
    Pedestrian,
    /// Dogs walking alongside pedestrians.
    Dog,
    /// Birds crossing the sky.
    Bird,
    /// Cloud puffs.
    Cloud,
}

impl Tone {
    /// Every tone in declaration order.
    pub const ALL: [Tone; 9] = [
        Tone::Car,
        Tone::Headlight,
        Tone::Ambulance,
        Tone::SirenRed,
        Tone::SirenBlue,
        Tone::Pedestrian,
        Tone::Dog,
        Tone::Bird,
        Tone::Cloud,
    ];

    /// Stable identifier used in batch keys and serialized snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tone::Car => "car",
            Tone::Headlight => "headlight",
            Tone::Ambulance => "ambulance",
            Tone::SirenRed => "sirenRed",
            Tone::SirenBlue => "sirenBlue",
            Tone::Pedestrian => "pedestrian",
            Tone::Dog => "dog",
            Tone::Bird => "bird",
            Tone::Cloud => "cloud",
        }
    }
}

/// Rectangle emitted by an actor together with its paint style.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorRect {
    /// Left edge measured in voxels.
    pub x: i32,
    /// Top edge measured in voxels.
    pub y: i32,
    /// Horizontal extent measured in voxels.
    pub width: i32,
    /// Vertical extent measured in voxels.
    pub height: i32,
    /// Paint style applied by the renderer.
    pub tone: Tone,
    /// Base opacity in the range 0.0..=1.0 before renderer adjustments.
    pub opacity: f64,
}

impl ActorRect {
    /// Creates a new actor rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32, tone: Tone, opacity: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            tone,
            opacity,
        }
    }

    /// Geometry of the rectangle without paint information.
    #[must_use]
    pub const fn rect(&self) -> VoxelRect {
        VoxelRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Anything that occupies an axis-aligned voxel rectangle.
pub trait VoxelShape {
    /// Rectangle covered by the shape.
    fn voxel_rect(&self) -> VoxelRect;
}

impl VoxelShape for VoxelRect {
    fn voxel_rect(&self) -> VoxelRect {
        *self
    }
}

impl VoxelShape for ActorRect {
    fn voxel_rect(&self) -> VoxelRect {
        self.rect()
    }
}

/// Clamps a value into `0.0..=1.0`, mapping NaN to zero.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Rounds halfway cases towards positive infinity.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
