#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Actors that populate the living city.
//!
//! Every actor kind lives in its own module with a spawn function and a pure
//! update/render pair. Positional actors derive their position from the
//! simulated clock alone, so rendering the same actor at the same instant
//! always yields the same rectangles. The [`Actor`] sum type unifies the kinds
//! behind the [`ActorBehavior`] trait for the engine.

pub mod ambulance;
pub mod bird;
pub mod car;
pub mod cloud;
pub mod dog;
pub mod event;
pub mod pedestrian;
pub mod streetlight;
pub mod truck;

use living_city_core::{ActorRect, Config, RngError};
use living_city_system_layout::Layout;
use thiserror::Error;

pub use ambulance::{spawn_ambulance, Ambulance, AMBULANCE_LIFETIME_MS, SIREN_FLASH_PERIOD_MS};
pub use bird::{spawn_birds, Bird, Heading};
pub use car::{spawn_cars, Car};
pub use cloud::{spawn_clouds, Cloud};
pub use dog::{spawn_event_dog, Dog};
pub use event::{EventActor, EVENT_ACTOR_TTL_MS, EVENT_KIND_PREFIX};
pub use pedestrian::{spawn_pedestrians, Pedestrian, Pedestrians};
pub use streetlight::{spawn_streetlights, Streetlight, Streetlights};
pub use truck::{spawn_trucks, Truck};

/// Errors raised while spawning actors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActorError {
    /// A random draw was requested with an empty range.
    #[error(transparent)]
    Rng(#[from] RngError),
}

/// Night-ness above which headlights and streetlights switch on.
pub const LIGHTS_THRESHOLD: f64 = living_city_system_time_of_day::LIGHTS_ON_NIGHTNESS;

/// State shared with every actor for one simulation step or render pass.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    /// Simulated milliseconds since the engine started.
    pub now_ms: u64,
    /// Length of the step that produced `now_ms`; zero for pure re-renders.
    pub dt_ms: u64,
    /// Live configuration, including the current time of day.
    pub config: &'a Config,
    /// Layout of the scene.
    pub layout: &'a Layout,
}

impl<'a> FrameContext<'a> {
    /// Creates a context for a render pass without elapsed time.
    #[must_use]
    pub const fn new(now_ms: u64, config: &'a Config, layout: &'a Layout) -> Self {
        Self {
            now_ms,
            dt_ms: 0,
            config,
            layout,
        }
    }

    /// Returns the context annotated with the length of the step.
    #[must_use]
    pub const fn with_step(self, dt_ms: u64) -> Self {
        Self { dt_ms, ..self }
    }

    /// Returns the context with a different configuration.
    #[must_use]
    pub const fn with_config<'b>(self, config: &'b Config) -> FrameContext<'b>
    where
        'a: 'b,
    {
        FrameContext {
            now_ms: self.now_ms,
            dt_ms: self.dt_ms,
            config,
            layout: self.layout,
        }
    }

    /// Clock position in seconds.
    #[must_use]
    pub fn now_seconds(&self) -> f64 {
        self.now_ms as f64 / 1000.0
    }

    /// Distance travelled at `speed_vps` voxels per second, honouring the time scale.
    #[must_use]
    pub fn travel(&self, speed_vps: f64) -> f64 {
        self.now_seconds() * speed_vps * self.config.time_scale
    }

    /// Current night-ness derived from the live time of day.
    #[must_use]
    pub fn nightness(&self) -> f64 {
        living_city_system_time_of_day::nightness(self.config.time_of_day)
    }

    /// Actor scale of the layout.
    #[must_use]
    pub fn scale(&self) -> i32 {
        actor_scale(self.layout)
    }
}

/// Inputs for the spawn functions.
#[derive(Clone, Copy, Debug)]
pub struct SpawnContext<'a> {
    /// Configuration providing the seed, density and toggles.
    pub config: &'a Config,
    /// Layout the actors are placed on.
    pub layout: &'a Layout,
    /// Lower bound for the density-driven count of an enabled kind.
    pub min_count: usize,
}

impl<'a> SpawnContext<'a> {
    /// Creates a spawn context without a minimum count.
    #[must_use]
    pub const fn new(config: &'a Config, layout: &'a Layout) -> Self {
        Self {
            config,
            layout,
            min_count: 0,
        }
    }

    /// Returns the context with a minimum count for enabled kinds.
    #[must_use]
    pub const fn with_min_count(self, min_count: usize) -> Self {
        Self { min_count, ..self }
    }

    /// Resolves the population of a kind from its toggle and density table.
    #[must_use]
    pub fn count(&self, enabled: bool, sparse: usize, normal: usize, dense: usize) -> usize {
        if !enabled {
            return 0;
        }
        self.config
            .density
            .select(sparse, normal, dense)
            .max(self.min_count)
    }

    /// Actor scale of the layout.
    #[must_use]
    pub fn scale(&self) -> i32 {
        actor_scale(self.layout)
    }
}

/// Shared interface of every actor kind.
pub trait ActorBehavior {
    /// Label identifying the kind; event actors carry a unique label.
    fn kind(&self) -> &str;

    /// Advances the actor to the context's instant.
    #[must_use]
    fn update(self, ctx: &FrameContext<'_>) -> Self
    where
        Self: Sized;

    /// Projects the actor to drawable rectangles.
    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect>;

    /// Whether the actor should be removed.
    fn is_done(&self) -> bool {
        false
    }
}

/// Every actor the engine can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Actor {
    /// See [`Car`].
    Car(Car),
    /// See [`Truck`].
    Truck(Truck),
    /// See [`Ambulance`].
    Ambulance(Ambulance),
    /// See [`Pedestrians`].
    Pedestrians(Pedestrians),
    /// See [`Streetlights`].
    Streetlights(Streetlights),
    /// See [`Bird`].
    Bird(Bird),
    /// See [`Cloud`].
    Cloud(Cloud),
    /// See [`Dog`].
    Dog(Dog),
    /// See [`EventActor`].
    Event(EventActor),
}

impl Actor {
    /// Whether the actor was spawned by a semantic event.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(self, Actor::Event(_))
    }
}

impl ActorBehavior for Actor {
    fn kind(&self) -> &str {
        match self {
            Actor::Car(actor) => actor.kind(),
            Actor::Truck(actor) => actor.kind(),
            Actor::Ambulance(actor) => actor.kind(),
            Actor::Pedestrians(actor) => actor.kind(),
            Actor::Streetlights(actor) => actor.kind(),
            Actor::Bird(actor) => actor.kind(),
            Actor::Cloud(actor) => actor.kind(),
            Actor::Dog(actor) => actor.kind(),
            Actor::Event(actor) => actor.kind(),
        }
    }

    fn update(self, ctx: &FrameContext<'_>) -> Self {
        match self {
            Actor::Car(actor) => Actor::Car(actor.update(ctx)),
            Actor::Truck(actor) => Actor::Truck(actor.update(ctx)),
            Actor::Ambulance(actor) => Actor::Ambulance(actor.update(ctx)),
            Actor::Pedestrians(actor) => Actor::Pedestrians(actor.update(ctx)),
            Actor::Streetlights(actor) => Actor::Streetlights(actor.update(ctx)),
            Actor::Bird(actor) => Actor::Bird(actor.update(ctx)),
            Actor::Cloud(actor) => Actor::Cloud(actor.update(ctx)),
            Actor::Dog(actor) => Actor::Dog(actor.update(ctx)),
            Actor::Event(actor) => Actor::Event(actor.update(ctx)),
        }
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        match self {
            Actor::Car(actor) => actor.render(ctx),
            Actor::Truck(actor) => actor.render(ctx),
            Actor::Ambulance(actor) => actor.render(ctx),
            Actor::Pedestrians(actor) => actor.render(ctx),
            Actor::Streetlights(actor) => actor.render(ctx),
            Actor::Bird(actor) => actor.render(ctx),
            Actor::Cloud(actor) => actor.render(ctx),
            Actor::Dog(actor) => actor.render(ctx),
            Actor::Event(actor) => actor.render(ctx),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            Actor::Ambulance(actor) => actor.is_done(),
            Actor::Event(actor) => actor.is_done(),
            _ => false,
        }
    }
}

/// Spawns the baseline population enabled by the configuration.
pub fn spawn_baseline(ctx: &SpawnContext<'_>) -> Result<Vec<Actor>, ActorError> {
    let mut actors = Vec::new();
    actors.extend(spawn_cars(ctx)?.into_iter().map(Actor::Car));
    actors.extend(spawn_trucks(ctx)?.into_iter().map(Actor::Truck));
    actors.extend(spawn_streetlights(ctx)?.into_iter().map(Actor::Streetlights));
    actors.extend(spawn_pedestrians(ctx)?.into_iter().map(Actor::Pedestrians));
    actors.extend(spawn_clouds(ctx)?.into_iter().map(Actor::Cloud));
    actors.extend(spawn_birds(ctx)?.into_iter().map(Actor::Bird));
    Ok(actors)
}

/// Renders every actor and concatenates the rectangles.
#[must_use]
pub fn render_all(actors: &[Actor], ctx: &FrameContext<'_>) -> Vec<ActorRect> {
    actors.iter().flat_map(|actor| actor.render(ctx)).collect()
}

/// Voxel size of one actor cell: the layout grid scale, at least one.
#[must_use]
pub fn actor_scale(layout: &Layout) -> i32 {
    layout.grid_scale.max(1)
}

/// Top row of the street lane for an actor `rows` cells tall.
#[must_use]
pub fn lane_y(layout: &Layout, rows: i32) -> i32 {
    (layout.baseline_y - rows * actor_scale(layout)).max(0)
}

/// Rows occupied by a vehicle at the given scale.
#[must_use]
pub const fn vehicle_rows(scale: i32) -> i32 {
    if scale > 1 {
        3
    } else {
        2
    }
}

pub(crate) fn floor_i32(value: f64) -> i32 {
    value.floor() as i32
}

pub(crate) fn half(scale: i32) -> i32 {
    (scale / 2).max(1)
}
