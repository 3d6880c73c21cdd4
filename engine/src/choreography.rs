//! Maps semantic events onto short-lived actor bursts.

use living_city_core::{ActorOverrides, Config, ConfigOverrides, Density, EventType};
use living_city_system_actors::{
    spawn_cars, spawn_event_dog, spawn_pedestrians, spawn_trucks, Actor, ActorBehavior, EventActor,
    SpawnContext, EVENT_KIND_PREFIX,
};
use living_city_system_layout::Layout;

use crate::EngineError;

/// Event actors that may be alive at the same time; older ones are evicted first.
pub const EVENT_ACTOR_LIMIT: usize = 6;

/// Actors produced for one event together with the configuration they run under.
#[derive(Debug)]
pub(crate) struct Burst {
    pub(crate) actors: Vec<Actor>,
    pub(crate) config: Config,
}

impl Burst {
    /// Wraps every actor so it expires on its own and carries a unique label.
    pub(crate) fn into_event_actors(
        self,
        event_type: EventType,
        event_index: u64,
        start_ms: u64,
    ) -> Vec<Actor> {
        let Burst { actors, config } = self;
        actors
            .into_iter()
            .enumerate()
            .map(|(i, actor)| {
                let label = format!("{EVENT_KIND_PREFIX}{event_type}:{event_index}-{i}");
                Actor::Event(EventActor::new(actor, label, start_ms, Some(config.clone())))
            })
            .collect()
    }
}

/// Seed for the burst triggered by the `event_index`-th event of a session.
pub(crate) fn event_seed(base_seed: &str, event_type: EventType, ts: u64, event_index: u64) -> String {
    format!("{base_seed}:event:{event_type}:{ts}:{event_index}")
}

fn burst_config(base: &Config, seed: &str, actors: ActorOverrides) -> Result<Config, EngineError> {
    let overrides = ConfigOverrides::default()
        .with_seed(seed)
        .with_density(Density::Sparse)
        .with_actors(actors);
    Ok(base.merge(&overrides)?)
}

/// Spawns the burst for a non-alert event. Alerts are handled by the engine directly.
pub(crate) fn spawn_burst(
    base: &Config,
    layout: &Layout,
    event_type: EventType,
    seed: &str,
) -> Result<Option<Burst>, EngineError> {
    let burst = match event_type {
        EventType::Search => {
            let config = burst_config(
                base,
                seed,
                ActorOverrides {
                    cars: Some(true),
                    ..ActorOverrides::default()
                },
            )?;
            let actors = spawn_cars(&SpawnContext::new(&config, layout))?
                .into_iter()
                .map(Actor::Car)
                .collect();
            Burst { actors, config }
        }
        EventType::CommandPaletteOpen | EventType::Login => {
            let config = burst_config(
                base,
                seed,
                ActorOverrides {
                    pedestrians: Some(true),
                    ..ActorOverrides::default()
                },
            )?;
            let actors = spawn_pedestrians(&SpawnContext::new(&config, layout))?
                .into_iter()
                .map(Actor::Pedestrians)
                .collect();
            Burst { actors, config }
        }
        EventType::Publish => {
            let config = burst_config(
                base,
                seed,
                ActorOverrides {
                    trucks: Some(true),
                    ..ActorOverrides::default()
                },
            )?;
            let actors = spawn_trucks(&SpawnContext::new(&config, layout).with_min_count(1))?
                .into_iter()
                .map(Actor::Truck)
                .collect();
            Burst { actors, config }
        }
        EventType::Upload => {
            // The dog is placed by the event seed but rendered under the live configuration.
            let placement = base.merge(&ConfigOverrides::default().with_seed(seed))?;
            let dog = spawn_event_dog(&SpawnContext::new(&placement, layout))?;
            Burst {
                actors: vec![Actor::Dog(dog)],
                config: base.clone(),
            }
        }
        EventType::Alert => return Ok(None),
    };
    Ok(Some(burst))
}

/// Appends `spawned` to the event actors in `actors`, keeping at most
/// [`EVENT_ACTOR_LIMIT`] of them. Returns how many were evicted.
pub(crate) fn add_event_actors(actors: Vec<Actor>, spawned: Vec<Actor>) -> (Vec<Actor>, usize) {
    let (mut events, mut merged): (Vec<Actor>, Vec<Actor>) =
        actors.into_iter().partition(Actor::is_event);
    events.extend(spawned);
    let evicted = events.len().saturating_sub(EVENT_ACTOR_LIMIT);
    merged.extend(events.into_iter().skip(evicted));
    (merged, evicted)
}

/// Whether an actor is an ambulance, either baseline or alert-triggered.
pub(crate) fn is_ambulance(actor: &Actor) -> bool {
    actor.kind() == "ambulance"
}
