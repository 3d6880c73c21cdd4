use std::{cell::Cell, rc::Rc, sync::Arc};

use living_city_core::{ActorOverrides, Config, ConfigOverrides, Density, Tone};
use living_city_engine::{Engine, EngineOptions, EVENT_ACTOR_LIMIT};
use living_city_system_event_bridge::{EventBus, ManualClock};
use serde_json::{json, Value};

struct Harness {
    engine: Engine,
    bus: EventBus,
    notifications: Rc<Cell<usize>>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let bus = EventBus::new(clock.clone());
        let mut engine = Engine::new(
            EngineOptions::default()
                .with_config(quiet_config())
                .with_playing(false)
                .with_event_source(bus.clone())
                .with_clock(clock),
        )
        .expect("engine builds");
        let notifications = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notifications);
        let _ = engine.subscribe(move |_| counter.set(counter.get() + 1));
        Self {
            engine,
            bus,
            notifications,
        }
    }

    fn dispatch(&mut self, payload: Value) -> Vec<Tone> {
        let _ = self.bus.dispatch_json(&payload);
        let _ = self.engine.pump_events();
        self.engine
            .snapshot()
            .actor_rects
            .iter()
            .map(|rect| rect.tone)
            .collect()
    }
}

fn quiet_config() -> Config {
    Config::default()
        .merge(
            &ConfigOverrides::default()
                .with_seed("seed")
                .with_density(Density::Normal)
                .with_actors(ActorOverrides::all_disabled()),
        )
        .expect("valid overrides")
}

#[test]
fn malformed_events_change_nothing() {
    let mut harness = Harness::new();
    let before = harness.engine.snapshot().clone();
    let _ = harness.dispatch(json!({ "type": "search" }));
    let _ = harness.dispatch(json!({ "type": "unknown", "ts": 1 }));
    assert_eq!(harness.engine.snapshot(), &before);
    assert_eq!(harness.notifications.get(), 0);
}

#[test]
fn search_and_upload_spawn_their_actors() {
    let mut harness = Harness::new();
    let tones = harness.dispatch(json!({ "type": "search", "query": "city", "ts": 1000 }));
    assert!(tones.contains(&Tone::Car));

    let mut harness = Harness::new();
    let tones = harness.dispatch(json!({ "type": "upload", "kind": "file", "ts": 2600 }));
    assert!(tones.contains(&Tone::Dog));
}

#[test]
fn palette_and_login_spawn_pedestrians() {
    let mut harness = Harness::new();
    let tones = harness.dispatch(json!({ "type": "command_palette_open", "ts": 1400 }));
    assert!(tones.contains(&Tone::Pedestrian));

    let mut harness = Harness::new();
    let tones = harness.dispatch(json!({ "type": "login", "method": "oauth", "ts": 2200 }));
    assert!(tones.contains(&Tone::Pedestrian));
}

#[test]
fn repeated_events_within_the_cooldown_are_ignored() {
    let mut harness = Harness::new();
    let first = harness.dispatch(json!({ "type": "search", "query": "rush", "ts": 4000 }));
    let second = harness.dispatch(json!({ "type": "search", "query": "rush", "ts": 4500 }));
    assert_eq!(first, second);
    assert_eq!(harness.notifications.get(), 1);
}

#[test]
fn publish_is_deterministic_for_a_fixed_seed() {
    let mut harness = Harness::new();
    let _ = harness.dispatch(json!({ "type": "publish", "kind": "artifact", "ts": 7200 }));
    let first = harness.engine.snapshot().actor_rects.clone();
    assert!(!first.is_empty());

    let mut harness = Harness::new();
    let _ = harness.dispatch(json!({ "type": "publish", "kind": "artifact", "ts": 7200 }));
    assert_eq!(harness.engine.snapshot().actor_rects, first);
}

#[test]
fn event_actors_expire_and_are_capped() {
    let mut harness = Harness::new();
    for i in 0..8u64 {
        let _ = harness.dispatch(json!({ "type": "upload", "ts": 10_000 + i * 2_000 }));
    }
    let dogs = harness
        .engine
        .snapshot()
        .actor_rects
        .iter()
        .filter(|rect| rect.tone == Tone::Dog)
        .count();
    assert_eq!(dogs, EVENT_ACTOR_LIMIT * 2);

    harness.engine.step(110);
    assert!(harness.engine.snapshot().actor_rects.is_empty());
}

#[test]
fn detaching_the_last_subscriber_stops_delivery() {
    let clock = Arc::new(ManualClock::new(0));
    let bus = EventBus::new(clock.clone());
    let mut engine = Engine::new(
        EngineOptions::default()
            .with_config(quiet_config())
            .with_event_source(bus.clone())
            .with_clock(clock),
    )
    .expect("engine builds");
    assert_eq!(bus.listener_count(), 0);

    let id = engine.subscribe(|_| {});
    assert_eq!(bus.listener_count(), 1);
    let _ = engine.unsubscribe(id);

    let _ = bus.dispatch_json(&json!({ "type": "upload", "ts": 1 }));
    assert_eq!(bus.listener_count(), 0);
    assert_eq!(engine.pump_events(), 0);
    assert!(engine.snapshot().actor_rects.is_empty());
}
