use std::sync::Arc;

use living_city_core::{
    ActorOverrides, AlertKind, CityEvent, CityEventKind, Config, ConfigOverrides, Tone,
};
use living_city_engine::{Engine, EngineOptions, EventOutcome, FrameRequest, FIXED_STEP_MS};
use living_city_system_actors::AMBULANCE_LIFETIME_MS;
use living_city_system_event_bridge::{EventBus, ManualClock};
use serde_json::json;

fn ambulance_config() -> Config {
    Config::default()
        .merge(&ConfigOverrides::default().with_seed("seed").with_actors(ActorOverrides {
            ambulance: Some(true),
            ..ActorOverrides::all_disabled()
        }))
        .expect("valid overrides")
}

fn ambulance_engine() -> Engine {
    Engine::new(EngineOptions::default().with_config(ambulance_config())).expect("engine builds")
}

fn alert(ts: u64) -> CityEvent {
    CityEvent::new(CityEventKind::Alert {
        kind: AlertKind::Ambulance,
    })
    .at(ts)
}

fn has_sirens(engine: &Engine) -> bool {
    let rects = &engine.snapshot().actor_rects;
    rects.iter().any(|rect| rect.tone == Tone::SirenRed)
        && rects.iter().any(|rect| rect.tone == Tone::SirenBlue)
}

#[test]
fn alert_shows_an_ambulance_for_its_lifetime() {
    let mut engine = ambulance_engine();
    assert!(engine.snapshot().actor_rects.is_empty());

    assert_eq!(
        engine.handle_event(&alert(1)).ok(),
        Some(EventOutcome::Spawned { actors: 1 })
    );
    assert!(has_sirens(&engine), "ambulance missing from the next snapshot");

    let last_visible_step = (AMBULANCE_LIFETIME_MS / FIXED_STEP_MS - 1) as u32;
    engine.step(last_visible_step);
    assert_eq!(engine.snapshot().now_ms, AMBULANCE_LIFETIME_MS - FIXED_STEP_MS);
    assert!(has_sirens(&engine), "ambulance vanished early");

    engine.step(1);
    assert!(engine.snapshot().actor_rects.is_empty(), "ambulance outlived its lifetime");
}

#[test]
fn a_second_alert_replaces_the_first_ambulance() {
    let mut engine = ambulance_engine();
    let _ = engine.handle_event(&alert(1_000));
    let single = engine.snapshot().actor_rects.len();

    let _ = engine.handle_event(&alert(5_000));
    assert_eq!(engine.snapshot().actor_rects.len(), single);
}

#[test]
fn alerts_inside_the_cooldown_are_throttled() {
    let mut engine = ambulance_engine();
    let _ = engine.handle_event(&alert(1_000));
    assert_eq!(engine.handle_event(&alert(1_500)).ok(), Some(EventOutcome::Throttled));
    assert!(matches!(
        engine.handle_event(&alert(2_200)),
        Ok(EventOutcome::Spawned { .. })
    ));
}

#[test]
fn alerts_reach_a_paused_engine() {
    let clock = Arc::new(ManualClock::new(0));
    let bus = EventBus::new(clock.clone());
    let mut engine = Engine::new(
        EngineOptions::default()
            .with_config(ambulance_config())
            .with_playing(false)
            .with_event_source(bus.clone())
            .with_clock(clock),
    )
    .expect("engine builds");
    let _ = engine.subscribe(|_| {});

    assert!(bus
        .dispatch_json(&json!({ "type": "alert", "kind": "ambulance" }))
        .is_delivered());
    engine.step(1);
    assert!(has_sirens(&engine), "alert waited for playback");
    assert_eq!(engine.snapshot().now_ms, FIXED_STEP_MS);

    let _ = bus.dispatch_json(&json!({ "type": "alert", "kind": "ambulance", "ts": 5_000 }));
    assert_eq!(engine.frame(16), FrameRequest::Idle);
    assert_eq!(engine.pump_events(), 0, "idle frame left the alert queued");
    assert!(has_sirens(&engine));
    assert!(!engine.snapshot().playing);
}
