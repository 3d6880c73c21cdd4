use std::sync::Arc;

use living_city_core::{CityEvent, CityEventKind};
use living_city_system_event_bridge::{
    DispatchOutcome, DropReason, EventBus, EventSource, ManualClock, RATE_CEILING, RATE_WINDOW_MS,
};
use serde_json::json;

#[test]
fn burst_within_one_window_is_capped_at_the_ceiling() {
    let clock = Arc::new(ManualClock::new(10_000));
    let bus = EventBus::new(clock.clone());
    let mut listener = bus.attach();

    let outcomes: Vec<DispatchOutcome> = (0..50)
        .map(|_| {
            let _ = clock.advance(5);
            bus.dispatch_json(&json!({ "type": "search", "query": "city" }))
        })
        .collect();

    let delivered = outcomes.iter().filter(|outcome| outcome.is_delivered()).count();
    assert_eq!(delivered, RATE_CEILING as usize);
    assert!(outcomes[RATE_CEILING as usize..]
        .iter()
        .all(|outcome| *outcome == DispatchOutcome::Dropped(DropReason::RateLimited)));
    assert!(listener.drain().len() <= RATE_CEILING as usize);
}

#[test]
fn explicit_timestamps_take_precedence_over_the_clock() {
    let clock = Arc::new(ManualClock::new(0));
    let bus = EventBus::new(clock.clone());
    let mut listener = bus.attach();

    for i in 0..20u64 {
        clock.set(i * RATE_WINDOW_MS);
        let event = CityEvent::new(CityEventKind::Upload { kind: None }).at(500 + i);
        let _ = bus.dispatch(event);
    }
    let delivered = listener.drain();
    assert_eq!(delivered.len(), RATE_CEILING as usize);
    assert!(delivered.iter().all(|event| event.ts.unwrap_or(0) < 520));
}

#[test]
fn window_reopens_after_it_elapses() {
    let clock = Arc::new(ManualClock::new(0));
    let bus = EventBus::new(clock.clone());
    let mut listener = bus.attach();

    for _ in 0..10 {
        let _ = bus.dispatch_json(&json!({ "type": "publish" }));
    }
    clock.set(RATE_WINDOW_MS);
    assert!(bus.dispatch_json(&json!({ "type": "publish" })).is_delivered());
    assert_eq!(listener.drain().len(), RATE_CEILING as usize + 1);
}
