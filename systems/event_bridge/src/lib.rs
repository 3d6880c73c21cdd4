#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rate-limited channel that carries semantic UI events into the engine.
//!
//! Hosts publish [`CityEvent`] values on an [`EventBus`]. Consumers attach
//! through the [`EventSource`] trait and receive an [`EventListener`] that
//! queues deliveries until the consumer drains them, so events never re-enter
//! the engine while it is in the middle of a step. Dispatch and delivery are
//! throttled independently per event type, and the whole bus goes quiet when
//! the host asks for reduced motion.

pub mod clock;
pub mod limiter;

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc, Mutex, PoisonError,
};

use living_city_core::CityEvent;
use tracing::debug;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{RateLimiter, RATE_CEILING, RATE_WINDOW_MS};

/// Reason an event was not forwarded to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The payload did not describe a valid event.
    Malformed,
    /// The host asked for reduced motion.
    ReducedMotion,
    /// Too many events of the same type arrived within one window.
    RateLimited,
}

/// Result of a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was queued for this many listeners.
    Delivered {
        /// Number of listeners that received the event.
        listeners: usize,
    },
    /// The event was discarded.
    Dropped(DropReason),
}

impl DispatchOutcome {
    /// Whether the event reached the bus fan-out.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Something consumers can attach to in order to receive events.
pub trait EventSource {
    /// Registers a new listener; dropping the listener detaches it.
    fn attach(&self) -> EventListener;
}

/// Event source for non-interactive contexts; its listeners never receive anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSource;

impl EventSource for NoopEventSource {
    fn attach(&self) -> EventListener {
        let (_sender, receiver) = mpsc::channel();
        EventListener::new(receiver, Arc::new(SystemClock))
    }
}

/// Receiving end of an attachment.
pub struct EventListener {
    receiver: Receiver<CityEvent>,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl EventListener {
    fn new(receiver: Receiver<CityEvent>, clock: Arc<dyn Clock>) -> Self {
        Self {
            receiver,
            limiter: RateLimiter::default(),
            clock,
        }
    }

    /// Takes every queued event that passes the delivery limiter.
    pub fn drain(&mut self) -> Vec<CityEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            let now_ms = event.ts.unwrap_or_else(|| self.clock.now_ms());
            if self.limiter.allow(event.event_type(), now_ms) {
                events.push(event);
            } else {
                debug!(event_type = %event.event_type(), "delivery rate limited");
            }
        }
        events
    }

    /// Reopens every delivery window, as after a scene rebuild.
    pub fn reset_limits(&mut self) {
        self.limiter.reset();
    }
}

struct BusState {
    senders: Vec<Sender<CityEvent>>,
    limiter: RateLimiter,
    reduced_motion: bool,
}

/// Shared publish/subscribe bus; clones refer to the same bus.
#[derive(Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("reduced_motion", &self.reduced_motion())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl EventBus {
    /// Creates a bus that stamps and throttles events with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                senders: Vec::new(),
                limiter: RateLimiter::default(),
                reduced_motion: false,
            })),
            clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suppresses or re-enables every dispatch.
    pub fn set_reduced_motion(&self, reduced_motion: bool) {
        self.lock().reduced_motion = reduced_motion;
    }

    /// Whether dispatches are currently suppressed.
    #[must_use]
    pub fn reduced_motion(&self) -> bool {
        self.lock().reduced_motion
    }

    /// Number of attached listeners that are still alive.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().senders.len()
    }

    /// Publishes a typed event, stamping it with the clock when it has no timestamp.
    pub fn dispatch(&self, event: CityEvent) -> DispatchOutcome {
        if let Err(error) = event.validate() {
            debug!(%error, "dropping malformed event");
            return DispatchOutcome::Dropped(DropReason::Malformed);
        }

        let mut state = self.lock();
        if state.reduced_motion {
            return DispatchOutcome::Dropped(DropReason::ReducedMotion);
        }

        let ts = event.ts.unwrap_or_else(|| self.clock.now_ms());
        let event_type = event.event_type();
        if !state.limiter.allow(event_type, ts) {
            debug!(event_type = %event_type, ts, "dispatch rate limited");
            return DispatchOutcome::Dropped(DropReason::RateLimited);
        }

        let event = CityEvent { ts: Some(ts), ..event };
        state.senders.retain(|sender| sender.send(event.clone()).is_ok());
        DispatchOutcome::Delivered {
            listeners: state.senders.len(),
        }
    }

    /// Publishes an untyped payload, dropping it when it does not parse.
    pub fn dispatch_json(&self, payload: &serde_json::Value) -> DispatchOutcome {
        match CityEvent::from_json(payload) {
            Ok(event) => self.dispatch(event),
            Err(error) => {
                debug!(%error, "dropping malformed event payload");
                DispatchOutcome::Dropped(DropReason::Malformed)
            }
        }
    }
}

impl EventSource for EventBus {
    fn attach(&self) -> EventListener {
        let (sender, receiver) = mpsc::channel();
        self.lock().senders.push(sender);
        EventListener::new(receiver, Arc::clone(&self.clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use living_city_core::{AlertKind, CityEventKind};
    use serde_json::json;

    fn bus_at(now_ms: u64) -> (EventBus, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now_ms));
        (EventBus::new(clock.clone()), clock)
    }

    #[test]
    fn dispatch_stamps_missing_timestamps() {
        let (bus, _clock) = bus_at(4_200);
        let mut listener = bus.attach();
        let outcome = bus.dispatch(CityEvent::new(CityEventKind::Alert {
            kind: AlertKind::Ambulance,
        }));
        assert_eq!(outcome, DispatchOutcome::Delivered { listeners: 1 });
        let events = listener.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ts, Some(4_200));
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        let (bus, _clock) = bus_at(0);
        let mut listener = bus.attach();
        let outcome = bus.dispatch_json(&json!({ "type": "teleport" }));
        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::Malformed));
        let empty_query = CityEvent::new(CityEventKind::Search {
            query: String::new(),
        });
        assert_eq!(
            bus.dispatch(empty_query),
            DispatchOutcome::Dropped(DropReason::Malformed)
        );
        assert!(listener.drain().is_empty());
    }

    #[test]
    fn reduced_motion_suppresses_dispatch() {
        let (bus, _clock) = bus_at(0);
        let mut listener = bus.attach();
        bus.set_reduced_motion(true);
        let outcome = bus.dispatch_json(&json!({ "type": "upload" }));
        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::ReducedMotion));
        assert!(listener.drain().is_empty());

        bus.set_reduced_motion(false);
        assert!(bus.dispatch_json(&json!({ "type": "upload" })).is_delivered());
        assert_eq!(listener.drain().len(), 1);
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let (bus, _clock) = bus_at(0);
        let listener = bus.attach();
        let _other = bus.attach();
        assert_eq!(bus.listener_count(), 2);
        drop(listener);
        let outcome = bus.dispatch_json(&json!({ "type": "login" }));
        assert_eq!(outcome, DispatchOutcome::Delivered { listeners: 1 });
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn reset_limits_reopens_delivery() {
        let (sender, receiver) = mpsc::channel();
        let mut listener = EventListener::new(receiver, Arc::new(ManualClock::new(0)));
        let upload = |ts| CityEvent::new(CityEventKind::Upload { kind: None }).at(ts);

        for ts in 0..10 {
            sender.send(upload(ts)).expect("listener alive");
        }
        assert_eq!(listener.drain().len(), RATE_CEILING as usize);

        sender.send(upload(20)).expect("listener alive");
        assert!(listener.drain().is_empty());

        listener.reset_limits();
        sender.send(upload(21)).expect("listener alive");
        assert_eq!(listener.drain().len(), 1);
    }

    #[test]
    fn noop_source_never_delivers() {
        let mut listener = NoopEventSource.attach();
        assert!(listener.drain().is_empty());
    }
}
