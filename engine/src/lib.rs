#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step simulation engine for the living city wordmark.
//!
//! An [`Engine`] owns the layout, the actor population and the latest
//! [`EngineSnapshot`]. Hosts drive it by calling [`Engine::frame`] from their
//! frame callback while it reports [`FrameRequest::Continue`]; the engine
//! converts wall-clock deltas into 50ms simulation steps, so two engines fed
//! the same frame timestamps and events produce the same snapshots.
//!
//! The engine runs only while it is playing and has at least one subscriber.
//! The first subscriber attaches the engine to its [`EventSource`]; the last
//! unsubscribe detaches it again.

mod choreography;

use std::{collections::HashMap, fmt, sync::Arc};

use living_city_core::{
    ActorRect, AlertKind, CityEvent, CityEventKind, Config, ConfigError, ConfigOverrides, EventType,
};
use living_city_system_actors::{
    render_all, spawn_ambulance, spawn_baseline, Actor, ActorBehavior, ActorError, FrameContext,
    SpawnContext,
};
use living_city_system_event_bridge::{Clock, EventListener, EventSource, SystemClock};
use living_city_system_layout::{create_layout, Layout, LayoutError, LayoutOptions};
use living_city_system_time_of_day::normalize_time_of_day;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub use choreography::EVENT_ACTOR_LIMIT;

/// Length of one simulation step.
pub const FIXED_STEP_MS: u64 = 50;
/// Longest wall-clock gap a single frame may account for.
pub const MAX_FRAME_MS: u64 = 250;
/// Simulated milliseconds in one full day at a time scale of 1.
pub const DAY_CYCLE_MS: u64 = 240_000;
/// Minimum gap between two accepted events of the same type, measured on event timestamps.
pub const EVENT_COOLDOWN_MS: u64 = 1_200;

/// Errors raised while building or reconfiguring an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration overrides were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The wordmark layout could not be generated.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// An actor population could not be spawned.
    #[error(transparent)]
    Actor(#[from] ActorError),
}

/// Immutable view of the simulation published to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    /// Simulated milliseconds since the engine was created.
    pub now_ms: u64,
    /// Whether the host asked the engine to animate.
    pub playing: bool,
    /// Live configuration; its time of day advances with the simulation.
    pub config: Config,
    /// Every rectangle drawn by the current actors.
    pub actor_rects: Vec<ActorRect>,
}

/// Handle returned by [`Engine::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Tells the host whether to schedule another frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRequest {
    /// The engine is running and wants another frame.
    Continue,
    /// The engine stopped; do not schedule further frames.
    Idle,
}

/// What the engine did with a semantic event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// New actors joined the scene.
    Spawned {
        /// Number of actors added.
        actors: usize,
    },
    /// Another event of the same type arrived within the cooldown.
    Throttled,
    /// The event was valid but produced nothing, for example an alert with ambulances disabled.
    Ignored,
    /// The event payload violated its constraints.
    Malformed,
}

type Listener = Box<dyn FnMut(&EngineSnapshot)>;

/// Construction parameters for an [`Engine`].
pub struct EngineOptions {
    config: Config,
    playing: bool,
    event_source: Option<Box<dyn EventSource>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("config", &self.config)
            .field("playing", &self.playing)
            .field("event_source", &self.event_source.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            playing: true,
            event_source: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl EngineOptions {
    /// Starts from the provided configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets whether the engine starts playing.
    #[must_use]
    pub fn with_playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    /// Connects the engine to a stream of semantic events.
    #[must_use]
    pub fn with_event_source(mut self, source: impl EventSource + 'static) -> Self {
        self.event_source = Some(Box::new(source));
        self
    }

    /// Clock used to stamp events that arrive without a timestamp.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// The living city simulation.
pub struct Engine {
    layout: Layout,
    actors: Vec<Actor>,
    snapshot: EngineSnapshot,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    running: bool,
    last_frame_ms: Option<u64>,
    accumulator_ms: u64,
    event_source: Option<Box<dyn EventSource>>,
    event_listener: Option<EventListener>,
    clock: Arc<dyn Clock>,
    ambulance_trigger_index: u64,
    event_index: u64,
    last_event_at: HashMap<EventType, u64>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("now_ms", &self.snapshot.now_ms)
            .field("playing", &self.snapshot.playing)
            .field("running", &self.running)
            .field("actors", &self.actors.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds an engine, its layout and its baseline population.
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        let EngineOptions {
            config,
            playing,
            event_source,
            clock,
        } = options;
        config.validate()?;
        let layout = create_layout(&LayoutOptions::for_render(&config.render))?;
        let actors = spawn_baseline(&SpawnContext::new(&config, &layout))?;

        let mut engine = Self {
            layout,
            actors,
            snapshot: EngineSnapshot {
                now_ms: 0,
                playing,
                config,
                actor_rects: Vec::new(),
            },
            listeners: Vec::new(),
            next_subscription: 0,
            running: false,
            last_frame_ms: None,
            accumulator_ms: 0,
            event_source,
            event_listener: None,
            clock,
            ambulance_trigger_index: 0,
            event_index: 0,
            last_event_at: HashMap::new(),
        };
        engine.render();
        Ok(engine)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    /// Layout the actors are placed on.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the frame loop is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Registers a listener notified after every state change.
    ///
    /// The first subscriber attaches the event source and may start the frame loop.
    pub fn subscribe(&mut self, listener: impl FnMut(&EngineSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        self.ensure_event_listener();
        self.maybe_start();
        id
    }

    /// Removes a listener. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        let removed = self.listeners.len() != before;
        self.maybe_stop();
        if self.listeners.is_empty() && self.event_listener.take().is_some() {
            debug!("event listener detached");
        }
        removed
    }

    /// Starts or pauses the simulation.
    pub fn set_playing(&mut self, playing: bool) {
        if self.snapshot.playing == playing {
            return;
        }
        self.snapshot.playing = playing;
        self.emit();
        if playing {
            self.maybe_start();
        } else {
            self.maybe_stop();
        }
    }

    /// Merges `overrides` into the configuration and rebuilds the scene.
    ///
    /// Nothing changes when the overrides are rejected. On success the
    /// baseline population is respawned and the event counters, cooldowns and
    /// delivery limits start over. The layout is rebuilt only when the render
    /// section changed.
    pub fn set_config(&mut self, overrides: &ConfigOverrides) -> Result<(), EngineError> {
        let config = self.snapshot.config.merge(overrides)?;
        let layout = if config.render == self.snapshot.config.render {
            None
        } else {
            Some(create_layout(&LayoutOptions::for_render(&config.render))?)
        };
        let actors = spawn_baseline(&SpawnContext::new(
            &config,
            layout.as_ref().unwrap_or(&self.layout),
        ))?;

        debug!(
            seed = %config.seed,
            density = %config.density,
            actors = actors.len(),
            relayout = layout.is_some(),
            "configuration rebuilt"
        );

        if let Some(layout) = layout {
            self.layout = layout;
        }
        self.actors = actors;
        self.snapshot.config = config;
        self.ambulance_trigger_index = 0;
        self.event_index = 0;
        self.last_event_at.clear();
        if let Some(listener) = self.event_listener.as_mut() {
            listener.reset_limits();
        }
        self.render();
        self.emit();
        Ok(())
    }

    /// Same as [`Engine::set_config`] for an untyped payload.
    pub fn set_config_json(&mut self, overrides: &serde_json::Value) -> Result<(), EngineError> {
        let overrides = ConfigOverrides::from_json(overrides)?;
        self.set_config(&overrides)
    }

    /// Jumps to a time of day without advancing the simulation.
    pub fn set_time_of_day(&mut self, time_of_day: f64) {
        self.snapshot.config = self
            .snapshot
            .config
            .with_time_of_day(normalize_time_of_day(time_of_day));
        self.render();
        self.emit();
    }

    /// Advances the simulation by `steps` fixed steps regardless of the play state.
    ///
    /// Events already delivered to the engine are applied before the first step.
    pub fn step(&mut self, steps: u32) {
        let _ = self.pump_events();
        if steps == 0 {
            return;
        }
        for _ in 0..steps {
            self.advance(FIXED_STEP_MS);
        }
        self.emit();
    }

    /// Runs one host frame at wall-clock `timestamp_ms`.
    ///
    /// Pending events are handled first, even while paused. The elapsed time
    /// since the previous frame is clamped to [`MAX_FRAME_MS`] and consumed in
    /// whole steps; any remainder carries over to the next frame.
    pub fn frame(&mut self, timestamp_ms: u64) -> FrameRequest {
        let _ = self.pump_events();
        if !self.running {
            return FrameRequest::Idle;
        }
        if !self.snapshot.playing || self.listeners.is_empty() {
            self.stop();
            return FrameRequest::Idle;
        }

        let last_frame_ms = *self.last_frame_ms.get_or_insert(timestamp_ms);
        let delta_ms = timestamp_ms.saturating_sub(last_frame_ms).min(MAX_FRAME_MS);
        self.last_frame_ms = Some(timestamp_ms);
        self.accumulator_ms += delta_ms;

        let steps = self.accumulator_ms / FIXED_STEP_MS;
        if steps > 0 {
            self.accumulator_ms -= steps * FIXED_STEP_MS;
            for _ in 0..steps {
                self.advance(FIXED_STEP_MS);
            }
            self.emit();
        }
        FrameRequest::Continue
    }

    /// Handles every event queued on the attached event source.
    ///
    /// Returns the number of events that spawned actors.
    pub fn pump_events(&mut self) -> usize {
        let events = match self.event_listener.as_mut() {
            Some(listener) => listener.drain(),
            None => return 0,
        };
        let mut spawned = 0;
        for event in &events {
            match self.handle_event(event) {
                Ok(EventOutcome::Spawned { .. }) => spawned += 1,
                Ok(_) => {}
                Err(error) => warn!(%error, event_type = %event.event_type(), "event burst failed"),
            }
        }
        spawned
    }

    /// Applies a single semantic event.
    pub fn handle_event(&mut self, event: &CityEvent) -> Result<EventOutcome, EngineError> {
        let event_type = event.event_type();
        if let Err(error) = event.validate() {
            debug!(%error, %event_type, "rejected malformed event");
            return Ok(EventOutcome::Malformed);
        }
        let ts = event.ts.unwrap_or_else(|| self.clock.now_ms());
        if self.is_throttled(event_type, ts) {
            debug!(%event_type, ts, "event within cooldown");
            return Ok(EventOutcome::Throttled);
        }

        if let CityEventKind::Alert {
            kind: AlertKind::Ambulance,
        } = event.kind
        {
            return Ok(self.dispatch_ambulance());
        }

        let config = &self.snapshot.config;
        let seed = choreography::event_seed(&config.seed, event_type, ts, self.event_index);
        self.event_index += 1;
        let burst = match choreography::spawn_burst(config, &self.layout, event_type, &seed)? {
            Some(burst) if !burst.actors.is_empty() => burst,
            _ => return Ok(EventOutcome::Ignored),
        };

        let spawned = burst.into_event_actors(event_type, self.event_index, self.snapshot.now_ms);
        let count = spawned.len();
        let (actors, evicted) =
            choreography::add_event_actors(std::mem::take(&mut self.actors), spawned);
        if evicted > 0 {
            trace!(evicted, "evicted oldest event actors");
        }
        self.actors = actors;
        self.render();
        self.emit();
        Ok(EventOutcome::Spawned { actors: count })
    }

    fn dispatch_ambulance(&mut self) -> EventOutcome {
        if !self.snapshot.config.actors.ambulance {
            debug!("ambulance alert ignored while ambulances are disabled");
            return EventOutcome::Ignored;
        }
        let trigger_index = self.ambulance_trigger_index;
        self.ambulance_trigger_index += 1;
        let ctx = SpawnContext::new(&self.snapshot.config, &self.layout);
        let Some(ambulance) = spawn_ambulance(&ctx, self.snapshot.now_ms, trigger_index) else {
            return EventOutcome::Ignored;
        };
        self.actors.retain(|actor| !choreography::is_ambulance(actor));
        self.actors.push(Actor::Ambulance(ambulance));
        self.render();
        self.emit();
        EventOutcome::Spawned { actors: 1 }
    }

    fn is_throttled(&mut self, event_type: EventType, ts: u64) -> bool {
        if let Some(last) = self.last_event_at.get(&event_type) {
            if ts.saturating_sub(*last) < EVENT_COOLDOWN_MS {
                return true;
            }
        }
        let _ = self.last_event_at.insert(event_type, ts);
        false
    }

    fn advance(&mut self, step_ms: u64) {
        let now_ms = self.snapshot.now_ms + step_ms;
        let current = &self.snapshot.config;
        let time_of_day = normalize_time_of_day(
            current.time_of_day + (step_ms as f64 * current.time_scale) / DAY_CYCLE_MS as f64,
        );
        let config = current.with_time_of_day(time_of_day);

        let ctx = FrameContext::new(now_ms, &config, &self.layout).with_step(step_ms);
        let actors: Vec<Actor> = std::mem::take(&mut self.actors)
            .into_iter()
            .map(|actor| actor.update(&ctx))
            .filter(|actor| !actor.is_done())
            .collect();
        let actor_rects = render_all(&actors, &FrameContext::new(now_ms, &config, &self.layout));

        self.actors = actors;
        self.snapshot.now_ms = now_ms;
        self.snapshot.config = config;
        self.snapshot.actor_rects = actor_rects;
    }

    fn render(&mut self) {
        let ctx = FrameContext::new(self.snapshot.now_ms, &self.snapshot.config, &self.layout);
        let actor_rects = render_all(&self.actors, &ctx);
        self.snapshot.actor_rects = actor_rects;
    }

    fn emit(&mut self) {
        let snapshot = &self.snapshot;
        for (_, listener) in &mut self.listeners {
            listener(snapshot);
        }
    }

    fn ensure_event_listener(&mut self) {
        if self.event_listener.is_some() {
            return;
        }
        if let Some(source) = &self.event_source {
            self.event_listener = Some(source.attach());
            debug!("event listener attached");
        }
    }

    fn maybe_start(&mut self) {
        if self.running || !self.snapshot.playing || self.listeners.is_empty() {
            return;
        }
        self.running = true;
    }

    fn maybe_stop(&mut self) {
        if !self.listeners.is_empty() && self.snapshot.playing {
            return;
        }
        self.stop();
    }

    fn stop(&mut self) {
        self.running = false;
        self.last_frame_ms = None;
        self.accumulator_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use living_city_core::{ActorOverrides, Density, RenderOverrides, Tone};
    use std::{cell::Cell, rc::Rc};

    fn quiet_engine(actors: ActorOverrides) -> Engine {
        let config = Config::default()
            .merge(
                &ConfigOverrides::default()
                    .with_seed("seed")
                    .with_actors(actors),
            )
            .expect("valid config");
        Engine::new(EngineOptions::default().with_config(config)).expect("engine builds")
    }

    fn counter() -> (Rc<Cell<usize>>, impl FnMut(&EngineSnapshot) + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move |_: &EngineSnapshot| handle.set(handle.get() + 1))
    }

    #[test]
    fn runs_only_while_playing_with_subscribers() {
        let mut engine = quiet_engine(ActorOverrides::all_disabled());
        assert!(!engine.is_running());
        assert_eq!(engine.frame(0), FrameRequest::Idle);

        let (_, listener) = counter();
        let id = engine.subscribe(listener);
        assert!(engine.is_running());

        engine.set_playing(false);
        assert!(!engine.is_running());
        engine.set_playing(true);
        assert!(engine.is_running());

        assert!(engine.unsubscribe(id));
        assert!(!engine.is_running());
        assert!(!engine.unsubscribe(id));
    }

    #[test]
    fn frames_accumulate_fixed_steps() {
        let mut engine = quiet_engine(ActorOverrides::all_disabled());
        let (notified, listener) = counter();
        let _ = engine.subscribe(listener);

        assert_eq!(engine.frame(1_000), FrameRequest::Continue);
        assert_eq!(engine.snapshot().now_ms, 0);
        let _ = engine.frame(1_030);
        assert_eq!(engine.snapshot().now_ms, 0);
        let _ = engine.frame(1_075);
        assert_eq!(engine.snapshot().now_ms, 50);
        // A long stall only accounts for the clamp.
        let _ = engine.frame(10_000);
        assert_eq!(engine.snapshot().now_ms, 300);
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn steps_rotate_the_time_of_day() {
        let mut engine = quiet_engine(ActorOverrides::all_disabled());
        let before = engine.snapshot().config.time_of_day;
        engine.step(4);
        let expected = before + (200.0 * engine.snapshot().config.time_scale) / DAY_CYCLE_MS as f64;
        assert_eq!(engine.snapshot().now_ms, 200);
        assert!((engine.snapshot().config.time_of_day - expected).abs() < 1e-12);
        engine.step(0);
        assert_eq!(engine.snapshot().now_ms, 200);
    }

    #[test]
    fn time_of_day_jumps_are_normalized_and_do_not_advance() {
        let mut engine = quiet_engine(ActorOverrides::default());
        engine.set_time_of_day(1.25);
        assert!((engine.snapshot().config.time_of_day - 0.25).abs() < 1e-12);
        assert_eq!(engine.snapshot().now_ms, 0);
    }

    #[test]
    fn rejected_overrides_leave_the_engine_untouched() {
        let mut engine = quiet_engine(ActorOverrides::default());
        let before = engine.snapshot().clone();
        let overrides = ConfigOverrides::default().with_render(RenderOverrides {
            voxel_scale: Some(0),
            ..RenderOverrides::default()
        });
        assert!(matches!(engine.set_config(&overrides), Err(EngineError::Config(_))));
        assert_eq!(engine.snapshot(), &before);
    }

    #[test]
    fn config_rebuild_resets_cooldowns() {
        let mut engine = quiet_engine(ActorOverrides::all_disabled());
        let search = CityEvent::new(CityEventKind::Search { query: "q".to_owned() }).at(4_000);
        assert!(matches!(engine.handle_event(&search), Ok(EventOutcome::Spawned { .. })));
        assert_eq!(engine.handle_event(&search.clone().at(4_500)).ok(), Some(EventOutcome::Throttled));

        engine
            .set_config(&ConfigOverrides::default().with_density(Density::Dense))
            .expect("valid overrides");
        assert!(engine.snapshot().actor_rects.is_empty());
        assert!(matches!(engine.handle_event(&search), Ok(EventOutcome::Spawned { .. })));
        assert!(engine
            .snapshot()
            .actor_rects
            .iter()
            .any(|rect| rect.tone == Tone::Car));
    }

    #[test]
    fn ambulance_alerts_respect_the_toggle() {
        let mut engine = quiet_engine(ActorOverrides::all_disabled());
        let alert = CityEvent::new(CityEventKind::Alert {
            kind: AlertKind::Ambulance,
        })
        .at(1);
        assert_eq!(engine.handle_event(&alert).ok(), Some(EventOutcome::Ignored));
    }
}
