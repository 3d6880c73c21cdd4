//! Short-lived actors spawned by semantic events.

use living_city_core::{ActorRect, Config};

use crate::{Actor, ActorBehavior, FrameContext};

/// Lifetime of an event-spawned actor in simulated milliseconds.
pub const EVENT_ACTOR_TTL_MS: u64 = 5_500;
/// Prefix of every event actor kind label.
pub const EVENT_KIND_PREFIX: &str = "event:";

/// Wraps an actor so that it expires after [`EVENT_ACTOR_TTL_MS`].
///
/// The wrapped actor sees the burst configuration it was spawned with, with
/// the time of day taken from the live clock.
#[derive(Clone, Debug, PartialEq)]
pub struct EventActor {
    inner: Box<Actor>,
    label: String,
    start_ms: u64,
    config: Option<Config>,
    done: bool,
}

impl EventActor {
    /// Wraps `inner` as an event actor born at `start_ms`.
    #[must_use]
    pub fn new(inner: Actor, label: String, start_ms: u64, config: Option<Config>) -> Self {
        Self {
            inner: Box::new(inner),
            label,
            start_ms,
            config,
            done: false,
        }
    }

    /// Simulated instant the actor was spawned at.
    #[must_use]
    pub const fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Actor being wrapped.
    #[must_use]
    pub fn inner(&self) -> &Actor {
        &self.inner
    }

    fn scoped_config(&self, live: &Config) -> Option<Config> {
        self.config
            .as_ref()
            .map(|config| config.with_time_of_day(live.time_of_day))
    }
}

impl ActorBehavior for EventActor {
    fn kind(&self) -> &str {
        &self.label
    }

    fn update(self, ctx: &FrameContext<'_>) -> Self {
        if self.done {
            return self;
        }
        let scoped = self.scoped_config(ctx.config);
        let inner_ctx = scoped.as_ref().map_or(*ctx, |config| ctx.with_config(config));
        let inner = (*self.inner).update(&inner_ctx);
        let expired = ctx.now_ms.saturating_sub(self.start_ms) >= EVENT_ACTOR_TTL_MS;
        Self {
            done: inner.is_done() || expired,
            inner: Box::new(inner),
            ..self
        }
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        if self.done {
            return Vec::new();
        }
        match self.scoped_config(ctx.config) {
            Some(config) => self.inner.render(&ctx.with_config(&config)),
            None => self.inner.render(ctx),
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
