//! Presentation adapter that lets a surface follow an engine.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use living_city_core::ConfigOverrides;
use living_city_engine::{Engine, EngineError, EngineSnapshot, FrameRequest, SubscriptionId};

use crate::scene::{render_svg, SceneFrame, SceneOptions};

/// A mounted surface showing one engine.
///
/// Engine notifications only raise a flag; the surface picks up the latest
/// snapshot when it calls [`CitySim::flush`], so any number of notifications
/// between two paints collapse into one update and never re-enter the engine.
/// A disabled adapter shows a frozen, paused snapshot and never subscribes.
#[derive(Debug)]
pub struct CitySim {
    engine: Rc<RefCell<Engine>>,
    subscription: Option<SubscriptionId>,
    pending: Rc<Cell<bool>>,
    snapshot: EngineSnapshot,
}

impl CitySim {
    /// Mounts an enabled adapter.
    #[must_use]
    pub fn new(engine: Rc<RefCell<Engine>>) -> Self {
        Self::with_enabled(engine, true)
    }

    /// Mounts an adapter, subscribing only when `enabled`.
    #[must_use]
    pub fn with_enabled(engine: Rc<RefCell<Engine>>, enabled: bool) -> Self {
        let pending = Rc::new(Cell::new(false));
        let (snapshot, subscription) = {
            let mut live = engine.borrow_mut();
            if enabled {
                let flag = Rc::clone(&pending);
                let id = live.subscribe(move |_| flag.set(true));
                (live.snapshot().clone(), Some(id))
            } else {
                let frozen = EngineSnapshot {
                    playing: false,
                    ..live.snapshot().clone()
                };
                (frozen, None)
            }
        };
        Self {
            engine,
            subscription,
            pending,
            snapshot,
        }
    }

    /// Whether the adapter follows the engine.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    /// Snapshot as of the last flush.
    #[must_use]
    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    /// Live engine snapshot, bypassing coalescing.
    #[must_use]
    pub fn peek(&self) -> EngineSnapshot {
        self.engine.borrow().snapshot().clone()
    }

    /// Whether the engine changed since the last flush.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.get()
    }

    /// Adopts the latest engine snapshot if anything changed. Call once per paint.
    pub fn flush(&mut self) -> bool {
        if !self.is_enabled() || !self.pending.replace(false) {
            return false;
        }
        self.snapshot = self.engine.borrow().snapshot().clone();
        true
    }

    /// Runs one engine frame at `timestamp_ms` and flushes the result.
    pub fn frame(&mut self, timestamp_ms: u64) -> FrameRequest {
        if !self.is_enabled() {
            return FrameRequest::Idle;
        }
        let request = self.engine.borrow_mut().frame(timestamp_ms);
        let _ = self.flush();
        request
    }

    /// Delivers events queued on the engine's event source.
    pub fn pump_events(&mut self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.engine.borrow_mut().pump_events()
    }

    /// See [`Engine::set_playing`].
    pub fn set_playing(&mut self, playing: bool) {
        if self.is_enabled() {
            self.engine.borrow_mut().set_playing(playing);
        }
    }

    /// Flips the live play state.
    pub fn toggle_playing(&mut self) {
        if self.is_enabled() {
            let mut engine = self.engine.borrow_mut();
            let playing = engine.snapshot().playing;
            engine.set_playing(!playing);
        }
    }

    /// See [`Engine::set_time_of_day`].
    pub fn set_time_of_day(&mut self, time_of_day: f64) {
        if self.is_enabled() {
            self.engine.borrow_mut().set_time_of_day(time_of_day);
        }
    }

    /// See [`Engine::step`].
    pub fn step(&mut self, steps: u32) {
        if self.is_enabled() {
            self.engine.borrow_mut().step(steps);
        }
    }

    /// See [`Engine::set_config`]. Disabled adapters accept and ignore overrides.
    pub fn set_config(&mut self, overrides: &ConfigOverrides) -> Result<(), EngineError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.engine.borrow_mut().set_config(overrides)
    }

    /// Scene options for the displayed configuration.
    #[must_use]
    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions::from_config(&self.snapshot.config)
    }

    /// Displayed snapshot rendered as SVG.
    #[must_use]
    pub fn render_svg(&self) -> String {
        render_svg(&SceneFrame::from_snapshot(&self.snapshot), &self.scene_options())
    }
}

impl Drop for CitySim {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            if let Ok(mut engine) = self.engine.try_borrow_mut() {
                let _ = engine.unsubscribe(id);
            }
        }
    }
}
