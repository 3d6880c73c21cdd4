//! Backend that drives the adapter on a simulated clock.

use std::sync::Arc;

use anyhow::Result;
use living_city_engine::FrameRequest;
use living_city_rendering::{CitySim, RenderingBackend};
use living_city_system_event_bridge::{DispatchOutcome, EventBus, ManualClock};
use tracing::{debug, info};

use crate::script::EventScript;

/// Runs a fixed number of frames without a display.
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    clock: Arc<ManualClock>,
    bus: EventBus,
    script: EventScript,
    frames: u32,
    frame_ms: u64,
}

impl HeadlessBackend {
    pub(crate) fn new(
        clock: Arc<ManualClock>,
        bus: EventBus,
        script: EventScript,
        frames: u32,
        frame_ms: u64,
    ) -> Self {
        Self {
            clock,
            bus,
            script,
            frames,
            frame_ms,
        }
    }

    fn dispatch_due(&mut self, now_ms: u64) {
        for event in self.script.due(now_ms) {
            let event_type = event.event_type();
            match self.bus.dispatch(event) {
                DispatchOutcome::Delivered { listeners } => {
                    debug!(%event_type, now_ms, listeners, "scripted event delivered");
                }
                DispatchOutcome::Dropped(reason) => {
                    info!(%event_type, now_ms, ?reason, "scripted event dropped");
                }
            }
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(mut self, sim: &mut CitySim, mut present: F) -> Result<()>
    where
        F: FnMut(&CitySim) -> Result<()>,
    {
        let mut presented = 0_u32;
        for frame in 0..self.frames {
            let now_ms = u64::from(frame) * self.frame_ms;
            self.clock.set(now_ms);
            self.dispatch_due(now_ms);

            let request = sim.frame(now_ms);
            present(sim)?;
            presented += 1;
            if request == FrameRequest::Idle {
                debug!(frame, "engine went idle");
                break;
            }
        }

        // Events scheduled after the last frame still land in the final picture.
        let end_ms = u64::from(self.frames) * self.frame_ms;
        self.clock.set(end_ms);
        self.dispatch_due(end_ms);
        let _ = sim.pump_events();
        if sim.flush() {
            present(sim)?;
            presented += 1;
        }

        info!(
            frames = self.frames,
            presented,
            unscheduled = self.script.len(),
            "headless run finished"
        );
        Ok(())
    }
}
