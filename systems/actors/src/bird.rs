//! Birds flapping across the upper sky.

use living_city_core::{ActorRect, CityRng, Tone};

use crate::{floor_i32, ActorBehavior, ActorError, FrameContext, SpawnContext};

const FLAPS_PER_SECOND: f64 = 6.0;
const FRAME_COUNT: usize = 4;

/// Horizontal direction of flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    /// Flying towards increasing x.
    East,
    /// Flying towards decreasing x.
    West,
}

/// One bird crossing the sky.
#[derive(Clone, Debug, PartialEq)]
pub struct Bird {
    x0: f64,
    speed_vps: f64,
    y: i32,
    wing_phase: f64,
    heading: Heading,
    size: f64,
}

/// Silhouette offsets `[dx, dy, w, h]` for one wing frame.
///
/// Frames cycle wings up, level, down and level again.
fn wing_frame(index: usize, s: i32) -> Vec<[i32; 4]> {
    let mut parts = vec![[0, 0, s * 3, s], [s * 3, 0, s, s], [-s, 0, s, s]];
    match index % FRAME_COUNT {
        0 => parts.extend([
            [0, -s * 2, s, s * 2],
            [s, -s * 2, s, s],
            [s * 2, -s * 2, s, s * 2],
            [s, -s * 2, s, s],
        ]),
        2 => parts.extend([
            [0, s, s, s * 2],
            [s, s, s, s],
            [s * 2, s, s, s * 2],
            [s, s, s, s],
        ]),
        _ => parts.extend([[-s, 0, s * 2, s], [s * 2, 0, s * 2, s]]),
    }
    parts
}

impl ActorBehavior for Bird {
    fn kind(&self) -> &str {
        "bird"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        let scene_width = ctx.layout.scene_width;
        let s = floor_i32(f64::from(ctx.scale()) * self.size).max(1);
        let total_width = s * 6;

        let period = f64::from(scene_width + total_width * 2);
        let raw_x = (self.x0 + ctx.travel(self.speed_vps)) % period;
        let x = match self.heading {
            Heading::East => floor_i32(raw_x - f64::from(total_width)),
            Heading::West => floor_i32(f64::from(scene_width) - raw_x),
        };
        if x > scene_width + total_width || x < -total_width {
            return Vec::new();
        }

        let frame = (ctx.now_seconds() * FLAPS_PER_SECOND + self.wing_phase).floor();
        let frame = if frame.is_finite() && frame >= 0.0 { frame as usize } else { 0 };
        wing_frame(frame, s)
            .into_iter()
            .map(|[dx, dy, w, h]| {
                let dx = match self.heading {
                    Heading::East => dx,
                    Heading::West => -dx - w + total_width / 2,
                };
                ActorRect::new(x + dx, self.y + dy, w, h, Tone::Bird, 1.0)
            })
            .collect()
    }
}

/// Spawns birds in the upper 5–40% of the scene.
pub fn spawn_birds(ctx: &SpawnContext<'_>) -> Result<Vec<Bird>, ActorError> {
    let count = ctx.count(ctx.config.actors.birds, 3, 5, 8);
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "birds");
    let scale = ctx.scale();
    let height = f64::from(ctx.layout.height);
    let min_y = (scale * 2).max(floor_i32(height * 0.05));
    let max_y = floor_i32(height * 0.4);
    let period = f64::from(ctx.layout.scene_width) * 1.5;

    Ok((0..count)
        .map(|i| {
            let speed_vps = 8.0 + rng.next_float() * 6.0;
            let x0 = (i as f64 / count as f64) * period + rng.next_float() * period * 0.3;
            let wing_phase = rng.next_float() * 4.0;
            let y = min_y + floor_i32(rng.next_float() * f64::from(max_y - min_y));
            let heading = if rng.next_float() > 0.5 {
                Heading::East
            } else {
                Heading::West
            };
            let size = 1.2 + rng.next_float() * 0.6;
            Bird {
                x0,
                speed_vps,
                y,
                wing_phase,
                heading,
                size,
            }
        })
        .collect())
}
