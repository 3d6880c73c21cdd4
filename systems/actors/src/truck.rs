//! Box trucks with a separate cab and trailer.

use living_city_core::{clamp01, ActorRect, CityRng, Tone};

use crate::{
    floor_i32, half, lane_y, vehicle_rows, ActorBehavior, ActorError, FrameContext, SpawnContext,
    LIGHTS_THRESHOLD,
};

/// A truck looping along the street lane.
#[derive(Clone, Debug, PartialEq)]
pub struct Truck {
    x0: f64,
    speed_vps: f64,
    width: i32,
    cab_width: i32,
    y: i32,
}

impl ActorBehavior for Truck {
    fn kind(&self) -> &str {
        "truck"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        let scene_width = ctx.layout.scene_width;
        let scale = ctx.scale();
        let period = f64::from(scene_width + self.width + 12 * scale);
        let x = floor_i32((self.x0 + ctx.travel(self.speed_vps)) % period - f64::from(self.width));
        let margin = (scale * 2).max(2);
        if x > scene_width + margin || x + self.width < -margin {
            return Vec::new();
        }

        let (y, width, cab) = (self.y, self.width, self.cab_width);
        let hd = scale > 1;
        let mut out = Vec::with_capacity(10);
        if hd {
            let gap = scale;
            let trailer = width - cab - gap;
            let window_inset = half(scale);
            let wheel = half(scale);
            let wheel_y = y + scale * 2;
            out.extend([
                ActorRect::new(x + scale, y, cab - scale, scale, Tone::Car, 0.74),
                ActorRect::new(x + cab + gap, y, trailer, scale, Tone::Car, 0.78),
                ActorRect::new(x, y + scale, cab, scale, Tone::Car, 0.88),
                ActorRect::new(x + cab + gap, y + scale, trailer, scale, Tone::Car, 0.84),
                ActorRect::new(x, y + scale * 2, width, scale, Tone::Car, 0.95),
                ActorRect::new(
                    x + window_inset,
                    y + scale,
                    (cab - window_inset * 2).max(1),
                    scale,
                    Tone::Car,
                    0.55,
                ),
                ActorRect::new(x + scale, wheel_y, wheel, wheel, Tone::Car, 0.58),
                ActorRect::new(x + cab + gap + scale, wheel_y, wheel, wheel, Tone::Car, 0.58),
                ActorRect::new(x + width - scale - wheel, wheel_y, wheel, wheel, Tone::Car, 0.58),
            ]);
        } else {
            out.extend([
                ActorRect::new(x + cab, y, width - cab, 1, Tone::Car, 0.82),
                ActorRect::new(x + 1, y, cab - 1, 1, Tone::Car, 0.88),
                ActorRect::new(x, y + 1, width, 1, Tone::Car, 0.95),
            ]);
        }

        let nightness = ctx.nightness();
        if nightness > LIGHTS_THRESHOLD {
            let (light_y, size) = if hd { (y + scale * 2, scale) } else { (y + 1, 1) };
            out.push(ActorRect::new(
                x + width,
                light_y,
                size,
                size,
                Tone::Headlight,
                clamp01(nightness * 0.85),
            ));
        }
        out
    }
}

/// Spawns trucks; none at sparse density unless a minimum count is requested.
pub fn spawn_trucks(ctx: &SpawnContext<'_>) -> Result<Vec<Truck>, ActorError> {
    let count = ctx.count(ctx.config.actors.trucks, 0, 1, 2);
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "trucks");
    let scale = ctx.scale();
    let y = lane_y(ctx.layout, vehicle_rows(scale));
    let width = 10 * scale;
    let cab_width = 4 * scale;
    let period = f64::from(ctx.layout.scene_width + width + 12 * scale);

    Ok((0..count)
        .map(|i| {
            let speed_vps = 2.0 + rng.next_float() * 2.0;
            let x0 = (i as f64 / count as f64) * period + rng.next_float() * 6.0 * f64::from(scale);
            Truck {
                x0,
                speed_vps,
                width,
                cab_width,
                y,
            }
        })
        .collect())
}
