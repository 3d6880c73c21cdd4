//! The ambulance raised by `alert` events.
//!
//! Unlike the looping vehicles the ambulance crosses the street once. It
//! enters from the left edge, flashes its sirens and is retired after
//! [`AMBULANCE_LIFETIME_MS`] or once it has driven past the right edge.

use living_city_core::{ActorRect, CityRng, Tone};

use crate::{floor_i32, half, lane_y, vehicle_rows, ActorBehavior, FrameContext, SpawnContext};

/// Simulated lifetime of an ambulance.
pub const AMBULANCE_LIFETIME_MS: u64 = 9_000;
/// Period of one siren colour before the lamps swap.
pub const SIREN_FLASH_PERIOD_MS: u64 = 180;

const SIREN_DIM: f64 = 0.22;

/// One ambulance crossing the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Ambulance {
    spawn_at_ms: u64,
    end_at_ms: u64,
    x0: f64,
    speed_vps: f64,
    width: i32,
    y: i32,
    done: bool,
}

impl Ambulance {
    fn x(&self, ctx: &FrameContext<'_>) -> i32 {
        let elapsed_s = ctx.now_ms.saturating_sub(self.spawn_at_ms) as f64 / 1000.0;
        floor_i32(self.x0 + elapsed_s * self.speed_vps * ctx.config.time_scale)
    }

    /// Simulated instant after which the ambulance is retired.
    #[must_use]
    pub const fn end_at_ms(&self) -> u64 {
        self.end_at_ms
    }
}

impl ActorBehavior for Ambulance {
    fn kind(&self) -> &str {
        "ambulance"
    }

    fn update(self, ctx: &FrameContext<'_>) -> Self {
        if self.done {
            return self;
        }
        let off_screen = self.x(ctx) > ctx.layout.scene_width + 3 * ctx.scale();
        let expired = ctx.now_ms >= self.end_at_ms;
        Self {
            done: !ctx.config.actors.ambulance || expired || off_screen,
            ..self
        }
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        if self.done || ctx.now_ms >= self.end_at_ms {
            return Vec::new();
        }
        let scale = ctx.scale();
        let x = self.x(ctx);
        let margin = (scale * 2).max(2);
        if x > ctx.layout.scene_width + margin || x + self.width < -margin {
            return Vec::new();
        }

        let (y, width) = (self.y, self.width);
        let hd = scale > 1;
        let mut out = Vec::with_capacity(10);
        if hd {
            let window_inset = half(scale);
            let stripe_height = half(scale);
            let stripe_y = y + scale + scale / 2;
            let wheel = half(scale);
            let wheel_y = y + scale * 2;
            out.extend([
                ActorRect::new(x + scale, y, width - scale * 2, scale, Tone::Ambulance, 0.78),
                ActorRect::new(x, y + scale, width, scale, Tone::Ambulance, 0.9),
                ActorRect::new(x, y + scale * 2, width, scale, Tone::Ambulance, 0.97),
                ActorRect::new(
                    x + window_inset,
                    y + scale,
                    (width - window_inset * 2 - scale).max(1),
                    scale,
                    Tone::Ambulance,
                    0.55,
                ),
                ActorRect::new(
                    x + scale,
                    stripe_y,
                    (width - scale * 3).max(1),
                    stripe_height,
                    Tone::SirenRed,
                    0.45,
                ),
                ActorRect::new(x + scale, wheel_y, wheel, wheel, Tone::Ambulance, 0.6),
                ActorRect::new(x + width - scale - wheel, wheel_y, wheel, wheel, Tone::Ambulance, 0.6),
            ]);
        } else {
            out.extend([
                ActorRect::new(x + 1, y, width - 2, 1, Tone::Ambulance, 0.85),
                ActorRect::new(x, y + 1, width, 1, Tone::Ambulance, 0.95),
            ]);
        }

        let flash = ctx.now_ms.saturating_sub(self.spawn_at_ms) / SIREN_FLASH_PERIOD_MS;
        let (red, blue) = if flash % 2 == 0 {
            (1.0, SIREN_DIM)
        } else {
            (SIREN_DIM, 1.0)
        };
        let siren = if hd { scale } else { 1 };
        let siren_y = y - siren;
        out.extend([
            ActorRect::new(x + 2 * scale, siren_y, siren, siren, Tone::SirenRed, red),
            ActorRect::new(x + 4 * scale, siren_y, siren, siren, Tone::SirenBlue, blue),
            ActorRect::new(
                x + width,
                if hd { y + scale * 2 } else { y + 1 },
                siren,
                siren,
                Tone::Headlight,
                1.0,
            ),
        ]);
        out
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// Spawns an ambulance at `now_ms`, or nothing when ambulances are disabled.
///
/// Each trigger draws from its own stream keyed by `trigger_index` so that
/// consecutive alerts produce different speeds.
#[must_use]
pub fn spawn_ambulance(ctx: &SpawnContext<'_>, now_ms: u64, trigger_index: u64) -> Option<Ambulance> {
    if !ctx.config.actors.ambulance {
        return None;
    }

    let mut rng = CityRng::for_instance(&ctx.config.seed, "ambulance", trigger_index);
    let scale = ctx.scale();
    let width = 7 * scale;
    let speed_vps = 7.0 + rng.next_float() * 3.0;
    let x0 = f64::from(-width - 2 * scale) + rng.next_float() * f64::from(2 * scale);

    Some(Ambulance {
        spawn_at_ms: now_ms,
        end_at_ms: now_ms + AMBULANCE_LIFETIME_MS,
        x0,
        speed_vps,
        width,
        y: lane_y(ctx.layout, vehicle_rows(scale)),
        done: false,
    })
}
