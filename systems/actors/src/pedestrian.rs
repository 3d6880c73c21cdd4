//! Pedestrians pacing the sidewalk, some walking a dog.

use living_city_core::{round_half_up, ActorRect, CityRng, Tone};

use crate::{floor_i32, half, ActorBehavior, ActorError, FrameContext, SpawnContext};

/// One walker pacing back and forth between two columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Pedestrian {
    /// Leftmost column of the walk.
    pub min_x: i32,
    /// Rightmost column of the walk.
    pub max_x: i32,
    /// Walking speed in voxels per second.
    pub speed_vps: f64,
    /// Offset along the triangle wave.
    pub phase: f64,
    /// Top row of the body.
    pub y_body: i32,
    /// Whether a dog walks alongside.
    pub has_dog: bool,
    /// Side of the walker the dog is on, in actor cells.
    pub dog_offset: i32,
}

/// The sidewalk crowd, rendered as a single actor.
#[derive(Clone, Debug, PartialEq)]
pub struct Pedestrians {
    walkers: Vec<Pedestrian>,
}

impl Pedestrians {
    /// Walkers in spawn order.
    #[must_use]
    pub fn walkers(&self) -> &[Pedestrian] {
        &self.walkers
    }
}

/// Position along a triangle wave that bounces between `0` and `length`.
#[must_use]
pub fn ping_pong(t: f64, length: f64) -> f64 {
    if length <= 0.0 {
        return 0.0;
    }
    let period = length * 2.0;
    let wrapped = t.rem_euclid(period);
    if wrapped <= length {
        wrapped
    } else {
        period - wrapped
    }
}

fn clamp_round(value: f64, min: i32, max: i32) -> i32 {
    (round_half_up(value) as i32).max(min).min(max)
}

impl ActorBehavior for Pedestrians {
    fn kind(&self) -> &str {
        "pedestrians"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        if !ctx.config.actors.pedestrians || self.walkers.is_empty() {
            return Vec::new();
        }

        let scene_width = ctx.layout.scene_width;
        let scale = ctx.scale();
        let hd = scale > 1;
        let body_width = if hd { scale } else { 1 };
        let body_height = if hd { scale * 2 } else { 1 };
        let head = if hd { scale } else { 1 };
        let limb = if hd { half(scale) } else { 1 };
        let mut out = Vec::new();

        for walker in &self.walkers {
            let span = f64::from((walker.max_x - walker.min_x).max(0));
            let travel = ctx.travel(walker.speed_vps) + walker.phase;
            let x = walker.min_x + floor_i32(ping_pong(travel, span));
            let y = walker.y_body;

            if x + body_width <= 0 || x >= scene_width {
                continue;
            }
            if y < 0 || y + body_height > ctx.layout.height {
                continue;
            }

            if y - head >= 0 {
                out.push(ActorRect::new(x, y - head, head, head, Tone::Pedestrian, 0.55));
            }

            if hd {
                out.extend([
                    ActorRect::new(x, y, body_width, scale, Tone::Pedestrian, 0.85),
                    ActorRect::new(x + scale / 2, y + scale, body_width, scale, Tone::Pedestrian, 0.85),
                    ActorRect::new(x + scale / 3, y + scale * 2 - limb, limb, limb, Tone::Pedestrian, 0.6),
                ]);
                let arm_x = x + body_width;
                if arm_x + limb <= scene_width {
                    out.push(ActorRect::new(arm_x, y + scale / 2, limb, limb, Tone::Pedestrian, 0.6));
                }
            } else {
                out.push(ActorRect::new(x, y, 1, 1, Tone::Pedestrian, 0.85));
            }

            if walker.has_dog {
                render_dog(&mut out, walker, x, scale, scene_width);
            }
        }
        out
    }
}

fn render_dog(out: &mut Vec<ActorRect>, walker: &Pedestrian, x: i32, scale: i32, scene_width: i32) {
    let dog_x = x + walker.dog_offset * scale;
    if dog_x < 0 || dog_x >= scene_width {
        return;
    }
    if scale <= 1 {
        out.push(ActorRect::new(dog_x, walker.y_body, 1, 1, Tone::Dog, 0.72));
        return;
    }

    let dog_y = walker.y_body + scale;
    let body = scale * 2;
    let head_x = dog_x + body;
    if head_x + scale > scene_width {
        return;
    }
    out.extend([
        ActorRect::new(dog_x, dog_y, body, scale, Tone::Dog, 0.72),
        ActorRect::new(head_x, dog_y, scale, scale, Tone::Dog, 0.62),
    ]);
    let tail = half(scale);
    if dog_x - tail >= 0 {
        out.push(ActorRect::new(dog_x - tail, dog_y + scale / 2, tail, tail, Tone::Dog, 0.52));
    }
}

/// Spawns the sidewalk crowd as one actor, or nothing when it cannot fit.
///
/// When dogs are enabled at least one walker is guaranteed a dog.
pub fn spawn_pedestrians(ctx: &SpawnContext<'_>) -> Result<Vec<Pedestrians>, ActorError> {
    let count = ctx.count(ctx.config.actors.pedestrians, 1, 3, 5);
    let layout = ctx.layout;
    if count == 0 || layout.scene_width <= 0 || layout.height <= 0 {
        return Ok(Vec::new());
    }

    let x_max = (layout.scene_width - 1).max(0);
    if x_max < 4 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "pedestrians");
    let scale = ctx.scale();
    let body_height = if scale > 1 { scale * 2 } else { 1 };
    let head = if scale > 1 { scale } else { 1 };
    let y_body = head.max(layout.baseline_y - body_height);
    if y_body + body_height > layout.height {
        return Ok(Vec::new());
    }

    let max_len = (14 * scale).min((x_max - 1).max(4)).max(4);
    let min_len = (6 * scale).min(max_len);
    let dogs_enabled = ctx.config.actors.dogs;

    let mut walkers = Vec::with_capacity(count);
    for i in 0..count {
        let x_base = round_half_up((i + 1) as f64 / (count + 1) as f64 * f64::from(x_max)) as i32;
        let jitter = rng.next_int(-2 * scale, 3 * scale + 1)?;
        let center_x = clamp_round(f64::from(x_base + jitter), 1, (x_max - 1).max(1));

        let length = rng.next_int(min_len, max_len + 1)?;
        let max_min_x = (x_max - (length - 1)).max(0);
        let min_x = clamp_round(f64::from(center_x - length / 2), 0, max_min_x);
        let max_x = x_max.min(min_x + length - 1);

        let speed_vps = 0.9 + rng.next_float() * 1.6;
        let phase = rng.next_float() * f64::from(((max_x - min_x) * 2).max(1));
        let dog_offset = if rng.next_float() < 0.3 { 1 } else { -1 };
        let has_dog = dogs_enabled && rng.next_float() < 0.35;

        walkers.push(Pedestrian {
            min_x,
            max_x,
            speed_vps,
            phase,
            y_body,
            has_dog,
            dog_offset,
        });
    }

    if dogs_enabled && !walkers.iter().any(|walker| walker.has_dog) {
        if let Some(first) = walkers.first_mut() {
            first.has_dog = true;
        }
    }

    Ok(vec![Pedestrians { walkers }])
}
