//! Streetlights that switch on after dusk, some with a faulty flicker.

use living_city_core::{clamp01, round_half_up, ActorRect, CityRng, Tone};

use crate::{half, ActorBehavior, ActorError, FrameContext, SpawnContext, LIGHTS_THRESHOLD};

/// One lamp post.
#[derive(Clone, Debug, PartialEq)]
pub struct Streetlight {
    /// Column of the bulb.
    pub x: i32,
    /// Row of the bulb.
    pub y: i32,
    /// Whether the lamp flickers.
    pub flicker: bool,
    /// Length of one flicker cycle.
    pub cycle_ms: u32,
    /// Offset into the flicker cycle.
    pub phase_ms: u32,
    /// Opacity while the lamp is dimmed.
    pub dim_opacity: f64,
}

impl Streetlight {
    fn opacity(&self, now_ms: u64) -> f64 {
        if !self.flicker || self.cycle_ms == 0 {
            return 1.0;
        }
        match (now_ms + u64::from(self.phase_ms)) % u64::from(self.cycle_ms) {
            0..=119 => self.dim_opacity,
            120..=199 => 1.0,
            200..=319 => self.dim_opacity * 0.7,
            _ => 1.0,
        }
    }
}

/// Every lamp post on the street, rendered as a single actor.
#[derive(Clone, Debug, PartialEq)]
pub struct Streetlights {
    lights: Vec<Streetlight>,
}

impl Streetlights {
    /// Lamp posts in spawn order.
    #[must_use]
    pub fn lights(&self) -> &[Streetlight] {
        &self.lights
    }
}

impl ActorBehavior for Streetlights {
    fn kind(&self) -> &str {
        "streetlight"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        if ctx.nightness() <= LIGHTS_THRESHOLD {
            return Vec::new();
        }

        let layout = ctx.layout;
        let scale = ctx.scale();
        let post_width = half(scale);
        let post_height = scale * 2;
        let mut out = Vec::new();

        for light in &self.lights {
            if light.x < 0 || light.x >= layout.scene_width || light.y < 0 || light.y >= layout.height {
                continue;
            }
            let opacity = light.opacity(ctx.now_ms);

            if scale <= 1 {
                out.push(ActorRect::new(light.x, light.y, 1, 1, Tone::Headlight, opacity));
                continue;
            }

            let bulb = scale;
            let post_x = light.x + (bulb - post_width) / 2;
            let post_y = light.y + bulb;
            let cap_height = (scale / 3).max(1);
            let glow = bulb + half(scale);
            let glow_offset = (glow - bulb) / 2;

            if post_y + post_height <= layout.height {
                out.push(ActorRect::new(
                    post_x,
                    post_y,
                    post_width,
                    post_height,
                    Tone::Pedestrian,
                    clamp01(opacity * 0.55),
                ));
            }
            let cap_y = light.y - cap_height;
            if cap_y >= 0 {
                out.push(ActorRect::new(
                    light.x,
                    cap_y,
                    bulb,
                    cap_height,
                    Tone::Pedestrian,
                    clamp01(opacity * 0.4),
                ));
            }
            let glow_x = light.x - glow_offset;
            let glow_y = light.y - glow_offset;
            if glow_x + glow >= 0 && glow_y + glow >= 0 {
                out.push(ActorRect::new(
                    glow_x,
                    glow_y,
                    glow,
                    glow,
                    Tone::Headlight,
                    clamp01(opacity * 0.25),
                ));
            }
            out.push(ActorRect::new(light.x, light.y, bulb, bulb, Tone::Headlight, opacity));
        }
        out
    }
}

/// Spawns the lamp posts as one actor, spaced evenly with jitter.
pub fn spawn_streetlights(ctx: &SpawnContext<'_>) -> Result<Vec<Streetlights>, ActorError> {
    let count = ctx.count(ctx.config.actors.streetlights, 2, 4, 6);
    if count == 0 || ctx.layout.scene_width <= 0 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "streetlights");
    let scale = ctx.scale();
    let y = (ctx.layout.baseline_y - 3 * scale).max(0);
    let x_max = (ctx.layout.scene_width - 1).max(0);
    let span = f64::from(x_max);

    let mut lights = Vec::with_capacity(count);
    for i in 0..count {
        let x_base = round_half_up((i + 1) as f64 / (count + 1) as f64 * span);
        let jitter = rng.next_int(-scale, 2 * scale + 1)?;
        let x = clamp01((x_base + f64::from(jitter)) / span.max(1.0)) * span;

        let cycle_ms = rng.next_int(2400, 7200)?;
        let phase_ms = rng.next_int(0, cycle_ms)?;
        let flicker = rng.next_float() < 0.45;
        let dim_opacity = 0.18 + rng.next_float() * 0.22;

        lights.push(Streetlight {
            x: round_half_up(x) as i32,
            y,
            flicker,
            cycle_ms: cycle_ms.unsigned_abs(),
            phase_ms: phase_ms.unsigned_abs(),
            dim_opacity,
        });
    }

    Ok(vec![Streetlights { lights }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config_with, hd_layout, standard_layout};
    use living_city_core::{ActorOverrides, Density};

    fn lights_only() -> ActorOverrides {
        ActorOverrides {
            streetlights: Some(true),
            ..ActorOverrides::all_disabled()
        }
    }

    #[test]
    fn dark_during_the_day() {
        let layout = standard_layout();
        let config = config_with(lights_only(), Density::Normal, 0.5);
        let lights = spawn_streetlights(&SpawnContext::new(&config, &layout)).expect("spawns");
        assert!(lights[0].render(&FrameContext::new(0, &config, &layout)).is_empty());
    }

    #[test]
    fn lamps_stay_inside_the_scene_at_night() {
        let layout = hd_layout();
        let config = config_with(lights_only(), Density::Dense, 0.0);
        let lights = spawn_streetlights(&SpawnContext::new(&config, &layout)).expect("spawns");
        assert_eq!(lights[0].lights().len(), 6);
        for light in lights[0].lights() {
            assert!(light.x >= 0 && light.x < layout.scene_width);
            assert!((2400..7200).contains(&light.cycle_ms));
        }
        let rects = lights[0].render(&FrameContext::new(0, &config, &layout));
        let bulbs = rects
            .iter()
            .filter(|rect| rect.tone == Tone::Headlight && rect.width == 3)
            .count();
        assert_eq!(bulbs, 6);
    }

    #[test]
    fn flicker_follows_cycle() {
        let light = Streetlight {
            x: 0,
            y: 0,
            flicker: true,
            cycle_ms: 1000,
            phase_ms: 0,
            dim_opacity: 0.2,
        };
        assert_eq!(light.opacity(50), 0.2);
        assert_eq!(light.opacity(150), 1.0);
        assert!((light.opacity(250) - 0.14).abs() < 1e-9);
        assert_eq!(light.opacity(500), 1.0);
        assert_eq!(light.opacity(1_050), 0.2);
    }
}
