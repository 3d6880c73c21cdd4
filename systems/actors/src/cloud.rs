//! Translucent clouds drifting near the top of the sky.

use living_city_core::{ActorRect, CityRng, Tone};

use crate::{floor_i32, ActorBehavior, ActorError, FrameContext, SpawnContext};

/// One cloud made of a few overlapping puffs.
#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    x0: f64,
    y: i32,
    speed_vps: f64,
    width: i32,
    height: i32,
    puff_count: u32,
    puff_seed: u32,
}

impl ActorBehavior for Cloud {
    fn kind(&self) -> &str {
        "cloud"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        let scene_width = ctx.layout.scene_width;
        let period = f64::from(scene_width + self.width * 2);
        let x = floor_i32((self.x0 + ctx.travel(self.speed_vps)) % period - f64::from(self.width));
        if x > scene_width + self.width || x + self.width < -self.width {
            return Vec::new();
        }

        // Puff layout is fixed per cloud so it does not shimmer between frames.
        let mut rng = CityRng::new(&format!("cloud:{}", self.puff_seed));
        let puff = floor_i32(f64::from(self.height) * 0.7).max(1);
        (0..self.puff_count)
            .map(|_| {
                let puff_x = x + floor_i32(rng.next_float() * f64::from((self.width - puff).max(1)));
                let puff_y = self.y + floor_i32(rng.next_float() * f64::from((self.height - puff).max(1)));
                let puff_w = puff + floor_i32(rng.next_float() * f64::from(puff) * 0.3);
                let opacity = 0.18 + rng.next_float() * 0.04;
                ActorRect::new(puff_x, puff_y, puff_w, puff, Tone::Cloud, opacity)
            })
            .collect()
    }
}

/// Spawns clouds in the upper 3–20% of the scene.
pub fn spawn_clouds(ctx: &SpawnContext<'_>) -> Result<Vec<Cloud>, ActorError> {
    let count = ctx.count(ctx.config.actors.clouds, 1, 2, 3);
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "clouds");
    let scale = ctx.scale();
    let height = f64::from(ctx.layout.height);
    let min_y = floor_i32(height * 0.03).max(1);
    let max_y = floor_i32(height * 0.2);
    let period = f64::from(ctx.layout.scene_width) * 2.0;

    Ok((0..count)
        .map(|i| {
            let width = scale * (2 + floor_i32(rng.next_float() * 2.0));
            let height = scale * (1 + floor_i32(rng.next_float() * 2.0));
            let speed_vps = 1.0 + rng.next_float() * 1.5;
            let x0 = (i as f64 / count as f64) * period + rng.next_float() * period * 0.4;
            let y = min_y + floor_i32(rng.next_float() * f64::from((max_y - min_y).max(1)));
            let puff_count = 2 + (rng.next_float() * 2.0).floor() as u32;
            let puff_seed = (rng.next_float() * 10_000.0).floor() as u32;
            Cloud {
                x0,
                y,
                speed_vps,
                width,
                height,
                puff_count,
                puff_seed,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config_with, hd_layout};
    use living_city_core::{ActorOverrides, Density};

    fn clouds_only() -> ActorOverrides {
        ActorOverrides {
            clouds: Some(true),
            ..ActorOverrides::all_disabled()
        }
    }

    #[test]
    fn clouds_are_faint_and_stable() {
        let layout = hd_layout();
        let config = config_with(clouds_only(), Density::Dense, 0.5);
        let clouds = spawn_clouds(&SpawnContext::new(&config, &layout)).expect("spawns");
        assert_eq!(clouds.len(), 3);

        for cloud in &clouds {
            assert!((2..=3).contains(&cloud.puff_count));
            assert!(cloud.y >= 1);
            let still = Cloud {
                speed_vps: 0.0,
                x0: f64::from(cloud.width) + 10.0,
                ..cloud.clone()
            };
            let first = still.render(&FrameContext::new(0, &config, &layout));
            let again = still.render(&FrameContext::new(5_000, &config, &layout));
            assert_eq!(first, again);
            assert_eq!(first.len() as u32, cloud.puff_count);
            assert!(first
                .iter()
                .all(|rect| rect.tone == Tone::Cloud && (0.18..0.22).contains(&rect.opacity)));
        }
    }

    #[test]
    fn culled_when_a_full_width_off_the_left_edge() {
        let layout = hd_layout();
        let config = config_with(clouds_only(), Density::Normal, 0.5);
        let ctx = FrameContext::new(0, &config, &layout);
        let cloud = |x0: f64| Cloud {
            x0,
            y: 4,
            speed_vps: 0.0,
            width: 20,
            height: 6,
            puff_count: 3,
            puff_seed: 7,
        };
        // x = x0 - width, culled once x + width < -width.
        assert!(cloud(-21.0).render(&ctx).is_empty());
        assert_eq!(cloud(-20.0).render(&ctx).len(), 3);
        // Start of the loop sits one width left of the scene and is still drawn.
        assert_eq!(cloud(0.0).render(&ctx).len(), 3);
    }
}
