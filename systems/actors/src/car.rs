//! Cars looping along the street.

use living_city_core::{clamp01, ActorRect, CityRng, Tone};

use crate::{
    floor_i32, half, lane_y, vehicle_rows, ActorBehavior, ActorError, FrameContext, SpawnContext,
    LIGHTS_THRESHOLD,
};

/// A car looping along the street lane.
#[derive(Clone, Debug, PartialEq)]
pub struct Car {
    x0: f64,
    speed_vps: f64,
    width: i32,
    y: i32,
}

impl Car {
    fn x(&self, ctx: &FrameContext<'_>, scale: i32) -> i32 {
        let period = f64::from(ctx.layout.scene_width + self.width + 8 * scale);
        floor_i32((self.x0 + ctx.travel(self.speed_vps)) % period - f64::from(self.width))
    }
}

impl ActorBehavior for Car {
    fn kind(&self) -> &str {
        "car"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        let scene_width = ctx.layout.scene_width;
        let scale = ctx.scale();
        let x = self.x(ctx, scale);
        let margin = (scale * 2).max(2);
        if x > scene_width + margin || x + self.width < -margin {
            return Vec::new();
        }

        let (y, width) = (self.y, self.width);
        let hd = scale > 1;
        let mut out = Vec::with_capacity(7);
        if hd {
            let window_inset = half(scale);
            let wheel = half(scale);
            let wheel_y = y + scale * 2;
            out.extend([
                ActorRect::new(x + scale, y, width - scale * 2, scale, Tone::Car, 0.72),
                ActorRect::new(x, y + scale, width, scale, Tone::Car, 0.88),
                ActorRect::new(x + scale, y + scale * 2, width - scale, scale, Tone::Car, 0.95),
                ActorRect::new(
                    x + window_inset,
                    y + scale,
                    (width - window_inset * 2 - scale).max(1),
                    scale,
                    Tone::Car,
                    0.55,
                ),
                ActorRect::new(x + scale, wheel_y, wheel, wheel, Tone::Car, 0.6),
                ActorRect::new(x + width - scale - wheel, wheel_y, wheel, wheel, Tone::Car, 0.6),
            ]);
        } else {
            out.extend([
                ActorRect::new(x + 1, y, width - 2, 1, Tone::Car, 0.85),
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

/// Spawns cars spread evenly across one loop period.
pub fn spawn_cars(ctx: &SpawnContext<'_>) -> Result<Vec<Car>, ActorError> {
    let count = ctx.count(ctx.config.actors.cars, 1, 2, 3);
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "cars");
    let scale = ctx.scale();
    let y = lane_y(ctx.layout, vehicle_rows(scale));
    let width = 5 * scale;
    let period = f64::from(ctx.layout.scene_width + width + 8 * scale);

    Ok((0..count)
        .map(|i| {
            let speed_vps = 2.4 + rng.next_float() * 4.0;
            let x0 = (i as f64 / count as f64) * period + rng.next_float() * 4.0 * f64::from(scale);
            Car {
                x0,
                speed_vps,
                width,
                y,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config_with, hd_layout, standard_layout};
    use living_city_core::{ActorOverrides, Density};

    fn cars_only() -> ActorOverrides {
        ActorOverrides {
            cars: Some(true),
            ..ActorOverrides::all_disabled()
        }
    }

    #[test]
    fn density_controls_population() {
        let layout = standard_layout();
        for (density, expected) in [(Density::Sparse, 1), (Density::Normal, 2), (Density::Dense, 3)] {
            let config = config_with(cars_only(), density, 0.5);
            let cars = spawn_cars(&SpawnContext::new(&config, &layout)).expect("spawns");
            assert_eq!(cars.len(), expected);
        }
    }

    #[test]
    fn spawning_is_deterministic() {
        let layout = standard_layout();
        let config = config_with(cars_only(), Density::Dense, 0.5);
        let first = spawn_cars(&SpawnContext::new(&config, &layout)).expect("spawns");
        let second = spawn_cars(&SpawnContext::new(&config, &layout)).expect("spawns");
        assert_eq!(first, second);
    }

    #[test]
    fn headlights_only_at_night() {
        let layout = standard_layout();
        let car = Car {
            x0: 20.0,
            speed_vps: 0.0,
            width: 5,
            y: 9,
        };
        let day = config_with(cars_only(), Density::Normal, 0.5);
        let night = config_with(cars_only(), Density::Normal, 0.0);
        let day_rects = car.render(&FrameContext::new(0, &day, &layout));
        let night_rects = car.render(&FrameContext::new(0, &night, &layout));
        assert!(day_rects.iter().all(|rect| rect.tone == Tone::Car));
        assert_eq!(day_rects.len(), 2);
        let headlight = night_rects
            .iter()
            .find(|rect| rect.tone == Tone::Headlight)
            .expect("headlight at night");
        assert_eq!((headlight.x, headlight.y), (20, 10));
    }

    #[test]
    fn hd_cars_use_three_rows() {
        let layout = hd_layout();
        let config = config_with(cars_only(), Density::Sparse, 0.5);
        let cars = spawn_cars(&SpawnContext::new(&config, &layout)).expect("spawns");
        let car = Car { x0: 30.0, ..cars[0].clone() };
        let rects = car.render(&FrameContext::new(0, &config, &layout));
        assert_eq!(rects.len(), 6);
        let bottom = rects.iter().map(|rect| rect.y + rect.height).max().expect("rects");
        assert_eq!(bottom, layout.baseline_y);
    }

    #[test]
    fn culled_beyond_scene_margin() {
        let layout = standard_layout();
        let config = config_with(cars_only(), Density::Sparse, 0.5);
        let period = layout.scene_width + 5 + 8;
        // x = (x0 % period) - width lands past the right margin.
        let car = Car {
            x0: f64::from(period - 1),
            speed_vps: 0.0,
            width: 5,
            y: 9,
        };
        assert!(car.x(&FrameContext::new(0, &config, &layout), 1) > layout.scene_width + 2);
        assert!(car.render(&FrameContext::new(0, &config, &layout)).is_empty());
    }
}
