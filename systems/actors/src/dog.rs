//! A dog that sits on the sidewalk after an upload.

use living_city_core::{ActorRect, CityRng, Tone};

use crate::{ActorBehavior, ActorError, FrameContext, SpawnContext};

/// A stationary dog.
#[derive(Clone, Debug, PartialEq)]
pub struct Dog {
    x: i32,
    y: i32,
    body_width: i32,
    head: i32,
}

impl ActorBehavior for Dog {
    fn kind(&self) -> &str {
        "dog"
    }

    fn update(self, _ctx: &FrameContext<'_>) -> Self {
        self
    }

    fn render(&self, _ctx: &FrameContext<'_>) -> Vec<ActorRect> {
        vec![
            ActorRect::new(self.x, self.y, self.body_width, self.head, Tone::Dog, 0.72),
            ActorRect::new(self.x + self.body_width, self.y, self.head, self.head, Tone::Dog, 0.62),
        ]
    }
}

/// Places a dog at a random spot on the sidewalk, drawing from `seed:dog`.
pub fn spawn_event_dog(ctx: &SpawnContext<'_>) -> Result<Dog, ActorError> {
    let mut rng = CityRng::for_subsystem(&ctx.config.seed, "dog");
    let scale = ctx.scale();
    let body_width = scale * 2;
    let max_x = (ctx.layout.scene_width - body_width - scale).max(0);
    let x = if max_x > 0 { rng.next_int(0, max_x + 1)? } else { 0 };
    Ok(Dog {
        x,
        y: (ctx.layout.baseline_y - scale).max(0),
        body_width,
        head: scale,
    })
}
