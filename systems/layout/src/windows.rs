//! Flicker schedules for the lit windows of the wordmark.

use living_city_core::{clamp01, CityRng, RenderDetail};
use living_city_system_time_of_day::nightness;
use serde::{Deserialize, Serialize};

use crate::{checked_scale, glyph, glyph_metrics, metrics_factor, to_i32, LayoutError, WORDMARK_TEXT};

/// One window cell with its deterministic flicker schedule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Column of the window.
    pub x: i32,
    /// Row of the window.
    pub y: i32,
    /// Length of one flicker cycle.
    pub cycle_ms: u32,
    /// Offset into the cycle.
    pub phase_ms: u32,
    /// Fraction of the cycle the window is on.
    pub duty: f64,
    /// Eligibility roll compared against the activation level.
    pub roll: f64,
}

/// Inputs for [`create_windows`].
#[derive(Clone, Debug, PartialEq)]
pub struct WindowOptions {
    /// Scene seed; windows draw from `seed:windows`.
    pub seed: String,
    /// Text whose glyphs host the windows.
    pub text: String,
    /// Rows above the glyphs before scaling.
    pub top_padding: i32,
    /// Columns between glyphs before scaling.
    pub letter_spacing: i32,
    /// Integer multiplier applied to the glyph grid.
    pub resolution: u32,
    /// Glyph detail tier.
    pub detail: RenderDetail,
    /// Base probability that a filled cell becomes a window.
    pub window_chance: f64,
    /// Shortest flicker cycle.
    pub min_cycle_ms: i32,
    /// Longest flicker cycle.
    pub max_cycle_ms: i32,
}

impl WindowOptions {
    /// Default options for a seed, resolution and detail tier.
    #[must_use]
    pub fn new(seed: &str, resolution: u32, detail: RenderDetail) -> Self {
        Self {
            seed: seed.to_owned(),
            text: WORDMARK_TEXT.to_owned(),
            top_padding: 4,
            letter_spacing: 1,
            resolution,
            detail,
            window_chance: 0.35,
            min_cycle_ms: 1400,
            max_cycle_ms: 5200,
        }
    }
}

/// Rolls the window schedule for the interior of every glyph.
///
/// Only filled cells inside rows `2..=5` and columns `1..=3` of each glyph (in
/// standard units) are candidates. The inclusion chance shrinks with the
/// square root of the grid scale so that denser grids keep a similar look.
pub fn create_windows(options: &WindowOptions) -> Result<Vec<Window>, LayoutError> {
    let metrics = glyph_metrics(options.detail);
    let resolution = checked_scale("resolution", options.resolution)?;
    let detail_scale = to_i32(metrics.scale);
    let window_scale = resolution * detail_scale;
    let top_padding = options.top_padding * window_scale;
    let letter_spacing = options.letter_spacing * window_scale;
    let density_scale = f64::from(window_scale).sqrt().max(1.0);
    if !(0.0..=1.0).contains(&options.window_chance) {
        return Err(LayoutError::InvalidWindowChance);
    }
    let window_chance = clamp01(options.window_chance / density_scale);

    let invalid_cycle = LayoutError::InvalidCycleRange {
        min: options.min_cycle_ms,
        max: options.max_cycle_ms,
    };
    if options.min_cycle_ms <= 0 || options.max_cycle_ms < options.min_cycle_ms {
        return Err(invalid_cycle);
    }
    let cycle_limit = options.max_cycle_ms.checked_add(1).ok_or(invalid_cycle)?;

    let mut rng = CityRng::for_subsystem(&options.seed, "windows");
    let mut windows = Vec::new();
    let factor = metrics_factor(resolution);
    let row_start = 2 * window_scale;
    let row_end = 5 * window_scale + (window_scale - 1);
    let col_start = window_scale;
    let col_end = 3 * window_scale + (window_scale - 1);
    let mut cursor = 0;

    for ch in options.text.chars() {
        if ch == ' ' {
            cursor += letter_spacing * 2;
            continue;
        }

        let glyph = glyph(ch, options.detail)?.expanded(factor);
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                let filled = usize::try_from(row)
                    .ok()
                    .zip(usize::try_from(col).ok())
                    .is_some_and(|(r, c)| glyph.is_filled(r, c));
                if !filled || rng.next_float() >= window_chance {
                    continue;
                }

                let cycle_ms = rng.next_int(options.min_cycle_ms, cycle_limit)?;
                let phase_ms = rng.next_int(0, cycle_ms)?;
                let duty = clamp01(0.78 + rng.next_float() * 0.18);
                let roll = rng.next_float();
                windows.push(Window {
                    x: cursor + col,
                    y: top_padding + row,
                    cycle_ms: cycle_ms.unsigned_abs(),
                    phase_ms: phase_ms.unsigned_abs(),
                    duty,
                    roll,
                });
            }
        }

        cursor += to_i32(metrics.cols) * resolution + letter_spacing;
    }

    Ok(windows)
}

/// Evaluates which windows are lit at a moment in time.
///
/// The activation level grows with night-ness past `0.15` and is scaled by
/// `intensity`. A window is lit when its roll is below the activation level
/// and the clock sits in the on-portion of its cycle.
#[must_use]
pub fn window_lights(windows: &[Window], now_ms: u64, time_of_day: f64, intensity: f64) -> Vec<bool> {
    let active = clamp01((nightness(time_of_day) - 0.15) / 0.85) * clamp01(intensity);
    windows
        .iter()
        .map(|window| {
            if window.roll >= active || window.cycle_ms == 0 {
                return false;
            }
            let cycle = u64::from(window.cycle_ms);
            let t = (now_ms + u64::from(window.phase_ms)) % cycle;
            (t as f64) < f64::from(window.cycle_ms) * window.duty
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_are_deterministic_and_in_range() {
        let options = WindowOptions::new("markdowntown", 1, RenderDetail::Standard);
        let first = create_windows(&options).expect("windows build");
        let second = create_windows(&options).expect("windows build");
        assert_eq!(first, second);
        assert!(!first.is_empty());
        for window in &first {
            assert!((1400..=5200).contains(&window.cycle_ms));
            assert!(window.phase_ms < window.cycle_ms);
            assert!((0.78..=0.96).contains(&window.duty));
            assert!((4 + 2..=4 + 5).contains(&window.y));
        }
    }

    #[test]
    fn seeds_change_the_schedule() {
        let a = create_windows(&WindowOptions::new("a", 1, RenderDetail::Standard)).expect("builds");
        let b = create_windows(&WindowOptions::new("b", 1, RenderDetail::Standard)).expect("builds");
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut cycles = WindowOptions::new("seed", 1, RenderDetail::Standard);
        cycles.min_cycle_ms = 6000;
        assert!(matches!(
            create_windows(&cycles),
            Err(LayoutError::InvalidCycleRange { .. })
        ));

        let mut chance = WindowOptions::new("seed", 1, RenderDetail::Standard);
        chance.window_chance = 1.5;
        assert_eq!(create_windows(&chance), Err(LayoutError::InvalidWindowChance));
    }

    #[test]
    fn lights_stay_off_during_the_day() {
        let windows = create_windows(&WindowOptions::new("seed", 1, RenderDetail::Standard))
            .expect("builds");
        assert!(window_lights(&windows, 1234, 0.5, 1.0).iter().all(|lit| !lit));
        assert!(window_lights(&windows, 1234, 0.0, 0.0).iter().all(|lit| !lit));
    }

    #[test]
    fn lights_follow_each_cycle_at_night() {
        let window = Window {
            x: 0,
            y: 0,
            cycle_ms: 1000,
            phase_ms: 0,
            duty: 0.5,
            roll: 0.0,
        };
        assert_eq!(window_lights(&[window], 100, 0.0, 1.0), vec![true]);
        assert_eq!(window_lights(&[window], 700, 0.0, 1.0), vec![false]);
        assert_eq!(window_lights(&[window], 1100, 0.0, 1.0), vec![true]);
    }
}
