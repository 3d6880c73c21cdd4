#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural geometry for the living city wordmark.
//!
//! The layout system turns the wordmark text into run-length voxel rectangles,
//! generates the background skyline silhouette and rolls the flicker schedule
//! of every lit window. Every generator is a pure function of its options;
//! randomness comes from [`CityRng`] streams keyed by the scene seed.

pub mod glyphs;
pub mod skyline;
pub mod windows;

use living_city_core::{RenderConfig, RenderDetail, RngError, VoxelRect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use glyphs::{glyph, glyph_metrics, Glyph, GlyphMetrics, WORDMARK_TEXT};
pub use skyline::{create_skyline, SkylineOptions};
pub use windows::{create_windows, window_lights, Window, WindowOptions};

/// Largest resolution or banner multiplier accepted by the generators.
pub const MAX_SCALE: u32 = 256;

/// Errors raised by the procedural generators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The text contains a character without a glyph.
    #[error("unknown wordmark glyph {glyph:?}")]
    UnknownGlyph {
        /// Character that could not be drawn.
        glyph: char,
    },
    /// A resolution or banner multiplier is outside `1..=MAX_SCALE`.
    #[error("{field} must be within 1..={MAX_SCALE}, got {value}")]
    ScaleOutOfRange {
        /// Name of the offending option.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },
    /// Skyline heights are non-positive or inverted.
    #[error("invalid skyline height range {min}..={max}")]
    InvalidHeightRange {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
    /// Skyline segment widths are non-positive or inverted.
    #[error("invalid skyline segment width range {min}..={max}")]
    InvalidSegmentWidthRange {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
    /// Window flicker cycles are non-positive or inverted.
    #[error("invalid window cycle range {min}..={max} ms")]
    InvalidCycleRange {
        /// Lower bound in milliseconds.
        min: i32,
        /// Upper bound in milliseconds.
        max: i32,
    },
    /// The window inclusion chance is outside `0..=1`.
    #[error("window chance must be within 0..=1")]
    InvalidWindowChance,
    /// A random draw was requested with an empty range.
    #[error(transparent)]
    Rng(#[from] RngError),
}

/// Inputs for [`create_layout`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Text to spell; spaces advance the cursor by two letter gaps.
    pub text: String,
    /// Columns between glyphs before scaling.
    pub letter_spacing: i32,
    /// Rows above the glyphs before scaling.
    pub top_padding: i32,
    /// Integer multiplier applied to the glyph grid.
    pub resolution: u32,
    /// Multiplier for the full scene width.
    pub scene_scale: u32,
    /// Glyph detail tier.
    pub detail: RenderDetail,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text: WORDMARK_TEXT.to_owned(),
            letter_spacing: 1,
            top_padding: 4,
            resolution: 1,
            scene_scale: 1,
            detail: RenderDetail::Standard,
        }
    }
}

impl LayoutOptions {
    /// Options derived from the render section of a configuration.
    #[must_use]
    pub fn for_render(render: &RenderConfig) -> Self {
        Self {
            resolution: render.voxel_scale,
            scene_scale: render.banner_scale,
            detail: render.detail,
            ..Self::default()
        }
    }

    /// Degraded options used when the configured layout cannot be built.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            resolution: 3,
            scene_scale: 1,
            detail: RenderDetail::Standard,
            ..Self::default()
        }
    }
}

/// Geometry of the wordmark derived from [`LayoutOptions`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Width of the spelled text.
    pub width: i32,
    /// Width of the whole scene including banner extension.
    pub scene_width: i32,
    /// Height of the scene.
    pub height: i32,
    /// Filled run-length rectangles that spell the text.
    pub rects: Vec<VoxelRect>,
    /// Row on which buildings stand.
    pub baseline_y: i32,
    /// Rows per glyph at this resolution.
    pub glyph_rows: i32,
    /// Columns per glyph at this resolution.
    pub glyph_cols: i32,
    /// Rows above the glyphs.
    pub top_padding: i32,
    /// Detail multiplier of the glyph tier.
    pub detail_scale: i32,
    /// Resolution multiplier.
    pub resolution: i32,
    /// Combined `resolution * detail_scale`.
    pub grid_scale: i32,
}

impl Layout {
    /// Whether the layout uses expanded HD geometry.
    #[must_use]
    pub const fn is_hd(&self) -> bool {
        self.detail_scale > 1
    }
}

pub(crate) fn checked_scale(field: &'static str, value: u32) -> Result<i32, LayoutError> {
    let value = value.max(1);
    if value > MAX_SCALE {
        return Err(LayoutError::ScaleOutOfRange { field, value });
    }
    i32::try_from(value).map_err(|_| LayoutError::ScaleOutOfRange { field, value })
}

pub(crate) fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Builds the wordmark layout.
///
/// Each glyph row is emitted as horizontal runs: contiguous filled columns
/// merge into one rectangle of height one.
pub fn create_layout(options: &LayoutOptions) -> Result<Layout, LayoutError> {
    let metrics = glyph_metrics(options.detail);
    let resolution = checked_scale("resolution", options.resolution)?;
    let scene_scale = checked_scale("scene_scale", options.scene_scale)?;
    let detail_scale = to_i32(metrics.scale);
    let grid_scale = resolution * detail_scale;
    let letter_spacing = options.letter_spacing * grid_scale;
    let top_padding = options.top_padding * grid_scale;
    let glyph_rows = to_i32(metrics.rows) * resolution;
    let glyph_cols = to_i32(metrics.cols) * resolution;
    let factor = metrics_factor(resolution);

    let mut cursor = 0;
    let mut rects = Vec::new();

    for ch in options.text.chars() {
        if ch == ' ' {
            cursor += letter_spacing * 2;
            continue;
        }

        let glyph = glyph(ch, options.detail)?.expanded(factor);
        for row in 0..glyph.rows() {
            let mut col = 0;
            while col < glyph.cols() {
                if !glyph.is_filled(row, col) {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < glyph.cols() && glyph.is_filled(row, col) {
                    col += 1;
                }
                rects.push(VoxelRect::new(
                    cursor + to_i32(start),
                    top_padding + to_i32(row),
                    to_i32(col - start),
                    1,
                ));
            }
        }

        cursor += glyph_cols + letter_spacing;
    }

    let trailing = if options.text.is_empty() {
        0
    } else {
        letter_spacing
    };
    let width = (cursor - trailing).max(0);
    let scene_width = width.max(width * scene_scale);
    let baseline_y = top_padding + glyph_rows;

    Ok(Layout {
        width,
        scene_width,
        height: baseline_y,
        rects,
        baseline_y,
        glyph_rows,
        glyph_cols,
        top_padding,
        detail_scale,
        resolution,
        grid_scale,
    })
}

pub(crate) fn metrics_factor(resolution: i32) -> usize {
    usize::try_from(resolution).unwrap_or(1)
}

/// Largest integer multiplier that fits the layout into a pixel height.
///
/// Returns `1` when either input is non-finite or not positive.
#[must_use]
pub fn integer_scale_to_fit_height(target_height_px: f64, layout_height: f64) -> u32 {
    if !target_height_px.is_finite() || target_height_px <= 0.0 {
        return 1;
    }
    if !layout_height.is_finite() || layout_height <= 0.0 {
        return 1;
    }
    let scale = (target_height_px / layout_height).floor();
    if scale >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    (scale as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_has_expected_extents() {
        let layout = create_layout(&LayoutOptions::default()).expect("layout builds");
        // Twelve glyphs of five columns separated by eleven single gaps.
        assert_eq!(layout.width, 12 * 5 + 11);
        assert_eq!(layout.scene_width, layout.width);
        assert_eq!(layout.height, 4 + 7);
        assert_eq!(layout.baseline_y, 11);
        assert_eq!(layout.grid_scale, 1);
        assert!(!layout.is_hd());
    }

    #[test]
    fn runs_merge_contiguous_columns() {
        let options = LayoutOptions {
            text: "T".to_owned(),
            ..LayoutOptions::default()
        };
        let layout = create_layout(&options).expect("layout builds");
        assert_eq!(layout.rects[0], VoxelRect::new(0, 4, 5, 1));
        assert_eq!(layout.rects.len(), 7);
        assert!(layout.rects[1..].iter().all(|rect| rect.width == 1 && rect.x == 2));
    }

    #[test]
    fn hd_layout_scales_grid() {
        let layout = create_layout(&LayoutOptions::for_render(&RenderConfig::default()))
            .expect("layout builds");
        assert_eq!(layout.detail_scale, 3);
        assert_eq!(layout.resolution, 3);
        assert_eq!(layout.grid_scale, 9);
        assert_eq!(layout.glyph_rows, 63);
        assert_eq!(layout.top_padding, 36);
        assert!(layout.is_hd());
    }

    #[test]
    fn spaces_advance_by_two_gaps() {
        let spaced = LayoutOptions {
            text: "T T".to_owned(),
            ..LayoutOptions::default()
        };
        let layout = create_layout(&spaced).expect("layout builds");
        assert_eq!(layout.width, 5 + 1 + 2 + 5);
    }

    #[test]
    fn unknown_glyphs_and_huge_scales_are_rejected() {
        let unknown = LayoutOptions {
            text: "TOWNZ".to_owned(),
            ..LayoutOptions::default()
        };
        assert_eq!(
            create_layout(&unknown),
            Err(LayoutError::UnknownGlyph { glyph: 'Z' })
        );

        let huge = LayoutOptions {
            resolution: MAX_SCALE + 1,
            ..LayoutOptions::default()
        };
        assert!(matches!(
            create_layout(&huge),
            Err(LayoutError::ScaleOutOfRange { field: "resolution", .. })
        ));
    }

    #[test]
    fn zero_scales_are_treated_as_one() {
        let options = LayoutOptions {
            resolution: 0,
            scene_scale: 0,
            ..LayoutOptions::default()
        };
        let layout = create_layout(&options).expect("layout builds");
        assert_eq!(layout.resolution, 1);
        assert_eq!(layout.scene_width, layout.width);
    }

    #[test]
    fn scale_to_fit_height() {
        assert_eq!(integer_scale_to_fit_height(100.0, 11.0), 9);
        assert_eq!(integer_scale_to_fit_height(5.0, 11.0), 1);
        assert_eq!(integer_scale_to_fit_height(f64::NAN, 11.0), 1);
        assert_eq!(integer_scale_to_fit_height(100.0, 0.0), 1);
        assert_eq!(integer_scale_to_fit_height(-3.0, 11.0), 1);
    }
}
