//! Background skyline silhouette.

use living_city_core::{CityRng, SkylineConfig, VoxelRect};

use crate::LayoutError;

/// Inputs for [`create_skyline`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkylineOptions {
    /// Width to tile, usually the scene width.
    pub width: i32,
    /// Row the buildings stand on.
    pub baseline_y: i32,
    /// Scene seed; the skyline draws from `seed:skyline`.
    pub seed: String,
    /// Shortest building.
    pub min_height: i32,
    /// Tallest building.
    pub max_height: i32,
    /// Narrowest building.
    pub min_segment_width: i32,
    /// Widest building.
    pub max_segment_width: i32,
}

impl SkylineOptions {
    /// Options for a scene, with heights multiplied by `height_scale`.
    ///
    /// Segment widths stay in voxels while heights are expressed in grid
    /// units, so HD scenes keep proportionate buildings.
    #[must_use]
    pub fn for_scene(
        width: i32,
        baseline_y: i32,
        seed: &str,
        skyline: &SkylineConfig,
        height_scale: i32,
    ) -> Self {
        let scaled = |value: u32| clamp_to_i32(value).saturating_mul(height_scale.max(1));
        Self {
            width,
            baseline_y,
            seed: seed.to_owned(),
            min_height: scaled(skyline.min_height),
            max_height: scaled(skyline.max_height),
            min_segment_width: clamp_to_i32(skyline.min_segment_width),
            max_segment_width: clamp_to_i32(skyline.max_segment_width),
        }
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Tiles `0..width` with buildings of random width and height.
///
/// Every segment except possibly the last truncated one has a width within
/// the configured range. Empty scenes produce no segments.
pub fn create_skyline(options: &SkylineOptions) -> Result<Vec<VoxelRect>, LayoutError> {
    if options.width <= 0 || options.baseline_y <= 0 {
        return Ok(Vec::new());
    }
    let height_limit = options.max_height.checked_add(1);
    let (height_limit, width_limit) = match (height_limit, options.max_segment_width.checked_add(1)) {
        (Some(h), Some(w)) => (h, w),
        (None, _) => {
            return Err(LayoutError::InvalidHeightRange {
                min: options.min_height,
                max: options.max_height,
            })
        }
        (_, None) => {
            return Err(LayoutError::InvalidSegmentWidthRange {
                min: options.min_segment_width,
                max: options.max_segment_width,
            })
        }
    };
    if options.min_height <= 0 || options.max_height < options.min_height {
        return Err(LayoutError::InvalidHeightRange {
            min: options.min_height,
            max: options.max_height,
        });
    }
    if options.min_segment_width <= 0 || options.max_segment_width < options.min_segment_width {
        return Err(LayoutError::InvalidSegmentWidthRange {
            min: options.min_segment_width,
            max: options.max_segment_width,
        });
    }

    let mut rng = CityRng::for_subsystem(&options.seed, "skyline");
    let mut rects = Vec::new();
    let mut x = 0;
    while x < options.width {
        let segment = rng
            .next_int(options.min_segment_width, width_limit)?
            .min(options.width - x);
        let height = rng.next_int(options.min_height, height_limit)?;
        rects.push(VoxelRect::new(
            x,
            (options.baseline_y - height).max(0),
            segment,
            height,
        ));
        x += segment;
    }
    Ok(rects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: i32) -> SkylineOptions {
        SkylineOptions::for_scene(width, 11, "markdowntown", &SkylineConfig::default(), 1)
    }

    #[test]
    fn tiles_the_full_width() {
        let rects = create_skyline(&options(71)).expect("skyline builds");
        let mut cursor = 0;
        for rect in &rects {
            assert_eq!(rect.x, cursor);
            assert!((2..=6).contains(&rect.height));
            assert_eq!(rect.bottom(), 11);
            cursor = rect.right();
        }
        assert_eq!(cursor, 71);
    }

    #[test]
    fn empty_scenes_yield_nothing() {
        assert!(create_skyline(&options(0)).expect("empty").is_empty());
        let mut flat = options(20);
        flat.baseline_y = 0;
        assert!(create_skyline(&flat).expect("empty").is_empty());
    }

    #[test]
    fn inverted_ranges_are_errors() {
        let mut inverted = options(20);
        inverted.min_height = 7;
        assert_eq!(
            create_skyline(&inverted),
            Err(LayoutError::InvalidHeightRange { min: 7, max: 6 })
        );

        let mut narrow = options(20);
        narrow.max_segment_width = 1;
        assert!(matches!(
            create_skyline(&narrow),
            Err(LayoutError::InvalidSegmentWidthRange { .. })
        ));

        let mut overflow = options(20);
        overflow.max_height = i32::MAX;
        assert!(create_skyline(&overflow).is_err());
    }

    #[test]
    fn heights_follow_grid_scale() {
        let scaled =
            SkylineOptions::for_scene(200, 99, "markdowntown", &SkylineConfig::default(), 9);
        assert_eq!((scaled.min_height, scaled.max_height), (18, 54));
        assert_eq!((scaled.min_segment_width, scaled.max_segment_width), (2, 6));
    }
}
