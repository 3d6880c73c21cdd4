use living_city_system_layout::{create_skyline, SkylineOptions};
use proptest::prelude::*;

proptest! {
    #[test]
    fn segments_tile_the_width_within_bounds(
        width in 1i32..600,
        baseline_y in 1i32..120,
        min_height in 1i32..12,
        extra_height in 0i32..12,
        min_segment_width in 1i32..10,
        extra_segment_width in 0i32..10,
        seed in "[a-z]{1,12}",
    ) {
        let options = SkylineOptions {
            width,
            baseline_y,
            seed,
            min_height,
            max_height: min_height + extra_height,
            min_segment_width,
            max_segment_width: min_segment_width + extra_segment_width,
        };
        let rects = create_skyline(&options).expect("valid ranges build");

        let mut cursor = 0;
        for (index, rect) in rects.iter().enumerate() {
            prop_assert_eq!(rect.x, cursor, "gap or overlap at segment {}", index);
            prop_assert!(rect.height >= options.min_height && rect.height <= options.max_height);
            prop_assert!(rect.width <= options.max_segment_width);
            if index + 1 < rects.len() {
                prop_assert!(rect.width >= options.min_segment_width);
            } else {
                prop_assert!(rect.width >= 1);
            }
            prop_assert!(rect.y >= 0);
            cursor = rect.right();
        }
        prop_assert_eq!(cursor, width);
    }
}
