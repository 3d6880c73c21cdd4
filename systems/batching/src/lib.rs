#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Converts voxel rectangles into compact vector path data.
//!
//! Rectangles that share a paint style are merged into a single path string so
//! that a frame with hundreds of voxels needs only a handful of draw calls.

use std::{collections::HashMap, fmt::Write as _};

use living_city_core::{VoxelRect, VoxelShape};

/// One merged path together with the paint style of its group.
#[derive(Clone, Debug, PartialEq)]
pub struct PathBatch<M> {
    /// Grouping key returned by the caller.
    pub key: String,
    /// Paint metadata returned by the caller for the first rectangle of the group.
    pub meta: M,
    /// Concatenated path data.
    pub d: String,
}

/// Paint group assigned to a rectangle by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct PathGroup<M> {
    /// Grouping key; rectangles with equal keys share one path.
    pub key: String,
    /// Paint metadata carried with the group.
    pub meta: M,
}

impl<M> PathGroup<M> {
    /// Creates a group from a key and its metadata.
    #[must_use]
    pub fn new(key: impl Into<String>, meta: M) -> Self {
        Self {
            key: key.into(),
            meta,
        }
    }
}

fn push_rect(path: &mut String, rect: VoxelRect, scale: i32) {
    let (x, y) = (rect.x * scale, rect.y * scale);
    let (w, h) = (rect.width * scale, rect.height * scale);
    let _ = write!(path, "M{x} {y}h{w}v{h}h-{w}Z");
}

/// Path data for a list of rectangles scaled by `scale`; empty rectangles are skipped.
#[must_use]
pub fn rects_to_path<R: VoxelShape>(rects: &[R], scale: i32) -> String {
    let mut path = String::new();
    for rect in rects.iter().map(VoxelShape::voxel_rect) {
        if !rect.is_empty() {
            push_rect(&mut path, rect, scale);
        }
    }
    path
}

/// Groups rectangles by the key returned from `group` and merges each group
/// into one path.
///
/// Groups appear in the order their first rectangle was seen. Returning `None`
/// from `group` skips the rectangle; empty rectangles are skipped as well.
pub fn batch_rects_to_paths<R, M, F>(rects: &[R], scale: i32, mut group: F) -> Vec<PathBatch<M>>
where
    R: VoxelShape,
    F: FnMut(&R) -> Option<PathGroup<M>>,
{
    let mut batches: Vec<PathBatch<M>> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for source in rects {
        let rect = source.voxel_rect();
        if rect.is_empty() {
            continue;
        }
        let Some(PathGroup { key, meta }) = group(source) else {
            continue;
        };
        let index = match index_by_key.get(&key) {
            Some(index) => *index,
            None => {
                let index = batches.len();
                let _ = index_by_key.insert(key.clone(), index);
                batches.push(PathBatch {
                    key,
                    meta,
                    d: String::new(),
                });
                index
            }
        };
        push_rect(&mut batches[index].d, rect, scale);
    }

    batches
}
