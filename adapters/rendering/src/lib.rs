#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation layer for the living city wordmark.
//!
//! [`scene`] turns an engine snapshot into SVG markup and [`sim`] adapts an
//! engine to a surface that repaints at its own pace. Hosts plug into both
//! through [`RenderingBackend`].

pub mod scene;
pub mod sim;

use anyhow::Result as AnyResult;
use living_city_system_layout::LayoutError;
use thiserror::Error;

pub use scene::{
    compose_svg, render_svg, static_svg, SceneFrame, SceneOptions, SizeMode, BASE_VOXEL_PIXEL_SCALE,
};
pub use sim::CitySim;

/// Errors raised while composing a frame.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A generator rejected its inputs.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Writing markup failed.
    #[error("failed to write scene markup")]
    Format(#[from] std::fmt::Error),
}

/// Host capable of driving and presenting a [`CitySim`].
pub trait RenderingBackend {
    /// Runs frames until the backend decides to stop.
    ///
    /// `present` is called with the adapter after every frame that produced
    /// a new snapshot, so backends can repaint without polling the engine.
    fn run<F>(self, sim: &mut CitySim, present: F) -> AnyResult<()>
    where
        F: FnMut(&CitySim) -> AnyResult<()>;
}
