//! Composition of a complete wordmark frame as SVG markup.
//!
//! Layers are painted bottom to top: sky, sun, moon, stars, skyline,
//! wordmark, ground line, lit windows and finally the actor batches. All
//! geometry is expressed in layout scene coordinates; HD layouts are scaled
//! back down to the standard view box by a single group transform.

use std::fmt::{self, Write as _};

use glam::{DVec2, IVec2};
use living_city_core::{
    clamp01, round_half_up, ActorRect, Config, RenderDetail, Scheme, SkylineConfig, Tone, VoxelRect,
    ACCESSIBLE_LABEL,
};
use living_city_engine::EngineSnapshot;
use living_city_system_batching::{batch_rects_to_paths, rects_to_path, PathGroup};
use living_city_system_layout::{
    create_layout, create_skyline, create_windows, window_lights, Layout, LayoutOptions,
    SkylineOptions, Window, WindowOptions, WORDMARK_TEXT,
};
use living_city_system_palette::{lerp_rgb, palette, Palette, Rgb, SIREN_BLUE, SIREN_RED};
use living_city_system_time_of_day::{celestial_positions, time_of_day_phase, CelestialPosition};
use tracing::warn;

use crate::SceneError;

/// Pixels per voxel at resolution 1.
pub const BASE_VOXEL_PIXEL_SCALE: u32 = 3;

const STAR_COLUMNS: [f64; 4] = [0.18, 0.34, 0.62, 0.78];
const STAR_ROWS: [i32; 4] = [2, 4, 3, 5];

/// How the root element is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMode {
    /// Width and height in pixels derived from the layout.
    #[default]
    Fixed,
    /// Width and height follow the container.
    Fluid,
}

/// Static knobs for composing frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneOptions {
    /// Resolution multiplier of the layout.
    pub resolution: u32,
    /// Scene width multiplier.
    pub banner_scale: u32,
    /// Glyph detail tier.
    pub detail: RenderDetail,
    /// Skyline tuning.
    pub skyline: SkylineConfig,
    /// Paint buildings with flat fills even when a voxel grid pattern would apply.
    pub solid_fills: bool,
    /// Sizing of the root element.
    pub size_mode: SizeMode,
    /// Prefix for element ids; must be unique per document.
    pub id_prefix: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SceneOptions {
    /// Options matching the render and skyline sections of a configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            resolution: config.render.voxel_scale,
            banner_scale: config.render.banner_scale,
            detail: config.render.detail,
            skyline: config.skyline,
            solid_fills: false,
            size_mode: SizeMode::Fixed,
            id_prefix: "living-city".to_owned(),
        }
    }

    fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            resolution: self.resolution,
            scene_scale: self.banner_scale,
            detail: self.detail,
            ..LayoutOptions::default()
        }
    }
}

/// Dynamic inputs of one frame.
#[derive(Clone, Copy, Debug)]
pub struct SceneFrame<'a> {
    /// Seed driving the skyline and window generators.
    pub seed: &'a str,
    /// Normalized time of day.
    pub time_of_day: f64,
    /// Palette preset.
    pub scheme: Scheme,
    /// Simulated milliseconds, used for window flicker.
    pub now_ms: u64,
    /// Actor rectangles to draw on top of the city.
    pub actor_rects: &'a [ActorRect],
}

impl<'a> SceneFrame<'a> {
    /// Frame inputs taken from an engine snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &'a EngineSnapshot) -> Self {
        Self {
            seed: &snapshot.config.seed,
            time_of_day: snapshot.config.time_of_day,
            scheme: snapshot.config.scheme,
            now_ms: snapshot.now_ms,
            actor_rects: &snapshot.actor_rects,
        }
    }
}

/// Composes a frame, failing on the first generator error.
pub fn compose_svg(frame: &SceneFrame<'_>, options: &SceneOptions) -> Result<String, SceneError> {
    let layout = create_layout(&options.layout_options())?;
    let skyline = create_skyline(&SkylineOptions::for_scene(
        layout.scene_width,
        layout.baseline_y,
        frame.seed,
        &options.skyline,
        layout.grid_scale,
    ))?;
    let windows = create_windows(&WindowOptions::new(
        frame.seed,
        options.resolution,
        options.detail,
    ))?;
    write_svg(frame, options, &layout, &skyline, &lit_window_rects(frame, &windows))
}

/// Composes a frame, degrading instead of failing.
///
/// A layout failure falls back to the standard layout at resolution 3;
/// skyline and window failures drop the affected layer. When even that
/// cannot be written the static label is returned.
#[must_use]
pub fn render_svg(frame: &SceneFrame<'_>, options: &SceneOptions) -> String {
    let (options, layout) = match create_layout(&options.layout_options()) {
        Ok(layout) => (options.clone(), layout),
        Err(error) => {
            warn!(
                %error,
                resolution = options.resolution,
                banner_scale = options.banner_scale,
                "layout failed, using fallback"
            );
            let fallback = LayoutOptions::fallback();
            let options = SceneOptions {
                resolution: fallback.resolution,
                banner_scale: fallback.scene_scale,
                detail: fallback.detail,
                ..options.clone()
            };
            match create_layout(&fallback) {
                Ok(layout) => (options, layout),
                Err(error) => {
                    warn!(%error, "fallback layout failed");
                    return static_svg();
                }
            }
        }
    };
    let skyline = create_skyline(&SkylineOptions::for_scene(
        layout.scene_width,
        layout.baseline_y,
        frame.seed,
        &options.skyline,
        layout.grid_scale,
    ))
    .unwrap_or_else(|error| {
        warn!(%error, "skyline failed, omitting layer");
        Vec::new()
    });
    let windows = create_windows(&WindowOptions::new(
        frame.seed,
        options.resolution,
        options.detail,
    ))
    .unwrap_or_else(|error| {
        warn!(%error, "windows failed, omitting layer");
        Vec::new()
    });

    match write_svg(frame, &options, &layout, &skyline, &lit_window_rects(frame, &windows)) {
        Ok(svg) => svg,
        Err(error) => {
            warn!(%error, "scene composition failed, using static label");
            static_svg()
        }
    }
}

/// Markup carrying only the accessible label.
#[must_use]
pub fn static_svg() -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"{ACCESSIBLE_LABEL}\"><title>{ACCESSIBLE_LABEL}</title><text x=\"0\" y=\"12\">{ACCESSIBLE_LABEL}</text></svg>"
    )
}

fn lit_window_rects(frame: &SceneFrame<'_>, windows: &[Window]) -> Vec<VoxelRect> {
    let lit = window_lights(windows, frame.now_ms, frame.time_of_day, 1.0);
    windows
        .iter()
        .zip(lit)
        .filter(|(_, lit)| *lit)
        .map(|(window, _)| VoxelRect::new(window.x, window.y, 1, 1))
        .collect()
}

/// Paint style of one actor batch.
#[derive(Clone, Debug, PartialEq)]
struct ActorPaint {
    fill: String,
    opacity: f64,
}

/// Fill and adjusted opacity for an actor rectangle, or `None` when it is invisible.
fn actor_paint(rect: &ActorRect, colors: &Palette, nightness: f64) -> Option<PathGroup<ActorPaint>> {
    let fill = match rect.tone {
        Tone::Headlight => colors.window,
        Tone::Car => colors.car,
        Tone::Ambulance | Tone::Pedestrian => colors.building,
        Tone::SirenRed => SIREN_RED,
        Tone::SirenBlue => SIREN_BLUE,
        _ => colors.building_muted,
    };
    let opacity = match rect.tone {
        Tone::Headlight => rect.opacity * clamp01(nightness * 1.25),
        Tone::SirenRed | Tone::SirenBlue => rect.opacity * clamp01(0.65 + nightness * 0.65),
        _ => rect.opacity,
    };
    if !opacity.is_finite() || opacity <= 0.0 {
        return None;
    }
    let fill = fill.to_css();
    Some(PathGroup::new(
        format!("{}-{fill}-{opacity}", rect.tone.as_str()),
        ActorPaint { fill, opacity },
    ))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BodyRect {
    min: IVec2,
    size: IVec2,
    corner: Option<f64>,
    opacity: Option<f64>,
}

impl BodyRect {
    fn square(min: IVec2, side: i32) -> Self {
        Self {
            min,
            size: IVec2::splat(side),
            corner: None,
            opacity: None,
        }
    }

    fn faded(self, opacity: f64) -> Self {
        Self {
            opacity: Some(opacity),
            ..self
        }
    }

    fn rounded(self) -> Self {
        Self {
            corner: Some((f64::from(self.size.x) / 3.0).max(1.0)),
            ..self
        }
    }
}

fn fraction(size: i32, factor: f64) -> i32 {
    (f64::from(size) * factor).floor() as i32
}

fn sun_rects(origin: IVec2, size: i32, hd: bool) -> Vec<BodyRect> {
    let ray = (size / 3).max(1);
    let ray_offset = ((size - ray) / 2).max(0);
    let diag = (ray / 2).max(1);
    let core_inset = (size / 4).max(1);
    let core_size = (size - core_inset * 2).max(1);

    let mut rects = vec![
        BodyRect::square(origin, size).rounded(),
        BodyRect::square(origin + IVec2::new(-ray, ray_offset), ray),
        BodyRect::square(origin + IVec2::new(size, ray_offset), ray),
    ];
    if hd {
        rects.extend([
            BodyRect::square(origin + IVec2::new(ray_offset, -ray), ray),
            BodyRect::square(origin + IVec2::new(ray_offset, size), ray),
            BodyRect::square(origin + IVec2::splat(-diag), diag).faded(0.8),
            BodyRect::square(origin + IVec2::new(size, -diag), diag).faded(0.8),
            BodyRect::square(origin + IVec2::new(-diag, size), diag).faded(0.8),
            BodyRect::square(origin + IVec2::splat(size), diag).faded(0.8),
            BodyRect::square(origin + IVec2::splat(core_inset), core_size).faded(0.35),
        ]);
    }
    rects
}

fn moon_rects(origin: IVec2, size: i32, hd: bool) -> Vec<BodyRect> {
    let cut = fraction(size, 0.6).max(1);
    let crater = (size / 5).max(1);
    let crater_small = (size / 7).max(1);

    let mut rects = vec![
        BodyRect::square(origin, size).rounded(),
        BodyRect::square(
            origin + IVec2::new(fraction(size, 0.4), fraction(size, 0.2)),
            cut,
        )
        .faded(0.35),
    ];
    if hd {
        rects.extend([
            BodyRect::square(origin + IVec2::splat(crater), crater).faded(0.25),
            BodyRect::square(
                origin + IVec2::new(fraction(size, 0.65), fraction(size, 0.55)),
                crater,
            )
            .faded(0.2),
            BodyRect::square(
                origin + IVec2::new(fraction(size, 0.2), fraction(size, 0.65)),
                crater_small,
            )
            .faded(0.2),
            BodyRect::square(
                origin + IVec2::new(fraction(size, 0.55), fraction(size, 0.25)),
                crater_small,
            )
            .faded(0.18),
        ]);
    }
    rects
}

/// Top-left corner of a celestial body within the sky band.
fn sky_position(sky_max: DVec2, body: &CelestialPosition) -> IVec2 {
    let scaled = sky_max * DVec2::new(body.x, 1.0 - clamp01(body.altitude));
    DVec2::new(round_half_up(scaled.x), round_half_up(scaled.y)).as_ivec2()
}

fn write_body(out: &mut String, fill: Rgb, opacity: f64, rects: &[BodyRect]) -> fmt::Result {
    write!(out, "<g fill=\"{fill}\" opacity=\"{opacity}\">")?;
    for rect in rects {
        write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
            rect.min.x, rect.min.y, rect.size.x, rect.size.y
        )?;
        if let Some(corner) = rect.corner {
            write!(out, " rx=\"{corner}\" ry=\"{corner}\"")?;
        }
        if let Some(opacity) = rect.opacity {
            write!(out, " opacity=\"{opacity}\"")?;
        }
        out.push_str("/>");
    }
    out.push_str("</g>");
    Ok(())
}

fn write_grid_pattern(out: &mut String, id: &str, edge: Rgb, face: Rgb) -> fmt::Result {
    write!(
        out,
        "<pattern id=\"{id}\" patternUnits=\"userSpaceOnUse\" width=\"1\" height=\"1\">\
         <rect x=\"0\" y=\"0\" width=\"1\" height=\"1\" fill=\"{edge}\"/>\
         <rect x=\"0.08\" y=\"0.08\" width=\"0.84\" height=\"0.84\" fill=\"{face}\"/>\
         </pattern>"
    )
}

fn escape_attr(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect()
}

fn write_svg(
    frame: &SceneFrame<'_>,
    options: &SceneOptions,
    layout: &Layout,
    skyline: &[VoxelRect],
    lit_windows: &[VoxelRect],
) -> Result<String, SceneError> {
    let colors = palette(frame.time_of_day, frame.scheme);
    let daylight = time_of_day_phase(frame.time_of_day).daylight;
    let nightness = clamp01(1.0 - daylight);
    let celestial = celestial_positions(frame.time_of_day);

    let resolution = layout.resolution.max(1);
    let scene = IVec2::new(layout.scene_width, layout.height);
    let detail_scale = f64::from(layout.detail_scale.max(1));
    let view = DVec2::new(f64::from(scene.x), f64::from(scene.y)) / detail_scale;
    let pixels = view / f64::from(resolution) * f64::from(BASE_VOXEL_PIXEL_SCALE);
    let grid_scale = layout.grid_scale;
    let use_grid = grid_scale > 1 && !options.solid_fills;

    let id = escape_attr(&options.id_prefix);
    let building_grid = format!("{id}-building-grid");
    let muted_grid = format!("{id}-building-muted-grid");

    let mut out = String::new();
    out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\"");
    write!(out, " viewBox=\"0 0 {} {}\"", view.x, view.y)?;
    match options.size_mode {
        SizeMode::Fixed => write!(
            out,
            " width=\"{}\" height=\"{}\"",
            round_half_up(pixels.x),
            round_half_up(pixels.y)
        )?,
        SizeMode::Fluid => out.push_str(" width=\"100%\" height=\"100%\""),
    }
    write!(
        out,
        " data-render-detail=\"{}\" role=\"img\" aria-labelledby=\"{id}-title\" aria-describedby=\"{id}-desc\" \
         aria-roledescription=\"Animated wordmark\" focusable=\"false\" shape-rendering=\"crispEdges\">",
        options.detail
    )?;

    out.push_str("<defs>");
    if use_grid {
        write_grid_pattern(
            &mut out,
            &building_grid,
            lerp_rgb(colors.building, colors.building_muted, 0.2),
            colors.building,
        )?;
        write_grid_pattern(
            &mut out,
            &muted_grid,
            lerp_rgb(colors.building_muted, colors.sky, 0.1),
            colors.building_muted,
        )?;
    }
    out.push_str("</defs>");

    write!(out, "<title id=\"{id}-title\">{ACCESSIBLE_LABEL}</title>")?;
    write!(
        out,
        "<desc id=\"{id}-desc\">Living voxel/cityscape wordmark spelling \u{201c}{WORDMARK_TEXT}\u{201d}.</desc>"
    )?;

    if layout.detail_scale == 1 {
        out.push_str("<g>");
    } else {
        write!(out, "<g transform=\"scale({})\">", 1.0 / detail_scale)?;
    }

    write!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        scene.x, scene.y, colors.sky
    )?;

    let body_size = 2 * grid_scale;
    let sky_height = layout.top_padding.max(1);
    let sky_max = DVec2::new(
        f64::from((scene.x - body_size).max(0)),
        f64::from((sky_height - body_size).max(0)),
    );
    let hd_bodies = grid_scale > 1;
    if celestial.sun.visible {
        let origin = sky_position(sky_max, &celestial.sun);
        write_body(
            &mut out,
            colors.sun,
            clamp01(daylight * 1.1),
            &sun_rects(origin, body_size, hd_bodies),
        )?;
    }
    if celestial.moon.visible {
        let origin = sky_position(sky_max, &celestial.moon);
        write_body(
            &mut out,
            colors.moon,
            clamp01(nightness * 1.1),
            &moon_rects(origin, body_size, hd_bodies),
        )?;
    }

    let star_opacity = clamp01(nightness * 1.1);
    for (column, row) in STAR_COLUMNS.iter().zip(STAR_ROWS) {
        let x = round_half_up(f64::from(scene.x) * column);
        write!(
            out,
            "<rect x=\"{x}\" y=\"{}\" width=\"{resolution}\" height=\"{resolution}\" fill=\"{}\" opacity=\"{star_opacity}\"/>",
            row * resolution,
            colors.star
        )?;
    }

    let muted_fill = if use_grid {
        format!("url(#{muted_grid})")
    } else {
        colors.building_muted.to_css()
    };
    let building_fill = if use_grid {
        format!("url(#{building_grid})")
    } else {
        colors.building.to_css()
    };
    write!(
        out,
        "<g fill=\"{muted_fill}\" opacity=\"0.9\"><path d=\"{}\"/></g>",
        rects_to_path(skyline, 1)
    )?;
    write!(
        out,
        "<g fill=\"{building_fill}\"><path d=\"{}\"/></g>",
        rects_to_path(&layout.rects, 1)
    )?;
    write!(
        out,
        "<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{resolution}\" fill=\"{}\" opacity=\"0.25\"/>",
        layout.baseline_y - resolution,
        scene.x,
        colors.building_muted
    )?;

    let windows_path = rects_to_path(lit_windows, 1);
    if !windows_path.is_empty() {
        write!(
            out,
            "<g fill=\"{}\" opacity=\"{}\"><path d=\"{windows_path}\"/></g>",
            colors.window,
            clamp01(nightness * 1.15)
        )?;
    }

    let batches = batch_rects_to_paths(frame.actor_rects, 1, |rect| {
        actor_paint(rect, &colors, nightness)
    });
    if !batches.is_empty() {
        out.push_str("<g>");
        for batch in &batches {
            write!(
                out,
                "<path d=\"{}\" fill=\"{}\" opacity=\"{}\"/>",
                batch.d, batch.meta.fill, batch.meta.opacity
            )?;
        }
        out.push_str("</g>");
    }

    out.push_str("</g></svg>");
    Ok(out)
}
