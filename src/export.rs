//! Export — PNG and PDF snapshots of a canvas.
//!
//! DESIGN
//! ======
//! The scene is rendered to SVG by `canvas::render`, rasterized with resvg
//! over a solid background at the requested scale, then encoded as PNG or
//! wrapped in a single-page PDF. Any failure aborts the export; no partial
//! file is produced.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use canvas::doc::{CanvasElement, ElementId};
use canvas::input::ExportFormat;
use canvas::render::{DEFAULT_PADDING, Scene, SceneOptions, render_scene};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::pdf::{self, RgbImage};

/// Largest raster side we are willing to allocate, in pixels.
const MAX_SIDE_PX: f64 = 16_384.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("export scale must be positive, got {0}")]
    InvalidScale(f32),
    #[error("invalid background color {0:?}")]
    InvalidBackground(String),
    #[error("export size {width}x{height} is out of range")]
    Size { width: f64, height: f64 },
    #[error("scene could not be parsed: {0}")]
    Svg(String),
    #[error("encoding failed: {0}")]
    Encode(String),
}

impl crate::error::UserFacing for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_EXPORT_EMPTY",
            Self::InvalidScale(_) | Self::InvalidBackground(_) => "E_EXPORT_OPTIONS",
            Self::Size { .. } => "E_EXPORT_SIZE",
            Self::Svg(_) | Self::Encode(_) => "E_EXPORT_RENDER",
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Empty => "There is nothing on the canvas to export.".to_owned(),
            _ => format!("Export failed: {self}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Pixels per canvas unit.
    pub scale: f32,
    /// `#rgb` or `#rrggbb`.
    pub background: String,
    /// Restrict to these elements; empty exports everything.
    pub only: Vec<ElementId>,
    pub padding: f64,
}

impl ExportOptions {
    #[must_use]
    pub fn from_config(format: ExportFormat, config: &ExportConfig) -> Self {
        Self { format, scale: config.scale, background: config.background.clone(), only: Vec::new(), padding: DEFAULT_PADDING }
    }
}

/// Finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct Exported {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Raster size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Exported {
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        mime_type(self.format)
    }

    #[must_use]
    pub fn data_url(&self) -> String {
        data_url(self.mime_type(), &self.bytes)
    }
}

#[must_use]
pub fn mime_type(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Png => "image/png",
        ExportFormat::Pdf => "application/pdf",
    }
}

#[must_use]
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Export `elements` (or `options.only`) in the requested format.
pub fn export(elements: &[CanvasElement], options: &ExportOptions) -> Result<Exported, ExportError> {
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(ExportError::InvalidScale(options.scale));
    }
    let background = parse_color(&options.background)?;
    let scene_options = SceneOptions { only: options.only.clone(), padding: options.padding, background: None };
    let scene = render_scene(elements, &scene_options).ok_or(ExportError::Empty)?;
    let pixmap = rasterize(&scene, options.scale, background)?;
    let (width, height) = (pixmap.width(), pixmap.height());

    let bytes = match options.format {
        ExportFormat::Png => pixmap.encode_png().map_err(|e| ExportError::Encode(e.to_string()))?,
        ExportFormat::Pdf => {
            let pixels = rgb_pixels(&pixmap);
            pdf::single_image_page(&RgbImage { width, height, pixels: &pixels })
                .map_err(|e| ExportError::Encode(e.to_string()))?
        }
    };
    info!(format = ?options.format, elements = scene.elements, width, height, bytes = bytes.len(), "export: done");
    Ok(Exported { format: options.format, bytes, width, height })
}

/// Rasterize `scene` at `scale` over an opaque `background`.
pub fn rasterize(scene: &Scene, scale: f32, background: Color) -> Result<Pixmap, ExportError> {
    let width = (scene.width * f64::from(scale)).ceil();
    let height = (scene.height * f64::from(scale)).ceil();
    if !(1.0..=MAX_SIDE_PX).contains(&width) || !(1.0..=MAX_SIDE_PX).contains(&height) {
        return Err(ExportError::Size { width, height });
    }

    let mut opt = usvg::Options::default();
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);
    let tree = usvg::Tree::from_data(scene.svg.as_bytes(), &opt).map_err(|e| ExportError::Svg(e.to_string()))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut pixmap =
        Pixmap::new(width as u32, height as u32).ok_or(ExportError::Size { width, height })?;
    pixmap.fill(background);
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    debug!(width = pixmap.width(), height = pixmap.height(), "export: rasterized");
    Ok(pixmap)
}

/// Packed RGB from an opaque pixmap.
fn rgb_pixels(pixmap: &Pixmap) -> Vec<u8> {
    pixmap.data().chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
}

/// Parse `#rgb` / `#rrggbb` into an opaque color.
pub fn parse_color(text: &str) -> Result<Color, ExportError> {
    let invalid = || ExportError::InvalidBackground(text.to_string());
    let hex = text.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    let (r, g, b) = match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..=i].repeat(2));
            (expand(0)?, expand(1)?, expand(2)?)
        }
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        _ => return Err(invalid()),
    };
    Ok(Color::from_rgba8(r, g, b, 255))
}

/// Download name: slugified `name` plus `-canvas.png|.pdf`.
#[must_use]
pub fn default_filename(name: &str, format: ExportFormat) -> String {
    let ext = match format {
        ExportFormat::Png => "png",
        ExportFormat::Pdf => "pdf",
    };
    let slug = slugify(name);
    if slug.is_empty() { format!("canvas.{ext}") } else { format!("{slug}-canvas.{ext}") }
}

/// Lowercase, runs of non-alphanumerics become one `-`, trimmed.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
