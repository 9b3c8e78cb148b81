//! Flattened, shareable picture of the finished glass.
//!
//! The fog surface already holds its own clipped composite (frosted photo,
//! tint, noise, carved text, wiped trails), so a single draw over the sharp
//! background reproduces what the user sees. A watermark goes on top and the
//! result is encoded as JPEG.

use crate::compositor::Surface;
use crate::error::{AssetError, ExportError};
use crate::font::Typeface;
use crate::vision;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::rc::Rc;
use tiny_skia::{Color, FillRule, Paint, Pixmap, PixmapPaint, Transform};

pub const JPEG_MIME: &str = "image/jpeg";

/// Boxed future for the asset port (single-threaded, no `Send`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/* ------------------------------- assets ------------------------------- */

/// Where background images come from.
pub trait AssetSource {
    /// Load and decode an image into a premultiplied pixmap.
    fn load_image(&self, reference: &str) -> BoxFuture<'_, Result<Pixmap, AssetError>>;
}

fn decode(reference: &str, bytes: &[u8]) -> Result<Pixmap, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        reference: reference.to_owned(),
        reason: e.to_string(),
    })?;
    vision::pixmap_from_image(&decoded.to_rgba8()).ok_or_else(|| AssetError::Decode {
        reference: reference.to_owned(),
        reason: "image has no pixels".to_owned(),
    })
}

/// Files under a root directory. Web-style references (`/assets/bg.png`) are
/// resolved relative to the root.
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference.trim_start_matches('/'))
    }
}

impl AssetSource for FsAssets {
    fn load_image(&self, reference: &str) -> BoxFuture<'_, Result<Pixmap, AssetError>> {
        let reference = reference.to_owned();
        let path = self.resolve(&reference);

        Box::pin(async move {
            if reference.contains("://") {
                return Err(AssetError::Unreachable(reference));
            }
            let bytes = fs::read(&path).map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => AssetError::NotFound(reference.clone()),
                _ => AssetError::Io { path: path.clone(), source },
            })?;
            log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());
            decode(&reference, &bytes)
        })
    }
}

/// Encoded images kept in memory, keyed by reference.
#[derive(Default)]
pub struct MemoryAssets {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, encoded: Vec<u8>) {
        self.images.insert(reference.into(), encoded);
    }
}

impl AssetSource for MemoryAssets {
    fn load_image(&self, reference: &str) -> BoxFuture<'_, Result<Pixmap, AssetError>> {
        let result = match self.images.get(reference) {
            Some(bytes) => decode(reference, bytes),
            None => Err(AssetError::NotFound(reference.to_owned())),
        };
        Box::pin(async move { result })
    }
}

/* ------------------------------- export ------------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub file_name: String,
    pub title: String,
    pub caption: String,
    pub watermark: String,
    /// Watermark font size in pixels.
    pub watermark_size: f32,
    /// Distance from the bottom edge to the watermark baseline.
    pub watermark_bottom: f32,
    pub watermark_color: crate::types::Rgba,
    pub shadow_color: crate::types::Rgba,
    /// Gaussian sigma of the watermark shadow.
    pub shadow_blur: f32,
    pub jpeg_quality: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "mensaje-sangar.jpg".to_owned(),
            title: "Mensaje en el cristal".to_owned(),
            caption: "Te he dejado un mensaje en el cristal del coche... ❤️ Escribe el tuyo aquí: https://hangar-navidad.com"
                .to_owned(),
            watermark: "Díselo con el corazón - Neumáticos Sangar".to_owned(),
            watermark_size: 14.0,
            watermark_bottom: 40.0,
            watermark_color: crate::types::Rgba::new(255, 255, 255, 0.9),
            shadow_color: crate::types::Rgba::new(0, 0, 0, 0.8),
            shadow_blur: 2.0,
            jpeg_quality: 90,
        }
    }
}

/// One encoded export, ready to share or save.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
    pub title: String,
    pub caption: String,
}

pub struct ExportCompositor {
    settings: ExportSettings,
    typeface: Rc<dyn Typeface>,
}

impl ExportCompositor {
    pub fn new(settings: ExportSettings, typeface: Rc<dyn Typeface>) -> Self {
        Self { settings, typeface }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Background (sharp) + fog surface + watermark -> JPEG.
    pub async fn export(
        &self,
        surface: &Surface,
        assets: &dyn AssetSource,
        background: &str,
    ) -> Result<ExportArtifact, ExportError> {
        // A) Sharp background
        let image = assets.load_image(background).await?;
        let mut canvas = cover_backdrop(&image, surface.width(), surface.height())
            .ok_or_else(|| ExportError::Encoding("cannot allocate export canvas".to_owned()))?;

        // B) The fog exactly as the user left it
        draw_fog(&mut canvas, surface.pixmap());

        // C) Watermark
        self.draw_watermark(&mut canvas);

        // D) Encode
        let bytes = encode_jpeg(&canvas, self.settings.jpeg_quality)?;
        log::info!("exported {} ({} bytes)", self.settings.file_name, bytes.len());

        Ok(ExportArtifact {
            bytes,
            mime_type: JPEG_MIME,
            file_name: self.settings.file_name.clone(),
            title: self.settings.title.clone(),
            caption: self.settings.caption.clone(),
        })
    }

    fn draw_watermark(&self, canvas: &mut Pixmap) {
        let s = &self.settings;
        let Some(glyphs) = self.typeface.outline(&s.watermark, s.watermark_size) else { return };
        let width = self.typeface.measure(&s.watermark, s.watermark_size);
        // Outlines are centred on the line's middle; lift it so the baseline
        // sits `watermark_bottom` above the edge.
        let x = (canvas.width() as f32 - width) / 2.0;
        let y = canvas.height() as f32 - s.watermark_bottom - s.watermark_size * 0.35;
        let ts = Transform::from_translate(x, y);

        let mut paint = Paint::default();
        paint.anti_alias = true;

        // Soft shadow for legibility on bright photos
        if let Some(mut shadow) = Pixmap::new(canvas.width(), canvas.height()) {
            paint.set_color(s.shadow_color.to_skia());
            shadow.fill_path(&glyphs, &paint, FillRule::Winding, ts, None);
            vision::blur_pixmap(&mut shadow, s.shadow_blur);
            canvas.draw_pixmap(0, 0, shadow.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }

        paint.set_color(s.watermark_color.to_skia());
        canvas.fill_path(&glyphs, &paint, FillRule::Winding, ts, None);
    }
}

/// Cover-fit `background` onto a fresh opaque canvas of the given size.
pub fn cover_backdrop(background: &Pixmap, width: u32, height: u32) -> Option<Pixmap> {
    let mut canvas = Pixmap::new(width, height)?;
    canvas.fill(Color::BLACK);
    vision::draw_cover(&mut canvas, background.as_ref(), None);
    Some(canvas)
}

/// Lay the fog surface over a same-size canvas.
pub fn draw_fog(canvas: &mut Pixmap, fog: &Pixmap) {
    canvas.draw_pixmap(0, 0, fog.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
}

pub fn encode_jpeg(canvas: &Pixmap, quality: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = vision::pixmap_to_rgb(canvas)
        .ok_or_else(|| ExportError::Encoding("pixel buffer does not match canvas size".to_owned()))?;
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| ExportError::Encoding(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ExportError::Encoding("encoder produced no data".to_owned()));
    }
    Ok(bytes)
}

/* ------------------------------- sharing ------------------------------- */

/// How a share attempt ended. Cancelling is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// The user closed the share sheet.
    NotShared,
    /// No share sheet: the picture was saved instead.
    Saved(PathBuf),
}

/// Native share sheet, download prompt, or anything else that takes the picture.
pub trait ShareTarget {
    fn share(&mut self, artifact: &ExportArtifact) -> Result<ShareOutcome, ExportError>;
}

/// Fallback target: write the file into a directory.
pub struct SaveToDirectory {
    dir: PathBuf,
}

impl SaveToDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ShareTarget for SaveToDirectory {
    fn share(&mut self, artifact: &ExportArtifact) -> Result<ShareOutcome, ExportError> {
        let path = self.dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Save { path: path.clone(), source })?;
        log::info!("saved {}", path.display());
        Ok(ShareOutcome::Saved(path))
    }
}
