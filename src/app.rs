//! One owner for the whole misted-glass state.
//!
//! `MistedGlass` holds the message, the fog compositor (and with it the live
//! surface), the eraser and the exporter. Window code talks to it only through
//! the methods below.

use crate::compositor::{FogCompositor, FogSettings, Surface};
use crate::error::{ExportError, FogError};
use crate::export::{AssetSource, ExportArtifact, ExportCompositor, ExportSettings, ShareOutcome, ShareTarget};
use crate::font::Typeface;
use crate::message::MessageStore;
use crate::stroke::{BrushSettings, ErasureStroke, InputResponse, PointerInput};
use std::rc::Rc;
use tiny_skia::Pixmap;

pub struct MistedGlass {
    messages: MessageStore,
    fog: FogCompositor,
    eraser: ErasureStroke,
    exporter: ExportCompositor,
}

impl MistedGlass {
    /// `typeface` carves the message, `watermark_face` signs exports.
    pub fn new(
        fog: FogSettings,
        brush: BrushSettings,
        export: ExportSettings,
        typeface: Rc<dyn Typeface>,
        watermark_face: Rc<dyn Typeface>,
        width: u32,
        height: u32,
    ) -> Result<Self, FogError> {
        Ok(Self {
            messages: MessageStore::default(),
            fog: FogCompositor::new(fog, typeface, width, height)?,
            eraser: ErasureStroke::new(brush),
            exporter: ExportCompositor::new(export, watermark_face),
        })
    }

    pub fn message(&self) -> &str {
        self.messages.get()
    }

    /// Blank messages are ignored. A visible fog is repainted with the new text,
    /// which also wipes away earlier finger trails.
    pub fn set_message(&mut self, message: &str) -> bool {
        if !self.messages.set(message) {
            return false;
        }
        if self.fog.is_active() {
            self.fog.paint(&self.messages);
        }
        true
    }

    /// Back to the start: default message, no fog, no wipe in progress.
    /// The loaded photo is kept.
    pub fn reset(&mut self) {
        self.eraser.pointer_up();
        self.messages = MessageStore::default();
        self.fog.reset();
    }

    pub fn reveal(&mut self) {
        self.eraser.pointer_up();
        self.fog.reveal(&self.messages);
    }

    pub fn is_active(&self) -> bool {
        self.fog.is_active()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), FogError> {
        if (width, height) == (self.surface().width(), self.surface().height()) {
            return Ok(());
        }
        self.fog.resize(width, height, &self.messages)
    }

    pub fn surface(&self) -> &Surface {
        self.fog.surface()
    }

    /// The sharp photo behind the glass, once loaded.
    pub fn background(&self) -> Option<&Pixmap> {
        self.fog.background()
    }

    /// Erasing only starts once the fog is showing.
    pub fn pointer_down(&mut self, input: &PointerInput) -> InputResponse {
        if !self.fog.is_active() {
            return InputResponse { suppress_default: input.is_touch() };
        }
        self.eraser.pointer_down(self.fog.surface_mut(), input)
    }

    pub fn pointer_move(&mut self, input: &PointerInput) -> InputResponse {
        self.eraser.pointer_move(self.fog.surface_mut(), input)
    }

    pub fn pointer_up(&mut self) {
        self.eraser.pointer_up();
    }

    pub fn is_erasing(&self) -> bool {
        self.eraser.session().active
    }

    /// Fetch the photo behind the glass. A failed load keeps whatever photo
    /// was there before (possibly none) instead of failing.
    pub async fn load_background(&mut self, assets: &dyn AssetSource, reference: &str) -> bool {
        match assets.load_image(reference).await {
            Ok(image) => {
                log::info!("background {reference} is {}x{}", image.width(), image.height());
                self.fog.set_background(Some(image), &self.messages);
                true
            }
            Err(e) => {
                log::warn!("background unavailable, keeping the current one: {e}");
                false
            }
        }
    }

    pub async fn export(&self, assets: &dyn AssetSource, background: &str) -> Result<ExportArtifact, ExportError> {
        self.exporter.export(self.fog.surface(), assets, background).await
    }

    pub async fn export_and_share(
        &self,
        assets: &dyn AssetSource,
        background: &str,
        target: &mut dyn ShareTarget,
    ) -> Result<ShareOutcome, ExportError> {
        let artifact = self.export(assets, background).await?;
        let outcome = target.share(&artifact)?;
        match &outcome {
            ShareOutcome::Shared => log::info!("shared {}", artifact.file_name),
            ShareOutcome::NotShared => log::info!("share cancelled"),
            ShareOutcome::Saved(path) => log::info!("share unavailable, saved to {}", path.display()),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::export::MemoryAssets;
    use crate::font::BlockFont;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn glass(width: u32, height: u32) -> MistedGlass {
        MistedGlass::new(
            FogSettings::curved_window(),
            BrushSettings::default(),
            ExportSettings::default(),
            Rc::new(BlockFont),
            Rc::new(BlockFont),
            width,
            height,
        )
        .unwrap()
    }

    fn assets_with_background() -> MemoryAssets {
        let img = RgbaImage::from_pixel(16, 9, Rgba([40, 120, 200, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        let mut assets = MemoryAssets::new();
        assets.insert("bg.png", out.into_inner());
        assets
    }

    struct Cancelled;

    impl ShareTarget for Cancelled {
        fn share(&mut self, _artifact: &ExportArtifact) -> Result<ShareOutcome, ExportError> {
            Ok(ShareOutcome::NotShared)
        }
    }

    #[test]
    fn test_message_round_trip_and_rejection() {
        let mut app = glass(200, 100);
        assert_eq!(app.message(), "Te quiero");
        assert!(app.set_message("Hola guapa"));
        assert!(!app.set_message("  \t"));
        assert_eq!(app.message(), "Hola guapa");
    }

    #[test]
    fn test_nothing_is_drawn_before_reveal() {
        let mut app = glass(200, 100);
        app.resize(300, 150).unwrap();
        assert!(!app.is_active());
        assert_eq!((app.surface().width(), app.surface().height()), (300, 150));
        assert!(app.surface().pixmap().data().iter().all(|&b| b == 0));

        let response = app.pointer_down(&PointerInput::Touch(vec![(150.0, 60.0)]));
        assert!(response.suppress_default);
        assert!(!app.is_erasing());
    }

    #[test]
    fn test_reveal_then_erase() {
        let mut app = glass(300, 200);
        app.set_message(".");
        app.reveal();
        assert!(app.is_active());
        let idx = ((70 * 300 + 150) * 4 + 3) as usize;
        assert!(app.surface().pixmap().data()[idx] > 0);

        app.pointer_down(&PointerInput::Mouse { x: 150.0, y: 70.0 });
        assert!(app.is_erasing());
        assert_eq!(app.surface().pixmap().data()[idx], 0);
        app.pointer_up();
        assert!(!app.is_erasing());
    }

    #[test]
    fn test_new_message_repaints_visible_fog() {
        let mut app = glass(300, 200);
        app.set_message(".");
        app.reveal();
        let before = app.surface().pixmap().data().to_vec();
        app.set_message("Feliz Navidad");
        assert_ne!(app.surface().pixmap().data(), &before[..]);
    }

    #[test]
    fn test_same_size_resize_keeps_trails() {
        let mut app = glass(300, 200);
        app.reveal();
        app.pointer_down(&PointerInput::Mouse { x: 150.0, y: 70.0 });
        app.pointer_up();
        let wiped = app.surface().pixmap().data().to_vec();
        app.resize(300, 200).unwrap();
        assert_eq!(app.surface().pixmap().data(), &wiped[..]);
    }

    #[test]
    fn test_failed_background_load_degrades() {
        let mut app = glass(120, 80);
        app.reveal();
        assert!(!pollster::block_on(app.load_background(&MemoryAssets::new(), "missing.png")));
        assert!(app.is_active());
        assert!(app.background().is_none());
        assert!(pollster::block_on(app.load_background(&assets_with_background(), "bg.png")));
        assert_eq!(app.background().map(|bg| (bg.width(), bg.height())), Some((16, 9)));
    }

    #[test]
    fn test_failed_reload_keeps_previous_background() {
        let mut app = glass(120, 80);
        app.reveal();
        assert!(pollster::block_on(app.load_background(&assets_with_background(), "bg.png")));
        let with_photo = app.surface().pixmap().data().to_vec();

        assert!(!pollster::block_on(app.load_background(&MemoryAssets::new(), "bg.png")));
        assert!(app.background().is_some());
        assert_eq!(app.surface().pixmap().data(), &with_photo[..]);
    }

    #[test]
    fn test_reset_returns_to_the_start() {
        let mut app = glass(300, 200);
        assert!(pollster::block_on(app.load_background(&assets_with_background(), "bg.png")));
        app.set_message("Feliz Navidad");
        app.reveal();
        app.pointer_down(&PointerInput::Mouse { x: 150.0, y: 70.0 });

        app.reset();
        assert!(!app.is_active());
        assert!(!app.is_erasing());
        assert_eq!(app.message(), "Te quiero");
        assert!(app.background().is_some());
        assert!(app.surface().pixmap().data().iter().all(|&b| b == 0));
        assert!(app.surface().clip().is_none());

        app.reveal();
        assert!(app.is_active());
    }

    #[test]
    fn test_export_and_share_reports_cancel() {
        let mut app = glass(120, 80);
        app.reveal();
        let outcome = pollster::block_on(app.export_and_share(&assets_with_background(), "bg.png", &mut Cancelled));
        assert_eq!(outcome.unwrap(), ShareOutcome::NotShared);
    }

    #[test]
    fn test_export_fails_without_background() {
        let app = glass(120, 80);
        let result = pollster::block_on(app.export(&MemoryAssets::new(), "bg.png"));
        assert!(matches!(result, Err(ExportError::AssetLoad(AssetError::NotFound(_)))));
    }
}
