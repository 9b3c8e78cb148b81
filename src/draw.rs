// Window + HUD utilities for the demo.
// Visual effects provided here:
// 1) A resizable window that shows the composed frame (photo + fog).
// 2) Mouse and key state, read once per frame.
// 3) A small hint line drawn with the block font, with a 1-pixel shadow.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use misted_glass::error::Error;
use misted_glass::font::{BlockFont, Typeface};
use misted_glass::types::FrameBuffer;
use tiny_skia::{Color, FillRule, Paint, Pixmap, Transform};

const PRESET_KEYS: [Key; 4] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4];

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Visual: a new empty, resizable window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let options = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, options).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Current client area; changes when the user drags the window border.
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels, `None` while the cursor is outside.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    /// Visual: while held, the fog under the cursor gets wiped.
    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    pub fn enter_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Enter, KeyRepeat::No)
    }

    /// Visual: the fog disappears and the default message comes back.
    pub fn r_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::R, KeyRepeat::No)
    }

    pub fn s_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::S, KeyRepeat::No)
    }

    /// Index of the preset phrase key (1-4) pressed this frame.
    pub fn preset_pressed_once(&self) -> Option<usize> {
        PRESET_KEYS.iter().position(|&k| self.window.is_key_pressed(k, KeyRepeat::No))
    }
}

/// Draw one line of HUD text with its top-left corner at (x, y).
/// Visual: small white capitals with a black shadow, readable on fog and photo.
pub fn draw_hud(canvas: &mut Pixmap, x: f32, y: f32, text: &str, size: f32) {
    let Some(glyphs) = BlockFont.outline(text, size) else { return };
    let mut paint = Paint::default();
    // outlines are centred vertically on y = 0
    let middle = y + size * 0.35;

    // Shadow pass: offset by one pixel
    paint.set_color(Color::BLACK);
    canvas.fill_path(&glyphs, &paint, FillRule::Winding, Transform::from_translate(x + 1.0, middle + 1.0), None);

    // Foreground pass
    paint.set_color(Color::WHITE);
    canvas.fill_path(&glyphs, &paint, FillRule::Winding, Transform::from_translate(x, middle), None);
}
