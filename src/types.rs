// Small value types shared by the geometry, paint and window code.
use serde::{Deserialize, Serialize};

/// What the window shows: one packed 0x00RRGGBB word per pixel (minifb format).
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// A point in unit-square coordinates: (0,0) top-left, (1,1) bottom-right of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPoint {
    pub x: f32,
    pub y: f32,
}

impl UnitPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale into surface pixels.
    #[inline]
    pub fn scale(self, width: f32, height: f32) -> (f32, f32) {
        (self.x * width, self.y * height)
    }

    pub fn in_unit_square(self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Straight-alpha colour with 8-bit channels and a fractional alpha, like CSS `rgba()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, a)
    }
}

/// Erase strength in [0,1] per pixel over a rectangular patch of the surface.
/// Visual: unseen directly; it controls how much fog is wiped at each pixel.
pub struct Coverage {
    pub x: i32,            // surface column of alpha[0]
    pub y: i32,            // surface row of alpha[0]
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<f32>,   // length = width * height, values clamped to [0.0, 1.0]
}

impl Coverage {
    pub fn new(x: i32, y: i32, width: usize, height: usize) -> Self {
        Self { x, y, width, height, alpha: vec![0.0; width * height] }
    }
}

/// Precomputed round brush "stamp" dabbed into a Coverage along a stroke.
/// Visual: makes the wiped edge soft/feathered.
pub struct Stamp {
    pub radius: i32,       // pixels from center to edge
    pub weights: Vec<f32>, // (2r+1)*(2r+1), centered kernel, peak 1.0
}
