// Condensation droplets: a small tile of sparse, faint white specks that the
// compositor repeats across the window.
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

/// Deterministic xorshift32 RNG for lightweight randomness.
/// Visual: decides which specks of the noise tile are lit.
#[derive(Clone)]
pub struct Rng32 { state: u32 }

impl Rng32 {
    pub fn from_seed(seed: u32) -> Self { Self { state: seed | 1 } }
    #[inline] pub fn next_u32(&mut self) -> u32 {
        // xorshift32: three shifts, period 2^32 - 1
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
    #[inline] pub fn next_f32(&mut self) -> f32 {
        // Uniform [0,1)
        (self.next_u32() >> 8) as f32 / ((1u32 << 24) as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Edge length of the square tile in pixels.
    pub tile_size: u32,
    /// Chance that a pixel holds a speck.
    pub density: f32,
    /// Alpha of one speck (0..255) inside the tile.
    pub speck_alpha: u8,
    /// Extra opacity when the tile is painted.
    pub opacity: f32,
    pub seed: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self { tile_size: 200, density: 0.5, speck_alpha: 0x10, opacity: 0.5, seed: 0xC0FFEE }
    }
}

/// Render the tile once; the same seed always yields the same tile.
/// Returns `None` for a zero tile size.
pub fn noise_tile(settings: &NoiseSettings) -> Option<Pixmap> {
    let mut tile = Pixmap::new(settings.tile_size, settings.tile_size)?;
    let mut rng = Rng32::from_seed(settings.seed);
    let a = settings.speck_alpha;
    for px in tile.data_mut().chunks_exact_mut(4) {
        if rng.next_f32() < settings.density {
            // premultiplied white at alpha `a`
            px.copy_from_slice(&[a, a, a, a]);
        }
    }
    Some(tile)
}
