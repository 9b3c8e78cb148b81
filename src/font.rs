// Glyph sources for the carved message and the export watermark.
// Visual: a typeface turns a string into filled shapes; the compositor erases
// the fog wherever those shapes land.
//
// Two sources:
// 1) BlockFont: a built-in 5x7 bitmap font scaled up to any size (no files needed).
// 2) OutlineFont: a TrueType/OpenType face read from disk (the hand-written look).

use crate::error::AssetError;
use crate::text::Measure;
use ab_glyph::{Font, FontArc, FontVec, GlyphId, OutlineCurve};
use std::path::Path as FsPath;
use tiny_skia::{Path, PathBuilder, Rect};

/// Anything that can measure and outline a single line of text.
///
/// `outline` lays the text out from x = 0 (left edge) with y = 0 on the
/// vertical middle of the line, like a canvas with `textBaseline = "middle"`.
/// Returns `None` when nothing visible would be drawn (e.g. only spaces).
pub trait Typeface: Measure {
    fn outline(&self, text: &str, font_size: f32) -> Option<Path>;
}

/* ---------- 5x7 bitmap font ---------- */

/// Cell size is a tenth of the font size: glyphs are 0.7 em tall and advance 0.6 em.
const CELL_PER_EM: f32 = 0.1;
const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;
const ADVANCE_CELLS: usize = 6; // 5 pixels glyph width + 1 pixel spacing

/// Shown for characters the table does not know.
const TOFU: [u8; 7] = [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

/// Blocky capitals built from the 5x7 table; lowercase and accented letters
/// fold to their base capitals.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFont;

impl BlockFont {
    /// Glyph rows for `ch`, `None` for zero-width characters.
    fn rows(ch: char) -> Option<[u8; 7]> {
        if ch.is_control() || matches!(ch, '\u{200B}'..='\u{200F}' | '\u{FE00}'..='\u{FE0F}') {
            return None;
        }
        Some(glyph5x7(fold(ch)).unwrap_or(TOFU))
    }

    fn visible_count(text: &str) -> usize {
        text.chars().filter(|&c| Self::rows(c).is_some()).count()
    }
}

impl Measure for BlockFont {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let n = Self::visible_count(text);
        if n == 0 {
            return 0.0;
        }
        let cell = font_size * CELL_PER_EM;
        // no spacing after the last glyph
        (n * ADVANCE_CELLS - 1) as f32 * cell
    }
}

impl Typeface for BlockFont {
    fn outline(&self, text: &str, font_size: f32) -> Option<Path> {
        let cell = font_size * CELL_PER_EM;
        let top = -(GLYPH_ROWS as f32) * cell / 2.0;
        let mut pb = PathBuilder::new();
        let mut pen = 0.0_f32;

        for ch in text.chars() {
            let Some(rows) = Self::rows(ch) else { continue };
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..GLYPH_COLS {
                    if (rowbits & (1 << (GLYPH_COLS - 1 - rx))) != 0 {
                        let x = pen + rx as f32 * cell;
                        let y = top + ry as f32 * cell;
                        if let Some(r) = Rect::from_xywh(x, y, cell, cell) {
                            pb.push_rect(r);
                        }
                    }
                }
            }
            pen += ADVANCE_CELLS as f32 * cell;
        }
        pb.finish()
    }
}

/// Map a character to the table's alphabet: ASCII capitals, digits, a few symbols.
fn fold(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' | 'Ñ' => 'N',
        'ç' | 'Ç' => 'C',
        '♥' | '❤' => '♥',
        _ => ch.to_ascii_uppercase(),
    }
}

/// Return a 5x7 glyph bitmap.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        ';' => g!(0b00000,0b00100,0b00000,0b00000,0b00110,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '¡' => g!(0b00100,0b00000,0b00100,0b00100,0b00100,0b00100,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '¿' => g!(0b00100,0b00000,0b00100,0b01000,0b10000,0b10001,0b01110),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),
        '"' => g!(0b01010,0b01010,0b00000,0b00000,0b00000,0b00000,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '/' => g!(0b00001,0b00001,0b00010,0b00100,0b01000,0b10000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '&' => g!(0b01100,0b10010,0b10100,0b01000,0b10101,0b10010,0b01101),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        '♥' => g!(0b00000,0b01010,0b11111,0b11111,0b01110,0b00100,0b00000),

        _ => None,
    }
}

/* ---------- outline fonts from disk ---------- */

/// A scalable face; sizes are CSS-style pixels per em.
#[derive(Clone)]
pub struct OutlineFont {
    font: FontArc,
}

impl OutlineFont {
    pub fn from_file(path: &FsPath) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
        let font = FontVec::try_from_vec(bytes).map_err(|_| AssetError::Font(path.to_path_buf()))?;
        log::info!("loaded outline font {}", path.display());
        Ok(Self { font: FontArc::new(font) })
    }

    /// Font units -> pixels at `font_size`.
    fn units_to_px(&self, font_size: f32) -> f32 {
        font_size / self.font.units_per_em().unwrap_or(1000.0)
    }

    fn glyph_ids<'a>(&'a self, text: &'a str) -> impl Iterator<Item = GlyphId> + 'a {
        text.chars().filter(|c| !c.is_control()).map(|c| self.font.glyph_id(c))
    }
}

impl Measure for OutlineFont {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let mut units = 0.0;
        let mut prev: Option<GlyphId> = None;
        for id in self.glyph_ids(text) {
            if let Some(p) = prev {
                units += self.font.kern_unscaled(p, id);
            }
            units += self.font.h_advance_unscaled(id);
            prev = Some(id);
        }
        units * self.units_to_px(font_size)
    }
}

impl Typeface for OutlineFont {
    fn outline(&self, text: &str, font_size: f32) -> Option<Path> {
        let s = self.units_to_px(font_size);
        // Font y grows upwards from the baseline; put the middle of the em box at y = 0.
        let middle = (self.font.ascent_unscaled() + self.font.descent_unscaled()) / 2.0;
        let mut pb = PathBuilder::new();
        let mut pen = 0.0_f32;
        let mut prev: Option<GlyphId> = None;

        for id in self.glyph_ids(text) {
            if let Some(p) = prev {
                pen += self.font.kern_unscaled(p, id);
            }
            if let Some(outline) = self.font.outline(id) {
                let map = |p: ab_glyph::Point| ((pen + p.x) * s, (middle - p.y) * s);
                let mut cursor: Option<ab_glyph::Point> = None;
                for curve in &outline.curves {
                    let start = match curve {
                        OutlineCurve::Line(p0, _) | OutlineCurve::Quad(p0, _, _) | OutlineCurve::Cubic(p0, _, _, _) => *p0,
                    };
                    // A jump in the curve list starts a new contour.
                    if cursor != Some(start) {
                        if cursor.is_some() {
                            pb.close();
                        }
                        let (x, y) = map(start);
                        pb.move_to(x, y);
                    }
                    match curve {
                        OutlineCurve::Line(_, p1) => {
                            let (x, y) = map(*p1);
                            pb.line_to(x, y);
                            cursor = Some(*p1);
                        }
                        OutlineCurve::Quad(_, c, p1) => {
                            let (cx, cy) = map(*c);
                            let (x, y) = map(*p1);
                            pb.quad_to(cx, cy, x, y);
                            cursor = Some(*p1);
                        }
                        OutlineCurve::Cubic(_, c0, c1, p1) => {
                            let (c0x, c0y) = map(*c0);
                            let (c1x, c1y) = map(*c1);
                            let (x, y) = map(*p1);
                            pb.cubic_to(c0x, c0y, c1x, c1y, x, y);
                            cursor = Some(*p1);
                        }
                    }
                }
                if cursor.is_some() {
                    pb.close();
                }
            }
            pen += self.font.h_advance_unscaled(id);
            prev = Some(id);
        }
        pb.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_font_width_scales_linearly() {
        let font = BlockFont;
        // 2 glyphs: 11 cells of 10 px at size 100
        assert_eq!(font.measure("Te", 100.0), 110.0);
        assert_eq!(font.measure("Te", 50.0), 55.0);
        assert_eq!(font.measure("", 100.0), 0.0);
    }

    #[test]
    fn test_block_font_skips_variation_selectors() {
        let font = BlockFont;
        assert_eq!(font.measure("❤\u{FE0F}", 10.0), font.measure("♥", 10.0));
    }

    #[test]
    fn test_block_font_folds_accents() {
        assert_eq!(glyph5x7(fold('á')), glyph5x7('A'));
        assert_eq!(glyph5x7(fold('ñ')), glyph5x7('N'));
        assert_eq!(glyph5x7(fold('q')), glyph5x7('Q'));
    }

    #[test]
    fn test_block_outline_is_centered_vertically() {
        let path = BlockFont.outline("E", 100.0).unwrap();
        let b = path.bounds();
        assert!((b.top() + 35.0).abs() < 1e-3);
        assert!((b.bottom() - 35.0).abs() < 1e-3);
        assert!(b.left().abs() < 1e-3);
        assert!((b.right() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_block_outline_of_spaces_is_empty() {
        assert!(BlockFont.outline("   ", 40.0).is_none());
    }

    fn dejavu() -> OutlineFont {
        OutlineFont::from_file(FsPath::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSans.ttf")))
            .unwrap()
    }

    fn count_segments(path: &Path) -> (usize, usize) {
        let moves = path.segments().filter(|s| matches!(s, tiny_skia::PathSegment::MoveTo(_))).count();
        let closes = path.segments().filter(|s| matches!(s, tiny_skia::PathSegment::Close)).count();
        (moves, closes)
    }

    #[test]
    fn test_outline_font_measure_scales_linearly() {
        let font = dejavu();
        let small = font.measure("Hola", 50.0);
        let large = font.measure("Hola", 100.0);
        assert!(small > 0.0);
        assert!((large - 2.0 * small).abs() < 1e-3, "{small} vs {large}");
        assert_eq!(font.measure("", 100.0), 0.0);
    }

    #[test]
    fn test_outline_font_applies_kerning() {
        let font = dejavu();
        let pair = font.measure("AV", 100.0);
        let apart = font.measure("A", 100.0) + font.measure("V", 100.0);
        assert!(pair < apart - 1.0, "AV {pair}, A + V {apart}");
    }

    #[test]
    fn test_outline_font_is_centred_on_the_middle_line() {
        let path = dejavu().outline("H", 100.0).unwrap();
        let b = path.bounds();
        // caps rise above y = 0 and the baseline sits below it
        assert!(b.top() < -30.0 && b.bottom() > 30.0, "{b:?}");
        assert!((b.top() + b.bottom()).abs() < 10.0, "{b:?}");
        assert!(b.left() >= 0.0 && b.right() <= dejavu().measure("H", 100.0));
    }

    #[test]
    fn test_outline_font_closes_every_contour() {
        let font = dejavu();
        assert_eq!(count_segments(&font.outline("H", 100.0).unwrap()), (1, 1));
        assert_eq!(count_segments(&font.outline("O", 100.0).unwrap()), (2, 2));
        assert_eq!(count_segments(&font.outline("OO", 100.0).unwrap()), (4, 4));
    }

    #[test]
    fn test_outline_font_of_spaces_is_empty() {
        assert!(dejavu().outline("  ", 40.0).is_none());
    }

    #[test]
    fn test_garbage_font_file_is_rejected() {
        let path = std::env::temp_dir().join("misted-glass-not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(matches!(OutlineFont::from_file(&path), Err(AssetError::Font(_))));
    }

    #[test]
    fn test_missing_font_file_is_an_io_error() {
        let err = OutlineFont::from_file(FsPath::new("/definitely/not/here.ttf"));
        assert!(matches!(err, Err(AssetError::Io { .. })));
    }
}
