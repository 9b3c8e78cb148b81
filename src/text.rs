//! Auto-fit text layout.
//!
//! Finds the largest font size at which a message fits a pixel budget by
//! shrinking linearly from a ceiling towards a floor. When the floor is reached
//! and the text still overflows, it is split into two roughly even lines at the
//! middle word. Single long tokens (or any text, when configured) are
//! truncated with an ellipsis before measuring.

use serde::{Deserialize, Serialize};

pub const ELLIPSIS: &str = "...";

/// Width of `text` rendered at `font_size` pixels.
pub trait Measure {
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

/// When over-long text gets cut to `max_chars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    /// Only text without any word boundary.
    LongTokens,
    /// Any text longer than `max_chars`.
    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Size the search starts at.
    pub max_size: f32,
    /// Size the search never goes below.
    pub min_size: f32,
    /// Linear decrement per measurement.
    pub step: f32,
    pub max_chars: usize,
    pub truncation: Truncation,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_size: 100.0,
            min_size: 20.0,
            step: 2.0,
            max_chars: 35,
            truncation: Truncation::LongTokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub font_size: f32,
    /// One or two lines, never empty.
    pub lines: Vec<String>,
}

pub fn fit<M: Measure + ?Sized>(text: &str, max_width: f32, measurer: &M, opts: &FitOptions) -> FittedText {
    let ceiling = opts.max_size.max(opts.min_size);
    let floor = opts.min_size.min(opts.max_size);
    let text = truncate(text, opts);

    // 1) Linear descent: deterministic and the range is small.
    let mut font_size = ceiling;
    if max_width <= 0.0 || opts.step <= 0.0 {
        font_size = floor;
    } else {
        while measurer.measure(&text, font_size) > max_width && font_size > floor {
            font_size = (font_size - opts.step).max(floor);
        }
    }

    // 2) Still too wide at the floor: split at the middle word.
    if measurer.measure(&text, font_size) > max_width {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() >= 2 {
            let mid = words.len().div_ceil(2);
            return FittedText {
                font_size,
                lines: vec![words[..mid].join(" "), words[mid..].join(" ")],
            };
        }
    }

    FittedText { font_size, lines: vec![text] }
}

fn truncate(text: &str, opts: &FitOptions) -> String {
    let too_long = text.chars().count() > opts.max_chars;
    let single_token = !text.trim().contains(char::is_whitespace);
    let cut = match opts.truncation {
        Truncation::Always => too_long,
        Truncation::LongTokens => too_long && single_token,
    };
    if !cut {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(opts.max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}
