// JSON configuration for the demo and the facade.
// Every field has a default, so `{}` is a complete config.
use crate::compositor::FogSettings;
use crate::error::ConfigError;
use crate::export::ExportSettings;
use crate::message::DEFAULT_MESSAGE;
use crate::stroke::BrushSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in window + fog combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    #[default]
    CurvedWindow,
    StraightWindow,
}

impl StylePreset {
    pub fn settings(self) -> FogSettings {
        match self {
            StylePreset::CurvedWindow => FogSettings::curved_window(),
            StylePreset::StraightWindow => FogSettings::straight_window(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preset: StylePreset,
    /// Full fog settings; replaces the preset when present.
    pub fog: Option<FogSettings>,
    pub brush: BrushSettings,
    pub export: ExportSettings,
    /// Background reference, resolved against `asset_root`.
    pub background: String,
    pub asset_root: PathBuf,
    /// TrueType/OpenType face for the message. The block font is used when unset.
    pub font: Option<PathBuf>,
    /// Face for the export watermark. Falls back to `font`.
    pub watermark_font: Option<PathBuf>,
    pub message: String,
    /// Phrases bound to the number keys.
    pub presets: Vec<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: StylePreset::default(),
            fog: None,
            brush: BrushSettings::default(),
            export: ExportSettings::default(),
            background: "/assets/images/background.png".to_owned(),
            asset_root: PathBuf::from("."),
            font: None,
            watermark_font: None,
            message: DEFAULT_MESSAGE.to_owned(),
            presets: vec![
                "Te quiero".to_owned(),
                "Feliz Navidad".to_owned(),
                "Eres mi mundo".to_owned(),
                "Te echo de menos".to_owned(),
            ],
            window_width: 1280,
            window_height: 720,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        let config = Self::from_json(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The explicit fog override, or the preset's settings.
    pub fn fog_settings(&self) -> FogSettings {
        self.fog.clone().unwrap_or_else(|| self.preset.settings())
    }

    /// Ranges serde cannot express. Shapes validate themselves while parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window_width, self.window_height
            )));
        }
        let fit = &self.fog_settings().fit;
        if fit.min_size <= 0.0 || fit.min_size > fit.max_size {
            return Err(ConfigError::Invalid(format!(
                "font size range {}..{} is empty",
                fit.min_size, fit.max_size
            )));
        }
        if fit.step <= 0.0 {
            return Err(ConfigError::Invalid(format!("font step must be positive, got {}", fit.step)));
        }
        if self.brush.width <= 0.0 || self.brush.spacing <= 0.0 || self.brush.feather < 0.0 {
            return Err(ConfigError::Invalid("brush width and spacing must be positive".to_owned()));
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg quality must be 1..=100, got {}",
                self.export.jpeg_quality
            )));
        }
        if self.message.trim().is_empty() {
            return Err(ConfigError::Invalid("default message is blank".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::FogStyle;
    use crate::shape::Outline;

    #[test]
    fn test_empty_object_is_the_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fog_settings(), FogSettings::curved_window());
        assert_eq!(config.presets.len(), 4);
    }

    #[test]
    fn test_preset_selects_straight_window() {
        let config = Config::from_json(r#"{ "preset": "straight_window", "message": "Hola" }"#).unwrap();
        let fog = config.fog_settings();
        assert!(matches!(fog.style, FogStyle::RadialGradient { .. }));
        assert!(matches!(fog.shape.outline(), Outline::Polygon(points) if points.len() == 5));
        assert_eq!(fog.fit.step, 5.0);
        assert_eq!(config.message, "Hola");
    }

    #[test]
    fn test_fog_override_round_trips() {
        let mut fog = FogSettings::straight_window();
        fog.carve.tilt_degrees = 0.0;
        let json = serde_json::json!({ "preset": "curved_window", "fog": fog }).to_string();
        let config = Config::from_json(&json).unwrap();
        assert_eq!(config.fog_settings(), fog);
    }

    #[test]
    fn test_bad_shape_is_a_parse_error() {
        let mut fog = serde_json::to_value(FogSettings::curved_window()).unwrap();
        let with_outline = |fog: &serde_json::Value| serde_json::json!({ "fog": fog }).to_string();

        fog["shape"]["outline"] = serde_json::json!({ "polygon": [
            { "x": 0.1, "y": 0.1 }, { "x": 0.9, "y": 0.1 }, { "x": 0.5, "y": 0.9 }
        ] });
        assert!(Config::from_json(&with_outline(&fog)).is_ok());

        fog["shape"]["outline"] = serde_json::json!({ "polygon": [
            { "x": 0.1, "y": 0.1 }, { "x": 0.9, "y": 0.1 }
        ] });
        assert!(matches!(Config::from_json(&with_outline(&fog)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        for json in [
            r#"{ "window_width": 0 }"#,
            r#"{ "brush": { "width": 0 } }"#,
            r#"{ "export": { "jpeg_quality": 0 } }"#,
            r#"{ "message": "   " }"#,
        ] {
            assert!(matches!(Config::from_json(json), Err(ConfigError::Invalid(_))), "{json}");
        }
    }

    #[test]
    fn test_load_reports_missing_file() {
        let path = std::env::temp_dir().join("misted-glass-no-such-config.json");
        assert!(matches!(Config::load(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join("misted-glass-config.json");
        fs::write(&path, r#"{ "window_width": 800, "window_height": 600 }"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!((config.window_width, config.window_height), (800, 600));
    }
}
