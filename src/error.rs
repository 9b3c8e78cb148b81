// Error types, one enum per concern.
// Every variant states *where* things went wrong.
use std::path::PathBuf;
use thiserror::Error;

/// A window outline that cannot describe a glass pane.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("outline needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("point {index} ({x}, {y}) lies outside the unit square")]
    OutOfUnitSquare { index: usize, x: f32, y: f32 },
    #[error("outline edges {0} and {1} cross each other")]
    SelfIntersecting(usize, usize),
    #[error("text width ratio must be in (0, 1], got {0}")]
    TextWidthRatio(f32),
}

/// Failures of the live fog surface.
#[derive(Debug, Error)]
pub enum FogError {
    #[error("surface size {width}x{height} cannot be allocated")]
    InvalidSize { width: u32, height: u32 },
}

/// Loading an image or font from wherever it lives.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode image {reference}: {reason}")]
    Decode { reference: String, reason: String },
    #[error("asset {0} not found")]
    NotFound(String),
    #[error("cannot fetch {0}: only local files are supported")]
    Unreachable(String),
    #[error("invalid font file {0}")]
    Font(PathBuf),
}

/// Flattening + encoding + handing off the shareable picture.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("background asset failed to load: {0}")]
    AssetLoad(#[from] AssetError),
    #[error("image encoding failed: {0}")]
    Encoding(String),
    #[error("cannot save exported image to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reading and validating the JSON configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything the demo binary can stop on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String),
    #[error("window update error: {0}")]
    WindowUpdate(String),
    #[error("invalid input filter: {0}")]
    Filter(#[from] regex::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fog(#[from] FogError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
