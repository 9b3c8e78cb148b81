//! Misted glass: a message written in the fog of a car window, wiped away by
//! the pointer, and exported as a flattened JPEG.

pub mod app;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod font;
pub mod message;
pub mod noise;
pub mod path;
pub mod shape;
pub mod stroke;
pub mod text;
pub mod types;
pub mod vision;
