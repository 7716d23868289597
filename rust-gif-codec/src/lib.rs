#![warn(missing_docs)]

//! Decodes animated GIFs into RGB frames, recolors them and encodes them back into GIF89a.
mod bitstream;
mod error;
/// Color cycling effects applied frame by frame
pub mod effect;
/// GIF decoder, LZW codec and encoder
pub mod gif;
/// Defines types for decoded animations
pub mod image;
/// Base64 and data URL handling for GIF payloads
pub mod transport;

pub use error::{Error, Result};
