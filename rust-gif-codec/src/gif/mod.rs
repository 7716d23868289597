mod encoder;
mod gif_core;
mod gif_reader;
mod header;
mod lzw;
mod palette;

pub use encoder::{quantize_frame, EncoderConfig, ENCODER_MIN_CODE_SIZE};
pub use gif_core::{DecodeFault, DecoderConfig, PLACEHOLDER_GRAY};
pub use header::{ColorTable, DisposalMethod, GifHeader, GraphicsControl};
pub use palette::{quantize, FixedPalette};

use crate::{
    error::Result,
    image::{DecodedGif, Frame, ImageDecoder, ImageEncoder},
};

/// Decodes a complete GIF byte stream with the default limits.
///
/// Fails with [`Error::Format`](crate::Error::Format) when the data does not start with `GIF` or
/// ends before the global color table is complete. Damage after that point never fails the call:
/// a broken frame becomes a gray placeholder, and a cut off stream keeps the frames read so far.
pub fn decode(bytes: &[u8]) -> Result<DecodedGif> {
    decode_with(bytes, &DecoderConfig::default())
}

/// Decodes a complete GIF byte stream with the given limits.
pub fn decode_with(bytes: &[u8], config: &DecoderConfig) -> Result<DecodedGif> {
    gif_core::GIFDecoder::new(bytes, config.clone()).decode()
}

/// Encodes frames onto a canvas of `width × height` with the default palette and infinite looping.
///
/// Fails with [`Error::Encoding`](crate::Error::Encoding) only when `frames` is empty.
pub fn encode(frames: &[Frame], width: u16, height: u16) -> Result<Vec<u8>> {
    encode_with(frames, width, height, &EncoderConfig::default())
}

/// Encodes frames with the given encoder options.
pub fn encode_with(
    frames: &[Frame],
    width: u16,
    height: u16,
    config: &EncoderConfig,
) -> Result<Vec<u8>> {
    encoder::GIFEncoder::new(frames, (width, height), config.clone()).encode()
}

/// Decompresses GIF LZW data into color indices. Returns what was decoded before any error.
pub fn lzw_decode(data: &[u8], min_code_size: u8) -> Vec<u8> {
    lzw::decode(data, min_code_size)
}

/// Compresses color indices into GIF LZW data.
pub fn lzw_encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    lzw::encode(indices, min_code_size)
}

/// Contains GIF image data
pub struct GIFDecoder<'data> {
    image_data: &'data [u8],
}

impl<'data> ImageDecoder<'data> for GIFDecoder<'data> {
    /// Initializes the GIF decoder from a byte slice
    fn new(image_data: &'data [u8]) -> Self {
        Self { image_data }
    }

    fn decode(&self) -> Result<DecodedGif> {
        decode(self.image_data)
    }
}

/// Writes a decoded animation back out as a GIF on its original canvas
pub struct GIFEncoder<'anim> {
    animation: &'anim DecodedGif,
}

impl<'anim> ImageEncoder<'anim> for GIFEncoder<'anim> {
    fn new(animation: &'anim DecodedGif) -> Self {
        Self { animation }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let config = EncoderConfig {
            repeat: Some(self.animation.loop_count.unwrap_or(0)),
            ..EncoderConfig::default()
        };
        encode_with(
            &self.animation.frames,
            self.animation.width,
            self.animation.height,
            &config,
        )
    }
}
