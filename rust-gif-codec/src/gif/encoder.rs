use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use tracing::debug;

use crate::{
    error::{Error, Result},
    gif::{
        gif_reader::{BlockIntroducer, ExtensionLabel},
        header::{DisposalMethod, GraphicsControl},
        lzw,
        palette::{quantize, FixedPalette},
    },
    image::Frame,
};

/// Encoded frames always use byte-wide symbols.
pub const ENCODER_MIN_CODE_SIZE: u8 = 8;

const MAX_SUB_BLOCK_LEN: usize = 255;

/// Options for the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// The fixed global color table every frame is quantized against.
    pub palette: FixedPalette,
    /// NETSCAPE2.0 loop count to write, `Some(0)` loops forever, `None` omits the extension.
    pub repeat: Option<u16>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            palette: FixedPalette::default(),
            repeat: Some(0),
        }
    }
}

pub struct GIFEncoder<'frames> {
    frames: &'frames [Frame],
    size: (u16, u16),
    config: EncoderConfig,
}

impl<'frames> GIFEncoder<'frames> {
    pub fn new(frames: &'frames [Frame], size: (u16, u16), config: EncoderConfig) -> Self {
        Self {
            frames,
            size,
            config,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.frames.is_empty() {
            return Err(Error::Encoding("No frames to encode"));
        }

        let mut out = Vec::new();
        self.write_header(&mut out)?;
        if let Some(repeat) = self.config.repeat {
            Self::write_loop_extension(&mut out, repeat)?;
        }
        for frame in self.frames {
            Self::write_frame(&mut out, frame)?;
        }
        out.write_u8(BlockIntroducer::Trailer as u8)?;

        debug!(
            "Encoded {} frames into {} bytes",
            self.frames.len(),
            out.len()
        );
        Ok(out)
    }

    fn write_header(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_all(b"GIF89a")?;
        out.write_u16::<LittleEndian>(self.size.0)?;
        out.write_u16::<LittleEndian>(self.size.1)?;
        // global table present, 8 bits color resolution, unsorted, 256 entries
        out.write_u8(0b1111_0111)?;
        out.write_u8(0)?; // background index
        out.write_u8(0)?; // pixel aspect ratio
        out.write_all(&self.config.palette.color_table().to_bytes())?;
        Ok(())
    }

    fn write_loop_extension(out: &mut Vec<u8>, repeat: u16) -> Result<()> {
        out.write_u8(BlockIntroducer::Extension as u8)?;
        out.write_u8(ExtensionLabel::Application as u8)?;
        out.write_u8(11)?;
        out.write_all(b"NETSCAPE2.0")?;
        out.write_u8(3)?;
        out.write_u8(1)?;
        out.write_u16::<LittleEndian>(repeat)?;
        out.write_u8(0)?;
        Ok(())
    }

    fn write_frame(out: &mut Vec<u8>, frame: &Frame) -> Result<()> {
        let control = GraphicsControl {
            disposal: DisposalMethod::RestoreBackground,
            user_input: false,
            transparent_index: None,
            delay_cs: delay_to_centiseconds(frame.delay_ms),
        };
        out.write_u8(BlockIntroducer::Extension as u8)?;
        out.write_u8(ExtensionLabel::GraphicsControl as u8)?;
        out.write_u8(4)?;
        out.write_all(&control.to_bytes())?;
        out.write_u8(0)?;

        out.write_u8(BlockIntroducer::ImageSeparator as u8)?;
        out.write_u16::<LittleEndian>(frame.left)?;
        out.write_u16::<LittleEndian>(frame.top)?;
        out.write_u16::<LittleEndian>(frame.width())?;
        out.write_u16::<LittleEndian>(frame.height())?;
        out.write_u8(0)?; // no local table, not interlaced

        out.write_u8(ENCODER_MIN_CODE_SIZE)?;
        let indices = quantize_frame(frame);
        let compressed = lzw::encode(&indices, ENCODER_MIN_CODE_SIZE);
        write_sub_blocks(out, &compressed)?;
        Ok(())
    }
}

/// Palette indices for every pixel of the frame, padded with index 0 if the bitmap is short.
pub fn quantize_frame(frame: &Frame) -> Vec<u8> {
    let pixel_count = frame.bitmap.pixel_count();
    let mut indices: Vec<u8> = frame.bitmap.pixels().take(pixel_count).map(quantize).collect();
    indices.resize(pixel_count, 0);
    indices
}

fn delay_to_centiseconds(delay_ms: u32) -> u16 {
    ((delay_ms as u64 + 5) / 10).min(u16::MAX as u64) as u16
}

fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    for block in data.chunks(MAX_SUB_BLOCK_LEN) {
        out.write_u8(block.len() as u8)?;
        out.write_all(block)?;
    }
    out.write_u8(0)?;
    Ok(())
}
