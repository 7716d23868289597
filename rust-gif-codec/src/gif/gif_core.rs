use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    error::Result,
    gif::{
        gif_reader::{BlockIntroducer, ExtensionLabel, GIFParser},
        header::{parse_loop_count, ColorTable, GifHeader, GraphicsControl, ImageDescriptor},
        lzw,
    },
    image::{Bitmap, DecodedGif, Frame, DEFAULT_DELAY_MS},
};

/// Color every pixel of a frame that could not be decoded is replaced with.
pub const PLACEHOLDER_GRAY: [u8; 3] = [128, 128, 128];

/// Limits applied while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Decoding stops once this many frames have been produced.
    pub max_frames: usize,
    /// Frames whose descriptor asks for more pixels than this are dropped without being decoded.
    pub max_frame_pixels: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frames: 100,
            max_frame_pixels: 1 << 24,
        }
    }
}

/// Why a single frame's pixels were replaced with a placeholder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeFault {
    /// The LZW minimum code size byte is outside `1..=8`
    #[error("LZW minimum code size {0} is outside 1..=8")]
    CodeSize(u8),
    /// The LZW data decoded to nothing for a frame with a non-zero area
    #[error("image data produced no pixels")]
    NoPixels,
}

pub struct GIFDecoder<'data> {
    reader: GIFParser<'data>,
    config: DecoderConfig,
}

impl<'data> GIFDecoder<'data> {
    pub fn new(data: &'data [u8], config: DecoderConfig) -> Self {
        Self {
            reader: GIFParser::new(data),
            config,
        }
    }

    /// Reads the header and every frame. Only a bad signature or a header, screen descriptor or
    /// global color table cut short is an error; problems after that end decoding early instead.
    pub fn decode(&mut self) -> Result<DecodedGif> {
        let header = GifHeader::read(&mut self.reader)?;
        let global_palette = header.read_global_color_table(&mut self.reader)?;

        let mut gif = DecodedGif {
            width: header.width,
            height: header.height,
            background_index: header.background_index,
            global_palette,
            loop_count: None,
            frames: vec![],
        };
        let mut control: Option<GraphicsControl> = None;

        loop {
            if gif.frames.len() >= self.config.max_frames {
                warn!("Stopping after {} frames", gif.frames.len());
                break;
            }

            let Ok(byte) = self.reader.read_next_byte() else {
                warn!("GIF ended without a trailer");
                break;
            };

            match GIFParser::to_introducer(byte) {
                Some(BlockIntroducer::Extension) => {
                    if !self.read_extension(&mut gif, &mut control) {
                        warn!("GIF ended inside an extension block");
                        break;
                    }
                }
                Some(BlockIntroducer::ImageSeparator) => {
                    let (frame, complete) = match self.read_frame(&gif, control.take()) {
                        Some(parsed) => parsed,
                        None => {
                            warn!("GIF ended inside an image descriptor");
                            break;
                        }
                    };
                    if let Some(frame) = frame {
                        gif.frames.push(frame);
                    }
                    if !complete {
                        warn!("GIF ended inside the data of frame {}", gif.frames.len());
                        break;
                    }
                }
                Some(BlockIntroducer::Trailer) => {
                    trace!("Trailer at offset {}", self.reader.position() - 1);
                    break;
                }
                None => {
                    warn!(
                        "Unknown block introducer {:#04x} at offset {}, keeping {} frames",
                        byte,
                        self.reader.position() - 1,
                        gif.frames.len()
                    );
                    break;
                }
            }
        }

        debug!(
            "Decoded {}x{} GIF with {} frames",
            gif.width,
            gif.height,
            gif.frames.len()
        );
        Ok(gif)
    }

    /// Returns false if the input ended before the extension's terminator.
    fn read_extension(
        &mut self,
        gif: &mut DecodedGif,
        control: &mut Option<GraphicsControl>,
    ) -> bool {
        let Ok(label) = self.reader.read_next_byte() else {
            return false;
        };
        trace!("Extension {:#04x} at offset {}", label, self.reader.position() - 2);

        match GIFParser::to_extension_label(label) {
            Some(ExtensionLabel::GraphicsControl) => {
                let blocks = self.reader.read_sub_blocks();
                *control = GraphicsControl::parse(&blocks.data);
                if control.is_none() {
                    debug!("Ignoring short graphics control extension");
                }
                blocks.complete
            }
            Some(ExtensionLabel::Application) => {
                let blocks = self.reader.read_sub_blocks();
                if let Some(count) = parse_loop_count(&blocks.data) {
                    gif.loop_count = Some(count);
                }
                blocks.complete
            }
            Some(ExtensionLabel::Comment) | Some(ExtensionLabel::PlainText) | None => {
                self.reader.skip_sub_blocks()
            }
        }
    }

    /// Parses one image. Returns `None` when the descriptor or local color table is cut off,
    /// otherwise the frame (`None` if it was over the pixel budget) and whether its data
    /// sub-blocks were terminated properly.
    fn read_frame(
        &mut self,
        gif: &DecodedGif,
        control: Option<GraphicsControl>,
    ) -> Option<(Option<Frame>, bool)> {
        let descriptor = ImageDescriptor::read(&mut self.reader).ok()?;
        let min_code_size = self.reader.read_next_byte().ok()?;
        let blocks = self.reader.read_sub_blocks();

        trace!(
            "Image {}x{} at ({}, {}), {} bytes of LZW data",
            descriptor.width,
            descriptor.height,
            descriptor.left,
            descriptor.top,
            blocks.data.len()
        );

        if descriptor.pixel_count() > self.config.max_frame_pixels {
            warn!(
                "Dropping frame {}: {}x{} is over the {} pixel limit",
                gif.frames.len(),
                descriptor.width,
                descriptor.height,
                self.config.max_frame_pixels
            );
            return Some((None, blocks.complete));
        }

        let palette = descriptor
            .local_color_table
            .as_ref()
            .or(gif.global_palette.as_ref());
        let size = (descriptor.width, descriptor.height);

        let bitmap = match decode_pixels(&descriptor, palette, min_code_size, &blocks.data) {
            Ok(bitmap) => bitmap,
            Err(fault) => {
                warn!(
                    "Frame {} replaced with a placeholder: {}",
                    gif.frames.len(),
                    fault
                );
                Bitmap::filled(size, PLACEHOLDER_GRAY)
            }
        };

        let delay_ms = match control.map(|control| control.delay_cs) {
            Some(delay_cs) if delay_cs > 0 => delay_cs as u32 * 10,
            _ => DEFAULT_DELAY_MS,
        };

        let frame = Frame {
            left: descriptor.left,
            top: descriptor.top,
            local_palette: descriptor.local_color_table,
            min_code_size,
            delay_ms,
            bitmap,
        };
        Some((Some(frame), blocks.complete))
    }
}

/// LZW-decodes a frame's data and maps the indices through `palette` into RGB.
fn decode_pixels(
    descriptor: &ImageDescriptor,
    palette: Option<&ColorTable>,
    min_code_size: u8,
    data: &[u8],
) -> core::result::Result<Bitmap, DecodeFault> {
    if min_code_size == 0 || min_code_size > lzw::MAX_MIN_CODE_SIZE {
        return Err(DecodeFault::CodeSize(min_code_size));
    }

    let pixel_count = descriptor.pixel_count();
    let mut indices = lzw::decode_limited(data, min_code_size, pixel_count);
    if indices.is_empty() && pixel_count > 0 {
        return Err(DecodeFault::NoPixels);
    }
    if indices.len() < pixel_count {
        debug!(
            "Image data has {} of {} pixels, padding with index 0",
            indices.len(),
            pixel_count
        );
    }
    indices.resize(pixel_count, 0);

    if descriptor.interlaced {
        indices = deinterlace(&indices, descriptor.width as usize, descriptor.height as usize);
    }

    let mut data = Vec::with_capacity(pixel_count * 3);
    for index in indices {
        let rgb = palette
            .and_then(|palette| palette.get(index))
            .unwrap_or([0, 0, 0]);
        data.extend_from_slice(&rgb);
    }

    Ok(Bitmap {
        channels: 3,
        size: (descriptor.width, descriptor.height),
        data,
    })
}

/// Interlaced rows are stored as every 8th row from 0, every 8th from 4, every 4th from 2,
/// then every 2nd from 1.
fn deinterlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

    let mut output = vec![0; indices.len()];
    let mut rows = indices.chunks_exact(width.max(1));
    for (start, step) in PASSES {
        for y in (start..height).step_by(step) {
            let Some(row) = rows.next() else {
                return output;
            };
            output[y * width..(y + 1) * width].copy_from_slice(row);
        }
    }
    output
}
