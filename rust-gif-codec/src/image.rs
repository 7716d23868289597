use crate::{error::Result, gif::ColorTable};

/// Delay used when a frame does not carry one, in milliseconds.
pub const DEFAULT_DELAY_MS: u32 = 100;

/// Stores a single frame of image data in a simple bitmap form
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// The number of color channels in the image. Always 3 (RGB) for decoded GIF frames.
    pub channels: u8,

    /// The size of the image
    pub size: (u16, u16),
    /// The raw bitmap data, row-major
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Creates an RGB bitmap filled with a single color.
    pub fn filled(size: (u16, u16), color: [u8; 3]) -> Self {
        let pixel_count = size.0 as usize * size.1 as usize;
        let mut data = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self {
            channels: 3,
            size,
            data,
        }
    }

    /// Number of pixels the bitmap's size calls for.
    pub fn pixel_count(&self) -> usize {
        self.size.0 as usize * self.size.1 as usize
    }

    /// Returns the RGB value at `(x, y)`, or `None` outside the bitmap or past the end of `data`.
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 3]> {
        if x >= self.size.0 || y >= self.size.1 {
            return None;
        }
        let index = (y as usize * self.size.0 as usize + x as usize) * self.channels as usize;
        let rgb = self.data.get(index..index + 3)?;
        Some([rgb[0], rgb[1], rgb[2]])
    }

    /// Iterates over the RGB triples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(self.channels.max(1) as usize)
            .filter(|chunk| chunk.len() >= 3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
    }
}

/// One image of an animation together with its placement and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the frame's left edge on the canvas
    pub left: u16,
    /// Offset of the frame's top edge on the canvas
    pub top: u16,
    /// The frame's own color table, if it had one
    pub local_palette: Option<ColorTable>,
    /// The LZW minimum code size the frame was stored with
    pub min_code_size: u8,
    /// How long the frame is shown, in milliseconds
    pub delay_ms: u32,
    /// The decoded RGB pixels; `bitmap.size` is the frame's width and height
    pub bitmap: Bitmap,
}

impl Frame {
    /// Creates a frame at the canvas origin with the default delay.
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            left: 0,
            top: 0,
            local_palette: None,
            min_code_size: 8,
            delay_ms: DEFAULT_DELAY_MS,
            bitmap,
        }
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u16 {
        self.bitmap.size.0
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u16 {
        self.bitmap.size.1
    }
}

/// Everything the decoder recovers from a GIF stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGif {
    /// Canvas width from the logical screen descriptor
    pub width: u16,
    /// Canvas height from the logical screen descriptor
    pub height: u16,
    /// Background color index from the logical screen descriptor
    pub background_index: u8,
    /// The global color table, if the stream declared one
    pub global_palette: Option<ColorTable>,
    /// Loop count from a NETSCAPE2.0 extension; `Some(0)` loops forever
    pub loop_count: Option<u16>,
    /// Frames in file order
    pub frames: Vec<Frame>,
}

/// Used to decode an image. This trait can be implemented for any animated format I want to decode.
pub trait ImageDecoder<'data> {
    /// Supplies the decoder with the image data
    fn new(image_data: &'data [u8]) -> Self;
    /// Decodes the image
    fn decode(&self) -> Result<DecodedGif>;
}

/// Used to encode an image. This trait can be implemented for any animated format I want to encode.
pub trait ImageEncoder<'anim> {
    /// Supplies the encoder with the decoded animation to encode.
    fn new(animation: &'anim DecodedGif) -> Self;
    /// Encodes the animation into a byte buffer.
    fn encode(&self) -> Result<Vec<u8>>;
    /// Encodes the animation and saves the result to a file at the given path.
    fn encode_to_file(&self, path: &str) -> Result<()> {
        let bytes = self.encode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[test]
fn filled_bitmap() {
    let bitmap = Bitmap::filled((2, 3), [1, 2, 3]);
    assert_eq!(bitmap.pixel_count(), 6);
    assert_eq!(bitmap.data.len(), 18);
    assert_eq!(bitmap.pixel(1, 2), Some([1, 2, 3]));
    assert_eq!(bitmap.pixel(2, 0), None);
    assert_eq!(bitmap.pixels().count(), 6);
}

#[test]
fn new_frame_defaults() {
    let frame = Frame::new(Bitmap::filled((4, 5), [0, 0, 0]));
    assert_eq!((frame.width(), frame.height()), (4, 5));
    assert_eq!(frame.delay_ms, DEFAULT_DELAY_MS);
    assert_eq!((frame.left, frame.top), (0, 0));
}
