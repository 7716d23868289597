use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use tracing::trace;

use crate::{
    error::{Error, Result},
    gif::gif_reader::GIFParser,
};

/// An ordered list of RGB triples with a power-of-two length between 2 and 256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<[u8; 3]>,
}

impl ColorTable {
    /// Number of entries announced by a 3-bit size exponent: `2^(exponent+1)`.
    pub fn len_for_exponent(exponent: u8) -> usize {
        2 << (exponent & 0b111)
    }

    /// Builds a table from the given colors, padding with black up to the next power of two (at least 2).
    /// Colors past the 256th are dropped.
    pub fn new(mut colors: Vec<[u8; 3]>) -> Self {
        colors.truncate(256);
        let len = colors.len().max(2).next_power_of_two();
        colors.resize(len, [0, 0, 0]);
        Self { colors }
    }

    fn read(reader: &mut GIFParser, exponent: u8) -> Result<Self> {
        let len = Self::len_for_exponent(exponent);
        let bytes = reader.read_bytes(len * 3)?;
        let colors = bytes
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        Ok(Self { colors })
    }

    /// The 3-bit exponent that describes this table's size in a packed field.
    pub fn size_exponent(&self) -> u8 {
        (self.colors.len().trailing_zeros() as u8).saturating_sub(1)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color at `index`, if the table is that long.
    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }

    /// All entries in index order
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// The table as it is stored in a GIF: `r g b r g b ...`
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }
}

/// The 6-byte header plus the 7-byte logical screen descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifHeader {
    /// Always `GIF`
    pub signature: [u8; 3],
    /// `87a` or `89a`, not checked
    pub version: [u8; 3],
    /// Logical screen width
    pub width: u16,
    /// Logical screen height
    pub height: u16,
    /// Whether a global color table follows
    pub global_color_table_flag: bool,
    /// Bits per primary color minus one
    pub color_resolution: u8,
    /// Whether the global table is sorted by importance
    pub sort_flag: bool,
    /// The global table holds `2^(exponent+1)` entries
    pub global_color_table_exponent: u8,
    /// Index of the background color in the global table
    pub background_index: u8,
    /// Raw aspect ratio byte
    pub pixel_aspect_ratio: u8,
}

impl GifHeader {
    /// The three bytes every GIF starts with
    pub const SIGNATURE: [u8; 3] = *b"GIF";

    pub(crate) fn read(reader: &mut GIFParser) -> Result<Self> {
        let signature: [u8; 3] = reader.read_exact()?;
        if signature != Self::SIGNATURE {
            return Err(Error::Format("Signature is not GIF"));
        }
        let version: [u8; 3] = reader.read_exact()?;

        let width = reader.read_next_short()?;
        let height = reader.read_next_short()?;
        let packed_field = reader.read_next_byte()?;
        let background_index = reader.read_next_byte()?;
        let pixel_aspect_ratio = reader.read_next_byte()?;

        trace!(
            "GIF{} logical screen {}x{}, packed {:#010b}",
            String::from_utf8_lossy(&version),
            width,
            height,
            packed_field
        );

        Ok(Self {
            signature,
            version,
            width,
            height,
            global_color_table_flag: packed_field & 0b1000_0000 != 0,
            color_resolution: (packed_field & 0b0111_0000) >> 4,
            sort_flag: packed_field & 0b0000_1000 != 0,
            global_color_table_exponent: packed_field & 0b0000_0111,
            background_index,
            pixel_aspect_ratio,
        })
    }

    /// Reads the global color table that follows the descriptor, if the flag announces one.
    pub(crate) fn read_global_color_table(&self, reader: &mut GIFParser) -> Result<Option<ColorTable>> {
        if !self.global_color_table_flag {
            return Ok(None);
        }
        ColorTable::read(reader, self.global_color_table_exponent).map(Some)
    }
}

/// The 9-byte image descriptor that follows an image separator, plus its local color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub sort_flag: bool,
    pub local_color_table: Option<ColorTable>,
}

impl ImageDescriptor {
    pub(crate) fn read(reader: &mut GIFParser) -> Result<Self> {
        let left = reader.read_next_short()?;
        let top = reader.read_next_short()?;
        let width = reader.read_next_short()?;
        let height = reader.read_next_short()?;
        let packed_field = reader.read_next_byte()?;

        let local_color_table = if packed_field & 0b1000_0000 != 0 {
            Some(ColorTable::read(reader, packed_field & 0b0000_0111)?)
        } else {
            None
        };

        Ok(Self {
            left,
            top,
            width,
            height,
            interlaced: packed_field & 0b0100_0000 != 0,
            sort_flag: packed_field & 0b0010_0000 != 0,
            local_color_table,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// What a viewer does with a frame's area before drawing the next one.
#[derive(PartialEq, Eq, FromPrimitive, Debug, Clone, Copy, Default)]
pub enum DisposalMethod {
    #[allow(missing_docs)]
    #[default]
    Unspecified = 0,
    /// Leave the frame in place
    DoNotDispose = 1,
    /// Clear the frame's area to the background
    RestoreBackground = 2,
    /// Restore what was there before the frame
    RestorePrevious = 3,
}

/// Graphics Control Extension payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicsControl {
    #[allow(missing_docs)]
    pub disposal: DisposalMethod,
    /// Wait for user input before continuing
    pub user_input: bool,
    /// Index drawn as transparent, if the flag is set
    pub transparent_index: Option<u8>,
    /// Delay in hundredths of a second
    pub delay_cs: u16,
}

impl GraphicsControl {
    /// Parses the first sub-block of a Graphics Control Extension. Returns `None` when it is too short.
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() < 4 {
            return None;
        }
        let packed_field = block[0];
        let disposal =
            DisposalMethod::from_u8((packed_field & 0b0001_1100) >> 2).unwrap_or_default();
        let transparent_index = if packed_field & 0b0000_0001 != 0 {
            Some(block[3])
        } else {
            None
        };

        Some(Self {
            disposal,
            user_input: packed_field & 0b0000_0010 != 0,
            transparent_index,
            delay_cs: u16::from_le_bytes([block[1], block[2]]),
        })
    }

    /// The 4-byte payload as written into the extension's single sub-block.
    pub fn to_bytes(&self) -> [u8; 4] {
        let mut packed_field = (self.disposal as u8) << 2;
        if self.user_input {
            packed_field |= 0b0000_0010;
        }
        if self.transparent_index.is_some() {
            packed_field |= 0b0000_0001;
        }
        let delay = self.delay_cs.to_le_bytes();
        [
            packed_field,
            delay[0],
            delay[1],
            self.transparent_index.unwrap_or(0),
        ]
    }
}

/// Application identifiers that carry an animation loop count.
const LOOPING_APPLICATIONS: [&[u8; 11]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

/// Extracts the loop count from a NETSCAPE2.0 style application extension.
///
/// `payload` is the extension's sub-blocks concatenated: the 11-byte identifier followed by
/// `0x01` and the little-endian loop count.
pub fn parse_loop_count(payload: &[u8]) -> Option<u16> {
    if payload.len() < 11 {
        return None;
    }
    let (identifier, data) = payload.split_at(11);
    if !LOOPING_APPLICATIONS.iter().any(|app| app[..] == *identifier) {
        return None;
    }
    match data {
        [0x01, low, high, ..] => Some(u16::from_le_bytes([*low, *high])),
        _ => None,
    }
}

#[rustfmt::skip]
#[allow(dead_code)]
static TEST_HEADER: [u8; 19] = [
    b'G', b'I', b'F', b'8', b'9', b'a',
    3, 0,           // Width
    2, 0,           // Height
    0b1001_0000,    // Global table, color resolution 1, 2 entries
    1,              // Background
    0,              // Aspect ratio
    0, 0, 0,
    255, 255, 255,  // Global color table
];

#[test]
fn read_header_and_global_table() {
    let mut reader = GIFParser::new(&TEST_HEADER);
    let header = GifHeader::read(&mut reader).unwrap();
    assert_eq!(&header.version, b"89a");
    assert_eq!((header.width, header.height), (3, 2));
    assert!(header.global_color_table_flag);
    assert_eq!(header.color_resolution, 1);
    assert_eq!(header.background_index, 1);

    let table = header.read_global_color_table(&mut reader).unwrap().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(1), Some([255, 255, 255]));
    assert_eq!(table.get(2), None);
}

#[test]
fn reject_bad_signature() {
    let mut data = TEST_HEADER;
    data[0] = b'P';
    let mut reader = GIFParser::new(&data);
    assert!(matches!(GifHeader::read(&mut reader), Err(Error::Format(_))));
}

#[test]
fn truncated_global_table() {
    let mut reader = GIFParser::new(&TEST_HEADER[..16]);
    let header = GifHeader::read(&mut reader).unwrap();
    assert!(header.read_global_color_table(&mut reader).is_err());
}

#[test]
fn color_table_sizes() {
    assert_eq!(ColorTable::len_for_exponent(0), 2);
    assert_eq!(ColorTable::len_for_exponent(7), 256);

    let table = ColorTable::new(vec![[1, 2, 3]; 5]);
    assert_eq!(table.len(), 8);
    assert_eq!(table.size_exponent(), 2);
    assert_eq!(table.get(7), Some([0, 0, 0]));
    assert_eq!(table.to_bytes().len(), 24);
}

#[test]
fn graphics_control_packing() {
    let control = GraphicsControl::parse(&[0b0000_1001, 0x0A, 0x00, 7]).unwrap();
    assert_eq!(control.disposal, DisposalMethod::RestoreBackground);
    assert_eq!(control.transparent_index, Some(7));
    assert_eq!(control.delay_cs, 10);
    assert_eq!(control.to_bytes(), [0b0000_1001, 0x0A, 0x00, 7]);

    assert_eq!(GraphicsControl::parse(&[0, 1]), None);
}

#[test]
fn loop_count_extension() {
    let mut payload = b"NETSCAPE2.0".to_vec();
    payload.extend_from_slice(&[0x01, 0x05, 0x00]);
    assert_eq!(parse_loop_count(&payload), Some(5));

    let mut other = b"XMP DataXMP".to_vec();
    other.extend_from_slice(&[0x01, 0x05, 0x00]);
    assert_eq!(parse_loop_count(&other), None);
    assert_eq!(parse_loop_count(b"NETSCAPE"), None);
}
