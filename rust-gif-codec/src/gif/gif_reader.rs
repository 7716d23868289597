use byteorder::{LittleEndian, ReadBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::{Cursor, Read};

use crate::error::{Error, Result};

/// Upper bound on the sub-blocks read for a single extension or image.
pub const MAX_SUB_BLOCKS: usize = 1 << 16;

#[derive(PartialEq, Eq, FromPrimitive, Debug, Clone, Copy)]
pub enum BlockIntroducer {
    Extension = 0x21,
    ImageSeparator = 0x2C,
    Trailer = 0x3B,
}

#[derive(PartialEq, Eq, FromPrimitive, Debug, Clone, Copy)]
pub enum ExtensionLabel {
    PlainText = 0x01,
    GraphicsControl = 0xF9,
    Comment = 0xFE,
    Application = 0xFF,
}

/// Sub-block payload joined together. `complete` is false when the input ended before the terminator.
#[derive(Debug, Default)]
pub struct SubBlocks {
    pub data: Vec<u8>,
    pub complete: bool,
}

pub struct GIFParser<'data> {
    cursor: Cursor<&'data [u8]>,
}

impl<'data> GIFParser<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn to_introducer(byte: u8) -> Option<BlockIntroducer> {
        FromPrimitive::from_u8(byte)
    }

    pub fn to_extension_label(byte: u8) -> Option<ExtensionLabel> {
        FromPrimitive::from_u8(byte)
    }

    pub fn read_next_short(&mut self) -> Result<u16> {
        match self.cursor.read_u16::<LittleEndian>() {
            Ok(val) => Ok(val),
            Err(_) => Err(Error::Format("Unexpected end of input")),
        }
    }

    pub fn read_next_byte(&mut self) -> Result<u8> {
        match self.cursor.read_u8() {
            Ok(val) => Ok(val),
            Err(_) => Err(Error::Format("Unexpected end of input")),
        }
    }

    pub fn read_exact<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        match self.cursor.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(_) => Err(Error::Format("Unexpected end of input")),
        }
    }

    /// Reads `len` bytes, failing without consuming anything if fewer remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'data [u8]> {
        let data: &'data [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or(Error::Format("Unexpected end of input"))?;
        self.cursor.set_position(end as u64);
        Ok(&data[start..end])
    }

    /// Concatenates length-prefixed sub-blocks up to the zero-length terminator.
    ///
    /// Running out of input is not an error here: whatever was read is returned with
    /// `complete == false`.
    pub fn read_sub_blocks(&mut self) -> SubBlocks {
        let mut blocks = SubBlocks::default();
        for _ in 0..MAX_SUB_BLOCKS {
            let block_size = match self.read_next_byte() {
                Ok(size) => size as usize,
                Err(_) => return blocks,
            };
            if block_size == 0 {
                blocks.complete = true;
                return blocks;
            }
            match self.read_bytes(block_size) {
                Ok(bytes) => blocks.data.extend_from_slice(bytes),
                Err(_) => {
                    // keep the partial block, the LZW decoder stops where the bits run out
                    let rest = self.remaining();
                    blocks.data.extend_from_slice(rest);
                    return blocks;
                }
            }
        }
        blocks
    }

    /// Skips sub-blocks up to and including the terminator. Returns false if the input ended first.
    pub fn skip_sub_blocks(&mut self) -> bool {
        for _ in 0..MAX_SUB_BLOCKS {
            let block_size = match self.read_next_byte() {
                Ok(size) => size as usize,
                Err(_) => return false,
            };
            if block_size == 0 {
                return true;
            }
            if self.read_bytes(block_size).is_err() {
                return false;
            }
        }
        false
    }

    fn remaining(&mut self) -> &'data [u8] {
        let data: &'data [u8] = *self.cursor.get_ref();
        let start = (self.cursor.position() as usize).min(data.len());
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }
}

#[rustfmt::skip]
#[allow(dead_code)]
static TEST_STREAM: [u8; 14] = [
    0x21, 0xFE,     // Comment extension
    3, b'h', b'i', b'!',
    0,              // Terminator
    0x2C,           // Image separator
    2, 0xAA, 0xBB,  // Sub-block
    1, 0xCC,        // Sub-block, terminator missing
    0x3B,
];

#[test]
fn read_introducers() {
    let mut reader = GIFParser::new(&TEST_STREAM);
    let byte = reader.read_next_byte().unwrap();
    assert_eq!(GIFParser::to_introducer(byte), Some(BlockIntroducer::Extension));
    let label = reader.read_next_byte().unwrap();
    assert_eq!(GIFParser::to_extension_label(label), Some(ExtensionLabel::Comment));
    assert!(reader.skip_sub_blocks());

    let byte = reader.read_next_byte().unwrap();
    assert_eq!(GIFParser::to_introducer(byte), Some(BlockIntroducer::ImageSeparator));
    assert_eq!(GIFParser::to_introducer(0x00), None);
}

#[test]
fn read_truncated_sub_blocks() {
    let mut reader = GIFParser::new(&TEST_STREAM[8..]);
    let blocks = reader.read_sub_blocks();
    // 0x3B is read as a length byte and the block it announces is cut off
    assert!(!blocks.complete);
    assert_eq!(blocks.data, vec![0xAA, 0xBB, 0xCC]);
    assert_eq!(reader.position(), 6);
}

#[test]
fn read_shorts_little_endian() {
    let data = [0x34, 0x12, 0xFF];
    let mut reader = GIFParser::new(&data);
    assert_eq!(reader.read_next_short().unwrap(), 0x1234);
    assert!(reader.read_next_short().is_err());
}
