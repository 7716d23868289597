/// Bitstream reader. Reads variable width codes packed least-significant-bit first, as GIF does.
#[derive(Debug)]
pub struct Bitstream<'data> {
    data: &'data [u8],
    byte_cursor: usize,
    bit_cursor: u8,
}

impl<'data> Bitstream<'data> {
    /// Creates a new bitstream.
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            data,
            byte_cursor: 0,
            bit_cursor: 0,
        }
    }

    /// Number of bits not yet consumed.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte_cursor) * 8 - self.bit_cursor as usize
    }

    /// Reads up to 16 bits out of the bitstream. Bit 0 of the first byte becomes bit 0 of the code.
    ///
    /// Returns `None` when fewer than `bits` bits are left; the cursor is not moved in that case.
    pub fn read_bits(&mut self, bits: u8) -> Option<u16> {
        if bits > 16 || self.remaining_bits() < bits as usize {
            return None;
        }

        let mut value: u16 = 0;
        let mut filled: u8 = 0;
        while filled < bits {
            let current_byte = self.data[self.byte_cursor] >> self.bit_cursor;
            let available = 8 - self.bit_cursor;
            let take = available.min(bits - filled);
            let mask = ((1u16 << take) - 1) as u8;

            value |= ((current_byte & mask) as u16) << filled;
            filled += take;

            self.bit_cursor += take;
            if self.bit_cursor == 8 {
                self.byte_cursor += 1;
                self.bit_cursor = 0;
            }
        }
        Some(value)
    }
}

/// Bitstream writer, the inverse of [`Bitstream`].
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    pending: u32,
    pending_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `bits` bits of `code`.
    pub fn write_bits(&mut self, code: u16, bits: u8) {
        debug_assert!(bits <= 16);
        let mask = if bits == 16 { 0xFFFF } else { (1u32 << bits) - 1 };
        self.pending |= (code as u32 & mask) << self.pending_bits;
        self.pending_bits += bits;

        while self.pending_bits >= 8 {
            self.data.push(self.pending as u8);
            self.pending >>= 8;
            self.pending_bits -= 8;
        }
    }

    /// Flushes a partial trailing byte (zero padded) and returns the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending_bits > 0 {
            self.data.push(self.pending as u8);
        }
        self.data
    }
}

#[test]
fn read_lsb_first() {
    // 0x44 = 0b0100_0100 -> codes (3 bits each): 100, 000, then 1 + next byte's bit 0
    let data = [0x44, 0x01];
    let mut bits = Bitstream::new(&data);
    assert_eq!(bits.read_bits(3), Some(4));
    assert_eq!(bits.read_bits(3), Some(0));
    assert_eq!(bits.read_bits(3), Some(5));
    assert_eq!(bits.remaining_bits(), 7);
}

#[test]
fn read_past_end() {
    let data = [0xFF];
    let mut bits = Bitstream::new(&data);
    assert_eq!(bits.read_bits(5), Some(0b11111));
    assert_eq!(bits.read_bits(5), None);
    assert_eq!(bits.read_bits(3), Some(0b111));
}

#[test]
fn writer_matches_reader() {
    let mut writer = BitWriter::new();
    for (code, width) in [(4u16, 3u8), (0, 3), (1, 3), (2, 3), (3, 4), (5, 4), (4095, 12)] {
        writer.write_bits(code, width);
    }
    let data = writer.finish();

    let mut bits = Bitstream::new(&data);
    for (code, width) in [(4u16, 3u8), (0, 3), (1, 3), (2, 3), (3, 4), (5, 4), (4095, 12)] {
        assert_eq!(bits.read_bits(width), Some(code));
    }
}
