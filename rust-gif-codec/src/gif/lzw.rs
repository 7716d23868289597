//! GIF flavoured LZW: variable width codes, least significant bit first, with clear and end codes.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bitstream::{BitWriter, Bitstream};

/// GIF codes never grow past 12 bits.
pub const MAX_CODE_WIDTH: u8 = 12;
const MAX_ENTRIES: usize = 1 << MAX_CODE_WIDTH;

/// Color indices are bytes, so the roots of the code table span at most 8 bits.
pub const MAX_MIN_CODE_SIZE: u8 = 8;

#[derive(Debug, Clone, Copy)]
struct Entry {
    /// Code of the string this one extends, `None` for the single-symbol roots.
    prefix: Option<u16>,
    suffix: u8,
    first: u8,
    len: u16,
}

/// Code table stored as an arena indexed by code. Reset truncates back to the roots.
struct Dictionary {
    entries: Vec<Entry>,
    roots: usize,
}

impl Dictionary {
    fn new(min_code_size: u8) -> Self {
        let clear_code = 1usize << min_code_size;
        let mut entries = Vec::with_capacity(MAX_ENTRIES);
        for code in 0..clear_code {
            entries.push(Entry {
                prefix: None,
                suffix: code as u8,
                first: code as u8,
                len: 1,
            });
        }
        // clear and end occupy codes but never expand to output
        for _ in 0..2 {
            entries.push(Entry {
                prefix: None,
                suffix: 0,
                first: 0,
                len: 0,
            });
        }
        let roots = entries.len();
        Self { entries, roots }
    }

    fn reset(&mut self) {
        self.entries.truncate(self.roots);
    }

    fn next_free(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, code: u16) -> Option<&Entry> {
        self.entries.get(code as usize).filter(|entry| entry.len > 0)
    }

    fn push(&mut self, prefix: u16, suffix: u8) {
        if self.entries.len() >= MAX_ENTRIES {
            return;
        }
        let parent = self.entries[prefix as usize];
        self.entries.push(Entry {
            prefix: Some(prefix),
            suffix,
            first: parent.first,
            len: parent.len + 1,
        });
    }

    /// Appends the string for `code` to `output`.
    fn expand(&self, code: u16, output: &mut Vec<u8>) {
        let len = self.entries[code as usize].len as usize;
        let start = output.len();
        output.resize(start + len, 0);

        let mut cursor = Some(code);
        let mut position = start + len;
        while let Some(current) = cursor {
            let entry = &self.entries[current as usize];
            position -= 1;
            output[position] = entry.suffix;
            cursor = entry.prefix;
        }
    }
}

/// Decompresses a GIF image data stream into color indices.
///
/// Never fails: a code that points outside the dictionary, or running out of bits before the end
/// code, stops decoding and returns the indices emitted so far.
pub fn decode(data: &[u8], min_code_size: u8) -> Vec<u8> {
    decode_limited(data, min_code_size, usize::MAX)
}

/// Like [`decode`], but stops once `limit` indices have been produced.
pub fn decode_limited(data: &[u8], min_code_size: u8, limit: usize) -> Vec<u8> {
    let mut output = Vec::new();
    if min_code_size == 0 || min_code_size > MAX_MIN_CODE_SIZE {
        debug!("LZW minimum code size {} is not supported", min_code_size);
        return output;
    }

    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;
    let mut dictionary = Dictionary::new(min_code_size);
    let mut bitstream = Bitstream::new(data);
    let mut code_width = min_code_size + 1;
    let mut previous: Option<u16> = None;

    while output.len() < limit {
        let code = match bitstream.read_bits(code_width) {
            Some(code) => code,
            None => {
                trace!("LZW stream ran out of bits without an end code");
                break;
            }
        };

        if code == clear_code {
            dictionary.reset();
            code_width = min_code_size + 1;
            previous = None;
            continue;
        }
        if code == end_code {
            break;
        }

        let Some(prev) = previous else {
            // first code after a clear is emitted as-is, nothing is added
            match dictionary.get(code) {
                Some(_) => dictionary.expand(code, &mut output),
                None => {
                    debug!("LZW code {} is not in the dictionary", code);
                    break;
                }
            }
            previous = Some(code);
            continue;
        };

        let first = if let Some(entry) = dictionary.get(code) {
            let first = entry.first;
            dictionary.expand(code, &mut output);
            first
        } else if code as usize == dictionary.next_free() {
            // KwK: the code being defined right now, previous string plus its own first symbol
            let first = dictionary.entries[prev as usize].first;
            dictionary.expand(prev, &mut output);
            output.push(first);
            first
        } else {
            debug!(
                "LZW code {} is past the next free entry {}",
                code,
                dictionary.next_free()
            );
            break;
        };

        dictionary.push(prev, first);
        if dictionary.next_free() == 1 << code_width && code_width < MAX_CODE_WIDTH {
            code_width += 1;
        }
        previous = Some(code);
    }

    output.truncate(limit);
    output
}

/// Compresses color indices into a GIF image data stream (without sub-block framing).
///
/// Indices must fit in `min_code_size` bits; larger values are masked.
pub fn encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let min_code_size = min_code_size.clamp(1, MAX_MIN_CODE_SIZE);
    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;
    let symbol_mask = (clear_code - 1) as u8;
    let first_free = end_code + 1;

    let mut writer = BitWriter::new();
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next_code = first_free;
    let mut code_width = min_code_size + 1;

    writer.write_bits(clear_code, code_width);

    let mut symbols = indices.iter().map(|index| index & symbol_mask);
    let Some(first_symbol) = symbols.next() else {
        writer.write_bits(end_code, code_width);
        return writer.finish();
    };
    let mut prefix = first_symbol as u16;

    for symbol in symbols {
        if let Some(&code) = table.get(&(prefix, symbol)) {
            prefix = code;
            continue;
        }

        writer.write_bits(prefix, code_width);

        if (next_code as usize) < MAX_ENTRIES {
            table.insert((prefix, symbol), next_code);
            next_code += 1;
            // the decoder adds its entry one code later, so it widens once next_code passes 2^width
            if next_code as usize > 1 << code_width && code_width < MAX_CODE_WIDTH {
                code_width += 1;
            }
        } else {
            writer.write_bits(clear_code, code_width);
            table.clear();
            next_code = first_free;
            code_width = min_code_size + 1;
        }
        prefix = symbol as u16;
    }

    writer.write_bits(prefix, code_width);
    writer.write_bits(end_code, code_width);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pack(codes: &[(u16, u8)]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        for &(code, width) in codes {
            writer.write_bits(code, width);
        }
        writer.finish()
    }

    #[test]
    fn clear_then_end_is_empty() {
        let data = pack(&[(4, 3), (5, 3)]);
        assert_eq!(decode(&data, 2), Vec::<u8>::new());
    }

    #[test]
    fn literal_pattern() {
        // the table reaches 8 entries after the third literal, so the last two codes are 4 bits wide
        let data = pack(&[(4, 3), (0, 3), (1, 3), (2, 3), (3, 4), (5, 4)]);
        assert_eq!(decode(&data, 2), vec![0, 1, 2, 3]);
    }

    #[test]
    fn kwk_case() {
        // 0, then code 6 before it is defined: 6 = [0, 0]
        let data = pack(&[(4, 3), (0, 3), (6, 3), (5, 3)]);
        assert_eq!(decode(&data, 2), vec![0, 0, 0]);
    }

    #[test]
    fn clear_mid_stream_resets_width() {
        let data = pack(&[(4, 3), (1, 3), (1, 3), (4, 3), (2, 3), (5, 3)]);
        assert_eq!(decode(&data, 2), vec![1, 1, 2]);
    }

    #[test]
    fn invalid_code_keeps_partial_output() {
        // 7 is two past the next free entry (6) while only one literal has been seen
        let data = pack(&[(4, 3), (2, 3), (7, 3), (1, 3)]);
        assert_eq!(decode(&data, 2), vec![2]);
    }

    #[test]
    fn missing_end_code() {
        // four 4-bit codes fill two bytes exactly, so no padding bits are read as codes
        let data = pack(&[(8, 4), (3, 4), (3, 4), (3, 4)]);
        assert_eq!(decode(&data, 3), vec![3, 3, 3]);
    }

    #[test]
    fn unsupported_code_size() {
        assert!(decode(&[0xFF, 0xFF], 0).is_empty());
        assert!(decode(&[0xFF, 0xFF], 9).is_empty());
    }

    #[test]
    fn whats_in_a_gif_sample() {
        // 10x10 sample image from "What's In A GIF", minimum code size 2
        let data = [
            0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75, 0xEC, 0x95, 0xFA,
            0xA8, 0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C, 0x01,
        ];
        let mut expected = Vec::new();
        for row in [
            "1111122222",
            "1111122222",
            "1111122222",
            "1110000222",
            "1110000222",
            "2220000111",
            "2220000111",
            "2222211111",
            "2222211111",
            "2222211111",
        ] {
            expected.extend(row.bytes().map(|b| b - b'0'));
        }
        assert_eq!(decode(&data, 2), expected);
    }

    #[test]
    fn encode_decode_long_runs() {
        // enough data to fill the table and force at least one clear code
        let indices: Vec<u8> = (0..20_000u32).map(|i| ((i * 7919) % 251) as u8).collect();
        let data = encode(&indices, 8);
        assert_eq!(decode(&data, 8), indices);
    }

    #[test]
    fn encode_decode_small_alphabet() {
        let indices = vec![0, 1, 1, 1, 1, 1, 0, 0, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1];
        let data = encode(&indices, 2);
        assert_eq!(decode(&data, 2), indices);
    }

    #[test]
    fn encode_empty() {
        let data = encode(&[], 8);
        assert!(decode(&data, 8).is_empty());
    }

    #[test]
    fn output_stops_at_limit() {
        let data = encode(&[9; 5000], 8);
        assert_eq!(decode_limited(&data, 8, 10), vec![9; 10]);
        assert!(decode_limited(&data, 8, 0).is_empty());
        assert_eq!(decode(&data, 8).len(), 5000);
    }
}
