use crate::gif::header::ColorTable;

/// The 256-entry global color table the encoder writes.
///
/// Both variants share the same quantizer, `r/32 + (g/32)*8 + (b/64)*64`, so the choice only
/// changes which color each index is shown as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixedPalette {
    /// Each entry is the center of the quantizer bucket it stands for (3 bits red, 3 green, 2 blue).
    #[default]
    Rgb332,
    /// `r = i*3 % 256, g = i*5 % 256, b = i*7 % 256`, byte for byte what older encoders produced.
    Legacy,
}

impl FixedPalette {
    /// Color for palette index `i`.
    pub fn color(self, i: u8) -> [u8; 3] {
        match self {
            FixedPalette::Rgb332 => [
                (i & 0b111) * 32 + 16,
                ((i >> 3) & 0b111) * 32 + 16,
                (i >> 6) * 64 + 32,
            ],
            FixedPalette::Legacy => {
                let i = i as u32;
                [(i * 3 % 256) as u8, (i * 5 % 256) as u8, (i * 7 % 256) as u8]
            }
        }
    }

    /// All 256 colors as a color table.
    pub fn color_table(self) -> ColorTable {
        ColorTable::new((0..=255u8).map(|i| self.color(i)).collect())
    }
}

/// Maps an RGB triple to its index in the fixed palette.
pub fn quantize([r, g, b]: [u8; 3]) -> u8 {
    let index = (r as u32 / 32) + (g as u32 / 32) * 8 + (b as u32 / 64) * 64;
    index.min(255) as u8
}

#[test]
fn quantize_corners() {
    assert_eq!(quantize([0, 0, 0]), 0);
    assert_eq!(quantize([255, 255, 255]), 255);
    assert_eq!(quantize([255, 0, 0]), 7);
    assert_eq!(quantize([0, 255, 0]), 56);
    assert_eq!(quantize([0, 0, 255]), 192);
}

#[test]
fn rgb332_round_trips_bucket_centers() {
    for i in 0..=255u8 {
        assert_eq!(quantize(FixedPalette::Rgb332.color(i)), i);
    }
}

#[test]
fn legacy_formula() {
    let table = FixedPalette::Legacy.color_table();
    assert_eq!(table.len(), 256);
    assert_eq!(table.get(0), Some([0, 0, 0]));
    assert_eq!(table.get(100), Some([44, 244, 188]));
}
