use pretty_assertions::assert_eq;
use rust_gif_codec::{
    effect::{apply_to_all, EffectKind, EffectSettings},
    gif::{
        decode, decode_with, encode, encode_with, lzw_encode, DecoderConfig, EncoderConfig,
        FixedPalette, GIFDecoder, GIFEncoder, PLACEHOLDER_GRAY,
    },
    image::{Bitmap, Frame, ImageDecoder, ImageEncoder},
    transport::{decode_payload, encode_payload},
    Error,
};

/// Clear, index 1, end at 3 bits with a minimum code size of 2.
const ONE_WHITE_PIXEL: [u8; 2] = [0x4C, 0x01];

#[rustfmt::skip]
static TWO_COLOR_SCREEN: [u8; 19] = [
    b'G', b'I', b'F', b'8', b'9', b'a',
    1, 0,           // Width
    1, 0,           // Height
    0b1000_0000,    // Global table with 2 entries
    0,              // Background
    0,              // Aspect ratio
    0, 0, 0,
    255, 255, 255,
];

fn image_block(width: u16, height: u16, packed: u8, min_code_size: u8, data: &[u8]) -> Vec<u8> {
    let mut block = vec![0x2C, 0, 0, 0, 0];
    block.extend_from_slice(&width.to_le_bytes());
    block.extend_from_slice(&height.to_le_bytes());
    block.push(packed);
    block.push(min_code_size);
    for chunk in data.chunks(255) {
        block.push(chunk.len() as u8);
        block.extend_from_slice(chunk);
    }
    block.push(0);
    block
}

fn graphics_control(delay_cs: u16) -> Vec<u8> {
    let delay = delay_cs.to_le_bytes();
    vec![0x21, 0xF9, 4, 0, delay[0], delay[1], 0, 0]
}

fn white_pixel_gif(blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut gif = TWO_COLOR_SCREEN.to_vec();
    for block in blocks {
        gif.extend_from_slice(block);
    }
    gif.push(0x3B);
    gif
}

/// A frame whose every pixel is the center of an RGB332 bucket.
fn bucket_frame(width: u16, height: u16, seed: u8) -> Frame {
    let palette = FixedPalette::Rgb332;
    let mut bitmap = Bitmap::filled((width, height), [0, 0, 0]);
    for (i, pixel) in bitmap.data.chunks_exact_mut(3).enumerate() {
        pixel.copy_from_slice(&palette.color((i as u8).wrapping_mul(seed)));
    }
    Frame::new(bitmap)
}

#[test]
fn not_a_gif() {
    assert!(matches!(decode(b"\x89PNG\r\n\x1a\n"), Err(Error::Format(_))));
    assert!(matches!(decode(b""), Err(Error::Format(_))));
}

#[test]
fn header_cut_short() {
    assert!(matches!(decode(b"GIF89a\x01\x00"), Err(Error::Format(_))));
    assert!(matches!(decode(&TWO_COLOR_SCREEN[..17]), Err(Error::Format(_))));
}

#[test]
fn screen_without_frames() {
    let gif = decode(&white_pixel_gif(&[])).unwrap();
    assert_eq!((gif.width, gif.height), (1, 1));
    assert!(gif.frames.is_empty());
    assert_eq!(gif.global_palette.map(|p| p.len()), Some(2));
}

#[test]
fn single_pixel_frame() {
    let bytes = white_pixel_gif(&[image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL)]);
    let gif = decode(&bytes).unwrap();

    assert_eq!(gif.frames.len(), 1);
    let frame = &gif.frames[0];
    assert_eq!((frame.width(), frame.height()), (1, 1));
    assert_eq!(frame.min_code_size, 2);
    assert_eq!(frame.delay_ms, 100);
    assert_eq!(frame.bitmap.data, vec![255, 255, 255]);
}

#[test]
fn delays_from_graphics_control() {
    let bytes = white_pixel_gif(&[
        graphics_control(5),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
        graphics_control(0),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    let gif = decode(&bytes).unwrap();
    let delays: Vec<u32> = gif.frames.iter().map(|f| f.delay_ms).collect();
    assert_eq!(delays, vec![50, 100, 100]);
}

#[test]
fn loop_count_and_comments() {
    let mut netscape = vec![0x21, 0xFF, 11];
    netscape.extend_from_slice(b"NETSCAPE2.0");
    netscape.extend_from_slice(&[3, 1, 3, 0, 0]);
    let comment = vec![0x21, 0xFE, 5, b'h', b'e', b'l', b'l', b'o', 0];

    let bytes = white_pixel_gif(&[netscape, comment, image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL)]);
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.loop_count, Some(3));
    assert_eq!(gif.frames.len(), 1);
}

#[test]
fn missing_trailer_keeps_frames() {
    let mut bytes = white_pixel_gif(&[
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    bytes.pop();
    assert_eq!(decode(&bytes).unwrap().frames.len(), 2);
}

#[test]
fn data_cut_mid_frame_keeps_partial_frame() {
    let mut bytes = white_pixel_gif(&[image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL)]);
    // drop the trailer, the terminator and the last data byte
    bytes.truncate(bytes.len() - 3);
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.frames.len(), 1);
    assert_eq!(gif.frames[0].bitmap.data, vec![255, 255, 255]);
}

#[test]
fn descriptor_cut_short_drops_frame() {
    let mut bytes = white_pixel_gif(&[
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    let second = TWO_COLOR_SCREEN.len() + image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL).len();
    bytes.truncate(second + 4);
    assert_eq!(decode(&bytes).unwrap().frames.len(), 1);
}

#[test]
fn unknown_block_stops_decoding() {
    let bytes = white_pixel_gif(&[
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
        vec![0x99, 1, 2, 3],
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    assert_eq!(decode(&bytes).unwrap().frames.len(), 1);
}

#[test]
fn broken_frame_becomes_placeholder() {
    let bytes = white_pixel_gif(&[
        image_block(2, 1, 0, 12, &[0xFF, 0xFF]),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.frames.len(), 2);
    assert_eq!(gif.frames[0].bitmap, Bitmap::filled((2, 1), PLACEHOLDER_GRAY));
    assert_eq!(gif.frames[1].bitmap.data, vec![255, 255, 255]);
}

#[test]
fn interlaced_rows_are_reordered() {
    // 1x5 image with a local table of 8 reds, rows stored in pass order 0, 4, 2, 1, 3
    let mut block = vec![0x2C, 0, 0, 0, 0, 1, 0, 5, 0, 0b1100_0010];
    for i in 0..8u8 {
        block.extend_from_slice(&[i * 10, 0, 0]);
    }
    block.push(3);
    let data = lzw_encode(&[0, 4, 2, 1, 3], 3);
    block.push(data.len() as u8);
    block.extend_from_slice(&data);
    block.push(0);

    let gif = decode(&white_pixel_gif(&[block])).unwrap();
    let frame = &gif.frames[0];
    assert_eq!(frame.local_palette.as_ref().map(|p| p.len()), Some(8));
    let reds: Vec<u8> = frame.bitmap.pixels().map(|rgb| rgb[0]).collect();
    assert_eq!(reds, vec![0, 10, 20, 30, 40]);
}

#[test]
fn frame_limit() {
    let frames: Vec<Vec<u8>> = (0..5)
        .map(|_| image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL))
        .collect();
    let bytes = white_pixel_gif(&frames);
    let config = DecoderConfig {
        max_frames: 2,
        ..DecoderConfig::default()
    };
    assert_eq!(decode_with(&bytes, &config).unwrap().frames.len(), 2);
    assert_eq!(decode(&bytes).unwrap().frames.len(), 5);
}

#[test]
fn oversized_frame_is_dropped() {
    // a 1x1 screen announcing a 65535x65535 image backed by two bytes of data
    let bytes = white_pixel_gif(&[
        image_block(u16::MAX, u16::MAX, 0, 2, &ONE_WHITE_PIXEL),
        image_block(1, 1, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.frames.len(), 1);
    assert_eq!(gif.frames[0].bitmap.data, vec![255, 255, 255]);
}

#[test]
fn frame_pixel_limit() {
    let bytes = white_pixel_gif(&[
        image_block(4, 4, 0, 2, &ONE_WHITE_PIXEL),
        image_block(4, 5, 0, 2, &ONE_WHITE_PIXEL),
    ]);
    let config = DecoderConfig {
        max_frame_pixels: 16,
        ..DecoderConfig::default()
    };
    let gif = decode_with(&bytes, &config).unwrap();
    assert_eq!(gif.frames.len(), 1);
    assert_eq!((gif.frames[0].width(), gif.frames[0].height()), (4, 4));
}

#[test]
fn encode_nothing() {
    assert!(matches!(encode(&[], 10, 10), Err(Error::Encoding(_))));
}

#[test]
fn encoded_stream_layout() {
    let bytes = encode(&[bucket_frame(4, 3, 7)], 4, 3).unwrap();
    assert_eq!(&bytes[..6], b"GIF89a");
    assert_eq!(&bytes[6..10], &[4, 0, 3, 0]);
    assert_eq!(bytes.last(), Some(&0x3B));
}

#[test]
fn encode_then_decode() {
    let mut frames = vec![
        bucket_frame(16, 9, 1),
        bucket_frame(16, 9, 37),
        bucket_frame(16, 9, 101),
    ];
    frames[1].delay_ms = 250;

    let bytes = encode(&frames, 16, 9).unwrap();
    let gif = decode(&bytes).unwrap();

    assert_eq!((gif.width, gif.height), (16, 9));
    assert_eq!(gif.loop_count, Some(0));
    assert_eq!(gif.frames.len(), 3);
    for (decoded, original) in gif.frames.iter().zip(&frames) {
        assert_eq!(decoded.bitmap, original.bitmap);
        assert_eq!(decoded.delay_ms, original.delay_ms);
        assert_eq!(decoded.min_code_size, 8);
    }
}

#[test]
fn large_frame_round_trip() {
    // enough pixels to fill the code table and force clear codes
    let frame = bucket_frame(200, 150, 13);
    let bytes = encode(std::slice::from_ref(&frame), 200, 150).unwrap();
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.frames[0].bitmap, frame.bitmap);
}

#[test]
fn encoding_is_deterministic() {
    let frames = vec![bucket_frame(8, 8, 3), bucket_frame(8, 8, 5)];
    assert_eq!(encode(&frames, 8, 8).unwrap(), encode(&frames, 8, 8).unwrap());
}

#[test]
fn legacy_palette_without_loop() {
    let frame = Frame::new(Bitmap::filled((2, 2), [255, 255, 255]));
    let config = EncoderConfig {
        palette: FixedPalette::Legacy,
        repeat: None,
    };
    let bytes = encode_with(&[frame], 2, 2, &config).unwrap();
    let gif = decode(&bytes).unwrap();
    assert_eq!(gif.loop_count, None);
    // white quantizes to 255, which the legacy table shows as (253, 251, 249)
    assert_eq!(gif.frames[0].bitmap.pixel(1, 1), Some([253, 251, 249]));
}

#[test]
fn decoder_and_encoder_traits() {
    let frames = vec![bucket_frame(5, 5, 11), bucket_frame(5, 5, 17)];
    let config = EncoderConfig {
        repeat: Some(4),
        ..EncoderConfig::default()
    };
    let bytes = encode_with(&frames, 5, 5, &config).unwrap();

    let gif = GIFDecoder::new(&bytes).decode().unwrap();
    assert_eq!(gif.loop_count, Some(4));
    let again = GIFEncoder::new(&gif).encode().unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn effect_then_transport() {
    let mut gif = decode(&encode(&[bucket_frame(6, 4, 9), bucket_frame(6, 4, 21)], 6, 4).unwrap())
        .unwrap();
    let settings = EffectSettings {
        kind: EffectKind::Concentration,
        ..EffectSettings::default()
    };
    apply_to_all(&mut gif, &settings);

    let bytes = encode(&gif.frames, gif.width, gif.height).unwrap();
    let payload = encode_payload(&bytes);
    assert!(payload.starts_with("data:image/gif;base64,R0lGODlh"));

    let restored = decode(&decode_payload(&payload).unwrap()).unwrap();
    assert_eq!(restored.frames.len(), 2);
    assert_eq!((restored.width, restored.height), (6, 4));
}
