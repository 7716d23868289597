use std::f32::consts::PI;
use std::str::FromStr;

use tracing::debug;

use crate::image::{DecodedGif, Frame};

/// Seven-stop gradient the rainbow effect cycles through.
const GAMING_COLORS: [[f32; 3]; 7] = [
    [255.0, 0.0, 0.0],
    [255.0, 128.0, 0.0],
    [255.0, 255.0, 0.0],
    [0.0, 255.0, 0.0],
    [0.0, 128.0, 255.0],
    [64.0, 0.0, 255.0],
    [128.0, 0.0, 255.0],
];

/// How much of an overlay effect's color replaces the original pixel.
const OVERLAY_STRENGTH: f32 = 0.8;

/// The color cycling effects that can be applied to each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectKind {
    /// Gaming gradient tinted by the pixel's own brightness
    #[default]
    Rainbow,
    /// Shimmering gold bands
    Golden,
    /// Blue to pink to purple bands
    BluePurplePink,
    /// Rainbow rings pulsing out from the center
    Pulse,
    /// Rainbow columns with a diamond shaped pulse
    RainbowPulse,
    /// White speed lines radiating from the center
    Concentration,
}

impl FromStr for EffectKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "rainbow" => Ok(EffectKind::Rainbow),
            "golden" => Ok(EffectKind::Golden),
            "bluepurplepink" => Ok(EffectKind::BluePurplePink),
            "pulse" => Ok(EffectKind::Pulse),
            "rainbowPulse" => Ok(EffectKind::RainbowPulse),
            "concentration" => Ok(EffectKind::Concentration),
            _ => Err(format!("unknown effect '{}'", name)),
        }
    }
}

/// Which way the rainbow gradient runs across a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientDirection {
    /// Left to right
    #[default]
    Horizontal,
    /// Top to bottom
    Vertical,
    /// Top left to bottom right
    DiagonalDown,
    /// Top right to bottom left
    DiagonalUp,
}

/// Parameters for [`apply_effect`].
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSettings {
    /// The effect to draw
    pub kind: EffectKind,
    /// Effect cycles per loop of the animation; whole numbers loop seamlessly
    pub speed: f32,
    /// 0 keeps the original colors, 100 applies the effect fully
    pub saturation: f32,
    /// Direction of the rainbow gradient
    pub direction: GradientDirection,
    /// Number of gradient stops spread across the frame
    pub density: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            kind: EffectKind::Rainbow,
            speed: 5.0,
            saturation: 100.0,
            direction: GradientDirection::Horizontal,
            density: 7.0,
        }
    }
}

/// Recolors frame `index` of an animation with `total` frames.
///
/// The effect's phase depends only on `index / total`, so the last frame leads smoothly back into
/// the first.
pub fn apply_effect(frame: &mut Frame, index: usize, total: usize, settings: &EffectSettings) {
    let progress = index as f32 / total.max(1) as f32 * settings.speed;
    let (width, height) = frame.bitmap.size;
    let canvas = Canvas {
        width: width as f32,
        height: height as f32,
    };
    let channels = frame.bitmap.channels.max(3) as usize;
    let rainbow = RainbowGradient::new(settings, progress);

    for (i, pixel) in frame.bitmap.data.chunks_exact_mut(channels).enumerate() {
        let x = (i % width.max(1) as usize) as f32;
        let y = (i / width.max(1) as usize) as f32;
        let original = [pixel[0], pixel[1], pixel[2]];

        let recolored = match settings.kind {
            EffectKind::Rainbow => rainbow.recolor(original, canvas.position(x, y, settings.direction)),
            EffectKind::Golden => overlay(original, golden_color(x, progress)),
            EffectKind::BluePurplePink => {
                overlay(original, blue_purple_pink_color(x, &canvas, progress))
            }
            EffectKind::Pulse => overlay(
                original,
                pulse_color(x, y, &canvas, progress, settings.saturation),
            ),
            EffectKind::RainbowPulse => overlay(
                original,
                rainbow_pulse_color(x, y, &canvas, progress, settings.saturation),
            ),
            EffectKind::Concentration => {
                overlay(original, concentration_color(x, y, &canvas, progress))
            }
        };
        pixel[..3].copy_from_slice(&recolored);
    }
}

/// Applies the effect to every frame, each at its own point in the cycle.
pub fn apply_to_all(gif: &mut DecodedGif, settings: &EffectSettings) {
    let total = gif.frames.len();
    debug!("Applying {:?} to {} frames", settings.kind, total);
    for (index, frame) in gif.frames.iter_mut().enumerate() {
        apply_effect(frame, index, total, settings);
    }
}

struct Canvas {
    width: f32,
    height: f32,
}

impl Canvas {
    fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Position along the gradient direction, roughly 0..1.
    fn position(&self, x: f32, y: f32, direction: GradientDirection) -> f32 {
        let (center_x, center_y) = self.center();
        let span = 2.0 * (self.width + self.height);
        match direction {
            GradientDirection::Horizontal => x / self.width,
            GradientDirection::Vertical => y / self.height,
            GradientDirection::DiagonalDown => {
                ((x - center_x) + (y - center_y) + self.width + self.height) / span
            }
            GradientDirection::DiagonalUp => {
                ((center_x - x) + (y - center_y) + self.width + self.height) / span
            }
        }
    }
}

struct RainbowGradient {
    stops: [[f32; 3]; 7],
    shift: f32,
    density: f32,
    level: f32,
}

impl RainbowGradient {
    fn new(settings: &EffectSettings, progress: f32) -> Self {
        let level = settings.saturation.clamp(0.0, 100.0) / 100.0;
        let mut stops = GAMING_COLORS;
        if level < 1.0 {
            // desaturate the stops towards mid gray
            for stop in stops.iter_mut() {
                for channel in stop.iter_mut() {
                    *channel = (*channel * level + 128.0 * (1.0 - level)).trunc();
                }
            }
        }
        Self {
            stops,
            shift: progress.rem_euclid(1.0) * stops.len() as f32,
            density: settings.density,
            level,
        }
    }

    fn recolor(&self, original: [u8; 3], position: f32) -> [u8; 3] {
        let count = self.stops.len();
        let color_float = (position * self.density + self.shift).rem_euclid(count as f32);
        let index = (color_float.floor() as usize) % count;
        let from = self.stops[index];
        let to = self.stops[(index + 1) % count];
        let blend = color_float.fract().clamp(0.0, 1.0);

        let [r, g, b] = original.map(|channel| channel as f32);
        let luminance = (r * 0.299 + g * 0.587 + b * 0.114) / 255.0;
        let boosted = (luminance * 1.4).clamp(0.3, 1.0);

        let mut result = [0u8; 3];
        for c in 0..3 {
            let gradient = (from[c] + (to[c] - from[c]) * blend).round();
            let target = gradient * boosted;
            let mixed = target * self.level + original[c] as f32 * (1.0 - self.level);
            result[c] = to_channel(mixed);
        }
        result
    }
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn overlay(original: [u8; 3], effect: [u8; 3]) -> [u8; 3] {
    let mut result = [0u8; 3];
    for c in 0..3 {
        result[c] = to_channel(
            effect[c] as f32 * OVERLAY_STRENGTH + original[c] as f32 * (1.0 - OVERLAY_STRENGTH),
        );
    }
    result
}

/// Color with the given hue (degrees) and chroma, the way the handlers approximated HSV.
fn hue_color(hue: f32, chroma: f32) -> [u8; 3] {
    let sector = hue.rem_euclid(360.0) / 60.0;
    let c = chroma.trunc();
    let x = (c * (1.0 - ((sector % 2.0) - 1.0).abs())).trunc();
    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [to_channel(r), to_channel(g), to_channel(b)]
}

fn golden_color(x: f32, progress: f32) -> [u8; 3] {
    let lightness = (127.0 + (progress * 4.0 * PI + x * 0.02).sin() * 50.0).trunc();
    [
        to_channel((lightness + 50.0).min(255.0)),
        to_channel(lightness.min(255.0)),
        to_channel((lightness - 100.0).max(0.0)),
    ]
}

fn blue_purple_pink_color(x: f32, canvas: &Canvas, progress: f32) -> [u8; 3] {
    let position = (x / canvas.width + progress).rem_euclid(1.0);
    let (r, g, b) = if position < 0.33 {
        let t = position / 0.33;
        (100.0 + t * 155.0, 150.0 * (1.0 - t), 255.0 - t * 100.0)
    } else if position < 0.66 {
        let t = (position - 0.33) / 0.33;
        (255.0 - t * 100.0, t * 100.0, 155.0 + t * 100.0)
    } else {
        let t = (position - 0.66) / 0.34;
        (155.0 - t * 55.0, 100.0 + t * 50.0, 255.0)
    };
    [to_channel(r.trunc()), to_channel(g.trunc()), to_channel(b.trunc())]
}

fn pulse_color(x: f32, y: f32, canvas: &Canvas, progress: f32, saturation: f32) -> [u8; 3] {
    let (center_x, center_y) = canvas.center();
    let distance = ((x - center_x).powi(2) + (y - center_y).powi(2)).sqrt();
    let max_distance = (center_x.powi(2) + center_y.powi(2)).sqrt().max(f32::EPSILON);

    let pulse = (progress * 2.0 * PI * 3.0 - distance / max_distance * 6.0)
        .sin()
        .abs();
    let hue = (distance / max_distance * 360.0 + progress * 360.0).trunc();
    hue_color(hue, pulse * saturation * 2.55)
}

fn rainbow_pulse_color(
    x: f32,
    y: f32,
    canvas: &Canvas,
    progress: f32,
    saturation: f32,
) -> [u8; 3] {
    let (center_x, center_y) = canvas.center();
    let hue = (x / canvas.width * 360.0 + progress * 360.0).trunc();
    let chroma = (saturation * 2.55).trunc().min(255.0);

    let distance = (x - center_x).abs() / center_x.max(f32::EPSILON)
        + (y - center_y).abs() / center_y.max(f32::EPSILON);
    let pulse = (progress * 2.0 * PI * 2.0 - distance * 4.0).sin().abs() * 0.5 + 0.5;
    hue_color(hue, chroma * pulse)
}

fn concentration_color(x: f32, y: f32, canvas: &Canvas, progress: f32) -> [u8; 3] {
    let (center_x, center_y) = canvas.center();
    let angle = (y - center_y).atan2(x - center_x);
    let distance = ((x - center_x).powi(2) + (y - center_y).powi(2)).sqrt();

    let line_intensity = (angle * 8.0 + progress * 2.0 * PI).sin().abs();
    let fade = (1.0 - distance / canvas.width.max(canvas.height)).max(0.0);
    let intensity = to_channel((line_intensity * fade * 255.0).trunc());
    [intensity; 3]
}
