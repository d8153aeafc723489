use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::canvas::Rgba;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    /// Hue sweeps across the bands.
    Spectrum,
    Fire,
    Ice,
    Mono([u8; 3]),
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Spectrum
    }
}

impl Palette {
    /// Color for band position `t` (0.0-1.0 across the spectrum) at `level`
    /// (0.0-1.0 energy). Alpha is always opaque.
    pub fn color(&self, t: f32, level: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let level = level.clamp(0.0, 1.0);
        let [r, g, b] = match self {
            Palette::Spectrum => hsv_to_rgb(t * 300.0, 0.85, 0.35 + 0.65 * level),
            Palette::Fire => hsv_to_rgb(60.0 * level, 1.0 - 0.3 * level, 0.45 + 0.55 * level),
            Palette::Ice => hsv_to_rgb(180.0 + 40.0 * t, 0.9 - 0.6 * level, 0.4 + 0.6 * level),
            Palette::Mono(rgb) => {
                let k = 0.35 + 0.65 * level;
                [
                    (rgb[0] as f32 * k) as u8,
                    (rgb[1] as f32 * k) as u8,
                    (rgb[2] as f32 * k) as u8,
                ]
            }
        };
        [r, g, b, 255]
    }
}

impl FromStr for Palette {
    type Err = String;

    /// Accepts `spectrum`, `fire`, `ice`, or a `#rrggbb` mono color.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spectrum" | "rainbow" => Ok(Palette::Spectrum),
            "fire" => Ok(Palette::Fire),
            "ice" => Ok(Palette::Ice),
            other => parse_hex_rgb(other)
                .map(Palette::Mono)
                .ok_or_else(|| format!("unknown palette '{s}'")),
        }
    }
}

/// Parse `#rrggbb`, `rrggbb` or `0xrrggbb`.
pub fn parse_hex_rgb(s: &str) -> Option<[u8; 3]> {
    let hex = s
        .trim()
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = value - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}
