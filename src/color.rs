use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::{CodedError, INVALID_COLOR};

/// Straight (non-premultiplied) 8-bit RGBA color, written as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`; the leading `#` is optional.
    pub fn parse_hex(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let invalid = || {
            anyhow!(CodedError::usage(
                INVALID_COLOR,
                format!("invalid color '{value}', expected #rgb, #rrggbb or #rrggbbaa"),
            )
            .with_details(json!({ "provided": value })))
        };

        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        match digits.len() {
            3 => {
                let nibble = |index: usize| -> Result<u8> {
                    let v = u8::from_str_radix(&digits[index..index + 1], 16)
                        .map_err(|_| invalid())?;
                    Ok(v * 17)
                };
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: channel(6..8)?,
            }),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// WCAG 2.x relative luminance of the opaque color, in `[0, 1]`.
    pub fn relative_luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse_hex(&value).map_err(|error| format!("{error:#}"))
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

/// WCAG contrast ratio between two colors, in `[1, 21]`.
pub fn contrast_ratio(a: Rgba8, b: Rgba8) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// White or black, whichever reads better on `background`. Ties go to white.
pub fn legible_text_color(background: Rgba8) -> Rgba8 {
    if contrast_ratio(Rgba8::WHITE, background) >= contrast_ratio(Rgba8::BLACK, background) {
        Rgba8::WHITE
    } else {
        Rgba8::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::{contrast_ratio, legible_text_color, Rgba8};
    use crate::error_codes::{find_coded_error, INVALID_COLOR};

    #[test]
    fn parses_short_long_and_alpha_forms() {
        assert_eq!(Rgba8::parse_hex("#fff").unwrap(), Rgba8::WHITE);
        assert_eq!(
            Rgba8::parse_hex("#007bff").unwrap(),
            Rgba8::rgb(0x00, 0x7b, 0xff)
        );
        assert_eq!(
            Rgba8::parse_hex("007BFF20").unwrap(),
            Rgba8::rgb(0x00, 0x7b, 0xff).with_alpha(0x20)
        );
    }

    #[test]
    fn rejects_garbage_with_coded_error() {
        for raw in ["", "#12", "#gggggg", "#12345", "blue"] {
            let error = Rgba8::parse_hex(raw).unwrap_err();
            let coded = find_coded_error(&error).expect("color errors are coded");
            assert_eq!(coded.code, INVALID_COLOR, "input {raw:?}");
        }
    }

    #[test]
    fn hex_output_round_trips_through_serde_string() {
        let color: Rgba8 = serde_yaml::from_str("'#1A2B3C'").unwrap();
        assert_eq!(color.to_hex(), "#1a2b3c");
        let translucent = Rgba8::rgb(1, 2, 3).with_alpha(4);
        assert_eq!(String::from(translucent), "#01020304");
    }

    #[test]
    fn black_on_white_is_maximum_contrast() {
        let ratio = contrast_ratio(Rgba8::BLACK, Rgba8::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(Rgba8::WHITE, Rgba8::WHITE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn legible_text_flips_on_light_accents() {
        assert_eq!(legible_text_color(Rgba8::rgb(0x1a, 0x23, 0x7e)), Rgba8::WHITE);
        assert_eq!(legible_text_color(Rgba8::rgb(0xff, 0xd7, 0x00)), Rgba8::BLACK);
    }
}
