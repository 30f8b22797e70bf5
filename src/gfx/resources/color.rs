//! Hex color parsing for paint rules

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Linear RGB color with an optional explicit alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub rgb: [f32; 3],
    pub alpha: Option<f32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color `{0}` must start with `#`")]
    MissingHash(String),
    #[error("color `{0}` must have 3, 6 or 8 hex digits")]
    BadLength(String),
    #[error("color `{0}` contains a non-hex digit")]
    BadDigit(String),
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            rgb: [r, g, b],
            alpha: None,
        }
    }

    /// RGBA using `fallback_alpha` when the color carries none.
    pub fn to_rgba(&self, fallback_alpha: f32) -> [f32; 4] {
        [
            self.rgb[0],
            self.rgb[1],
            self.rgb[2],
            self.alpha.unwrap_or(fallback_alpha),
        ]
    }

    fn channel(byte: u8) -> f32 {
        byte as f32 / 255.0
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }

        let bytes: Vec<u8> = match digits.len() {
            3 => digits
                .chars()
                .map(|c| {
                    let v = c.to_digit(16).unwrap_or(0) as u8;
                    v * 16 + v
                })
                .collect(),
            6 | 8 => (0..digits.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
                .collect::<Result<_, _>>()
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))?,
            _ => return Err(ColorParseError::BadLength(s.to_string())),
        };

        Ok(Self {
            rgb: [
                Self::channel(bytes[0]),
                Self::channel(bytes[1]),
                Self::channel(bytes[2]),
            ],
            alpha: bytes.get(3).map(|a| Self::channel(*a)),
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            to_byte(self.rgb[0]),
            to_byte(self.rgb[1]),
            to_byte(self.rgb[2])
        )?;
        if let Some(a) = self.alpha {
            write!(f, "{:02X}", to_byte(a))?;
        }
        Ok(())
    }
}
