//! RGB colors used for entities, particles and obstacles.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color used for cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unclamped channel values.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }

    /// Look up one of the named colors offered by the color picker.
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        match name {
            "red" => Ok(Self::new(255, 0, 0)),
            "green" => Ok(Self::new(0, 255, 0)),
            "blue" => Ok(Self::new(0, 0, 255)),
            "yellow" => Ok(Self::new(255, 255, 0)),
            "purple" => Ok(Self::new(128, 0, 128)),
            "black" => Ok(Self::new(0, 0, 0)),
            "white" => Ok(Self::new(255, 255, 255)),
            _ => Err(ProtocolError::UnknownColorName(name.to_string())),
        }
    }

    /// Parse a `#rrggbb` string.
    pub fn from_hex(hex: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidHexFormat(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Shift every channel by `delta`, clamping to the valid range.
    #[inline]
    pub fn offset(self, delta: i32) -> Self {
        Self::clamped(
            self.r as i32 + delta,
            self.g as i32 + delta,
            self.b as i32 + delta,
        )
    }

    /// Border color drawn around an entity of this color.
    #[inline]
    pub fn border(self) -> Self {
        self.offset(-20)
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Clamp a channel value to `[0, 255]`.
#[inline]
pub fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Format channels as a CSS `rgb(r, g, b)` string after clamping each one.
pub fn to_rgb_string(r: i32, g: i32, b: i32) -> String {
    Color::clamped(r, g, b).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_string_clamps() {
        assert_eq!(to_rgb_string(-10, 300, 128), "rgb(0, 255, 128)");
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#00ff80").unwrap(), Color::new(0, 255, 128));
        assert_eq!(Color::from_hex("#00FF80").unwrap(), Color::new(0, 255, 128));
    }

    #[test]
    fn test_from_hex_rejects_malformed() {
        for bad in ["00ff80", "#00ff8", "#00ff800", "#00gg80", "", "#+0ff80"] {
            assert!(
                matches!(Color::from_hex(bad), Err(ProtocolError::InvalidHexFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Color::from_name("purple").unwrap(), Color::new(128, 0, 128));
        assert!(matches!(
            Color::from_name("mauve"),
            Err(ProtocolError::UnknownColorName(name)) if name == "mauve"
        ));
    }

    #[test]
    fn test_border_is_darker_and_clamped() {
        assert_eq!(Color::new(10, 100, 255).border(), Color::new(0, 80, 235));
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(Color::new(0, 255, 128).to_hex(), "#00ff80");
    }
}
