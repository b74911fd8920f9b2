//! # Color
//!
//! RGBA color with double-precision components in `0..=1`.

use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component, `0..=1`.
    pub red: f64,
    /// Green component, `0..=1`.
    pub green: f64,
    /// Blue component, `0..=1`.
    pub blue: f64,
    /// Alpha component, `0..=1`.
    pub alpha: f64,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// An opaque color from RGB components.
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// A color from RGBA components.
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Components clamped into `0..=1`.
    pub fn clamped(self) -> Self {
        Self {
            red: self.red.clamp(0.0, 1.0),
            green: self.green.clamp(0.0, 1.0),
            blue: self.blue.clamp(0.0, 1.0),
            alpha: self.alpha.clamp(0.0, 1.0),
        }
    }

    /// Components as `f32`, for GPU-facing or file-facing buffers.
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.red as f32,
            self.green as f32,
            self.blue as f32,
            self.alpha as f32,
        ]
    }

    /// sRGB hex string `#RRGGBBAA` used by 3MF color groups.
    pub fn to_hex_rgba(self) -> String {
        let c = self.clamped();
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            (c.red * 255.0).round() as u8,
            (c.green * 255.0).round() as u8,
            (c.blue * 255.0).round() as u8,
            (c.alpha * 255.0).round() as u8,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_encoding() {
        assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_hex_rgba(), "#FF0000FF");
        assert_eq!(Color::rgba(0.0, 0.0, 0.0, 0.0).to_hex_rgba(), "#00000000");
    }

    #[test]
    fn test_clamping() {
        let c = Color::rgba(2.0, -1.0, 0.5, 1.5).clamped();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.5, 1.0));
    }
}
