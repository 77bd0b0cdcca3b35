//! Hex color decoding for the PDF renderer.

use regex::Regex;

lazy_static::lazy_static! {
    static ref HEX_COLOR: Regex =
        Regex::new(r"(?i)^#?([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})$").expect("valid hex color regex");
}

/// Platform purple, used whenever a color cannot be decoded.
pub const FALLBACK: Rgb = Rgb(176, 38, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Components scaled to the 0..=1 range PDF color operators take.
    pub fn unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

/// Decode `#rrggbb` (hash optional, any case). Anything else yields [`FALLBACK`].
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let Some(caps) = HEX_COLOR.captures(hex) else {
        return FALLBACK;
    };
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).unwrap_or(0);
    Rgb(channel(1), channel(2), channel(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_with_and_without_hash() {
        assert_eq!(hex_to_rgb("#FF0000"), Rgb(255, 0, 0));
        assert_eq!(hex_to_rgb("00ff7f"), Rgb(0, 255, 127));
        assert_eq!(hex_to_rgb("#b026FF"), Rgb(176, 38, 255));
    }

    #[test]
    fn test_invalid_input_falls_back() {
        for bad in ["", "#fff", "#1234567", "zzzzzz", "#12345g", " #112233"] {
            assert_eq!(hex_to_rgb(bad), FALLBACK, "input {:?}", bad);
        }
    }

    #[test]
    fn test_unit_scaling() {
        assert_eq!(Rgb::WHITE.unit(), [1.0, 1.0, 1.0]);
        assert_eq!(Rgb(0, 0, 0).unit(), [0.0, 0.0, 0.0]);
    }
}
