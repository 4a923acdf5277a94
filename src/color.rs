use serde::{Deserialize, Serialize};

use crate::error::{VeneerError, VeneerResult};

/// Straight (non-premultiplied) RGBA with channels normalized to [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const CLEAR: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Serialize as `0xAARRGGBB`, clamping each channel to [0,1] first.
    ///
    /// Each of green and blue is read from its own channel; the historical
    /// engine had an accessor that copied the red channel into both, which
    /// this implementation deliberately does not reproduce.
    pub fn to_hex(self) -> String {
        fn byte(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        format!(
            "0x{:02X}{:02X}{:02X}{:02X}",
            byte(self.a),
            byte(self.r),
            byte(self.g),
            byte(self.b)
        )
    }

    /// Straight RGBA8, rounding each channel.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn byte(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [byte(self.r), byte(self.g), byte(self.b), byte(self.a)]
    }
}

/// Parse the compact web-color notation used by descriptions.
///
/// Accepts an optional leading `#`, the literal `clear`, or a hex digit run
/// of length 1–5 (expanded toward 6 digits by repeating the pattern, never by
/// zero padding), 6 (`RRGGBB`) or 8 (`AARRGGBB`). Any other length is an
/// `InvalidColorFormat` error.
pub fn parse_web_color(code: &str) -> VeneerResult<Rgba> {
    let s: String = code.trim().chars().filter(|&c| c != '#').collect();

    if s == "clear" {
        return Ok(Rgba::CLEAR);
    }

    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VeneerError::invalid_color(format!(
            "\"{code}\" is not a hex digit run"
        )));
    }

    // Expand the 1-5 digit shorthands by self-repetition.
    let expanded = match s.len() {
        1 => s.repeat(6),
        2 => s.repeat(3),
        3 => s.repeat(2),
        4 => format!("{s}{}", &s[0..2]),
        5 => format!("{s}{}", &s[0..1]),
        6 | 8 => s.clone(),
        n => {
            return Err(VeneerError::invalid_color(format!(
                "hex color \"{code}\" has unsupported length {n}"
            )));
        }
    };

    let value = u32::from_str_radix(&expanded, 16)
        .map_err(|_| VeneerError::invalid_color(format!("\"{code}\" is not a hex digit run")))?;

    let alpha = if expanded.len() == 8 {
        ((value >> 24) & 0xFF) as f64 / 255.0
    } else {
        1.0
    };

    Ok(Rgba {
        r: ((value >> 16) & 0xFF) as f64 / 255.0,
        g: ((value >> 8) & 0xFF) as f64 / 255.0,
        b: (value & 0xFF) as f64 / 255.0,
        a: alpha,
    })
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_web_color(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_rgb_and_argb() {
        let c = parse_web_color("#FF8000").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-9);
        assert!((c.b - 0.0).abs() < 1e-9);
        assert!((c.a - 1.0).abs() < 1e-9);

        let c = parse_web_color("80FF0000").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
        assert!((c.r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shorthand_expands_by_pattern_repetition() {
        assert_eq!(
            parse_web_color("F").unwrap(),
            parse_web_color("FFFFFF").unwrap()
        );
        assert_eq!(
            parse_web_color("FA").unwrap(),
            parse_web_color("FAFAFA").unwrap()
        );
        assert_eq!(
            parse_web_color("ABC").unwrap(),
            parse_web_color("ABCABC").unwrap()
        );
        // 4 and 5 digit runs repeat then truncate toward 6, no zero padding.
        assert_eq!(
            parse_web_color("FFFA").unwrap(),
            parse_web_color("FFFAFF").unwrap()
        );
        assert_eq!(
            parse_web_color("ABCDE").unwrap(),
            parse_web_color("ABCDEA").unwrap()
        );
    }

    #[test]
    fn clear_and_hash_prefix() {
        assert_eq!(parse_web_color("clear").unwrap(), Rgba::CLEAR);
        assert_eq!(
            parse_web_color("#ABC").unwrap(),
            parse_web_color("ABC").unwrap()
        );
    }

    #[test]
    fn rejects_bad_lengths_and_digits() {
        assert!(matches!(
            parse_web_color("ABCDEFA"),
            Err(VeneerError::InvalidColorFormat(_))
        ));
        assert!(matches!(
            parse_web_color(""),
            Err(VeneerError::InvalidColorFormat(_))
        ));
        assert!(matches!(
            parse_web_color("GGG"),
            Err(VeneerError::InvalidColorFormat(_))
        ));
    }

    #[test]
    fn rejects_non_ascii_input_without_panicking() {
        // Multi-byte characters whose UTF-8 length lands on the 4/5 digit
        // shorthand paths must error, not slice mid-character.
        for bad in ["\u{1F4A1}", "é#é", "ﬀﬀ", "#日本"] {
            assert!(matches!(
                parse_web_color(bad),
                Err(VeneerError::InvalidColorFormat(_))
            ));
        }
    }

    #[test]
    fn hex_round_trip_is_exact_for_byte_multiples() {
        for &(r, g, b, a) in &[
            (0u8, 0u8, 0u8, 255u8),
            (255, 128, 64, 255),
            (1, 2, 3, 4),
            (200, 100, 50, 25),
        ] {
            let c = Rgba::rgba(
                r as f64 / 255.0,
                g as f64 / 255.0,
                b as f64 / 255.0,
                a as f64 / 255.0,
            );
            let hex = c.to_hex();
            let back = parse_web_color(hex.trim_start_matches("0x")).unwrap();
            assert_eq!(back.to_rgba8(), [r, g, b, a], "hex was {hex}");
        }
    }

    #[test]
    fn to_hex_reads_each_channel() {
        let c = Rgba::rgba(1.0, 0.5, 0.0, 1.0);
        assert_eq!(c.to_hex(), "0xFFFF8000");
    }

    #[test]
    fn to_hex_clamps_out_of_range_channels() {
        let c = Rgba::rgba(1.5, -0.25, 0.0, 2.0);
        assert_eq!(c.to_hex(), "0xFFFF0000");
    }
}
