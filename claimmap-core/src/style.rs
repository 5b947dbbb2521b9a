//! Marker style policy
//!
//! Maps the administrative flag of a claim to the line and fill style of its
//! marker. Admin claims use the "danger" palette, everything else the regular
//! one. The owner never influences the style.

use crate::config::{Palette, StyleConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit RGB color as understood by the marker service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RgbRepr", into = "u32")]
pub struct Rgb(u32);

impl Rgb {
    /// Admin claims.
    pub const RED: Rgb = Rgb(0xFF0000);
    /// Regular claims.
    pub const TEAL: Rgb = Rgb(0x009BC8);

    pub const MAX: u32 = 0xFFFFFF;

    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().and_then(Self::new)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<Rgb> for u32 {
    fn from(color: Rgb) -> Self {
        color.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Int(u32),
    Hex(String),
}

impl TryFrom<RgbRepr> for Rgb {
    type Error = String;

    fn try_from(repr: RgbRepr) -> Result<Self, Self::Error> {
        match repr {
            RgbRepr::Int(value) => {
                Rgb::new(value).ok_or_else(|| format!("color {} exceeds 0xFFFFFF", value))
            }
            RgbRepr::Hex(s) => {
                Rgb::parse_hex(&s).ok_or_else(|| format!("invalid color '{}', expected #rrggbb", s))
            }
        }
    }
}

/// Outline of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub weight: u32,
    pub opacity: f64,
    pub color: Rgb,
}

/// Interior of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub opacity: f64,
    pub color: Rgb,
}

/// Complete visual style applied to a claim marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub line: LineStyle,
    pub fill: FillStyle,
}

impl MarkerStyle {
    pub fn for_claim(is_admin: bool, config: &StyleConfig) -> Self {
        let palette: &Palette = if is_admin {
            &config.admin
        } else {
            &config.regular
        };
        Self {
            line: LineStyle {
                weight: config.line_weight,
                opacity: config.line_opacity,
                color: palette.line,
            },
            fill: FillStyle {
                opacity: config.fill_opacity,
                color: palette.fill,
            },
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Style depends only on the admin flag.
        #[test]
        fn prop_style_ignores_everything_but_admin_flag(is_admin in any::<bool>()) {
            let config = StyleConfig::default();
            let expected = if is_admin { Rgb::RED } else { Rgb::TEAL };
            let style = MarkerStyle::for_claim(is_admin, &config);
            prop_assert_eq!(style.line.color, expected);
            prop_assert_eq!(style.fill.color, expected);
        }
    }
}
