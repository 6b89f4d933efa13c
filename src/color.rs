use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MetadataValue;
use crate::error::{PlotError, Result};

/// 8-bit sRGB colour used throughout figures.
pub type Rgb = Srgb<u8>;

/// Grey of the given lightness (`0.0` black, `1.0` white).
pub fn gray(level: f32) -> Rgb {
    let v = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
    Srgb::new(v, v, v)
}

pub const BLACK: Rgb = Srgb::new(0, 0, 0);
pub const WHITE: Rgb = Srgb::new(255, 255, 255);

// ---------------------------------------------------------------------------
// Named palettes
// ---------------------------------------------------------------------------

const SET1: [(u8, u8, u8); 9] = [
    (0xe4, 0x1a, 0x1c),
    (0x37, 0x7e, 0xb8),
    (0x4d, 0xaf, 0x4a),
    (0x98, 0x4e, 0xa3),
    (0xff, 0x7f, 0x00),
    (0xff, 0xff, 0x33),
    (0xa6, 0x56, 0x28),
    (0xf7, 0x81, 0xbf),
    (0x99, 0x99, 0x99),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Qualitative nine-colour set; gamma is ignored.
    #[default]
    Set1,
    /// Blue → red → green gradient.
    Brg,
    /// Evenly spaced hues.
    Hues,
}

impl FromStr for Palette {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "set1" => Ok(Palette::Set1),
            "brg" => Ok(Palette::Brg),
            "hues" | "hsl" => Ok(Palette::Hues),
            other => Err(PlotError::invalid(format!("unknown palette '{other}'"))),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Palette::Set1 => "set1",
            Palette::Brg => "brg",
            Palette::Hues => "hues",
        };
        f.write_str(s)
    }
}

impl Palette {
    pub const ALL: [Palette; 3] = [Palette::Set1, Palette::Brg, Palette::Hues];

    /// Colour at position `t` in `[0, 1]` of a continuous palette.
    fn sample(self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        match self {
            Palette::Set1 => {
                let (r, g, b) = SET1[(t * (SET1.len() - 1) as f32).round() as usize];
                Srgb::new(r, g, b)
            }
            Palette::Brg => {
                let (from, to, u) = if t < 0.5 {
                    ((0.0, 0.0, 1.0), (1.0, 0.0, 0.0), t * 2.0)
                } else {
                    ((1.0, 0.0, 0.0), (0.0, 1.0, 0.0), t * 2.0 - 1.0)
                };
                let lerp = |a: f32, b: f32| a + (b - a) * u;
                let rgb: Srgb = Srgb::new(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2));
                rgb.into_format()
            }
            Palette::Hues => {
                let hsl = Hsl::new(t * 360.0, 0.75, 0.55);
                let rgb: Srgb = hsl.into_color();
                rgb.into_format()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Colour list generator
// ---------------------------------------------------------------------------

/// Generates `n` colours from `palette`.
///
/// `gamma < 1` moves the samples toward the start of a gradient palette,
/// `gamma > 1` toward its end.
pub fn color_list(n: usize, gamma: f32, palette: Palette) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| match palette {
            Palette::Set1 => {
                let (r, g, b) = SET1[i % SET1.len()];
                Srgb::new(r, g, b)
            }
            Palette::Brg => {
                let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.5 };
                palette.sample(t.powf(gamma))
            }
            Palette::Hues => palette.sample((i as f32 / n as f32).powf(gamma)),
        })
        .collect()
}

/// Endless cycle over `color_list(n, gamma, palette)`.
pub fn color_cycle(n: usize, gamma: f32, palette: Palette) -> impl Iterator<Item = Rgb> {
    color_list(n.max(1), gamma, palette).into_iter().cycle()
}

// ---------------------------------------------------------------------------
// Colour parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb`, a grey level such as `"0.7"`, or a basic colour name.
pub fn parse_color(s: &str) -> Result<Rgb> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PlotError::invalid(format!("invalid hex colour '{s}'")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| PlotError::invalid(format!("invalid hex colour '{s}'")))
        };
        return Ok(Srgb::new(channel(0)?, channel(2)?, channel(4)?));
    }
    if let Ok(level) = s.parse::<f32>() {
        if !(0.0..=1.0).contains(&level) {
            return Err(PlotError::invalid(format!(
                "grey level must be within 0..1, got '{s}'"
            )));
        }
        return Ok(gray(level));
    }
    let named = match s.to_ascii_lowercase().as_str() {
        "black" => BLACK,
        "white" => WHITE,
        "red" => Srgb::new(0xd6, 0x27, 0x28),
        "green" => Srgb::new(0x2c, 0xa0, 0x2c),
        "blue" => Srgb::new(0x1f, 0x77, 0xb4),
        "orange" => Srgb::new(0xff, 0x7f, 0x0e),
        "purple" => Srgb::new(0x94, 0x67, 0xbd),
        "gray" | "grey" => gray(0.5),
        _ => return Err(PlotError::invalid(format!("unknown colour '{s}'"))),
    };
    Ok(named)
}

// ---------------------------------------------------------------------------
// Color mapping: metadata value → colour
// ---------------------------------------------------------------------------

/// Maps unique metadata values of a chosen column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<MetadataValue, Rgb>,
    default_color: Rgb,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<MetadataValue>, palette: Palette) -> Self {
        let colors = color_cycle(unique_values.len(), 1.0, palette);
        let mapping = unique_values.iter().cloned().zip(colors).collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: gray(0.5),
        }
    }

    /// Look up the colour for a given metadata value.
    pub fn color_for(&self, value: &MetadataValue) -> Rgb {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Legend entries (value label → colour).
    pub fn legend_entries(&self) -> Vec<(String, Rgb)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_levels() {
        assert_eq!(gray(0.5), Srgb::new(128, 128, 128));
        assert_eq!(gray(1.0), WHITE);
        assert_eq!(gray(2.0), WHITE);
        assert_eq!(gray(0.0), BLACK);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000").unwrap(), Srgb::new(255, 128, 0));
        assert_eq!(parse_color("0.7").unwrap(), gray(0.7));
        assert_eq!(parse_color("Black").unwrap(), BLACK);
        assert!(parse_color("#ff80").unwrap_err().is_invalid_input());
        assert!(parse_color("1.5").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_color_list_lengths() {
        for p in Palette::ALL {
            assert_eq!(color_list(5, 1.0, p).len(), 5);
            assert!(color_list(0, 1.0, p).is_empty());
        }
    }

    #[test]
    fn test_brg_endpoints() {
        let colors = color_list(3, 1.0, Palette::Brg);
        assert_eq!(colors[0], Srgb::new(0, 0, 255));
        assert_eq!(colors[1], Srgb::new(255, 0, 0));
        assert_eq!(colors[2], Srgb::new(0, 255, 0));
    }

    #[test]
    fn test_cycle_repeats() {
        let colors: Vec<Rgb> = color_cycle(2, 1.0, Palette::Set1).take(5).collect();
        assert_eq!(colors[0], colors[2]);
        assert_eq!(colors[1], colors[3]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_palette_from_str() {
        assert_eq!("SET1".parse::<Palette>().unwrap(), Palette::Set1);
        assert_eq!("brg".parse::<Palette>().unwrap(), Palette::Brg);
        assert!("jet".parse::<Palette>().is_err());
    }

    #[test]
    fn test_color_map() {
        let values: BTreeSet<MetadataValue> = ["lncRNA", "protein_coding"]
            .iter()
            .map(|s| MetadataValue::String(s.to_string()))
            .collect();
        let cm = ColorMap::new("biotype", &values, Palette::Set1);
        let a = cm.color_for(&MetadataValue::String("lncRNA".into()));
        let b = cm.color_for(&MetadataValue::String("protein_coding".into()));
        assert_ne!(a, b);
        assert_eq!(cm.color_for(&MetadataValue::Null), gray(0.5));
        assert_eq!(cm.legend_entries().len(), 2);
    }
}
