//! Per-space display colors.
//!
//! Priority: selection highlight, then the categorical color-by palette,
//! then the ventilation compliance status, then the default color.

use crate::model::{ComplianceStatus, Space};
use crate::store::{CalculationCache, Selection};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// HSL to RGB; `hue` in degrees, `saturation`/`lightness` in 0..=1.
    #[must_use]
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let (s, l) = (saturation.clamp(0.0, 1.0), lightness.clamp(0.0, 1.0));

        if s == 0.0 {
            let v = channel(l);
            return Self(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self(
            channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, h)),
            channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[allow(clippy::cast_sign_loss)]
fn channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub const HIGHLIGHT_COLOR: Rgb = Rgb::from_hex(0xffff00);
pub const DEFAULT_COLOR: Rgb = Rgb::from_hex(0x88ccff);
pub const OK_COLOR: Rgb = Rgb::from_hex(0x2ecc71);
pub const WARNING_COLOR: Rgb = Rgb::from_hex(0xf39c12);
pub const NG_COLOR: Rgb = Rgb::from_hex(0xe74c3c);

pub const SELECTED_OPACITY: f32 = 0.9;
pub const DEFAULT_OPACITY: f32 = 0.7;

const GOLDEN_ANGLE: f64 = 137.508;
const GENERATED_SATURATION: f64 = 0.65;
const GENERATED_LIGHTNESS: f64 = 0.55;

const FIXED_PALETTE: [Rgb; 10] = [
    Rgb::from_hex(0x4e79a7),
    Rgb::from_hex(0xf28e2b),
    Rgb::from_hex(0xe15759),
    Rgb::from_hex(0x76b7b2),
    Rgb::from_hex(0x59a14f),
    Rgb::from_hex(0xedc948),
    Rgb::from_hex(0xb07aa1),
    Rgb::from_hex(0xff9da7),
    Rgb::from_hex(0x9c755f),
    Rgb::from_hex(0xbab0ac),
];

/// Color for the `index`-th distinct value of a palette.
#[must_use]
pub fn palette_color(index: usize) -> Rgb {
    match FIXED_PALETTE.get(index) {
        Some(color) => *color,
        None => {
            let step = (index - FIXED_PALETTE.len()) as f64;
            Rgb::from_hsl(step * GOLDEN_ANGLE, GENERATED_SATURATION, GENERATED_LIGHTNESS)
        }
    }
}

#[must_use]
pub fn status_color(status: ComplianceStatus) -> Rgb {
    match status {
        ComplianceStatus::Ok => OK_COLOR,
        ComplianceStatus::Warning => WARNING_COLOR,
        ComplianceStatus::Ng => NG_COLOR,
    }
}

/// Value → color assignment for one color-by property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Palette {
    pub key: String,
    colors: BTreeMap<String, Rgb>,
}

impl Palette {
    /// Assigns colors to the distinct values of `key` among `spaces`,
    /// in ascending order of the values.
    #[must_use]
    pub fn build<'a>(key: &str, spaces: impl IntoIterator<Item = &'a Space>) -> Self {
        let values: BTreeSet<String> = spaces
            .into_iter()
            .filter_map(|s| s.property_text(key))
            .collect();
        let colors = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| (value, palette_color(i)))
            .collect();
        Self {
            key: key.to_string(),
            colors,
        }
    }

    #[must_use]
    pub fn color_of(&self, value: &str) -> Option<Rgb> {
        self.colors.get(value).copied()
    }

    /// Legend entries in palette order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.colors.iter().map(|(v, c)| (v.as_str(), *c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub color: Rgb,
    pub opacity: f32,
}

/// Inputs of one color resolution pass.
pub struct ColorMapper<'a> {
    pub selection: &'a Selection,
    pub palette: Option<&'a Palette>,
    pub calculations: &'a CalculationCache,
}

impl ColorMapper<'_> {
    #[must_use]
    pub fn resolve(&self, space: &Space) -> Appearance {
        if self.selection.contains(&space.id) {
            return Appearance {
                color: HIGHLIGHT_COLOR,
                opacity: SELECTED_OPACITY,
            };
        }

        let by_property = self.palette.and_then(|palette| {
            space
                .property_text(&palette.key)
                .and_then(|value| palette.color_of(&value))
        });
        let color = by_property
            .or_else(|| self.calculations.status_for(&space.id).map(status_color))
            .unwrap_or(DEFAULT_COLOR);

        Appearance {
            color,
            opacity: DEFAULT_OPACITY,
        }
    }
}
