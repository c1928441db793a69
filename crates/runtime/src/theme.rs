//! Theme: named colors, fonts and style presets.
//!
//! Loaded from the `theme` document:
//!
//! ```json
//! {
//!   "colors":  { "accent": "#FF6B35", "bg": { "light": "#FFFFFF", "dark": "#1C1C1E" } },
//!   "fonts":   { "title": { "size": 28, "weight": "bold" } },
//!   "presets": { "card": { "padding": 12, "cornerRadius": 8 } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessera_core::{TaggedValue, ValueMap};
use tracing::debug;

use crate::error::DocumentError;
use crate::source::{load_json, DocumentSource, THEME_DOCUMENT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorDef {
    Fixed(String),
    Adaptive { light: String, dark: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDef {
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
}

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    /// Channels scaled to `0.0..=1.0`, in r, g, b, a order.
    pub fn to_unit(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f64::from(c) / 255.0)
    }
}

/// Parse `RRGGBB` or `AARRGGBB`, with any number of leading or trailing
/// `#`. Any other length is opaque black. Invalid digits read as zero.
pub fn parse_hex(hex: &str) -> Rgba {
    let digits = hex.trim_matches('#');
    let value = u64::from_str_radix(digits, 16).unwrap_or(0);
    let channel = |shift: u32| ((value >> shift) & 0xFF) as u8;
    match digits.chars().count() {
        6 => Rgba {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: 255,
        },
        8 => Rgba {
            a: channel(24),
            r: channel(16),
            g: channel(8),
            b: channel(0),
        },
        _ => Rgba::BLACK,
    }
}

#[derive(Deserialize)]
struct ThemeFile {
    #[serde(default)]
    colors: Option<ValueMap>,
    #[serde(default)]
    fonts: Option<BTreeMap<String, FontDef>>,
    #[serde(default)]
    presets: Option<BTreeMap<String, ValueMap>>,
}

// ──────────────────────────────────────────────
// ThemeEngine
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ThemeEngine {
    colors: BTreeMap<String, ColorDef>,
    fonts: BTreeMap<String, FontDef>,
    presets: BTreeMap<String, ValueMap>,
}

impl ThemeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `theme` document. On error the engine is left unchanged.
    ///
    /// Colors merge into the existing table; fonts and presets are replaced.
    /// Color entries that are neither a string nor a `{light, dark}` pair of
    /// strings are skipped.
    pub fn load(&mut self, source: &dyn DocumentSource) -> Result<(), DocumentError> {
        let theme: ThemeFile = load_json(source, THEME_DOCUMENT)?;

        for (name, value) in theme.colors.unwrap_or_default() {
            if let Some(def) = color_def(&value) {
                self.colors.insert(name, def);
            }
        }
        self.fonts = theme.fonts.unwrap_or_default();
        self.presets = theme.presets.unwrap_or_default();
        debug!(
            colors = self.colors.len(),
            fonts = self.fonts.len(),
            presets = self.presets.len(),
            "loaded theme"
        );
        Ok(())
    }

    pub fn set_color(&mut self, name: impl Into<String>, def: ColorDef) {
        self.colors.insert(name.into(), def);
    }

    pub fn color_def(&self, name: &str) -> Option<&ColorDef> {
        self.colors.get(name)
    }

    /// Hex string for a named color. Unknown names are assumed to be raw
    /// hex already and come back unchanged.
    pub fn color_hex<'a>(&'a self, name: &'a str, appearance: Appearance) -> &'a str {
        match self.colors.get(name) {
            None => name,
            Some(ColorDef::Fixed(hex)) => hex,
            Some(ColorDef::Adaptive { light, dark }) => match appearance {
                Appearance::Light => light,
                Appearance::Dark => dark,
            },
        }
    }

    pub fn color(&self, name: &str, appearance: Appearance) -> Rgba {
        parse_hex(self.color_hex(name, appearance))
    }

    /// Flat name → hex table using the light variant of adaptive colors.
    pub fn light_colors(&self) -> BTreeMap<String, String> {
        self.colors
            .keys()
            .map(|name| {
                (
                    name.clone(),
                    self.color_hex(name, Appearance::Light).to_string(),
                )
            })
            .collect()
    }

    pub fn font(&self, name: &str) -> Option<&FontDef> {
        self.fonts.get(name)
    }

    /// A named preset, or an empty map.
    pub fn preset(&self, name: &str) -> ValueMap {
        self.presets.get(name).cloned().unwrap_or_default()
    }

    /// The effective style of a node: its named preset, then its inline
    /// overrides on top.
    pub fn merged_style(&self, style: Option<&str>, inline: Option<&ValueMap>) -> ValueMap {
        let mut merged = style
            .and_then(|name| self.presets.get(name))
            .cloned()
            .unwrap_or_default();
        if let Some(inline) = inline {
            for (k, v) in inline {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

fn color_def(value: &TaggedValue) -> Option<ColorDef> {
    if let Some(hex) = value.as_str() {
        return Some(ColorDef::Fixed(hex.to_string()));
    }
    let pair = value.as_object()?;
    let light = pair.get("light")?.as_str()?;
    let dark = pair.get("dark")?.as_str()?;
    Some(ColorDef::Adaptive {
        light: light.to_string(),
        dark: dark.to_string(),
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
