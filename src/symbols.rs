//! Assigns each thread color a distinguishable (shape, glyph color) pair for
//! symbolic charts.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::{PatternError, Result};
use crate::glyphs::{self, Glyph, Point, FALLBACK_SHAPE};
use crate::palette_store::{normalize_hex, Palette, PaletteEntry};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(Cow<'static, str>);

impl ShapeId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphColor {
    pub name: Cow<'static, str>,
    pub rgb: [u8; 3],
}

impl GlyphColor {
    pub const fn named(name: &'static str, rgb: [u8; 3]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            rgb,
        }
    }

    /// CSS `rgb(r, g, b)` form for canvas/SVG renderers.
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub shape: ShapeId,
    pub glyph_color: GlyphColor,
}

/// Gray dot returned for colors missing from a symbol map.
pub static FALLBACK_SYMBOL: SymbolSpec = SymbolSpec {
    shape: ShapeId::from_static(FALLBACK_SHAPE),
    glyph_color: GlyphColor::named("gray", [120, 120, 120]),
};

impl SymbolSpec {
    pub fn glyph(&self, center: Point, size: f32) -> Glyph {
        glyphs::glyph_geometry(self.shape.as_str(), center, size)
    }

    pub fn is_fallback(&self) -> bool {
        *self == FALLBACK_SYMBOL
    }
}

const DEFAULT_SHAPES: [&str; 60] = [
    "digit_0", "digit_1", "digit_2", "digit_3", "digit_4", "digit_5", "digit_6", "digit_7",
    "digit_8", "digit_9", "letter_a", "letter_b", "letter_c", "letter_d", "letter_e", "letter_f",
    "letter_g", "letter_h", "letter_j", "letter_k", "letter_l", "letter_m", "letter_n",
    "letter_p", "letter_q", "letter_r", "letter_s", "letter_t", "letter_u", "letter_v",
    "letter_w", "letter_x", "letter_y", "letter_z", "heart", "diamond", "square", "triangle",
    "circle", "pentagon", "hexagon", "octagon", "decagon", "semicircle", "cloud", "star", "ring",
    "arrow_up", "arrow_down", "arrow_left", "arrow_right", "checkmark", "hash", "percent",
    "equals", "bracket", "parenthesis", "quote_mark", "spiral", "zigzag",
];

const DEFAULT_COLORS: [GlyphColor; 12] = [
    GlyphColor::named("dark_gray", [40, 40, 40]),
    GlyphColor::named("gray", [80, 80, 80]),
    GlyphColor::named("black", [0, 0, 0]),
    GlyphColor::named("dark_red", [139, 0, 0]),
    GlyphColor::named("blue", [0, 102, 204]),
    GlyphColor::named("dark_blue", [0, 51, 102]),
    GlyphColor::named("green", [0, 128, 0]),
    GlyphColor::named("dark_green", [0, 80, 0]),
    GlyphColor::named("orange", [255, 140, 0]),
    GlyphColor::named("purple", [102, 0, 102]),
    GlyphColor::named("pink", [200, 50, 100]),
    GlyphColor::named("brown", [139, 69, 19]),
];

/// Shapes × glyph colors available for assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCatalogue {
    shapes: Vec<ShapeId>,
    colors: Vec<GlyphColor>,
}

impl Default for SymbolCatalogue {
    fn default() -> Self {
        Self {
            shapes: DEFAULT_SHAPES.iter().map(|&id| ShapeId::from_static(id)).collect(),
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl SymbolCatalogue {
    pub fn new(shapes: Vec<ShapeId>, colors: Vec<GlyphColor>) -> Result<Self> {
        if shapes.is_empty() || colors.is_empty() {
            return Err(PatternError::configuration(
                "symbol catalogue needs at least one shape and one color",
            ));
        }
        Ok(Self { shapes, colors })
    }

    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    pub fn colors(&self) -> &[GlyphColor] {
        &self.colors
    }

    /// Number of distinct (shape, color) pairs.
    pub fn len(&self) -> usize {
        self.shapes.len() * self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every shape for the first color, then every shape for the next.
    pub fn combinations(&self) -> Vec<SymbolSpec> {
        self.colors
            .iter()
            .flat_map(|color| {
                self.shapes.iter().map(move |shape| SymbolSpec {
                    shape: shape.clone(),
                    glyph_color: color.clone(),
                })
            })
            .collect()
    }
}

/// Normalized hex → assigned symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolMap {
    symbols: BTreeMap<String, SymbolSpec>,
}

impl SymbolMap {
    pub fn get(&self, hex: &str) -> Option<&SymbolSpec> {
        self.symbols.get(&normalize_hex(hex))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolSpec)> + '_ {
        self.symbols.iter().map(|(hex, spec)| (hex.as_str(), spec))
    }

    /// Map covering every color of `palette`.
    pub fn for_palette(palette: &Palette, catalogue: &SymbolCatalogue) -> Self {
        build_symbol_map(palette.entries(), palette, catalogue)
    }
}

/// Assigns symbols by each color's rank among the palette's distinct hex
/// codes in load order, so a color keeps its symbol across legends.
pub fn build_symbol_map(
    legend: &[PaletteEntry],
    palette: &Palette,
    catalogue: &SymbolCatalogue,
) -> SymbolMap {
    let combinations = catalogue.combinations();
    let mut symbols = BTreeMap::new();
    if combinations.is_empty() {
        return SymbolMap { symbols };
    }

    for entry in legend {
        let rank = palette
            .index_of_hex(&entry.hex_code)
            .and_then(|index| palette.distinct_rank(index));
        match rank {
            Some(rank) => {
                symbols.insert(
                    normalize_hex(&entry.hex_code),
                    combinations[rank % combinations.len()].clone(),
                );
            }
            None => log::warn!(
                "Legend color {} ({}) is not in the palette; no symbol assigned",
                entry.hex_code,
                entry.display_name
            ),
        }
    }

    if legend.len() > combinations.len() {
        log::debug!(
            "{} legend colors exceed {} symbol combinations; symbols repeat",
            legend.len(),
            combinations.len()
        );
    }

    SymbolMap { symbols }
}

/// Never fails: unknown colors get [`FALLBACK_SYMBOL`].
pub fn symbol_for<'m>(hex: &str, map: &'m SymbolMap) -> &'m SymbolSpec {
    map.get(hex).unwrap_or(&FALLBACK_SYMBOL)
}
