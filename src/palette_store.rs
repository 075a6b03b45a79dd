//! Reference thread palette.
//!
//! The palette is loaded once, validated, and never mutated afterwards.
//! Entries keep their load order; nearest-color ties and symbol assignment
//! both depend on it.

use palette::Srgb;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::{PatternError, Result};

const BUNDLED_PALETTE_JSON: &str = include_str!("../data/dmc_palette.json");

/// DMC thread color entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Position in the palette's load order.
    pub id: usize,
    pub rgb: [u8; 3],
    /// Uppercase, without a leading `#`.
    pub hex_code: String,
    pub display_name: String,
    pub floss_code: String,
}

impl PaletteEntry {
    pub fn new(floss_code: &str, display_name: &str, rgb: [u8; 3]) -> Self {
        Self {
            id: 0,
            rgb,
            hex_code: rgb_to_hex(rgb),
            display_name: display_name.to_string(),
            floss_code: floss_code.to_string(),
        }
    }

    /// Hex code with the leading `#`, for display and rendering.
    pub fn display_hex(&self) -> String {
        format!("#{}", self.hex_code)
    }
}

/// One record of rgb-dmc style palette data. Every field is optional here
/// so that validation can name the missing one.
#[derive(Debug, Deserialize)]
struct RawThread {
    #[serde(default, alias = "code")]
    floss: Option<String>,
    #[serde(default, alias = "name")]
    description: Option<String>,
    #[serde(default)]
    r: Option<u8>,
    #[serde(default)]
    g: Option<u8>,
    #[serde(default)]
    b: Option<u8>,
    #[serde(default)]
    hex: Option<String>,
}

impl RawThread {
    fn into_entry(self, index: usize) -> Result<PaletteEntry> {
        let rgb = match (self.r, self.g, self.b) {
            (Some(r), Some(g), Some(b)) => [r, g, b],
            _ => return Err(PatternError::malformed(index, "missing RGB channel")),
        };

        let display_name = self
            .description
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PatternError::malformed(index, "missing display name"))?;

        if let Some(hex) = self.hex.as_deref().map(str::trim).filter(|hex| !hex.is_empty()) {
            let parsed = Srgb::<u8>::from_str(hex).map_err(|e| {
                PatternError::malformed(index, format!("invalid hex {:?}: {}", hex, e))
            })?;
            let parsed = [parsed.red, parsed.green, parsed.blue];
            if parsed != rgb {
                return Err(PatternError::malformed(
                    index,
                    format!("hex {:?} does not match rgb {:?}", hex, rgb),
                ));
            }
        }
        let hex_code = rgb_to_hex(rgb);

        Ok(PaletteEntry {
            id: index,
            rgb,
            hex_code,
            display_name,
            floss_code: self.floss.unwrap_or_default().trim().to_string(),
        })
    }
}

/// The fixed, ordered reference palette.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    by_hex: HashMap<String, usize>,
    /// For each entry, its position among distinct hex codes in load order.
    distinct_rank: Vec<usize>,
}

static BUNDLED: OnceLock<std::result::Result<Arc<Palette>, (usize, String)>> = OnceLock::new();

impl Palette {
    /// The palette shipped with the crate, parsed on first use.
    pub fn bundled() -> Result<Arc<Palette>> {
        BUNDLED
            .get_or_init(|| {
                Palette::load_json(BUNDLED_PALETTE_JSON)
                    .map(Arc::new)
                    .map_err(|err| match err {
                        PatternError::MalformedPalette { index, reason } => (index, reason),
                        other => (0, other.to_string()),
                    })
            })
            .clone()
            .map_err(|(index, reason)| PatternError::MalformedPalette { index, reason })
    }

    /// Parses a JSON array of palette records.
    pub fn load_json(source: &str) -> Result<Self> {
        let records: Vec<Value> = serde_json::from_str(source)
            .map_err(|e| PatternError::malformed(0, format!("invalid palette JSON: {}", e)))?;

        let entries = records
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<RawThread>(value)
                    .map_err(|e| PatternError::malformed(index, e.to_string()))
                    .and_then(|raw| raw.into_entry(index))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_entries(entries)
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_json(&source)
    }

    /// Builds a palette from entries in load order. Ids are reassigned to
    /// load positions.
    pub fn from_entries(entries: Vec<PaletteEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(PatternError::malformed(0, "palette has no entries"));
        }

        let mut entries = entries;
        let mut by_hex = HashMap::with_capacity(entries.len());
        let mut distinct_rank = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter_mut().enumerate() {
            if entry.display_name.trim().is_empty() {
                return Err(PatternError::malformed(index, "missing display name"));
            }
            entry.id = index;
            entry.hex_code = normalize_hex(&entry.hex_code);

            let next_rank = by_hex.len();
            match by_hex.get(&entry.hex_code) {
                Some(&first) => {
                    log::warn!(
                        "Palette entry {} ({}) repeats hex {} of entry {}",
                        index,
                        entry.floss_code,
                        entry.hex_code,
                        first
                    );
                    distinct_rank.push(distinct_rank[first]);
                }
                None => {
                    by_hex.insert(entry.hex_code.clone(), index);
                    distinct_rank.push(next_rank);
                }
            }
        }

        Ok(Self {
            entries,
            by_hex,
            distinct_rank,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a loaded palette; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaletteEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// O(1) lookup; accepts hex with or without `#`, any case.
    /// Duplicate hex codes resolve to their first entry.
    pub fn index_of_hex(&self, hex: &str) -> Option<usize> {
        self.by_hex.get(&normalize_hex(hex)).copied()
    }

    pub fn by_hex(&self, hex: &str) -> Option<&PaletteEntry> {
        self.index_of_hex(hex).map(|idx| &self.entries[idx])
    }

    /// Number of distinct hex codes.
    pub fn distinct_len(&self) -> usize {
        self.by_hex.len()
    }

    pub fn distinct_rank(&self, index: usize) -> Option<usize> {
        self.distinct_rank.get(index).copied()
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a PaletteEntry;
    type IntoIter = std::slice::Iter<'a, PaletteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Uppercase hex without the leading marker.
pub fn normalize_hex(hex: &str) -> String {
    hex.trim().trim_start_matches('#').to_ascii_uppercase()
}

pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("{:X}", Srgb::new(rgb[0], rgb[1], rgb[2]))
}

pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let srgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
    Some([srgb.red, srgb.green, srgb.blue])
}
