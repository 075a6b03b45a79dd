//! Nearest-thread lookup in RGB space: a linear scan per miss, with
//! repeated lookups within one conversion served by a [`QuantizationCache`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::palette_store::{Palette, PaletteEntry};

/// Channel step of the quantization grid.
pub const QUANT_STEP: u8 = 3;

/// Cache bucket: each channel rounded to the nearest multiple of [`QUANT_STEP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantKey(pub [u8; 3]);

impl QuantKey {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self(rgb.map(quantize_channel))
    }

    /// The bucket's representative color; every member of the bucket is
    /// matched as this color.
    pub fn representative(self) -> [u8; 3] {
        self.0
    }
}

impl std::fmt::Display for QuantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

fn quantize_channel(value: u8) -> u8 {
    let step = QUANT_STEP as u16;
    let rounded = ((value as u16 + step / 2) / step) * step;
    // 255 is itself a multiple of 3, so this never exceeds u8::MAX.
    rounded.min(u8::MAX as u16) as u8
}

/// Squared Euclidean distance between two RGB triples.
#[inline]
pub fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Index of the closest palette entry. Ties keep the first entry in load order.
pub fn nearest_index(palette: &Palette, rgb: [u8; 3]) -> usize {
    let mut best_idx = 0usize;
    let mut best_dist = u32::MAX;
    for (idx, entry) in palette.iter().enumerate() {
        let dist = distance_sq(rgb, entry.rgb);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
            if dist == 0 {
                break;
            }
        }
    }
    best_idx
}

/// Quantized color → palette index, scoped to one pattern synthesis.
#[derive(Debug, Default, Clone)]
pub struct QuantizationCache {
    entries: HashMap<QuantKey, usize>,
    hits: u64,
    misses: u64,
}

impl QuantizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette index for `rgb`, scanning only on a bucket miss.
    pub fn lookup(&mut self, palette: &Palette, rgb: [u8; 3]) -> usize {
        let key = QuantKey::from_rgb(rgb);
        if let Some(&idx) = self.entries.get(&key) {
            self.hits += 1;
            return idx;
        }
        self.misses += 1;
        let idx = nearest_index(palette, key.representative());
        self.entries.insert(key, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Folds another shard into this one. Both shards were filled against
    /// the same palette, so overlapping keys agree.
    pub fn merge(&mut self, other: QuantizationCache) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.entries.extend(other.entries);
    }
}

/// Nearest-color matcher owning its palette handle and per-run cache.
#[derive(Debug, Clone)]
pub struct NearestColorMatcher {
    palette: Arc<Palette>,
    cache: QuantizationCache,
}

impl NearestColorMatcher {
    pub fn new(palette: Arc<Palette>) -> Self {
        Self {
            palette,
            cache: QuantizationCache::new(),
        }
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    /// Cached lookup. Every color in a quantization bucket resolves to the
    /// entry nearest the bucket's representative.
    pub fn closest(&mut self, rgb: [u8; 3]) -> &PaletteEntry {
        let idx = self.cache.lookup(&self.palette, rgb);
        &self.palette.entries()[idx]
    }

    /// Uncached scan against the exact color.
    pub fn closest_exact(&self, rgb: [u8; 3]) -> &PaletteEntry {
        &self.palette.entries()[nearest_index(&self.palette, rgb)]
    }

    /// Must be called before each new conversion.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Swaps the palette; cached indices refer to the old one and are dropped.
    pub fn replace_palette(&mut self, palette: Arc<Palette>) {
        self.palette = palette;
        self.cache.clear();
    }

    pub fn cache(&self) -> &QuantizationCache {
        &self.cache
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn absorb(&mut self, shard: QuantizationCache) {
        self.cache.merge(shard);
    }
}
