//! Grid sampling: averages square cells of the bitmap and maps each cell to
//! its nearest palette thread.
//!
//! Rows are independent, so the parallel path splits them across rayon
//! workers, each with its own cache shard; shards are merged back into the
//! matcher once every row has been sampled.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::validate_grid_size;
use crate::error::{PatternError, Result};
use crate::image_source::SquareBitmap;
use crate::matcher::{NearestColorMatcher, QuantizationCache};
use crate::palette_store::{Palette, PaletteEntry};

/// G×G row-major grid of palette threads. Immutable once built.
#[derive(Debug, Clone)]
pub struct PatternGrid {
    palette: Arc<Palette>,
    size: u32,
    cells: Vec<usize>,
}

impl PatternGrid {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&PaletteEntry> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let idx = self.cells[(y * self.size + x) as usize];
        self.palette.get(idx)
    }

    /// Palette indices, row-major.
    pub fn indices(&self) -> &[usize] {
        &self.cells
    }

    /// All cells, row-major.
    pub fn iter(&self) -> impl Iterator<Item = &PaletteEntry> + '_ {
        self.cells.iter().map(move |&idx| &self.palette.entries()[idx])
    }

    pub fn row(&self, y: u32) -> Option<Vec<&PaletteEntry>> {
        if y >= self.size {
            return None;
        }
        let start = (y * self.size) as usize;
        let end = start + self.size as usize;
        Some(
            self.cells[start..end]
                .iter()
                .map(|&idx| &self.palette.entries()[idx])
                .collect(),
        )
    }

    /// Display hex codes (`#RRGGBB`) per row, for serialization.
    pub fn hex_rows(&self) -> Vec<Vec<String>> {
        self.cells
            .chunks(self.size.max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(|&idx| self.palette.entries()[idx].display_hex())
                    .collect()
            })
            .collect()
    }

    /// SHA-256 over the grid size and row-major hex codes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.size.to_le_bytes());
        for entry in self.iter() {
            hasher.update(entry.hex_code.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Content extent of a pattern, excluding the square padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDimensions {
    pub width: u32,
    pub height: u32,
}

impl PatternDimensions {
    /// `round(original / cell_size)` per axis, where `cell_size = bitmap_size / G`.
    pub fn from_original(
        original_width: u32,
        original_height: u32,
        bitmap_size: u32,
        grid_size: u32,
    ) -> Self {
        let cell_size = bitmap_size as f64 / grid_size as f64;
        let to_cells = |len: u32| ((len as f64 / cell_size).round() as u32).min(grid_size);
        Self {
            width: to_cells(original_width),
            height: to_cells(original_height),
        }
    }

    pub fn for_bitmap(bitmap: &SquareBitmap, grid_size: u32) -> Self {
        Self::from_original(
            bitmap.original_width(),
            bitmap.original_height(),
            bitmap.side(),
            grid_size,
        )
    }
}

/// Pixel bounds of the cells along one axis.
struct CellLayout<'a> {
    pixels: &'a [u8],
    side: u32,
    cell_px: u32,
}

impl CellLayout<'_> {
    fn bounds(&self, index: u32) -> (u32, u32) {
        let start = index * self.cell_px;
        let end = (start + self.cell_px).min(self.side);
        (start, end)
    }

    /// Byte range of pixels `x0..x1` in row `py` of the RGBA buffer.
    fn row_span(&self, py: u32, x0: u32, x1: u32) -> std::ops::Range<usize> {
        let row = py as usize * self.side as usize;
        (row + x0 as usize) * 4..(row + x1 as usize) * 4
    }

    /// Mean RGB of a cell, rounded per channel; alpha ignored.
    fn average(&self, x: u32, y: u32) -> Result<[u8; 3]> {
        let (x0, x1) = self.bounds(x);
        let (y0, y1) = self.bounds(y);
        if x1 <= x0 || y1 <= y0 {
            return Err(PatternError::EmptyCell { x, y });
        }

        let mut sums = [0u64; 3];
        for py in y0..y1 {
            for px in self.pixels[self.row_span(py, x0, x1)].chunks_exact(4) {
                sums[0] += px[0] as u64;
                sums[1] += px[1] as u64;
                sums[2] += px[2] as u64;
            }
        }

        let count = cell_area(x0, x1, y0, y1);
        Ok(sums.map(|sum| ((sum * 2 + count) / (count * 2)) as u8))
    }
}

fn cell_area(x0: u32, x1: u32, y0: u32, y1: u32) -> u64 {
    (x1 - x0) as u64 * (y1 - y0) as u64
}

#[derive(Default)]
struct Shard {
    cache: QuantizationCache,
    rows: Vec<(u32, Vec<usize>)>,
}

impl Shard {
    fn absorb(mut self, other: Shard) -> Self {
        self.cache.merge(other.cache);
        self.rows.extend(other.rows);
        self
    }
}

fn sample_row(
    layout: &CellLayout<'_>,
    palette: &Palette,
    cache: &mut QuantizationCache,
    grid_size: u32,
    y: u32,
) -> Result<Vec<usize>> {
    (0..grid_size)
        .map(|x| {
            let average = layout.average(x, y)?;
            Ok(cache.lookup(palette, average))
        })
        .collect()
}

/// Drives the matcher over every cell of a square bitmap.
#[derive(Debug, Clone)]
pub struct GridSampler {
    matcher: NearestColorMatcher,
    parallel: bool,
}

impl GridSampler {
    pub fn new(palette: Arc<Palette>) -> Self {
        Self {
            matcher: NearestColorMatcher::new(palette),
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn matcher(&self) -> &NearestColorMatcher {
        &self.matcher
    }

    pub fn matcher_mut(&mut self) -> &mut NearestColorMatcher {
        &mut self.matcher
    }

    /// Builds the G×G pattern grid. Cells are `floor(side / G)` pixels wide;
    /// leftover pixels at the right and bottom edges are not sampled.
    /// Nothing is returned unless every cell succeeds.
    pub fn sample(&mut self, bitmap: &SquareBitmap, grid_size: u32) -> Result<PatternGrid> {
        let side = bitmap.side();
        validate_grid_size(grid_size, side)?;

        self.matcher.reset();
        let palette = Arc::clone(self.matcher.palette());
        let layout = CellLayout {
            pixels: bitmap.image().as_raw(),
            side,
            cell_px: side / grid_size,
        };

        let shard = if self.parallel {
            (0..grid_size)
                .into_par_iter()
                .try_fold(Shard::default, |mut shard, y| {
                    let row = sample_row(&layout, &palette, &mut shard.cache, grid_size, y)?;
                    shard.rows.push((y, row));
                    Ok::<Shard, PatternError>(shard)
                })
                .try_reduce(Shard::default, |a, b| Ok(a.absorb(b)))?
        } else {
            let mut shard = Shard::default();
            for y in 0..grid_size {
                let row = sample_row(&layout, &palette, &mut shard.cache, grid_size, y)?;
                shard.rows.push((y, row));
            }
            shard
        };

        let Shard { cache, mut rows } = shard;
        rows.sort_unstable_by_key(|(y, _)| *y);
        let cells: Vec<usize> = rows.into_iter().flat_map(|(_, row)| row).collect();

        log::debug!(
            "Sampled {}x{} grid from {}px bitmap: {} buckets, {} hits, {} misses",
            grid_size,
            grid_size,
            side,
            cache.len(),
            cache.hits(),
            cache.misses()
        );
        self.matcher.absorb(cache);

        Ok(PatternGrid {
            palette,
            size: grid_size,
            cells,
        })
    }

    pub fn sample_with_dimensions(
        &mut self,
        bitmap: &SquareBitmap,
        grid_size: u32,
    ) -> Result<(PatternGrid, PatternDimensions)> {
        let grid = self.sample(bitmap, grid_size)?;
        Ok((grid, PatternDimensions::for_bitmap(bitmap, grid_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette_store::PaletteEntry;
    use image::{Rgba, RgbaImage};

    fn test_palette() -> Arc<Palette> {
        Arc::new(
            Palette::from_entries(vec![
                PaletteEntry::new("310", "Black", [0, 0, 0]),
                PaletteEntry::new("B5200", "Snow White", [255, 255, 255]),
                PaletteEntry::new("666", "Bright Red", [236, 33, 48]),
                PaletteEntry::new("700", "Bright Green", [46, 125, 9]),
                PaletteEntry::new("797", "Royal Blue", [19, 67, 141]),
            ])
            .unwrap(),
        )
    }

    fn square(side: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> SquareBitmap {
        let img = RgbaImage::from_fn(side, side, |x, y| {
            let [r, g, b] = f(x, y);
            Rgba([r, g, b, 255])
        });
        SquareBitmap::new(img, side, side).unwrap()
    }

    #[test]
    fn two_by_two_red_over_black() {
        let bitmap = square(2, |_, y| if y == 0 { [255, 0, 0] } else { [0, 0, 0] });
        let mut sampler = GridSampler::new(test_palette());
        let grid = sampler.sample(&bitmap, 2).unwrap();

        assert_eq!(grid.get(0, 0).unwrap().floss_code, "666");
        assert_eq!(grid.get(1, 0).unwrap().floss_code, "666");
        assert_eq!(grid.get(0, 1).unwrap().floss_code, "310");
        assert_eq!(grid.get(1, 1).unwrap().floss_code, "310");
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn two_by_two_against_bundled_palette() {
        let palette = Palette::bundled().unwrap();
        let bitmap = square(2, |_, y| if y == 0 { [255, 0, 0] } else { [0, 0, 0] });
        let mut sampler = GridSampler::new(palette.clone()).with_parallel(false);
        let grid = sampler.sample(&bitmap, 2).unwrap();

        let matcher = NearestColorMatcher::new(palette);
        assert_eq!(grid.get(0, 0), Some(matcher.closest_exact([255, 0, 0])));
        assert_eq!(grid.get(1, 1), Some(matcher.closest_exact([0, 0, 0])));
        assert_eq!(grid.get(1, 1).unwrap().floss_code, "310");
    }

    #[test]
    fn averages_round_to_nearest() {
        // Each 2x2 cell holds three 0s and one 2 on the red channel: mean 0.5 -> 1.
        let bitmap = square(4, |x, y| {
            if x % 2 == 0 && y % 2 == 0 {
                [2, 0, 0]
            } else {
                [0, 0, 0]
            }
        });
        let layout = CellLayout {
            pixels: bitmap.image().as_raw(),
            side: 4,
            cell_px: 2,
        };
        assert_eq!(layout.average(1, 1).unwrap(), [1, 0, 0]);
    }

    #[test]
    fn offsets_hold_for_very_large_bitmaps() {
        let side = 40_000u32;
        let layout = CellLayout {
            pixels: &[],
            side,
            cell_px: 20_000,
        };
        let span = layout.row_span(side - 1, 20_000, side);
        assert_eq!(span.end, side as usize * side as usize * 4);
        assert_eq!(span.len(), 20_000 * 4);
        assert_eq!(cell_area(20_000, side, 20_000, side), 400_000_000);
        assert_eq!(cell_area(0, side, 0, side), 1_600_000_000);
    }

    #[test]
    fn uneven_division_crops_the_remainder() {
        // 5px / 2 cells = 2px cells; column and row 4 are never sampled.
        let bitmap = square(5, |x, y| {
            if x == 4 || y == 4 {
                [255, 255, 255]
            } else {
                [0, 0, 0]
            }
        });
        let grid = GridSampler::new(test_palette()).sample(&bitmap, 2).unwrap();
        assert!(grid.iter().all(|entry| entry.floss_code == "310"));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let bitmap = square(60, |x, y| [(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]);
        let palette = Palette::bundled().unwrap();

        let mut parallel = GridSampler::new(palette.clone());
        let mut sequential = GridSampler::new(palette).with_parallel(false);
        let a = parallel.sample(&bitmap, 30).unwrap();
        let b = sequential.sample(&bitmap, 30).unwrap();

        assert_eq!(a.indices(), b.indices());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(parallel.matcher().cache_len(), sequential.matcher().cache_len());
    }

    #[test]
    fn repeated_runs_are_identical_and_reset_the_cache() {
        let bitmap = square(30, |x, y| [(x * 8) as u8, 100, (y * 8) as u8]);
        let mut sampler = GridSampler::new(Palette::bundled().unwrap());

        let first = sampler.sample(&bitmap, 15).unwrap();
        let buckets = sampler.matcher().cache_len();

        // A warm cache from another image must not change the result.
        let other = square(30, |_, _| [10, 200, 30]);
        sampler.sample(&other, 10).unwrap();
        assert_eq!(sampler.matcher().cache_len(), 1);

        let second = sampler.sample(&bitmap, 15).unwrap();
        assert_eq!(first.indices(), second.indices());
        assert_eq!(sampler.matcher().cache_len(), buckets);
    }

    #[test]
    fn rejects_invalid_grid_sizes() {
        let bitmap = square(4, |_, _| [0, 0, 0]);
        let mut sampler = GridSampler::new(test_palette());
        assert!(matches!(
            sampler.sample(&bitmap, 0),
            Err(PatternError::Configuration(_))
        ));
        assert!(matches!(
            sampler.sample(&bitmap, 5),
            Err(PatternError::Configuration(_))
        ));
    }

    #[test]
    fn zero_pixel_cells_are_errors() {
        let bitmap = square(4, |_, _| [0, 0, 0]);
        let layout = CellLayout {
            pixels: bitmap.image().as_raw(),
            side: 4,
            cell_px: 0,
        };
        assert!(matches!(
            layout.average(2, 3),
            Err(PatternError::EmptyCell { x: 2, y: 3 })
        ));
    }

    #[test]
    fn dimensions_follow_original_aspect() {
        // 400x600 padded to 600, sampled at 300: cell size 2px.
        let dims = PatternDimensions::from_original(400, 600, 600, 300);
        assert_eq!(dims, PatternDimensions { width: 200, height: 300 });

        let dims = PatternDimensions::from_original(1000, 333, 1000, 150);
        assert_eq!(dims.width, 150);
        assert_eq!(dims.height, 50);
    }

    #[test]
    fn hex_rows_and_fingerprint() {
        let bitmap = square(2, |x, _| if x == 0 { [0, 0, 0] } else { [255, 255, 255] });
        let grid = GridSampler::new(test_palette()).sample(&bitmap, 2).unwrap();
        assert_eq!(
            grid.hex_rows(),
            vec![
                vec!["#000000".to_string(), "#FFFFFF".to_string()],
                vec!["#000000".to_string(), "#FFFFFF".to_string()],
            ]
        );
        assert_eq!(grid.fingerprint().len(), 64);

        let flipped = square(2, |x, _| if x == 1 { [0, 0, 0] } else { [255, 255, 255] });
        let other = GridSampler::new(test_palette()).sample(&flipped, 2).unwrap();
        assert_ne!(grid.fingerprint(), other.fingerprint());
    }
}
