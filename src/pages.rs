//! Splits a pattern's content area into printable pages.
//!
//! Page-local coordinates are content coordinates; they are shifted by the
//! centering offset `(G - extent) / 2` and rounded to reach a grid cell. For
//! odd differences the offset is fractional and rounding pulls the content
//! window half a cell toward the bottom-right.

use serde::Serialize;

use crate::config::PageConfig;
use crate::palette_store::PaletteEntry;
use crate::sampler::{PatternDimensions, PatternGrid};

/// Page counts for a pattern at a given page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLayout {
    pub page_width_cells: u32,
    pub page_height_cells: u32,
    pub pages_horizontal: u32,
    pub pages_vertical: u32,
    pub total_pages: u32,
}

impl PageLayout {
    /// A zero page width or height yields no pages.
    pub fn new(dims: PatternDimensions, page_width_cells: u32, page_height_cells: u32) -> Self {
        let (pages_horizontal, pages_vertical) = if page_width_cells == 0 || page_height_cells == 0
        {
            (0, 0)
        } else {
            (
                dims.width.div_ceil(page_width_cells),
                dims.height.div_ceil(page_height_cells),
            )
        };
        Self {
            page_width_cells,
            page_height_cells,
            pages_horizontal,
            pages_vertical,
            total_pages: pages_horizontal * pages_vertical,
        }
    }

    pub fn from_config(dims: PatternDimensions, page: &PageConfig) -> Self {
        Self::new(dims, page.width_cells, page.height_cells)
    }

    /// Content-space origin of a page; pages run left to right, then down.
    pub fn page_origin(&self, page_index: u32) -> (u32, u32) {
        let columns = self.pages_horizontal.max(1);
        let col = page_index % columns;
        let row = page_index / columns;
        (col * self.page_width_cells, row * self.page_height_cells)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintPage<'g> {
    pub page_index: u32,
    pub start_x: u32,
    pub start_y: u32,
    /// `None` where the shifted coordinate falls outside the grid.
    pub cells: Vec<Vec<Option<&'g PaletteEntry>>>,
}

impl PrintPage<'_> {
    pub fn width_cells(&self) -> u32 {
        self.cells.first().map_or(0, |row| row.len() as u32)
    }

    pub fn height_cells(&self) -> u32 {
        self.cells.len() as u32
    }

    pub fn physical_size_mm(&self, cell_size_mm: f32) -> (f32, f32) {
        (
            self.width_cells() as f32 * cell_size_mm,
            self.height_cells() as f32 * cell_size_mm,
        )
    }
}

/// Maps a content coordinate into the padded grid.
pub fn content_to_grid(x: u32, y: u32, dims: PatternDimensions, grid_size: u32) -> (i64, i64) {
    let offset_x = (grid_size as f64 - dims.width as f64) / 2.0;
    let offset_y = (grid_size as f64 - dims.height as f64) / 2.0;
    (
        (x as f64 + offset_x).round() as i64,
        (y as f64 + offset_y).round() as i64,
    )
}

/// Pages run left to right, then down. Zero page sizes yield no pages.
pub fn paginate<'g>(
    grid: &'g PatternGrid,
    dims: PatternDimensions,
    grid_size: u32,
    page_width_cells: u32,
    page_height_cells: u32,
) -> Vec<PrintPage<'g>> {
    let layout = PageLayout::new(dims, page_width_cells, page_height_cells);
    (0..layout.total_pages)
        .map(|page_index| build_page(grid, dims, grid_size, &layout, page_index))
        .collect()
}

pub fn paginate_with_config<'g>(
    grid: &'g PatternGrid,
    dims: PatternDimensions,
    page: &PageConfig,
) -> Vec<PrintPage<'g>> {
    paginate(grid, dims, grid.size(), page.width_cells, page.height_cells)
}

fn build_page<'g>(
    grid: &'g PatternGrid,
    dims: PatternDimensions,
    grid_size: u32,
    layout: &PageLayout,
    page_index: u32,
) -> PrintPage<'g> {
    let (start_x, start_y) = layout.page_origin(page_index);
    let end_x = (start_x + layout.page_width_cells).min(dims.width);
    let end_y = (start_y + layout.page_height_cells).min(dims.height);
    let bound = grid_size as i64;

    let cells = (start_y..end_y)
        .map(|y| {
            (start_x..end_x)
                .map(|x| {
                    let (gx, gy) = content_to_grid(x, y, dims, grid_size);
                    if gx < 0 || gy < 0 || gx >= bound || gy >= bound {
                        None
                    } else {
                        grid.get(gx as u32, gy as u32)
                    }
                })
                .collect()
        })
        .collect();

    PrintPage {
        page_index,
        start_x,
        start_y,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::SquareBitmap;
    use crate::palette_store::Palette;
    use crate::sampler::GridSampler;
    use image::{Rgba, RgbaImage};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn striped_grid(size: u32) -> PatternGrid {
        let palette = Arc::new(
            Palette::from_entries(vec![
                PaletteEntry::new("310", "Black", [0, 0, 0]),
                PaletteEntry::new("B5200", "Snow White", [255, 255, 255]),
            ])
            .unwrap(),
        );
        let img = RgbaImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let bitmap = SquareBitmap::new(img, size, size).unwrap();
        GridSampler::new(palette).sample(&bitmap, size).unwrap()
    }

    #[test]
    fn page_counts_for_portrait_pattern() {
        let dims = PatternDimensions {
            width: 200,
            height: 300,
        };
        let layout = PageLayout::new(dims, 60, 85);
        assert_eq!(layout.pages_horizontal, 4);
        assert_eq!(layout.pages_vertical, 4);
        assert_eq!(layout.total_pages, 16);
        assert_eq!(layout.page_origin(0), (0, 0));
        assert_eq!(layout.page_origin(3), (180, 0));
        assert_eq!(layout.page_origin(4), (0, 85));
        assert_eq!(content_to_grid(0, 0, dims, 300), (50, 0));
    }

    #[test]
    fn first_page_is_offset_past_the_padding() {
        let grid = striped_grid(300);
        let dims = PatternDimensions {
            width: 200,
            height: 300,
        };
        let pages = paginate(&grid, dims, 300, 60, 85);
        assert_eq!(pages.len(), 16);

        let first = &pages[0];
        assert_eq!((first.start_x, first.start_y), (0, 0));
        assert_eq!(first.width_cells(), 60);
        assert_eq!(first.height_cells(), 85);
        assert_eq!(first.cells[0][0], grid.get(50, 0));
        assert_eq!(first.cells[84][59], grid.get(109, 84));

        let last = &pages[15];
        assert_eq!((last.start_x, last.start_y), (180, 255));
        assert_eq!(last.width_cells(), 20);
        assert_eq!(last.height_cells(), 45);
        assert_eq!(last.physical_size_mm(3.0), (60.0, 135.0));
    }

    #[test]
    fn pages_cover_content_exactly_once() {
        let grid = striped_grid(31);
        for (width, height) in [(31, 31), (20, 31), (31, 7), (1, 31), (30, 29)] {
            let dims = PatternDimensions { width, height };
            let pages = paginate(&grid, dims, 31, 6, 8);

            let mut seen = HashSet::new();
            for page in &pages {
                for (dy, row) in page.cells.iter().enumerate() {
                    for (dx, cell) in row.iter().enumerate() {
                        let x = page.start_x + dx as u32;
                        let y = page.start_y + dy as u32;
                        assert!(x < width && y < height);
                        assert!(seen.insert((x, y)), "({}, {}) appears twice", x, y);
                        assert!(cell.is_some());
                    }
                }
            }
            assert_eq!(seen.len(), (width * height) as usize);
        }
    }

    #[test]
    fn odd_padding_rounds_toward_the_far_edge() {
        // (31 - 30) / 2 = 0.5, so content x = 0 reads grid column 1.
        let dims = PatternDimensions {
            width: 30,
            height: 31,
        };
        assert_eq!(content_to_grid(0, 0, dims, 31), (1, 0));
        assert_eq!(content_to_grid(29, 30, dims, 31), (30, 30));
    }

    #[test]
    fn out_of_bounds_cells_are_none() {
        let grid = striped_grid(10);
        // Dimensions wider than the grid push the shifted coordinate negative.
        let dims = PatternDimensions {
            width: 14,
            height: 10,
        };
        let pages = paginate(&grid, dims, 10, 20, 20);
        assert_eq!(pages.len(), 1);
        let row = &pages[0].cells[0];
        assert_eq!(row.len(), 14);
        assert!(row[0].is_none());
        assert!(row[1].is_none());
        assert!(row[2].is_some());
        assert!(row[13].is_none());
    }

    #[test]
    fn zero_page_size_has_no_pages() {
        let grid = striped_grid(30);
        let dims = PatternDimensions {
            width: 20,
            height: 30,
        };
        for (pw, ph) in [(0, 85), (60, 0), (0, 0)] {
            let layout = PageLayout::new(dims, pw, ph);
            assert_eq!(layout.total_pages, 0);
            assert!(paginate(&grid, dims, 30, pw, ph).is_empty());
        }
    }

    #[test]
    fn empty_dimensions_have_no_pages() {
        let grid = striped_grid(4);
        let dims = PatternDimensions {
            width: 0,
            height: 4,
        };
        assert!(paginate(&grid, dims, 4, 60, 85).is_empty());
    }
}
