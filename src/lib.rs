pub mod config;
pub mod error;
pub mod glyphs;
pub mod image_source;
pub mod legend;
pub mod matcher;
pub mod pages;
pub mod palette_store;
pub mod sampler;
pub mod symbols;

pub use config::{ConversionConfig, PageConfig};
pub use error::{PatternError, Result};
pub use glyphs::{glyph_geometry, Glyph, GlyphRegistry, Point, Primitive};
pub use image_source::SquareBitmap;
pub use legend::extract_legend;
pub use matcher::NearestColorMatcher;
pub use pages::{paginate, PageLayout, PrintPage};
pub use palette_store::{Palette, PaletteEntry};
pub use sampler::{GridSampler, PatternDimensions, PatternGrid};
pub use symbols::{build_symbol_map, symbol_for, SymbolCatalogue, SymbolMap, SymbolSpec};

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// A converted pattern with everything renderers need.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub grid: PatternGrid,
    pub dimensions: PatternDimensions,
    pub legend: Vec<PaletteEntry>,
    pub symbols: SymbolMap,
    pub layout: PageLayout,
    pub page: PageConfig,
}

impl Pattern {
    pub fn pages(&self) -> Vec<PrintPage<'_>> {
        pages::paginate_with_config(&self.grid, self.dimensions, &self.page)
    }

    fn into_result(self, processing_time_ms: u64) -> PatternResult {
        PatternResult {
            grid_size: self.grid.size(),
            dimensions: self.dimensions,
            grid: self.grid.hex_rows(),
            fingerprint: self.grid.fingerprint(),
            legend: self.legend,
            page_layout: self.layout,
            cell_size_mm: self.page.cell_size_mm,
            symbol_map: self.symbols,
            processing_time_ms,
        }
    }
}

/// Serializable conversion output handed to rendering and export.
#[derive(Debug, Clone, Serialize)]
pub struct PatternResult {
    pub grid_size: u32,
    pub dimensions: PatternDimensions,
    /// Row-major `#RRGGBB` codes, `grid_size` rows of `grid_size` cells.
    pub grid: Vec<Vec<String>>,
    pub fingerprint: String,
    pub legend: Vec<PaletteEntry>,
    pub page_layout: PageLayout,
    pub cell_size_mm: f32,
    pub symbol_map: SymbolMap,
    pub processing_time_ms: u64,
}

/// Decode, pad, sample, then derive legend, page layout and symbols.
/// Nothing is returned unless every stage succeeds.
pub fn convert(
    image_bytes: &[u8],
    config: &ConversionConfig,
    palette: Arc<Palette>,
) -> Result<Pattern> {
    config.page.validate()?;
    let bitmap = image_source::load_square_bitmap(image_bytes)?;
    let grid_size = config.resolve_grid_size(bitmap.side())?;

    let mut sampler = GridSampler::new(Arc::clone(&palette)).with_parallel(config.parallel);
    let (grid, dimensions) = sampler.sample_with_dimensions(&bitmap, grid_size)?;

    let legend = extract_legend(&grid);
    let symbols = build_symbol_map(&legend, &palette, &SymbolCatalogue::default());
    let layout = PageLayout::from_config(dimensions, &config.page);

    Ok(Pattern {
        grid,
        dimensions,
        legend,
        symbols,
        layout,
        page: config.page,
    })
}

pub fn process_pattern(
    image_bytes: &[u8],
    config: &ConversionConfig,
    palette: Arc<Palette>,
) -> Result<PatternResult> {
    let start_time = std::time::Instant::now();
    log::info!(
        "Processing cross-stitch pattern: {} bytes, grid size {:?}",
        image_bytes.len(),
        config.grid_size
    );

    let pattern = convert(image_bytes, config, palette)?;
    let result = pattern.into_result(start_time.elapsed().as_millis() as u64);

    log::info!(
        "Pattern processed: {}x{} grid, {}x{} content, {} colors, {} pages, {}ms",
        result.grid_size,
        result.grid_size,
        result.dimensions.width,
        result.dimensions.height,
        result.legend.len(),
        result.page_layout.total_pages,
        result.processing_time_ms
    );

    Ok(result)
}

/// Process from file path instead of bytes
pub fn process_pattern_from_path(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
    palette: Arc<Palette>,
) -> Result<PatternResult> {
    let path = path.as_ref();
    log::info!("Processing cross-stitch pattern from file: {}", path.display());
    let bytes = image_source::read_file(path)?;
    process_pattern(&bytes, config, palette)
}
