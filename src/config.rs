use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};

/// Printable page geometry, in pattern cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width_cells: u32,
    pub height_cells: u32,
    /// Physical edge of one printed cell.
    pub cell_size_mm: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_cells: 60,
            height_cells: 85,
            cell_size_mm: 3.0,
        }
    }
}

impl PageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width_cells == 0 || self.height_cells == 0 {
            return Err(PatternError::configuration(format!(
                "page size must be positive, got {}x{} cells",
                self.width_cells, self.height_cells
            )));
        }
        if !(self.cell_size_mm > 0.0) {
            return Err(PatternError::configuration(format!(
                "cell size must be positive, got {} mm",
                self.cell_size_mm
            )));
        }
        Ok(())
    }
}

/// Conversion request settings.
///
/// `grid_size` is chosen by the caller from whatever sizes it offers;
/// the engine only rejects missing, zero, or bitmap-exceeding values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub grid_size: Option<u32>,
    pub page: PageConfig,
    pub parallel: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            grid_size: None,
            page: PageConfig::default(),
            parallel: true,
        }
    }
}

impl ConversionConfig {
    pub fn with_grid_size(grid_size: u32) -> Self {
        Self {
            grid_size: Some(grid_size),
            ..Self::default()
        }
    }

    /// Returns the selected grid size, checked against the bitmap side.
    pub fn resolve_grid_size(&self, bitmap_size: u32) -> Result<u32> {
        let size = self
            .grid_size
            .ok_or_else(|| PatternError::configuration("no grid size selected"))?;
        validate_grid_size(size, bitmap_size)?;
        Ok(size)
    }
}

pub fn validate_grid_size(grid_size: u32, bitmap_size: u32) -> Result<()> {
    if grid_size == 0 {
        return Err(PatternError::configuration("grid size must be positive"));
    }
    if grid_size > bitmap_size {
        return Err(PatternError::configuration(format!(
            "grid size {} exceeds bitmap size {}",
            grid_size, bitmap_size
        )));
    }
    Ok(())
}
