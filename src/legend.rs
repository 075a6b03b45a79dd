use std::cmp::Ordering;
use std::collections::HashSet;

use crate::palette_store::PaletteEntry;
use crate::sampler::PatternGrid;

/// Threads used by `grid`, one per hex code, sorted by display name.
pub fn extract_legend(grid: &PatternGrid) -> Vec<PaletteEntry> {
    extract_legend_from(grid.iter())
}

/// Dedup by hex (first occurrence wins), then sort by display name.
pub fn extract_legend_from<'a>(
    cells: impl IntoIterator<Item = &'a PaletteEntry>,
) -> Vec<PaletteEntry> {
    let mut seen = HashSet::new();
    let mut legend: Vec<PaletteEntry> = cells
        .into_iter()
        .filter(|&entry| seen.insert(entry.hex_code.as_str()))
        .cloned()
        .collect();

    legend.sort_by(compare_legend_entries);
    legend
}

/// Case-insensitive name order, then exact name, then hex so that threads
/// sharing a display name still sort deterministically.
pub fn compare_legend_entries(a: &PaletteEntry, b: &PaletteEntry) -> Ordering {
    compare_display_names(&a.display_name, &b.display_name)
        .then_with(|| a.hex_code.cmp(&b.hex_code))
}

pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::SquareBitmap;
    use crate::palette_store::Palette;
    use crate::sampler::GridSampler;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn entry(code: &str, name: &str, rgb: [u8; 3]) -> PaletteEntry {
        PaletteEntry::new(code, name, rgb)
    }

    #[test]
    fn dedups_and_sorts_by_name() {
        let red = entry("321", "Red", [199, 43, 59]);
        let black = entry("310", "Black", [0, 0, 0]);
        let ecru = entry("Ecru", "ecru", [240, 235, 213]);
        let cells = vec![&red, &black, &red, &ecru, &black];

        let legend = extract_legend_from(cells);
        let names: Vec<&str> = legend.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["Black", "ecru", "Red"]);
    }

    #[test]
    fn first_occurrence_wins_for_shared_hex() {
        let navy = entry("336", "Navy Blue", [0x13, 0x29, 0x4B]);
        let dark_navy = entry("823", "Dark Navy Blue", [0x13, 0x29, 0x4B]);
        let legend = extract_legend_from(vec![&navy, &dark_navy]);
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].floss_code, "336");
    }

    #[test]
    fn empty_input_gives_empty_legend() {
        assert!(extract_legend_from(Vec::<&PaletteEntry>::new()).is_empty());
    }

    #[test]
    fn legend_from_sampled_grid_is_unique_and_ordered() {
        let palette = Palette::bundled().unwrap();
        let img = RgbaImage::from_fn(40, 40, |x, y| Rgba([(x * 6) as u8, (y * 6) as u8, 90, 255]));
        let bitmap = SquareBitmap::new(img, 40, 40).unwrap();
        let grid = GridSampler::new(Arc::clone(&palette)).sample(&bitmap, 20).unwrap();

        let legend = extract_legend(&grid);
        assert!(!legend.is_empty());

        let unique: HashSet<&str> = legend.iter().map(|e| e.hex_code.as_str()).collect();
        assert_eq!(unique.len(), legend.len());
        for pair in legend.windows(2) {
            assert_eq!(compare_legend_entries(&pair[0], &pair[1]), Ordering::Less);
        }
        for entry in grid.iter() {
            assert!(unique.contains(entry.hex_code.as_str()));
        }
    }
}
