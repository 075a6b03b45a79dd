use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::path::Path;

use crate::error::{PatternError, Result};

const PADDING: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A square RGBA bitmap plus the size of the image before it was padded.
#[derive(Debug, Clone)]
pub struct SquareBitmap {
    image: RgbaImage,
    original_width: u32,
    original_height: u32,
}

impl SquareBitmap {
    /// Wraps an already-squared bitmap.
    pub fn new(image: RgbaImage, original_width: u32, original_height: u32) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width != height {
            return Err(PatternError::configuration(format!(
                "bitmap must be square, got {}x{}",
                width, height
            )));
        }
        if width == 0 {
            return Err(PatternError::configuration("bitmap is empty"));
        }
        if original_width == 0
            || original_height == 0
            || original_width > width
            || original_height > height
        {
            return Err(PatternError::configuration(format!(
                "original size {}x{} does not fit a {}x{} bitmap",
                original_width, original_height, width, height
            )));
        }
        Ok(Self {
            image,
            original_width,
            original_height,
        })
    }

    /// Centers `image` on a black square canvas with side `max(width, height)`.
    pub fn pad_to_square(image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PatternError::configuration("image has no pixels"));
        }

        let side = width.max(height);
        let rgba = image.to_rgba8();
        let image = if width == height {
            rgba
        } else {
            let mut canvas = RgbaImage::from_pixel(side, side, PADDING);
            let x = (side - width) / 2;
            let y = (side - height) / 2;
            imageops::overlay(&mut canvas, &rgba, x as i64, y as i64);
            canvas
        };

        Self::new(image, width, height)
    }

    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn original_width(&self) -> u32 {
        self.original_width
    }

    pub fn original_height(&self) -> u32 {
        self.original_height
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

pub fn load_square_bitmap(bytes: &[u8]) -> Result<SquareBitmap> {
    SquareBitmap::pad_to_square(&decode(bytes)?)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| PatternError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    #[test]
    fn wide_image_is_padded_top_and_bottom() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, image::Rgb([200, 10, 10])));
        let bitmap = SquareBitmap::pad_to_square(&img).unwrap();

        assert_eq!(bitmap.side(), 4);
        assert_eq!(bitmap.original_width(), 4);
        assert_eq!(bitmap.original_height(), 2);
        assert_eq!(bitmap.image().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(bitmap.image().get_pixel(0, 1).0, [200, 10, 10, 255]);
        assert_eq!(bitmap.image().get_pixel(3, 2).0, [200, 10, 10, 255]);
        assert_eq!(bitmap.image().get_pixel(3, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn tall_image_is_padded_left_and_right() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 6, image::Rgb([9, 9, 9])));
        let bitmap = SquareBitmap::pad_to_square(&img).unwrap();
        assert_eq!(bitmap.side(), 6);
        assert_eq!(bitmap.image().get_pixel(1, 0).0, [0, 0, 0, 255]);
        assert_eq!(bitmap.image().get_pixel(2, 0).0, [9, 9, 9, 255]);
        assert_eq!(bitmap.image().get_pixel(3, 5).0, [9, 9, 9, 255]);
        assert_eq!(bitmap.image().get_pixel(4, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn rejects_non_square_input() {
        let err = SquareBitmap::new(RgbaImage::new(3, 2), 3, 2).unwrap_err();
        assert!(matches!(err, PatternError::Configuration(_)));
        assert!(SquareBitmap::new(RgbaImage::new(3, 3), 4, 3).is_err());
    }

    #[test]
    fn decodes_png_bytes() {
        let img = RgbImage::from_pixel(3, 1, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let bitmap = load_square_bitmap(&bytes).unwrap();
        assert_eq!(bitmap.side(), 3);
        assert_eq!(bitmap.image().get_pixel(1, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            load_square_bitmap(b"not an image"),
            Err(PatternError::ImageDecode(_))
        ));
    }
}
