use dominant_segments::image::ColorImage;
use dominant_segments::Pixel;

pub const RED: [u8; 3] = [200, 30, 30];
pub const BLUE: [u8; 3] = [30, 30, 200];
pub const GREEN: [u8; 3] = [30, 190, 40];
pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Single-colour image.
pub fn uniform(width: usize, height: usize, color: [u8; 3]) -> ColorImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    ColorImage::filled(width, height, color)
}

/// Columns `< split` take `left`, the rest take `right`.
pub fn two_tone(
    width: usize,
    height: usize,
    split: usize,
    left: [u8; 3],
    right: [u8; 3],
) -> ColorImage {
    assert!(split <= width, "split must lie inside the image");
    ColorImage::from_fn(width, height, |x, _| if x < split { left } else { right })
}

/// Vertical stripes of `stripe` columns cycling through `colors`.
pub fn vertical_stripes(
    width: usize,
    height: usize,
    stripe: usize,
    colors: &[[u8; 3]],
) -> ColorImage {
    assert!(stripe > 0, "stripe width must be positive");
    assert!(!colors.is_empty(), "at least one colour is required");
    ColorImage::from_fn(width, height, |x, _| colors[(x / stripe) % colors.len()])
}

/// Every pixel of `image`, sorted.
pub fn all_pixels(image: &ColorImage) -> Vec<Pixel> {
    let mut pixels: Vec<Pixel> = image.pixels().collect();
    pixels.sort();
    pixels
}
