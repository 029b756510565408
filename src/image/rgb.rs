//! Owned RGB image in row-major layout (stride == width).
//!
//! The image is read-only for the duration of a segmentation run; the
//! controller shares it between worker tasks behind an `Arc`.
use crate::error::{Result, SegmentationError};
use crate::types::Pixel;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<[u8; 3]>,
}

impl ColorImage {
    /// Wrap a row-major buffer, checking that it matches `w × h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<[u8; 3]>) -> Result<Self> {
        let image = Self { w, h, data };
        image.check_dimensions()?;
        Ok(image)
    }

    /// Check that the buffer holds exactly `w × h` pixels.
    pub fn check_dimensions(&self) -> Result<()> {
        let (w, h) = (self.w, self.h);
        let expected = w.checked_mul(h).ok_or_else(|| {
            SegmentationError::invalid_argument("image", format!("{w}x{h} overflows"))
        })?;
        if self.data.len() != expected {
            return Err(SegmentationError::invalid_argument(
                "image",
                format!("expected {expected} pixels, got {}", self.data.len()),
            ));
        }
        Ok(())
    }

    /// Construct an image filled with a single colour.
    pub fn filled(w: usize, h: usize, color: [u8; 3]) -> Self {
        Self {
            w,
            h,
            data: vec![color; w * h],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Self { w, h, data }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: [u8; 3]) {
        let i = self.idx(x, y);
        self.data[i] = color;
    }

    #[inline]
    pub fn color(&self, p: Pixel) -> [u8; 3] {
        self.get(p.x as usize, p.y as usize)
    }

    #[inline]
    pub fn pixel_index(&self, p: Pixel) -> usize {
        self.idx(p.x as usize, p.y as usize)
    }

    pub fn pixel_count(&self) -> usize {
        self.w * self.h
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// True when every pixel has equal red, green and blue channels.
    pub fn is_grayscale(&self) -> bool {
        self.data.iter().all(|&[r, g, b]| r == g && g == b)
    }

    /// Every pixel coordinate in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        let w = self.w as u32;
        (0..self.h as u32).flat_map(move |y| (0..w).map(move |x| Pixel::new(x, y)))
    }
}
