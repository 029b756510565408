//! I/O helpers for colour images, label renderings and JSON.
//!
//! - `load_color_image`: read a PNG/JPEG/BMP into an owned `ColorImage`.
//! - `save_color_image`: write a `ColorImage` to disk.
//! - `render_segments`: paint each segment with a palette colour.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ColorImage, SegmentPalette};
use crate::types::Segment;
use image::{ImageBuffer, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_color_image(path: &Path) -> Result<ColorImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_rgb8();
    let w = img.width() as usize;
    let h = img.height() as usize;
    let data = img.pixels().map(|p| p.0).collect();
    ColorImage::from_vec(w, h, data).map_err(|e| format!("Invalid image {}: {e}", path.display()))
}

/// Save an RGB image to disk; the format follows the file extension.
pub fn save_color_image(image: &ColorImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let raw: Vec<u8> = image.data.iter().flatten().copied().collect();
    let buffer: RgbImage = ImageBuffer::from_raw(image.w as u32, image.h as u32, raw)
        .ok_or_else(|| "Failed to create image buffer".to_string())?;
    buffer
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Paint every segment on top of `source` with the next palette colour.
///
/// Pixels not covered by any segment keep their source colour.
pub fn render_segments(
    source: &ColorImage,
    segments: &[Segment],
    palette: &mut SegmentPalette,
) -> ColorImage {
    let mut out = source.clone();
    for segment in segments {
        let color = palette.next_color();
        for p in segment {
            out.set(p.x as usize, p.y as usize, color);
        }
    }
    out
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
