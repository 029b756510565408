//! Colours used to paint segments when rendering a label image.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_COLORS: [[u8; 3]; 5] = [
    [6, 143, 178],
    [255, 134, 0],
    [224, 55, 63],
    [120, 120, 120],
    [64, 251, 25],
];

const PALETTE_SEED: u64 = 24;

/// Hands out a fixed set of distinct colours, then seeded random ones.
///
/// The sequence is deterministic: two palettes created with [`SegmentPalette::new`]
/// produce the same colours in the same order.
#[derive(Clone, Debug)]
pub struct SegmentPalette {
    next_default: usize,
    rng: StdRng,
}

impl SegmentPalette {
    pub fn new() -> Self {
        Self {
            next_default: 0,
            rng: StdRng::seed_from_u64(PALETTE_SEED),
        }
    }

    pub fn next_color(&mut self) -> [u8; 3] {
        if let Some(&color) = DEFAULT_COLORS.get(self.next_default) {
            self.next_default += 1;
            return color;
        }
        [self.rng.gen(), self.rng.gen(), self.rng.gen()]
    }

    /// Restart the sequence from the first fixed colour.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SegmentPalette {
    fn default() -> Self {
        Self::new()
    }
}
