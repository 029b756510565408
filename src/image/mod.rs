pub mod io;
pub mod palette;
pub mod rgb;

pub use self::palette::SegmentPalette;
pub use self::rgb::ColorImage;
