//!
//! # Dimension Selector
//!
//! Picks target image dimensions from the output filename. Banner and
//! category images get a wide preset, icons a square one, and everything
//! else uses the caller-supplied defaults.

/// Wide preset for banner and category images.
pub const WIDE: (u32, u32) = (1200, 600);

/// Square preset for icons.
pub const SQUARE: (u32, u32) = (512, 512);

/// Selects width and height for an output filename.
///
/// Case-insensitive substring match: `banner`/`category` are checked before
/// `icon`; the first match wins. Filenames matching neither keyword set fall
/// back to the provided defaults.
pub fn select_dimensions(filename: &str, default_width: u32, default_height: u32) -> (u32, u32) {
    let lower = filename.to_lowercase();
    if lower.contains("banner") || lower.contains("category") {
        WIDE
    } else if lower.contains("icon") {
        SQUARE
    } else {
        (default_width, default_height)
    }
}
