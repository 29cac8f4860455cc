//! Deep-zoom pyramid level selection.
//!
//! A panorama face is stored as a resolution pyramid: level `L` holds the
//! face downsampled to at most `2^L` pixels per side, split into 256×256
//! tiles whose outer 1-pixel ring duplicates the neighbouring tile's edge
//! so texture filtering shows no seams. This module picks the level that
//! matches a face size and works out the tile grid laid out at that level.

/// Stored tile edge length in pixels, seam ring included.
pub const TILE_RASTER_SIZE: u32 = 256;

/// Width of the duplicated seam ring on each tile edge.
pub const TILE_OVERLAP: u32 = 1;

/// Pixels of real face content per tile edge.
pub const TILE_CONTENT_SIZE: u32 = TILE_RASTER_SIZE - 2 * TILE_OVERLAP;

/// Exclusive upper bound of the level search.
///
/// Level 19 covers faces up to 524288 pixels per side; anything larger is
/// outside what the export format produces.
pub const MAX_LEVEL: u32 = 20;

/// Pyramid level plus the tile grid dimension laid out at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSelection {
    /// Pyramid level index (directory name under `{face}_files/`).
    pub level: u32,
    /// Tiles per row and per column of the face grid.
    pub tiles_per_side: u32,
}

impl LevelSelection {
    /// Select the pyramid level and tile grid for a face of `size` pixels.
    ///
    /// Returns `None` when no level under [`MAX_LEVEL`] brackets `size`;
    /// callers treat that as an internal consistency failure, not user
    /// input error, since every face size a real export declares resolves.
    pub fn for_size(size: u32) -> Option<Self> {
        select_level(size).map(|level| Self {
            level,
            tiles_per_side: tiles_per_side(size),
        })
    }
}

/// Find the pyramid level for a face of `size` pixels.
///
/// The level is the smallest `L` with `2^(L-1) < size <= 2^L`: level 8
/// holds up to 256×256 pixels of real content, level 9 up to 512×512, and
/// so on. Searched by doubling from level 1, bounded by [`MAX_LEVEL`].
///
/// # Example
///
/// ```
/// use cubeatlas::pyramid::select_level;
///
/// assert_eq!(select_level(1040), Some(11));
/// assert_eq!(select_level(256), Some(8));
/// ```
pub fn select_level(size: u32) -> Option<u32> {
    let mut level_size: u64 = 2;
    for level in 1..MAX_LEVEL {
        if level_size / 2 < u64::from(size) && u64::from(size) <= level_size {
            return Some(level);
        }
        level_size *= 2;
    }
    None
}

/// Number of tile columns (and rows) covering a face of `size` pixels.
///
/// Each tile contributes [`TILE_CONTENT_SIZE`] pixels of real content. A
/// trailing sliver no wider than the seam overlap carried on the tile
/// edges does not get a column of its own; the border pixels already
/// cover it.
///
/// # Example
///
/// ```
/// use cubeatlas::pyramid::tiles_per_side;
///
/// assert_eq!(tiles_per_side(1040), 5);
/// assert_eq!(tiles_per_side(256), 1);
/// ```
pub fn tiles_per_side(size: u32) -> u32 {
    size.saturating_sub(2 * TILE_OVERLAP)
        .div_ceil(TILE_CONTENT_SIZE)
        .max(1)
}
