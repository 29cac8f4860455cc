//! Cubeatlas - deep-zoom cube panoramas flattened into cube-map textures
//!
//! This library converts a tiled, multi-resolution panorama export (six cube
//! faces, each stored as a deep-zoom pyramid of overlapping JPEG tiles) into
//! a single cube-map atlas image suitable for use as a texture.
//!
//! # High-Level API
//!
//! For most use cases the [`atlas`] module provides the conversion entry
//! point:
//!
//! ```ignore
//! use cubeatlas::atlas::convert_panorama;
//!
//! convert_panorama("pano/deepzoom/CubeManifest.txt", 256, "pano.png")?;
//! ```
//!
//! Batch conversion of a directory of panoramas lives in [`batch`].

pub mod atlas;
pub mod batch;
pub mod compositor;
pub mod face;
pub mod logging;
pub mod manifest;
pub mod pyramid;

/// Version of the cubeatlas library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
