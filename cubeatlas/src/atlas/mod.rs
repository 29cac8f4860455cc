//! Atlas assembly and single-panorama conversion.
//!
//! [`AtlasBuilder`] allocates the output canvas, runs the face compositor
//! over the six fixed face rectangles and returns the finished raster.
//! Encoding is left to the caller; [`convert_panorama`] is the
//! parse-build-encode entry point used by the CLI and batch layers.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::compositor::{FaceCompositor, ImageOpsRenderer, TileRenderer};
use crate::face::Face;
use crate::manifest::{CubeManifest, ManifestError};
use crate::pyramid::LevelSelection;

/// Result type for atlas operations.
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Errors that can occur while building or writing an atlas.
#[derive(Debug)]
pub enum AtlasError {
    /// The cube manifest could not be parsed.
    Manifest(ManifestError),

    /// No pyramid level brackets the declared face size.
    ///
    /// Any size a real export declares resolves, so hitting this means
    /// the inputs are inconsistent, not that the user passed a bad flag.
    UnresolvableSize { size: u32 },

    /// Failed to encode or write the output image.
    WriteFailed {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Failed to create the batch output directory.
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to enumerate the batch root directory.
    ReadDirFailed { path: PathBuf, source: io::Error },
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Manifest(e) => write!(f, "{}", e),
            AtlasError::UnresolvableSize { size } => {
                write!(f, "no pyramid level matches face size {}", size)
            }
            AtlasError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            AtlasError::CreateDirectoryFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            AtlasError::ReadDirFailed { path, source } => {
                write!(f, "failed to read directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for AtlasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AtlasError::Manifest(e) => Some(e),
            AtlasError::UnresolvableSize { .. } => None,
            AtlasError::WriteFailed { source, .. } => Some(source),
            AtlasError::CreateDirectoryFailed { source, .. } => Some(source),
            AtlasError::ReadDirFailed { source, .. } => Some(source),
        }
    }
}

impl From<ManifestError> for AtlasError {
    fn from(e: ManifestError) -> Self {
        AtlasError::Manifest(e)
    }
}

/// Builds cube-map atlases from panorama tile pyramids.
///
/// # Example
///
/// ```ignore
/// use cubeatlas::atlas::AtlasBuilder;
/// use cubeatlas::manifest::CubeManifest;
///
/// let manifest = CubeManifest::parse(manifest_path)?;
/// let atlas = AtlasBuilder::new(256).build(&manifest, manifest.panorama_root())?;
/// atlas.save("out.png")?;
/// ```
pub struct AtlasBuilder {
    face_size: u32,
    renderer: Arc<dyn TileRenderer>,
}

impl AtlasBuilder {
    /// Create a builder producing atlases with faces of `face_size`
    /// pixels (the atlas is `4 × face_size` on a side).
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            renderer: Arc::new(ImageOpsRenderer),
        }
    }

    /// Replace the tile renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn TileRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Face size of the atlases this builder produces.
    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    /// Build the atlas for `manifest`, reading face pyramids from
    /// `faces_root`.
    ///
    /// Faces write to disjoint atlas rectangles; absent faces stay
    /// transparent.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::UnresolvableSize`] when the manifest's face
    /// size falls outside the bounded level search.
    pub fn build(&self, manifest: &CubeManifest, faces_root: &Path) -> AtlasResult<RgbaImage> {
        let source_size = manifest.largest_face_size();
        let selection = LevelSelection::for_size(source_size)
            .ok_or(AtlasError::UnresolvableSize { size: source_size })?;

        debug!(
            source_size,
            level = selection.level,
            tiles_per_side = selection.tiles_per_side,
            face_size = self.face_size,
            "assembling atlas"
        );

        let mut atlas = RgbaImage::new(4 * self.face_size, 4 * self.face_size);
        let compositor = FaceCompositor::new(selection, source_size, self.renderer.as_ref());

        for face in Face::ALL {
            compositor.composite(
                &mut atlas,
                face.atlas_rect(self.face_size),
                &face.tile_dir(faces_root),
            );
        }

        Ok(atlas)
    }
}

/// Convert a single panorama to a PNG cube-map atlas.
///
/// Parses the manifest at `manifest_path`, composites the atlas with
/// faces of `face_size` pixels and writes it to `output` as PNG.
///
/// # Errors
///
/// Returns [`AtlasError::Manifest`] for an unreadable or malformed
/// manifest and [`AtlasError::WriteFailed`] when the output cannot be
/// encoded or written.
pub fn convert_panorama(manifest_path: &Path, face_size: u32, output: &Path) -> AtlasResult<()> {
    let manifest = CubeManifest::parse(manifest_path)?;

    info!(
        manifest = %manifest_path.display(),
        source_size = manifest.largest_face_size(),
        output = %output.display(),
        "converting panorama"
    );

    let atlas = AtlasBuilder::new(face_size).build(&manifest, manifest.panorama_root())?;

    atlas
        .save_with_format(output, ImageFormat::Png)
        .map_err(|source| AtlasError::WriteFailed {
            path: output.to_path_buf(),
            source,
        })
}
