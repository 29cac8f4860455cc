//! Cube manifest parsing.
//!
//! A panorama export carries a `CubeManifest.txt` next to the face tile
//! pyramids. Expected format:
//!
//! ```text
//! comment                  Sample File
//! Unknown                  19
//! Largest Size             1040
//! Angular Bounds           -180,180,-58.8321,40.5767
//! Image coords per face    0,front,0,0,0,934,1040,934,1040,0
//!                          1,right,0,0,0,934,1040,934,1040,0
//! ```
//!
//! Only the second line (the largest face size in pixels) is consumed;
//! the comment, angular bounds and per-face coordinate rows are ignored.
//! Not all faces of the cube are always included in an export.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Minimum number of manifest lines (header plus at least one face row).
const MIN_LINES: usize = 4;

/// Errors raised while reading a cube manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The manifest has fewer lines than the format requires.
    #[error("expected a manifest of at least 4 lines (one cube face), got {lines} lines in {}", path.display())]
    TooShort { path: PathBuf, lines: usize },

    /// The largest-size line did not parse as an unsigned integer.
    #[error("unable to parse line 2 of {} as an integer, got '{line}'", path.display())]
    InvalidSize { path: PathBuf, line: String },
}

/// Parsed cube manifest.
///
/// Immutable once parsed; the path is retained so callers can resolve the
/// face tile directories that live beside the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeManifest {
    path: PathBuf,
    largest_face_size: u32,
}

impl CubeManifest {
    /// Parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] on I/O failure,
    /// [`ManifestError::TooShort`] when fewer than four lines are present,
    /// and [`ManifestError::InvalidSize`] when the second line is not an
    /// unsigned decimal integer.
    pub fn parse(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < MIN_LINES {
            return Err(ManifestError::TooShort {
                path: path.to_path_buf(),
                lines: lines.len(),
            });
        }

        let size_line = lines[1].trim();
        let largest_face_size: u32 =
            size_line.parse().map_err(|_| ManifestError::InvalidSize {
                path: path.to_path_buf(),
                line: lines[1].to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            largest_face_size,
        })
    }

    /// Path the manifest was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest and the `{face}_files` pyramids.
    pub fn panorama_root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Largest face size declared by the export, in pixels.
    pub fn largest_face_size(&self) -> u32 {
        self.largest_face_size
    }
}
