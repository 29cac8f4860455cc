//! Batch panorama conversion.
//!
//! Walks the immediate subdirectories of a root directory, converts every
//! panorama stored in a GUID-named folder (`{guid}/deepzoom/
//! CubeManifest.txt`) and writes one `{guid}.png` per panorama into the
//! output directory. Panoramas are independent, so they are converted in
//! parallel; a failure in one is logged and counted without stopping the
//! rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::{error, info};

use crate::atlas::{convert_panorama, AtlasError, AtlasResult};

/// Manifest filename inside a panorama's `deepzoom` directory.
const MANIFEST_FILE: &str = "CubeManifest.txt";

/// Subdirectory of a panorama folder holding the deep-zoom export.
const DEEPZOOM_DIR: &str = "deepzoom";

/// Batch conversion options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root directory holding GUID-named panorama folders.
    pub root: PathBuf,
    /// Directory receiving one `{guid}.png` per panorama.
    pub output_dir: PathBuf,
    /// Face size of the produced atlases, in pixels.
    pub face_size: u32,
}

impl BatchOptions {
    /// Create options for converting everything under `root` into
    /// `output_dir` with faces of `face_size` pixels.
    pub fn new(root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, face_size: u32) -> Self {
        Self {
            root: root.into(),
            output_dir: output_dir.into(),
            face_size,
        }
    }
}

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Panoramas converted successfully.
    pub converted: usize,
    /// Panoramas that failed (malformed manifest, write failure, ...).
    pub failed: usize,
    /// Subdirectories skipped because their name is not a GUID.
    pub skipped: usize,
}

impl BatchSummary {
    /// True when at least one panorama was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.converted == 0 && self.failed > 0
    }
}

/// Canonical GUID pattern (`8-4-4-4-12` hex groups), whole-name match.
fn guid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$",
        )
        .unwrap()
    })
}

/// Whether `name` is a canonical GUID directory name.
pub fn is_guid_dir_name(name: &str) -> bool {
    guid_pattern().is_match(name)
}

/// Convert every GUID-named panorama folder under `options.root`.
///
/// Per-panorama failures are logged and counted in the summary; only
/// failures that sink the whole batch (unreadable root, uncreatable
/// output directory) are returned as errors.
///
/// # Errors
///
/// Returns [`AtlasError::ReadDirFailed`] when the root cannot be
/// enumerated and [`AtlasError::CreateDirectoryFailed`] when the output
/// directory cannot be created.
pub fn convert_directory(options: &BatchOptions) -> AtlasResult<BatchSummary> {
    fs::create_dir_all(&options.output_dir).map_err(|source| {
        AtlasError::CreateDirectoryFailed {
            path: options.output_dir.clone(),
            source,
        }
    })?;

    let (panoramas, skipped) = collect_panorama_dirs(&options.root)?;

    info!(
        root = %options.root.display(),
        candidates = panoramas.len(),
        skipped,
        "starting batch conversion"
    );

    let (converted, failed) = panoramas
        .par_iter()
        .map(|(name, dir)| {
            let manifest = dir.join(DEEPZOOM_DIR).join(MANIFEST_FILE);
            let output = options.output_dir.join(format!("{}.png", name));

            match convert_panorama(&manifest, options.face_size, &output) {
                Ok(()) => {
                    info!(panorama = %dir.display(), output = %output.display(), "converted");
                    (1usize, 0usize)
                }
                Err(e) => {
                    error!(panorama = %dir.display(), error = %e, "panorama conversion failed");
                    (0, 1)
                }
            }
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    let summary = BatchSummary {
        converted,
        failed,
        skipped,
    };

    info!(
        converted = summary.converted,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch conversion finished"
    );

    Ok(summary)
}

/// Enumerate `root`, returning GUID-named subdirectories and the count of
/// subdirectories skipped for not being GUID-named.
fn collect_panorama_dirs(root: &Path) -> AtlasResult<(Vec<(String, PathBuf)>, usize)> {
    let entries = fs::read_dir(root).map_err(|source| AtlasError::ReadDirFailed {
        path: root.to_path_buf(),
        source,
    })?;

    let mut panoramas = Vec::new();
    let mut skipped = 0;

    for entry in entries {
        let entry = entry.map_err(|source| AtlasError::ReadDirFailed {
            path: root.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_guid_dir_name(name) => {
                panoramas.push((name.to_string(), path));
            }
            _ => skipped += 1,
        }
    }

    // Deterministic processing order regardless of readdir order
    panoramas.sort();

    Ok((panoramas, skipped))
}
