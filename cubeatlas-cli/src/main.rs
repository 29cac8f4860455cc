//! Cubeatlas CLI - Command-line interface
//!
//! Flattens deep-zoom cube panoramas into single cube-map atlas PNGs,
//! either one panorama at a time or for a whole directory of exports.

mod error;

use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use cubeatlas::atlas::convert_panorama;
use cubeatlas::batch::{convert_directory, BatchOptions};
use cubeatlas::logging::init_logging;
use tracing::debug;

use crate::error::CliError;

/// Atlas sides are four faces long, so this is the smallest size that
/// yields a non-empty face.
const MIN_SIZE: u32 = 4;

#[derive(Parser)]
#[command(name = "cubeatlas")]
#[command(version = cubeatlas::VERSION)]
#[command(about = "Flatten a deep-zoom cube panorama into one cube-map atlas PNG")]
#[command(long_about = "Flatten a deep-zoom cube panorama into one .png file \
holding all 6 cube faces.\n\n\
With --file, a single panorama is converted: pass its deepzoom/CubeManifest.txt \
and the face tile pyramids are found next to it.\n\
With --dir, every panorama stored in a GUID-named directory underneath the \
given root is converted.")]
struct Args {
    /// Process a single panorama: path to its deepzoom/CubeManifest.txt
    #[arg(long, short = 'f', value_name = "MANIFEST", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Process all panoramas in GUID-named directories under this root
    #[arg(long, short = 'd', value_name = "ROOT")]
    dir: Option<PathBuf>,

    /// Output .png file (with --file) or output directory (with --dir)
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,

    /// Side length of the square output image; each face is SIZE / 4
    #[arg(long, short = 's', value_name = "PIXELS", default_value_t = 1024)]
    size: u32,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.debug) {
        CliError::LoggingInit(e.to_string()).exit();
    }

    if args.file.is_none() && args.dir.is_none() {
        // No actionable mode selected: show usage and fail
        let _ = Args::command().print_long_help();
        process::exit(2);
    }

    if let Err(e) = run(&args) {
        e.exit();
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    if args.size < MIN_SIZE {
        return Err(CliError::SizeTooSmall(args.size));
    }
    let face_size = args.size / 4;
    debug!(size = args.size, face_size, "starting");

    if let Some(manifest) = &args.file {
        if !manifest.is_file() {
            return Err(CliError::PathNotFound {
                flag: "--file",
                path: manifest.clone(),
            });
        }
        let output = args.out.as_ref().ok_or(CliError::MissingOutput {
            mode: "--file",
            expects: "output .png file",
        })?;

        convert_panorama(manifest, face_size, output).map_err(CliError::Convert)?;
        println!(
            "Wrote {} ({}x{})",
            output.display(),
            4 * face_size,
            4 * face_size
        );
        return Ok(());
    }

    if let Some(root) = &args.dir {
        if !root.is_dir() {
            return Err(CliError::PathNotFound {
                flag: "--dir",
                path: root.clone(),
            });
        }
        let output_dir = args.out.as_ref().ok_or(CliError::MissingOutput {
            mode: "--dir",
            expects: "output directory",
        })?;

        let options = BatchOptions::new(root, output_dir, face_size);
        let summary = convert_directory(&options).map_err(CliError::Batch)?;

        if summary.all_failed() {
            return Err(CliError::BatchAllFailed {
                failed: summary.failed,
            });
        }

        println!(
            "Converted {} panoramas underneath {} ({} failed, {} skipped)",
            summary.converted,
            root.display(),
            summary.failed,
            summary.skipped
        );
        return Ok(());
    }

    unreachable!("mode presence checked in main");
}
