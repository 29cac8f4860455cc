//! Face tile compositing.
//!
//! Draws the tiles of one cube face into the face's destination rectangle
//! of the atlas. Tiles are loaded from the selected pyramid level, the
//! 1-pixel seam ring is cropped off, and the remaining content is scaled
//! into a destination sub-rectangle computed proportionally from the grid
//! position. A missing face directory, level directory or tile file is
//! normal (not every panorama includes every face at every level) and
//! leaves the corresponding atlas region blank.
//!
//! The scaled-blit primitive is abstracted behind [`TileRenderer`] so the
//! grid arithmetic can be exercised without decoding pixels.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, warn};

use crate::face::Rect;
use crate::pyramid::{LevelSelection, TILE_CONTENT_SIZE, TILE_OVERLAP};

/// Scaled blit of a source raster region into a canvas region.
///
/// Implementations must be thread-safe (`Send + Sync`); batch conversion
/// composites panoramas from multiple threads.
pub trait TileRenderer: Send + Sync {
    /// Draw `src_region` of `src` into `dest_region` of `canvas`,
    /// scaling as needed. Pixels outside `dest_region` are not touched.
    fn draw_scaled(
        &self,
        src: &RgbaImage,
        src_region: Rect,
        dest_region: Rect,
        canvas: &mut RgbaImage,
    );
}

/// Default renderer backed by `image::imageops`.
///
/// Crops the source region, resamples with a bilinear filter (the
/// destination differs from the source by at most a few pixels per tile,
/// so a heavier kernel buys nothing), and overwrites the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOpsRenderer;

impl TileRenderer for ImageOpsRenderer {
    fn draw_scaled(
        &self,
        src: &RgbaImage,
        src_region: Rect,
        dest_region: Rect,
        canvas: &mut RgbaImage,
    ) {
        if dest_region.width == 0 || dest_region.height == 0 {
            return;
        }

        let content = imageops::crop_imm(
            src,
            src_region.x,
            src_region.y,
            src_region.width,
            src_region.height,
        )
        .to_image();

        let scaled = if (content.width(), content.height())
            == (dest_region.width, dest_region.height)
        {
            content
        } else {
            imageops::resize(
                &content,
                dest_region.width,
                dest_region.height,
                FilterType::Triangle,
            )
        };

        imageops::replace(
            canvas,
            &scaled,
            i64::from(dest_region.x),
            i64::from(dest_region.y),
        );
    }
}

/// Composites the tile grid of a single cube face into the atlas.
pub struct FaceCompositor<'a> {
    selection: LevelSelection,
    source_size: u32,
    renderer: &'a dyn TileRenderer,
}

impl<'a> FaceCompositor<'a> {
    /// Create a compositor for faces laid out at `selection` of a pyramid
    /// whose largest face is `source_size` pixels per side.
    pub fn new(
        selection: LevelSelection,
        source_size: u32,
        renderer: &'a dyn TileRenderer,
    ) -> Self {
        Self {
            selection,
            source_size,
            renderer,
        }
    }

    /// Draw every available tile of the face under `face_dir` into
    /// `face_rect` of `atlas`.
    ///
    /// Absent directories and tiles leave their cells blank. A tile that
    /// exists but fails to decode is skipped the same way, with a warning
    /// naming the file so corruption can be told apart from absence.
    pub fn composite(&self, atlas: &mut RgbaImage, face_rect: Rect, face_dir: &Path) {
        if !face_dir.is_dir() {
            // No images on this face of the cube.
            debug!(dir = %face_dir.display(), "face directory absent, leaving face blank");
            return;
        }

        let level_dir = face_dir.join(self.selection.level.to_string());
        if !level_dir.is_dir() {
            debug!(
                dir = %level_dir.display(),
                level = self.selection.level,
                "level directory absent, leaving face blank"
            );
            return;
        }

        for row in 0..self.selection.tiles_per_side {
            for col in 0..self.selection.tiles_per_side {
                let tile_path = level_dir.join(format!("{}_{}.jpg", col, row));
                if !tile_path.is_file() {
                    continue;
                }

                let tile = match image::open(&tile_path) {
                    Ok(img) => img.to_rgba8(),
                    Err(e) => {
                        warn!(
                            path = %tile_path.display(),
                            error = %e,
                            "skipping tile that failed to decode"
                        );
                        continue;
                    }
                };

                if tile.width() <= 2 * TILE_OVERLAP || tile.height() <= 2 * TILE_OVERLAP {
                    warn!(
                        path = %tile_path.display(),
                        width = tile.width(),
                        height = tile.height(),
                        "skipping tile smaller than its seam ring"
                    );
                    continue;
                }

                // Crop off the outer pixel: it duplicates the adjacent
                // tiles' edges so scaled output has no visible seams.
                let src_region = Rect::new(
                    TILE_OVERLAP,
                    TILE_OVERLAP,
                    tile.width() - 2 * TILE_OVERLAP,
                    tile.height() - 2 * TILE_OVERLAP,
                );

                let dest_region = self.dest_rect(face_rect, col, row);
                self.renderer.draw_scaled(&tile, src_region, dest_region, atlas);
            }
        }
    }

    /// Destination sub-rectangle for grid cell `(col, row)` inside
    /// `face_rect`.
    ///
    /// Offsets and sizes are proportional to the tile content span over
    /// the source face size. The final row and column stretch to the face
    /// rectangle's far edge, absorbing the rounding remainder so the face
    /// boundary has neither gap nor overlap.
    fn dest_rect(&self, face_rect: Rect, col: u32, row: u32) -> Rect {
        let x = face_rect.x + self.scaled_offset(face_rect.width, col);
        let y = face_rect.y + self.scaled_offset(face_rect.height, row);

        let width = if col == self.selection.tiles_per_side - 1 {
            face_rect.right() - x
        } else {
            face_rect.x + self.scaled_offset(face_rect.width, col + 1) - x
        };
        let height = if row == self.selection.tiles_per_side - 1 {
            face_rect.bottom() - y
        } else {
            face_rect.y + self.scaled_offset(face_rect.height, row + 1) - y
        };

        Rect::new(x, y, width, height)
    }

    /// `extent * (content * index) / source_size` in 64-bit, truncated.
    fn scaled_offset(&self, extent: u32, index: u32) -> u32 {
        let numerator = u64::from(extent) * u64::from(TILE_CONTENT_SIZE) * u64::from(index);
        (numerator / u64::from(self.source_size)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Renderer that records every requested blit instead of drawing.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<(Rect, Rect)>>,
    }

    impl TileRenderer for RecordingRenderer {
        fn draw_scaled(
            &self,
            _src: &RgbaImage,
            src_region: Rect,
            dest_region: Rect,
            _canvas: &mut RgbaImage,
        ) {
            self.calls.lock().unwrap().push((src_region, dest_region));
        }
    }

    fn write_jpeg_tile(path: &Path, size: u32, rgb: [u8; 3]) {
        use image::{Rgb, RgbImage};
        use std::io::Cursor;

        let img = RgbImage::from_pixel(size, size, Rgb(rgb));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Jpeg)
            .expect("encode tile");
        fs::write(path, buffer.into_inner()).unwrap();
    }

    fn selection(level: u32, tiles_per_side: u32) -> LevelSelection {
        LevelSelection {
            level,
            tiles_per_side,
        }
    }

    #[test]
    fn test_absent_face_dir_leaves_atlas_untouched() {
        let temp = TempDir::new().unwrap();
        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(8, 1), 256, &renderer);
        let mut atlas = RgbaImage::new(1024, 1024);

        compositor.composite(
            &mut atlas,
            Rect::new(256, 256, 256, 256),
            &temp.path().join("front_files"),
        );

        assert!(renderer.calls.lock().unwrap().is_empty());
        assert!(atlas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_absent_level_dir_leaves_atlas_untouched() {
        let temp = TempDir::new().unwrap();
        let face_dir = temp.path().join("front_files");
        fs::create_dir_all(face_dir.join("7")).unwrap();

        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(8, 1), 256, &renderer);
        let mut atlas = RgbaImage::new(1024, 1024);

        compositor.composite(&mut atlas, Rect::new(256, 256, 256, 256), &face_dir);

        assert!(renderer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_tile_skips_only_that_cell() {
        let temp = TempDir::new().unwrap();
        let level_dir = temp.path().join("front_files").join("9");
        fs::create_dir_all(&level_dir).unwrap();
        // 2×2 grid with one tile missing
        write_jpeg_tile(&level_dir.join("0_0.jpg"), 256, [10, 20, 30]);
        write_jpeg_tile(&level_dir.join("1_0.jpg"), 256, [10, 20, 30]);
        write_jpeg_tile(&level_dir.join("0_1.jpg"), 256, [10, 20, 30]);

        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(9, 2), 300, &renderer);
        let mut atlas = RgbaImage::new(1200, 1200);

        compositor.composite(
            &mut atlas,
            Rect::new(300, 300, 300, 300),
            &temp.path().join("front_files"),
        );

        assert_eq!(renderer.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_undecodable_tile_is_skipped() {
        let temp = TempDir::new().unwrap();
        let level_dir = temp.path().join("front_files").join("8");
        fs::create_dir_all(&level_dir).unwrap();
        fs::write(level_dir.join("0_0.jpg"), b"this is not a jpeg").unwrap();

        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(8, 1), 256, &renderer);
        let mut atlas = RgbaImage::new(1024, 1024);

        compositor.composite(
            &mut atlas,
            Rect::new(0, 0, 256, 256),
            &temp.path().join("front_files"),
        );

        assert!(renderer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_seam_ring_is_cropped() {
        let temp = TempDir::new().unwrap();
        let level_dir = temp.path().join("front_files").join("8");
        fs::create_dir_all(&level_dir).unwrap();
        write_jpeg_tile(&level_dir.join("0_0.jpg"), 256, [200, 100, 50]);

        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(8, 1), 256, &renderer);
        let mut atlas = RgbaImage::new(1024, 1024);

        compositor.composite(
            &mut atlas,
            Rect::new(256, 256, 256, 256),
            &temp.path().join("front_files"),
        );

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (src, _dest) = calls[0];
        assert_eq!(src, Rect::new(1, 1, 254, 254));
    }

    #[test]
    fn test_single_tile_face_fills_whole_rect() {
        let temp = TempDir::new().unwrap();
        let level_dir = temp.path().join("front_files").join("8");
        fs::create_dir_all(&level_dir).unwrap();
        write_jpeg_tile(&level_dir.join("0_0.jpg"), 256, [1, 2, 3]);

        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(8, 1), 256, &renderer);
        let mut atlas = RgbaImage::new(1024, 1024);
        let face_rect = Rect::new(256, 256, 256, 256);

        compositor.composite(&mut atlas, face_rect, &temp.path().join("front_files"));

        let calls = renderer.calls.lock().unwrap();
        // The only cell is also the last row and column: stretched to the
        // face rectangle's far edge.
        assert_eq!(calls[0].1, face_rect);
    }

    #[test]
    fn test_dest_rect_proportions_and_last_column_stretch() {
        let renderer = RecordingRenderer::default();
        // 1040-pixel source face, five tile columns, drawn 1:1
        let compositor = FaceCompositor::new(selection(11, 5), 1040, &renderer);
        let face_rect = Rect::new(0, 0, 1040, 1040);

        let first = compositor.dest_rect(face_rect, 0, 0);
        assert_eq!((first.x, first.width), (0, 254));

        let second = compositor.dest_rect(face_rect, 1, 0);
        assert_eq!((second.x, second.width), (254, 254));

        let last = compositor.dest_rect(face_rect, 4, 0);
        assert_eq!(last.x, 1016);
        // 4 × 254 = 1016 content pixels placed; the remainder is stretched
        assert_eq!(last.right(), face_rect.right());
        assert_eq!(last.width, 24);
    }

    #[test]
    fn test_dest_rect_scales_with_face_rect() {
        let renderer = RecordingRenderer::default();
        // Output face half the source resolution
        let compositor = FaceCompositor::new(selection(11, 5), 1040, &renderer);
        let face_rect = Rect::new(520, 0, 520, 520);

        let first = compositor.dest_rect(face_rect, 0, 0);
        assert_eq!(first.x, 520);
        assert_eq!(first.width, 127); // 520 * 254 / 1040
        let last = compositor.dest_rect(face_rect, 4, 4);
        assert_eq!(last.right(), face_rect.right());
        assert_eq!(last.bottom(), face_rect.bottom());
    }

    #[test]
    fn test_rows_and_columns_tile_the_face_exactly() {
        let renderer = RecordingRenderer::default();
        let compositor = FaceCompositor::new(selection(11, 5), 1040, &renderer);
        let face_rect = Rect::new(0, 0, 777, 777);

        // Adjacent columns meet with no gap or overlap
        for col in 0..4 {
            let a = compositor.dest_rect(face_rect, col, 0);
            let b = compositor.dest_rect(face_rect, col + 1, 0);
            assert_eq!(a.right(), b.x);
        }
        let last = compositor.dest_rect(face_rect, 4, 0);
        assert_eq!(last.right(), face_rect.right());
    }

    #[test]
    fn test_image_ops_renderer_draws_scaled_content() {
        use image::Rgba;

        let mut src = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        // Border pixels differ; cropping must exclude them
        for i in 0..8 {
            src.put_pixel(i, 0, Rgba([0, 255, 0, 255]));
            src.put_pixel(i, 7, Rgba([0, 255, 0, 255]));
            src.put_pixel(0, i, Rgba([0, 255, 0, 255]));
            src.put_pixel(7, i, Rgba([0, 255, 0, 255]));
        }

        let mut canvas = RgbaImage::new(16, 16);
        ImageOpsRenderer.draw_scaled(
            &src,
            Rect::new(1, 1, 6, 6),
            Rect::new(4, 4, 6, 6),
            &mut canvas,
        );

        // Same-size blit: pure red content, no green seam pixels
        assert_eq!(canvas.get_pixel(4, 4).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(9, 9).0, [255, 0, 0, 255]);
        // Outside the destination stays transparent
        assert_eq!(canvas.get_pixel(3, 4).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_image_ops_renderer_zero_size_dest_is_noop() {
        let src = RgbaImage::new(4, 4);
        let mut canvas = RgbaImage::new(8, 8);
        ImageOpsRenderer.draw_scaled(
            &src,
            Rect::new(1, 1, 2, 2),
            Rect::new(0, 0, 0, 3),
            &mut canvas,
        );
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_renderer_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TileRenderer>();
    }
}
