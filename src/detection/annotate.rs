//! Box drawing and artifact persistence.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::AnnotateError;
use crate::models::BoundingBox;

/// Outline color for detected boxes.
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Draw one hollow rectangle per box onto a fresh copy of the image.
///
/// Coordinates are taken as-is; boxes reaching past the frame are clipped at
/// the raster boundary rather than skipped. The input image is never
/// mutated.
pub fn annotate(image: &DynamicImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for b in boxes {
        let (x, y) = b.top_left();
        let rect = Rect::at(x as i32, y as i32)
            .of_size(b.width.max(1) as u32, b.height.max(1) as u32);
        draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
    }
    canvas
}

/// Annotate and persist as a maximum-quality JPEG.
///
/// Parent directories are created if absent.
pub fn annotate_to_file(
    image: &DynamicImage,
    boxes: &[BoundingBox],
    path: &Path,
) -> Result<(), AnnotateError> {
    let canvas = annotate(image, boxes);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    canvas.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, 100))?;
    Ok(())
}
