//! Image-to-tensor preprocessing.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::engine::{INPUT_SHAPE, MODEL_SIZE, TensorBuffer};

/// Reduce a 16-bit channel sample to the model's expected [0,1] range.
///
/// The channel accessor yields values in [0, 65535]; integer division by 257
/// brings them back to the 8-bit scale before the divide by 255. The model
/// was trained against exactly this convention, so no other normalization is
/// applied.
pub fn normalize_channel(value: u16) -> f32 {
    (value / 257) as f32 / 255.0
}

/// Pack an image into the model's `(1,3,640,640)` channel-planar input.
///
/// The resize runs on a copy with a Lanczos filter; the caller keeps the
/// original at full resolution, since detected coordinates are rescaled back
/// to it and annotation draws on it. Alpha is discarded.
pub fn pack(image: &DynamicImage) -> TensorBuffer {
    let resized = image
        .resize_exact(MODEL_SIZE, MODEL_SIZE, FilterType::Lanczos3)
        .to_rgba16();

    let plane = (MODEL_SIZE * MODEL_SIZE) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        let [r, g, b, _] = pixel.0;
        data[i] = normalize_channel(r);
        data[plane + i] = normalize_channel(g);
        data[2 * plane + i] = normalize_channel(b);
    }

    TensorBuffer::new(INPUT_SHAPE.to_vec(), data)
}
