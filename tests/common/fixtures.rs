use image::{DynamicImage, Rgb, RgbImage};

use spotter::engine::{INPUT_SHAPE, InferenceEngine, OUTPUT_SHAPE, TensorBuffer};
use spotter::error::EngineError;
use spotter::models::BoundingBox;

/// Candidate columns in the model output.
pub const COLUMNS: usize = 8400;

/// All-zero `(1,84,8400)` output data.
pub fn empty_output() -> Vec<f32> {
    vec![0.0; 84 * COLUMNS]
}

/// Write one candidate column in model-space units.
pub fn set_candidate(
    data: &mut [f32],
    col: usize,
    cx: f32,
    cy: f32,
    width: f32,
    height: f32,
    class: usize,
    prob: f32,
) {
    data[col] = cx;
    data[COLUMNS + col] = cy;
    data[2 * COLUMNS + col] = width;
    data[3 * COLUMNS + col] = height;
    data[(4 + class) * COLUMNS + col] = prob;
}

pub fn output_tensor(data: Vec<f32>) -> TensorBuffer {
    TensorBuffer::new(OUTPUT_SHAPE.to_vec(), data)
}

/// Engine that checks the input contract and replays a fixed output.
pub struct CannedEngine {
    output: TensorBuffer,
}

impl CannedEngine {
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            output: output_tensor(data),
        }
    }
}

impl InferenceEngine for CannedEngine {
    fn infer(&self, input: TensorBuffer) -> Result<TensorBuffer, EngineError> {
        input.expect_shape(&INPUT_SHAPE)?;
        Ok(self.output.clone())
    }
}

/// Engine that stalls for a fixed wall-clock time before answering.
pub struct StalledEngine(pub std::time::Duration);

impl InferenceEngine for StalledEngine {
    fn infer(&self, _input: TensorBuffer) -> Result<TensorBuffer, EngineError> {
        std::thread::sleep(self.0);
        Ok(output_tensor(empty_output()))
    }
}

/// Engine returning a deliberately wrong-shaped output tensor.
pub struct MisshapenEngine;

impl InferenceEngine for MisshapenEngine {
    fn infer(&self, _input: TensorBuffer) -> Result<TensorBuffer, EngineError> {
        Ok(TensorBuffer::new(vec![1, 84, 100], vec![0.0; 84 * 100]))
    }
}

/// Single-color test image.
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

pub fn make_box(
    class: &'static str,
    cx: i64,
    cy: i64,
    width: i64,
    height: i64,
    probability: f32,
) -> BoundingBox {
    BoundingBox {
        cx,
        cy,
        width,
        height,
        probability,
        class,
    }
}

/// Comparable fingerprint of a box list, for equality assertions.
pub fn fingerprints(boxes: &[BoundingBox]) -> Vec<(i64, i64, i64, i64, u32, &'static str)> {
    boxes
        .iter()
        .map(|b| {
            (
                b.cx,
                b.cy,
                b.width,
                b.height,
                b.probability.to_bits(),
                b.class,
            )
        })
        .collect()
}
