//! Output-tensor decoding: argmax, confidence filter, coordinate rescale.

use crate::detection::labels::CLASS_NAMES;
use crate::engine::{MODEL_SIZE, OUTPUT_SHAPE, TensorBuffer};
use crate::error::EngineError;
use crate::models::BoundingBox;

/// Candidate detections per output tensor.
pub const CANDIDATE_COLUMNS: usize = 8400;
/// Rows 0-3 carry box geometry; class confidences start at row 4.
const GEOMETRY_ROWS: usize = 4;

/// Scan the `(1,84,8400)` output into bounding-box candidates.
///
/// Per column: the class row with the strictly greatest confidence wins
/// (ties keep the lowest index), and the candidate is dropped unless that
/// confidence exceeds `threshold`. Geometry is rescaled from model space to
/// the original resolution and truncated to integers. The returned list is
/// unordered and not yet deduplicated.
pub fn decode(
    output: &TensorBuffer,
    original_width: u32,
    original_height: u32,
    threshold: f32,
) -> Result<Vec<BoundingBox>, EngineError> {
    output.expect_shape(&OUTPUT_SHAPE)?;
    let data = output.data();
    let at = |row: usize, col: usize| data[row * CANDIDATE_COLUMNS + col];

    let mut boxes = Vec::new();
    for col in 0..CANDIDATE_COLUMNS {
        let mut best_class = 0;
        let mut best_prob = at(GEOMETRY_ROWS, col);
        for class in 1..CLASS_NAMES.len() {
            let prob = at(GEOMETRY_ROWS + class, col);
            if prob > best_prob {
                best_prob = prob;
                best_class = class;
            }
        }
        if best_prob <= threshold {
            continue;
        }

        let scale_x = |v: f32| (v * original_width as f32 / MODEL_SIZE as f32) as i64;
        let scale_y = |v: f32| (v * original_height as f32 / MODEL_SIZE as f32) as i64;
        boxes.push(BoundingBox {
            cx: scale_x(at(0, col)),
            cy: scale_y(at(1, col)),
            width: scale_x(at(2, col)),
            height: scale_y(at(3, col)),
            probability: best_prob,
            class: CLASS_NAMES[best_class],
        });
    }

    Ok(boxes)
}
