pub mod annotate;
pub mod decode;
pub mod labels;
pub mod preprocess;
pub mod suppress;

use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use crate::engine::InferenceEngine;
use crate::error::DetectError;
use crate::models::BoundingBox;

/// Full detection pipeline: preprocess, model call, decode, suppress.
///
/// A run is synchronous and sequential; concurrent requests simply run their
/// own pipeline against the shared engine.
pub struct Detector {
    engine: Arc<dyn InferenceEngine>,
    probability_threshold: f32,
}

impl Detector {
    pub fn new(engine: Arc<dyn InferenceEngine>, probability_threshold: f32) -> Self {
        Self {
            engine,
            probability_threshold,
        }
    }

    /// Detect objects in an image, returning deduplicated boxes in original
    /// pixel units. Annotation is the caller's concern.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<BoundingBox>, DetectError> {
        let input = preprocess::pack(image);
        let output = self.engine.infer(input)?;
        let candidates = decode::decode(
            &output,
            image.width(),
            image.height(),
            self.probability_threshold,
        )?;
        debug!(candidates = candidates.len(), "decoded candidates");
        let boxes = suppress::suppress(candidates);
        debug!(boxes = boxes.len(), "detections after suppression");
        Ok(boxes)
    }
}
