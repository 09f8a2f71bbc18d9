//! Clustering-based duplicate suppression.
//!
//! Instead of IoU-based non-max suppression, duplicates are defined by
//! proximity of box centers relative to each box's own size: a candidate
//! whose center lands inside an accepted box's cluster radius is treated as
//! another sighting of the same object. This is an online single-pass
//! heuristic ordered by confidence, not a globally optimal clustering.

use std::cmp::Ordering;

use crate::models::BoundingBox;

/// Collapse redundant detections, per class.
///
/// Classes never suppress each other. Within a class the output keeps the
/// highest-confidence box of each emerging cluster, and no two surviving
/// boxes are within each other's cluster radius, which also makes the pass
/// idempotent.
pub fn suppress(candidates: Vec<BoundingBox>) -> Vec<BoundingBox> {
    // Partition by class, preserving first-seen class order so repeated runs
    // give identical output ordering.
    let mut partitions: Vec<(&'static str, Vec<BoundingBox>)> = Vec::new();
    for candidate in candidates {
        match partitions.iter_mut().find(|(c, _)| *c == candidate.class) {
            Some((_, list)) => list.push(candidate),
            None => partitions.push((candidate.class, vec![candidate])),
        }
    }

    let mut result = Vec::new();
    for (_, boxes) in partitions {
        result.extend(suppress_class(boxes));
    }
    result
}

fn suppress_class(mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    // Stable sort: equal confidences keep their first-occurrence order.
    boxes.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });

    let mut accepted: Vec<BoundingBox> = Vec::new();
    for candidate in boxes {
        // The most recently accepted box is the current cluster anchor.
        let Some(anchor) = accepted.last() else {
            accepted.push(candidate);
            continue;
        };

        let center = candidate.center();
        if center.distance(anchor.center()) <= anchor.cluster_radius() {
            // Same cluster as the current anchor.
            continue;
        }
        if accepted
            .iter()
            .any(|b| center.distance(b.center()) <= b.cluster_radius())
        {
            // Belongs to a cluster formed earlier.
            continue;
        }

        // A new distinct object; it becomes the anchor for what follows.
        accepted.push(candidate);
    }
    accepted
}
