use serde::Serialize;

/// One detected object in original-image pixel units.
///
/// `cx`/`cy` are the box center; all four geometry fields are truncated from
/// the model's 640-unit coordinate space after rescaling to the original
/// resolution, so values just outside the frame are possible for edge
/// detections.
#[derive(Debug, Clone, Serialize)]
pub struct BoundingBox {
    pub cx: i64,
    pub cy: i64,
    pub width: i64,
    pub height: i64,
    pub probability: f32,
    pub class: &'static str,
}

impl BoundingBox {
    pub fn center(&self) -> Point {
        Point {
            x: self.cx,
            y: self.cy,
        }
    }

    /// Distance threshold for duplicate suppression: 8% of this box's own
    /// width and height, collapsed into a single Euclidean radius.
    pub fn cluster_radius(&self) -> f64 {
        let dx = self.width as f64 * 0.08;
        let dy = self.height as f64 * 0.08;
        dx.hypot(dy)
    }

    /// Top-left corner, derived from center and size.
    pub fn top_left(&self) -> (i64, i64) {
        (self.cx - self.width / 2, self.cy - self.height / 2)
    }
}

/// Integer point used for center-distance comparisons during clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn distance(&self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

/// Metadata for one inference job, created at request time.
///
/// Records are appended to the process-wide registry and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
}
