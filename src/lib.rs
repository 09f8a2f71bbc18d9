pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod models;
pub mod server;
pub mod store;
pub mod tasks;

pub use config::ServiceConfig;
pub use detection::Detector;
pub use engine::{InferenceEngine, OrtEngine, TensorBuffer};
pub use error::{AnnotateError, DetectError, EngineError};
pub use models::{BoundingBox, InferenceRecord, Point};
pub use store::InferenceStore;
pub use tasks::{AnnotationJob, AnnotationQueue};
