//! Model execution boundary: tensor buffers, the engine trait and the
//! onnxruntime-backed implementation.

use std::path::{Path, PathBuf};

use ort::session::Session;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Side length of the model's square input canvas.
pub const MODEL_SIZE: u32 = 640;
/// Input tensor contract: one batch, RGB planes, 640x640.
pub const INPUT_SHAPE: [usize; 4] = [1, 3, 640, 640];
/// Output tensor contract: one batch, 4 geometry rows + 80 class rows,
/// 8400 candidate columns.
pub const OUTPUT_SHAPE: [usize; 3] = [1, 84, 8400];
/// Named input slot the model reads from.
pub const INPUT_SLOT: &str = "images";
/// Named output slot the model writes to.
pub const OUTPUT_SLOT: &str = "output0";

/// A flat buffer of 32-bit floats with an explicit logical shape.
#[derive(Debug, Clone)]
pub struct TensorBuffer {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TensorBuffer {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Verify this buffer against a fixed contract shape.
    pub fn expect_shape(&self, expected: &[usize]) -> Result<(), EngineError> {
        if self.shape != expected || self.data.len() != expected.iter().product::<usize>() {
            return Err(EngineError::ShapeMismatch {
                expected: expected.to_vec(),
                got: self.shape.clone(),
            });
        }
        Ok(())
    }
}

/// An opaque capability that turns one input tensor into one output tensor.
pub trait InferenceEngine: Send + Sync {
    fn infer(&self, input: TensorBuffer) -> Result<TensorBuffer, EngineError>;
}

/// Known onnxruntime shared-library locations, keyed by (OS, architecture).
const RUNTIME_FALLBACKS: &[(&str, &str, &str)] = &[
    ("linux", "x86_64", "/usr/lib/x86_64-linux-gnu/libonnxruntime.so"),
    ("linux", "aarch64", "/usr/lib/aarch64-linux-gnu/libonnxruntime.so"),
    ("macos", "x86_64", "/usr/local/lib/libonnxruntime.dylib"),
    ("macos", "aarch64", "/opt/homebrew/lib/libonnxruntime.dylib"),
    ("windows", "x86_64", "C:\\onnxruntime\\lib\\onnxruntime.dll"),
];

/// Fallback library path for a platform, if one is known.
pub fn fallback_library_path(os: &str, arch: &str) -> Option<&'static str> {
    RUNTIME_FALLBACKS
        .iter()
        .find(|(o, a, _)| *o == os && *a == arch)
        .map(|(_, _, path)| *path)
}

/// Initialize the onnxruntime environment once at startup.
///
/// Default discovery is tried first, then exactly one retry with an explicit
/// library location: the configured override if present, otherwise the
/// platform-keyed fallback. Failure after the retry is fatal to the process,
/// since no request can succeed without the runtime.
pub fn init_runtime(override_path: Option<&Path>) -> Result<(), EngineError> {
    if let Some(path) = override_path {
        ort::init_from(path.to_string_lossy())
            .with_name("spotter")
            .commit()
            .map_err(EngineError::RuntimeInit)?;
        return Ok(());
    }

    match ort::init().with_name("spotter").commit() {
        Ok(_) => Ok(()),
        Err(first) => {
            let os = std::env::consts::OS;
            let arch = std::env::consts::ARCH;
            let Some(path) = fallback_library_path(os, arch) else {
                warn!(error = %first, os, arch, "runtime discovery failed, no fallback known");
                return Err(EngineError::UnsupportedPlatform { os, arch });
            };
            warn!(error = %first, path, "runtime discovery failed, retrying with fallback library");
            ort::init_from(path)
                .with_name("spotter")
                .commit()
                .map_err(EngineError::RuntimeInit)?;
            Ok(())
        }
    }
}

/// Engine backed by an ONNX model file.
///
/// Each call builds its own session; session, input tensor and output tensor
/// are all dropped when the call returns, success or failure.
pub struct OrtEngine {
    model_path: PathBuf,
}

impl OrtEngine {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }
}

impl InferenceEngine for OrtEngine {
    fn infer(&self, input: TensorBuffer) -> Result<TensorBuffer, EngineError> {
        input.expect_shape(&INPUT_SHAPE)?;

        let mut session = Session::builder()?.commit_from_file(&self.model_path)?;
        let value = ort::value::Value::from_array((
            INPUT_SHAPE.as_slice(),
            input.into_data().into_boxed_slice(),
        ))?;

        let outputs = session.run(ort::inputs![INPUT_SLOT => value])?;
        let output = outputs
            .get(OUTPUT_SLOT)
            .ok_or(EngineError::MissingOutput(OUTPUT_SLOT))?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let shape: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
        debug!(?shape, "model output received");

        let buffer = TensorBuffer::new(shape, data.to_vec());
        buffer.expect_shape(&OUTPUT_SHAPE)?;
        Ok(buffer)
    }
}
