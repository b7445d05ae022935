use serde::Serialize;

use crate::preprocess::{ImageInput, INPUT_SHAPE};

#[cfg(feature = "tensorflow")]
mod graph;
#[cfg(feature = "tensorflow")]
pub use graph::GraphModel;

/// Output classes, in the order of the model's output vector.
pub const EMOTION_CLASSES: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "neutral", "sad", "surprise",
];

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("unexpected input shape {actual:?}, expected {expected:?}")]
    InputShape { actual: [u64; 4], expected: [u64; 4] },
    #[error("model returned {0} scores, expected {n}", n = EMOTION_CLASSES.len())]
    OutputLength(usize),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Top-1 result of a classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub emotion_name: &'static str,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub status: &'static str,
    pub model_path: String,
    pub input_shape: String,
    pub output_shape: String,
    pub num_operations: usize,
    pub emotion_classes: Vec<&'static str>,
}

/// Something that turns a preprocessed image into per-class scores.
///
/// Implementations are shared across request tasks and are called from the
/// blocking thread pool.
pub trait Classifier: Send + Sync + 'static {
    /// Raw per-class probabilities, one per entry of [`EMOTION_CLASSES`].
    fn predict(&self, input: &ImageInput) -> Result<Vec<f32>, ModelError>;

    fn info(&self) -> ModelInfo;
}

/// Reject inputs that do not match the `(1, 96, 96, 3)` layout.
pub fn check_input_shape(input: &ImageInput) -> Result<(), ModelError> {
    if input.shape() != INPUT_SHAPE {
        tracing::error!(actual = ?input.shape(), expected = ?INPUT_SHAPE, "wrong input shape");
        return Err(ModelError::InputShape {
            actual: input.shape(),
            expected: INPUT_SHAPE,
        });
    }
    Ok(())
}

/// Pick the highest scoring class.
pub fn classify(scores: &[f32]) -> Result<Prediction, ModelError> {
    if scores.len() != EMOTION_CLASSES.len() {
        return Err(ModelError::OutputLength(scores.len()));
    }

    let (idx, &confidence) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or(ModelError::OutputLength(0))?;

    for (name, prob) in EMOTION_CLASSES.iter().zip(scores) {
        tracing::debug!(emotion = name, probability = prob, "class score");
    }

    Ok(Prediction {
        emotion_name: EMOTION_CLASSES[idx],
        confidence,
    })
}

pub(crate) fn shape_string(shape: &[u64]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .skip(1)
        .map(|d| d.to_string())
        .collect();
    format!("(None, {})", dims.join(", "))
}
