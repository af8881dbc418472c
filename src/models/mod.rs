pub mod classifier;
pub mod device;
pub mod manager;

use crate::Result;
use ndarray::{Array2, Array4};

pub use classifier::OnnxClassifier;
pub use device::{select_compute_target, ComputeTarget};
pub use manager::{get_model_stats, load_model, load_model_with, ModelManager, ModelStats};

/// A loaded classifier: one forward pass from a normalized NCHW batch to
/// per-class scores, `[batch, classes]`.
///
/// Implementations must not mutate weights in `forward`; the predictor calls
/// it repeatedly with the same instance.
pub trait Model: Send + Sync {
    /// Device the weights live on.
    fn target(&self) -> ComputeTarget;

    fn forward(&self, batch: Array4<f32>) -> Result<Array2<f32>>;
}
