use crate::image::INPUT_SHAPE;
use crate::models::{ComputeTarget, Model};
use crate::utils::error::PredictError;
use crate::{Config, Result};
use ndarray::{Array2, Array4, Ix2};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    tensor::TensorElementType,
    value::{Tensor, ValueType},
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Benign/malignant network exported to ONNX.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    target: ComputeTarget,
    model_path: PathBuf,
    input_name: String,
    output_name: String,
    input_dims: Vec<i64>, // -1 marks a dynamic axis
}

impl OnnxClassifier {
    /// Build an ONNX Runtime session for `config.model_path` on `target` and
    /// check the graph signature against the preprocessing output.
    pub fn new(config: &Config, target: ComputeTarget) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.is_file() {
            return Err(PredictError::ArtifactLoad(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!(
            "Loading classifier from {} on {}",
            model_path.display(),
            target
        );

        let providers = target.execution_providers()?;
        let onnx = &config.onnx_config;
        let level = if onnx.enable_optimization {
            optimization_level(onnx.optimization_level)
        } else {
            GraphOptimizationLevel::Disable
        };

        let session = Session::builder()
            .map_err(setup_error)?
            .with_optimization_level(level)
            .map_err(setup_error)?
            .with_intra_threads(onnx.intra_threads)
            .map_err(setup_error)?
            .with_execution_providers(providers)
            .map_err(|e| PredictError::Device(format!("Cannot use {}: {}", target, e)))?
            .commit_from_file(model_path)
            .map_err(|e| {
                PredictError::ArtifactLoad(format!("{}: {}", model_path.display(), e))
            })?;

        let (input_name, input_dims) = Self::inspect_input(&session)?;
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(PredictError::ArtifactLoad(
                    "Classifier model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classifier ready: input '{}' {:?}, output '{}'",
            input_name,
            input_dims,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classifier output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            target,
            model_path: model_path.clone(),
            input_name,
            output_name,
            input_dims,
        })
    }

    /// First graph input must be an f32 tensor that accepts a 1x3x460x460 batch.
    fn inspect_input(session: &Session) -> Result<(String, Vec<i64>)> {
        let input = session.inputs.first().ok_or_else(|| {
            PredictError::ArtifactLoad("Classifier model has no inputs".to_string())
        })?;

        let dims: Vec<i64> = match &input.input_type {
            ValueType::Tensor { ty, shape, .. } => {
                if *ty != TensorElementType::Float32 {
                    return Err(PredictError::ArtifactLoad(format!(
                        "Input '{}' has element type {:?}, expected f32",
                        input.name, ty
                    )));
                }
                shape.iter().copied().collect()
            }
            other => {
                return Err(PredictError::ArtifactLoad(format!(
                    "Input '{}' is not a tensor: {:?}",
                    input.name, other
                )))
            }
        };

        if !dims_accept(&dims, &INPUT_SHAPE) {
            return Err(PredictError::ArtifactLoad(format!(
                "Input '{}' expects {:?}, preprocessing produces {:?}",
                input.name, dims, INPUT_SHAPE
            )));
        }

        Ok((input.name.clone(), dims))
    }

    /// File the session was loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Name of the graph input the batch is bound to.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Name of the graph output read as scores.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Declared input dims, -1 for dynamic axes.
    pub fn input_dims(&self) -> &[i64] {
        &self.input_dims
    }
}

impl Model for OnnxClassifier {
    fn target(&self) -> ComputeTarget {
        self.target
    }

    fn forward(&self, batch: Array4<f32>) -> Result<Array2<f32>> {
        if !dims_accept(&self.input_dims, batch.shape()) {
            return Err(PredictError::shape_mismatch(&self.input_dims, batch.shape()));
        }

        let input_tensor = Tensor::from_array(batch)?;
        let scores = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(PredictError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        let shape = scores.shape().to_vec();
        scores
            .into_dimensionality::<Ix2>()
            .map_err(|_| PredictError::ShapeMismatch {
                expected: "[batch, classes]".to_string(),
                actual: format!("{:?}", shape),
            })
    }
}

/// Do declared model dims accept a concrete shape? Non-positive dims are dynamic.
pub(crate) fn dims_accept(declared: &[i64], actual: &[usize]) -> bool {
    declared.len() == actual.len()
        && declared
            .iter()
            .zip(actual)
            .all(|(&d, &a)| d <= 0 || d as usize == a)
}

fn setup_error(e: impl std::fmt::Display) -> PredictError {
    PredictError::ArtifactLoad(format!("Session setup failed: {}", e))
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_batch_axis_accepted() {
        assert!(dims_accept(&[-1, 3, 460, 460], &INPUT_SHAPE));
        assert!(dims_accept(&[1, 3, 460, 460], &INPUT_SHAPE));
        assert!(dims_accept(&[-1, 3, -1, -1], &INPUT_SHAPE));
    }

    #[test]
    fn wrong_spatial_size_or_rank_rejected() {
        assert!(!dims_accept(&[1, 3, 224, 224], &INPUT_SHAPE));
        assert!(!dims_accept(&[1, 460, 460], &INPUT_SHAPE));
        assert!(!dims_accept(&[1, 1, 460, 460], &INPUT_SHAPE));
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let config = Config::new("/nonexistent/best_model.onnx", Some(1), false).unwrap();
        let err = OnnxClassifier::new(&config, ComputeTarget::Cpu)
            .err()
            .expect("load must fail");
        assert!(matches!(err, PredictError::ArtifactLoad(_)));
    }

    #[test]
    fn corrupt_artifact_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best_model.onnx");
        std::fs::write(&path, b"this is not a protobuf graph").unwrap();

        let config = Config::new(&path, Some(1), false).unwrap();
        let err = OnnxClassifier::new(&config, ComputeTarget::Cpu)
            .err()
            .expect("load must fail");
        assert!(matches!(err, PredictError::ArtifactLoad(_)), "{:?}", err);
    }

    #[test]
    fn optimization_levels_map() {
        assert!(matches!(optimization_level(0), GraphOptimizationLevel::Disable));
        assert!(matches!(optimization_level(3), GraphOptimizationLevel::Level3));
    }
}
