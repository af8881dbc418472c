use crate::models::{select_compute_target, ComputeTarget, OnnxClassifier};
use crate::utils::error::PredictError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Load the classifier from the fixed artifact path.
pub fn load_model() -> Result<(ComputeTarget, OnnxClassifier)> {
    load_model_with(&Config::default())
}

/// Pick a compute target, then deserialize the artifact onto it.
///
/// Neither failure is recovered here: without a model there is nothing to
/// serve, so callers should abort startup.
pub fn load_model_with(config: &Config) -> Result<(ComputeTarget, OnnxClassifier)> {
    config.validate()?;

    let target = select_compute_target(&config.onnx_config);
    let model = OnnxClassifier::new(config, target)?;

    Ok((target, model))
}

/// Process-wide holder for the loaded classifier.
pub struct ModelManager {
    target: ComputeTarget,
    model: Arc<OnnxClassifier>,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// Load the model once for the lifetime of the process.
    pub fn init(config: Config) -> Result<Arc<ModelManager>> {
        if MODEL_MANAGER.get().is_some() {
            return Err(PredictError::Internal(
                "Model manager already initialized".to_string(),
            ));
        }

        tracing::info!("Initializing model manager...");
        let (target, model) = load_model_with(&config)?;

        let manager = Arc::new(ModelManager {
            target,
            model: Arc::new(model),
            config,
        });

        MODEL_MANAGER
            .set(Arc::clone(&manager))
            .map_err(|_| PredictError::Internal("Failed to initialize model manager".to_string()))?;

        tracing::info!("Model manager initialized on {}", target);
        Ok(manager)
    }

    /// Handle to the manager created by [`ModelManager::init`].
    pub fn instance() -> Result<Arc<ModelManager>> {
        MODEL_MANAGER
            .get()
            .cloned()
            .ok_or_else(|| PredictError::Internal("Model manager not initialized".to_string()))
    }

    /// Compute target chosen at init.
    pub fn target(&self) -> ComputeTarget {
        self.target
    }

    /// Shared classifier.
    pub fn model(&self) -> Arc<OnnxClassifier> {
        Arc::clone(&self.model)
    }

    /// Config the model was loaded with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Model signature and runtime settings.
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            target: self.target,
            model_path: self.model.model_path().to_path_buf(),
            input_name: self.model.input_name().to_string(),
            output_name: self.model.output_name().to_string(),
            input_dims: self.model.input_dims().to_vec(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// Model information
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    /// Device the model runs on
    pub target: ComputeTarget,
    /// Loaded artifact
    pub model_path: PathBuf,
    /// Graph input name
    pub input_name: String,
    /// Graph output name
    pub output_name: String,
    /// Declared input dims, -1 for dynamic axes
    pub input_dims: Vec<i64>,
    /// Intra-op CPU threads
    pub intra_threads: usize,
    /// Graph optimization level
    pub optimization_level: i32,
}

/// Shortcut: stats of the global manager.
pub fn get_model_stats() -> Result<ModelStats> {
    Ok(ModelManager::instance()?.get_stats())
}
