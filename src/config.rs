use crate::utils::error::PredictError;
use crate::Result;
use std::path::PathBuf;

/// Where the exported classifier lives unless overridden.
pub const DEFAULT_MODEL_PATH: &str = "models/best_model.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// Serialized ONNX classifier
    pub model_path: PathBuf,

    /// Folders the CLI browses for images
    pub samples: SampleDirs,

    /// ONNX Runtime settings
    pub onnx_config: OnnxConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU threads used inside a single operator
    pub intra_threads: usize,

    /// Graph optimization level (0-3)
    pub optimization_level: i32,

    /// Enable graph optimization
    pub enable_optimization: bool,

    /// Try the CUDA execution provider before falling back to CPU
    pub prefer_accelerator: bool,

    /// CUDA device ordinal
    pub device_id: i32,
}

#[derive(Debug, Clone)]
pub struct SampleDirs {
    /// Bundled reference images
    pub test_dir: PathBuf,

    /// Images added by users
    pub user_dir: PathBuf,
}

impl Default for SampleDirs {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from("utils/test_data"),
            user_dir: PathBuf::from("utils/user_images"),
        }
    }
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            intra_threads: (num_cpus::get() * 3 / 4).max(1), // 75% of the cores
            optimization_level: 3,
            enable_optimization: true,
            prefer_accelerator: true,
            device_id: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            samples: SampleDirs::default(),
            onnx_config: OnnxConfig::default(),
        }
    }
}

impl Config {
    /// Config for the model at `model_path`; `threads` overrides the default
    /// intra-op thread count, `prefer_accelerator: false` pins the CPU.
    pub fn new(
        model_path: impl Into<PathBuf>,
        threads: Option<usize>,
        prefer_accelerator: bool,
    ) -> Result<Self> {
        let model_path = model_path.into();
        if model_path.as_os_str().is_empty() {
            return Err(PredictError::Config("Model path cannot be empty".to_string()));
        }

        let mut onnx_config = OnnxConfig {
            prefer_accelerator,
            ..OnnxConfig::default()
        };
        if let Some(threads) = threads {
            if threads == 0 {
                return Err(PredictError::Config(
                    "Thread count must be at least 1".to_string(),
                ));
            }
            onnx_config.intra_threads = threads;
        }

        Ok(Self {
            model_path,
            samples: SampleDirs::default(),
            onnx_config,
        })
    }

    /// Replace the sample folders.
    pub fn with_samples(mut self, samples: SampleDirs) -> Self {
        self.samples = samples;
        self
    }

    /// Range-checks values that may have been edited after construction.
    pub fn validate(&self) -> Result<()> {
        if self.onnx_config.intra_threads == 0 {
            return Err(PredictError::Config(
                "Thread count must be at least 1".to_string(),
            ));
        }
        if !(0..=3).contains(&self.onnx_config.optimization_level) {
            return Err(PredictError::Config(format!(
                "Optimization level {} out of range 0-3",
                self.onnx_config.optimization_level
            )));
        }
        if self.onnx_config.device_id < 0 {
            return Err(PredictError::Config(format!(
                "Invalid device id {}",
                self.onnx_config.device_id
            )));
        }
        Ok(())
    }
}
