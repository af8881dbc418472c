use crate::config::OnnxConfig;
#[cfg(not(feature = "cuda"))]
use crate::utils::error::PredictError;
use crate::Result;
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
#[cfg(feature = "cuda")]
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use serde::Serialize;
use std::fmt;

/// Where the forward pass executes. Chosen once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComputeTarget {
    Cpu,
    Cuda { device_id: i32 },
}

impl ComputeTarget {
    /// Anything but the CPU.
    pub fn is_accelerated(&self) -> bool {
        !matches!(self, ComputeTarget::Cpu)
    }

    /// Execution providers to register on the session for this target.
    ///
    /// Accelerated providers fail loudly instead of letting ONNX Runtime
    /// quietly run the graph on the CPU.
    pub fn execution_providers(&self) -> Result<Vec<ExecutionProviderDispatch>> {
        match self {
            ComputeTarget::Cpu => Ok(vec![CPUExecutionProvider::default().build()]),
            #[cfg(feature = "cuda")]
            ComputeTarget::Cuda { device_id } => Ok(vec![CUDAExecutionProvider::default()
                .with_device_id(*device_id)
                .build()
                .error_on_failure()]),
            #[cfg(not(feature = "cuda"))]
            ComputeTarget::Cuda { .. } => Err(PredictError::Device(
                "CUDA target requested but the cuda feature is not enabled".to_string(),
            )),
        }
    }
}

impl fmt::Display for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeTarget::Cpu => write!(f, "cpu"),
            ComputeTarget::Cuda { device_id } => write!(f, "cuda:{}", device_id),
        }
    }
}

/// Pick CUDA when it is compiled in, wanted, and reported usable; CPU otherwise.
pub fn select_compute_target(config: &OnnxConfig) -> ComputeTarget {
    if !config.prefer_accelerator {
        tracing::debug!("Accelerator disabled by configuration, using CPU");
        return ComputeTarget::Cpu;
    }

    #[cfg(feature = "cuda")]
    {
        let provider = CUDAExecutionProvider::default().with_device_id(config.device_id);
        match provider.is_available() {
            Ok(true) => {
                tracing::info!("CUDA execution provider available on device {}", config.device_id);
                return ComputeTarget::Cuda {
                    device_id: config.device_id,
                };
            }
            Ok(false) => tracing::info!("CUDA execution provider not available, falling back to CPU"),
            Err(e) => tracing::warn!("CUDA availability check failed, falling back to CPU: {}", e),
        }
    }

    #[cfg(not(feature = "cuda"))]
    tracing::debug!("Built without CUDA support, using CPU");

    ComputeTarget::Cpu
}
