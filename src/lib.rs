pub mod config;
pub mod image;
pub mod models;
pub mod predict;
pub mod utils;

// Re-export the main entry points
pub use config::Config;
pub use models::{load_model, load_model_with, ComputeTarget, Model, OnnxClassifier};
pub use predict::{predict_image, predict_image_detailed, ClassLabel, Prediction};
pub use utils::error::PredictError;

pub type Result<T> = std::result::Result<T, PredictError>;
