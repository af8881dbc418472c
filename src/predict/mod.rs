pub mod pipeline;
pub mod types;

pub use pipeline::{argmax, predict_decoded, predict_image, predict_image_detailed};
pub use types::{ClassLabel, Prediction, NUM_CLASSES};
