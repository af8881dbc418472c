pub mod loader;
pub mod preprocessing;
pub mod transforms;

pub use loader::ImageLoader;
pub use preprocessing::{ImagePreprocessor, INPUT_SHAPE};
pub use transforms::{ImageTransforms, INPUT_SIZE, MEAN, STD};
