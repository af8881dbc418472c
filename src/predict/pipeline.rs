use crate::image::{ImageLoader, ImagePreprocessor};
use crate::models::{ComputeTarget, Model};
use crate::predict::{ClassLabel, Prediction, NUM_CLASSES};
use crate::utils::error::PredictError;
use crate::Result;
use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;
use std::time::Instant;

/// Classify the image at `path`.
///
/// Decode failures come back as [`PredictError::ImageDecode`] and leave the
/// model untouched, so the caller can simply try another file.
pub fn predict_image<M>(path: impl AsRef<Path>, target: &ComputeTarget, model: &M) -> Result<ClassLabel>
where
    M: Model + ?Sized,
{
    Ok(predict_image_detailed(path, target, model)?.label)
}

/// Like [`predict_image`], keeping the raw scores and timing.
pub fn predict_image_detailed<M>(
    path: impl AsRef<Path>,
    target: &ComputeTarget,
    model: &M,
) -> Result<Prediction>
where
    M: Model + ?Sized,
{
    let start_time = Instant::now();
    let path = path.as_ref();

    ensure_target(target, model)?;
    let image = ImageLoader::from_path(path)?;
    let (label, scores) = classify(&image, model)?;

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    tracing::info!(
        "Predicted {}: {} (scores={:?}, time={}ms)",
        path.display(),
        label,
        scores,
        elapsed_ms
    );

    Ok(Prediction {
        path: path.to_path_buf(),
        label,
        scores,
        elapsed_ms,
    })
}

/// Classify an already decoded image.
pub fn predict_decoded<M>(image: &DynamicImage, target: &ComputeTarget, model: &M) -> Result<ClassLabel>
where
    M: Model + ?Sized,
{
    ensure_target(target, model)?;
    Ok(classify(image, model)?.0)
}

fn ensure_target<M: Model + ?Sized>(target: &ComputeTarget, model: &M) -> Result<()> {
    let actual = model.target();
    if actual != *target {
        return Err(PredictError::Device(format!(
            "Model is loaded on {}, prediction requested on {}",
            actual, target
        )));
    }
    Ok(())
}

fn classify<M: Model + ?Sized>(image: &DynamicImage, model: &M) -> Result<(ClassLabel, [f32; NUM_CLASSES])> {
    let batch = ImagePreprocessor::preprocess(image)?;
    let output = model.forward(batch)?;
    let scores = single_scores(&output)?;

    let index = argmax(&scores)?;
    let label = ClassLabel::from_index(index)
        .ok_or_else(|| PredictError::Internal(format!("No label for class index {}", index)))?;

    tracing::debug!("Scores {:?} -> index {}", scores, index);
    Ok((label, scores))
}

/// The one row of a `[1, 2]` output.
fn single_scores(output: &Array2<f32>) -> Result<[f32; NUM_CLASSES]> {
    if output.dim() != (1, NUM_CLASSES) {
        return Err(PredictError::shape_mismatch([1, NUM_CLASSES], output.shape()));
    }
    Ok([output[[0, 0]], output[[0, 1]]])
}

/// Index of the largest score. Ties go to the lowest index, matching the
/// max-reduction the network was validated with; that choice is arbitrary.
pub fn argmax(scores: &[f32]) -> Result<usize> {
    if scores.is_empty() {
        return Err(PredictError::Inference("Model returned no scores".to_string()));
    }
    if let Some(i) = scores.iter().position(|s| s.is_nan()) {
        return Err(PredictError::Inference(format!("Score {} is NaN", i)));
    }

    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    Ok(best)
}
