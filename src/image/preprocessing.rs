use crate::image::transforms::{ImageTransforms, INPUT_SIZE, MEAN, STD};
use crate::Result;
use image::DynamicImage;
use ndarray::{Array4, Axis};

/// Shape of the batch handed to the classifier, NCHW.
pub const INPUT_SHAPE: [usize; 4] = [1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize];

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Classifier preprocessing chain:
    /// RGB -> 460x460 bilinear -> [0, 1] -> mean/std normalize -> batch of 1.
    pub fn preprocess(image: &DynamicImage) -> Result<Array4<f32>> {
        let rgb = ImageTransforms::to_rgb(image);
        let resized = ImageTransforms::resize(&rgb, INPUT_SIZE, INPUT_SIZE);
        let tensor = ImageTransforms::to_tensor(&resized)?;
        let normalized = ImageTransforms::normalize(tensor, &MEAN, &STD)?;

        Ok(normalized.insert_axis(Axis(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn any_resolution_becomes_fixed_batch() {
        for (w, h) in [(1, 1), (50, 1200), (1024, 768)] {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([9, 9, 9])));
            let batch = ImagePreprocessor::preprocess(&img).unwrap();
            assert_eq!(batch.shape(), &INPUT_SHAPE);
        }
    }

    #[test]
    fn known_color_maps_to_known_values() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 60, Rgb([255, 0, 128])));
        let batch = ImagePreprocessor::preprocess(&img).unwrap();

        let expected = [
            (1.0 - MEAN[0]) / STD[0],
            (0.0 - MEAN[1]) / STD[1],
            (128.0 / 255.0 - MEAN[2]) / STD[2],
        ];
        for (c, want) in expected.iter().enumerate() {
            let plane = batch.index_axis(Axis(1), c);
            assert!(plane.iter().all(|v| (v - want).abs() < 1e-6), "channel {}", c);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(333, 217, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        }));
        let first = ImagePreprocessor::preprocess(&img).unwrap();
        let second = ImagePreprocessor::preprocess(&img).unwrap();

        let max_diff = first
            .iter()
            .zip(second.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff <= 1e-6);
    }

    #[test]
    fn grayscale_channels_differ_only_by_constants() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([128])));
        let batch = ImagePreprocessor::preprocess(&img).unwrap();
        let v = 128.0 / 255.0;
        for c in 0..3 {
            let got = batch[[0, c, 5, 5]];
            assert!((got - (v - MEAN[c]) / STD[c]).abs() < 1e-6);
        }
    }
}
