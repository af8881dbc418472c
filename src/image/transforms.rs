use crate::utils::error::PredictError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::{Array3, Axis};

/// Side length of the square network input.
pub const INPUT_SIZE: u32 = 460;

/// ImageNet channel statistics, R, G, B.
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Single steps of the preprocessing chain.
pub struct ImageTransforms;

impl ImageTransforms {
    /// Force three color channels: alpha is dropped, gray is replicated.
    pub fn to_rgb(image: &DynamicImage) -> RgbImage {
        image.to_rgb8()
    }

    /// Bilinear resize to exactly `width`x`height`; aspect ratio is not kept.
    ///
    /// Deterministic, but not bit-identical to torchvision's PIL resize:
    /// `FilterType::Triangle` keeps an f32 intermediate between the two passes
    /// where PIL rounds to u8, so single channel values can differ by 1.
    pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
        if image.dimensions() == (width, height) {
            return image.clone();
        }
        image::imageops::resize(image, width, height, FilterType::Triangle)
    }

    /// HWC bytes to a CHW float tensor in [0, 1].
    pub fn to_tensor(image: &RgbImage) -> Result<Array3<f32>> {
        let (width, height) = image.dimensions();
        let hwc = Array3::from_shape_vec(
            (height as usize, width as usize, 3),
            image.as_raw().clone(),
        )
        .map_err(|e| PredictError::Internal(format!("Pixel buffer layout: {}", e)))?;

        let chw = hwc
            .mapv(|v| v as f32 / 255.0)
            .permuted_axes([2, 0, 1])
            .as_standard_layout()
            .into_owned();

        Ok(chw)
    }

    /// `(x - mean[c]) / std[c]` for every channel of a CHW tensor.
    pub fn normalize(mut tensor: Array3<f32>, mean: &[f32; 3], std: &[f32; 3]) -> Result<Array3<f32>> {
        let channels = tensor.len_of(Axis(0));
        if channels != 3 {
            return Err(PredictError::shape_mismatch(
                [3, tensor.len_of(Axis(1)), tensor.len_of(Axis(2))],
                tensor.shape(),
            ));
        }
        if std.iter().any(|s| *s == 0.0) {
            return Err(PredictError::InvalidInput(
                "Standard deviation must be non-zero".to_string(),
            ));
        }

        for (c, mut plane) in tensor.axis_iter_mut(Axis(0)).enumerate() {
            let (m, s) = (mean[c], std[c]);
            plane.mapv_inplace(|v| (v - m) / s);
        }

        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};

    #[test]
    fn gray_is_replicated_and_alpha_dropped() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([77])));
        assert_eq!(*ImageTransforms::to_rgb(&gray).get_pixel(0, 0), Rgb([77, 77, 77]));

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 0])));
        assert_eq!(*ImageTransforms::to_rgb(&rgba).get_pixel(1, 1), Rgb([1, 2, 3]));
    }

    #[test]
    fn resize_hits_exact_size() {
        let img = RgbImage::from_pixel(31, 977, Rgb([5, 6, 7]));
        let resized = ImageTransforms::resize(&img, INPUT_SIZE, INPUT_SIZE);
        assert_eq!(resized.dimensions(), (INPUT_SIZE, INPUT_SIZE));
    }

    #[test]
    fn uniform_color_survives_resize() {
        let img = RgbImage::from_pixel(640, 480, Rgb([200, 100, 50]));
        let resized = ImageTransforms::resize(&img, INPUT_SIZE, INPUT_SIZE);
        assert!(resized.pixels().all(|p| *p == Rgb([200, 100, 50])));
    }

    #[test]
    fn to_tensor_is_channel_first() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([255, 0, 51]));
        let tensor = ImageTransforms::to_tensor(&img).unwrap();

        assert_eq!(tensor.shape(), &[3, 2, 3]);
        assert_eq!(tensor[[0, 1, 2]], 1.0);
        assert_eq!(tensor[[1, 1, 2]], 0.0);
        assert_eq!(tensor[[2, 1, 2]], 51.0 / 255.0);
        assert_eq!(tensor[[0, 0, 0]], 0.0);
    }

    #[test]
    fn normalize_applies_per_channel_constants() {
        let tensor = Array3::<f32>::from_elem((3, 1, 1), 0.5);
        let out = ImageTransforms::normalize(tensor, &MEAN, &STD).unwrap();
        for c in 0..3 {
            let expected = (0.5 - MEAN[c]) / STD[c];
            assert!((out[[c, 0, 0]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn normalize_rejects_wrong_channel_count() {
        let tensor = Array3::<f32>::zeros((4, 2, 2));
        let err = ImageTransforms::normalize(tensor, &MEAN, &STD).unwrap_err();
        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
    }

    #[test]
    fn normalize_rejects_zero_std() {
        let tensor = Array3::<f32>::zeros((3, 1, 1));
        assert!(ImageTransforms::normalize(tensor, &MEAN, &[1.0, 0.0, 1.0]).is_err());
    }
}
