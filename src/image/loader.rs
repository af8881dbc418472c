use crate::utils::error::PredictError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Upper bound for in-memory image payloads.
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// File extensions the sample folders are scanned for.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub struct ImageLoader;

impl ImageLoader {
    /// Decode an image from disk.
    ///
    /// The container format is sniffed from the content, so a JPEG saved as
    /// `.png` still decodes, while a text file renamed to `.png` fails with
    /// [`PredictError::ImageDecode`]. Read failures are reported the same way.
    /// Recognized formats other than PNG/JPEG give
    /// [`PredictError::UnsupportedFormat`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<DynamicImage> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(image::ImageError::IoError)?;
        Self::ensure_supported(reader.format())?;

        let image = reader.decode()?;
        Self::validate_dimensions(&image)?;

        tracing::debug!(
            "Decoded {} ({}x{}, {:?})",
            path.display(),
            image.width(),
            image.height(),
            image.color()
        );
        Ok(image)
    }

    /// Decode an image held in memory, same format rules as [`Self::from_path`].
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PredictError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }
        Self::ensure_supported(Self::detect_format(bytes))?;

        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// Format from the magic bytes, if any is recognized.
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// Only PNG and JPEG are accepted, like the upload filter of the page.
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// Unknown formats pass through so the decoder reports them.
    fn ensure_supported(format: Option<ImageFormat>) -> Result<()> {
        match format {
            Some(format) if !Self::is_supported_format(format) => Err(
                PredictError::UnsupportedFormat(format!("{:?}", format)),
            ),
            _ => Ok(()),
        }
    }

    /// Does the file name carry one of [`IMAGE_EXTENSIONS`]? Case-insensitive.
    pub fn has_image_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }

    /// Image files directly inside `dir`, sorted by file name.
    ///
    /// A folder that does not exist yet simply has no images.
    pub fn list_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.exists() {
            tracing::debug!("Image directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && Self::has_image_extension(&path) {
                images.push(path);
            }
        }
        images.sort();

        Ok(images)
    }

    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PredictError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }
        Ok(())
    }
}
