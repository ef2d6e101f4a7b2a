//! Saving captured frames.

use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}

/// Builds an RGBA image from captured pixels of the given texture format.
///
/// BGRA formats are swizzled; wgpu uses a top-left origin, so no vertical
/// flip is needed.
pub fn to_rgba_image(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<RgbaImage, ScreenshotError> {
    let mut rgba_data = data.to_vec();
    if matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    ) {
        for chunk in rgba_data.chunks_exact_mut(4) {
            chunk.swap(0, 2);
        }
    }
    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, rgba_data)
        .ok_or(ScreenshotError::InvalidImageData)
}

/// Saves an image, picking the encoder from the file extension.
///
/// Supports `.png`, `.jpg` and `.jpeg`.
pub fn save_image(path: impl AsRef<Path>, img: &RgbaImage) -> Result<(), ScreenshotError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            // JPEG has no alpha
            let rgb_img = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => {
            return Err(ScreenshotError::UnsupportedFormat(extension));
        }
    }

    log::info!("saved {}x{} image to {}", img.width(), img.height(), path.display());
    Ok(())
}
