use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use image::imageops::FilterType;
use tch::Tensor;
use thiserror::Error;

/// Per-channel normalization constants for EfficientNet-family inputs,
/// applied after scaling pixels to [0, 1].
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Error)]
pub enum InvalidImageError {
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid base64 image data: image has zero width or height")]
    ZeroDimension,
}

/// Decodes a base64 string into an RGB pixel buffer. Alpha is flattened and
/// grayscale expanded so the result is always three channels.
pub fn decode_base64_image(image_base64: &str) -> Result<RgbImage, InvalidImageError> {
    let raw = STANDARD.decode(image_base64.trim())?;
    let image = image::load_from_memory(&raw)?.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(InvalidImageError::ZeroDimension);
    }
    Ok(image)
}

/// Stretches the image to exactly `size` x `size`; aspect ratio is not
/// preserved.
pub fn resize_for_model(image: &RgbImage, size: u32) -> RgbImage {
    image::imageops::resize(image, size, size, FilterType::Triangle)
}

/// Pixel values scaled to [0, 1], normalized per channel, laid out CHW.
pub fn normalized_chw(image: &RgbImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let pixels = (width * height) as usize;
    let mut data = vec![0.0f32; 3 * pixels];
    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for channel in 0..3 {
            let value = pixel.0[channel] as f32 / 255.0;
            data[channel * pixels + offset] =
                (value - CHANNEL_MEAN[channel]) / CHANNEL_STD[channel];
        }
    }
    data
}

/// Builds the `[1, 3, size, size]` input batch for a single image.
pub fn input_tensor(image: &RgbImage, size: u32) -> Tensor {
    let resized = resize_for_model(image, size);
    let data = normalized_chw(&resized);
    Tensor::from_slice(&data).view((1, 3, size as i64, size as i64))
}
