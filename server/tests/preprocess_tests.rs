use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use server::inference::preprocess::{
    CHANNEL_MEAN, CHANNEL_STD, decode_base64_image, normalized_chw, resize_for_model,
};

fn png_base64(image: &RgbImage) -> String {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    STANDARD.encode(buffer.into_inner())
}

#[test]
fn rejects_invalid_base64_alphabet() {
    let err = decode_base64_image("this is not base64 at all!!!").unwrap_err();
    assert!(err.to_string().starts_with("Invalid base64 image data"));
}

#[test]
fn rejects_bytes_without_an_image_container() {
    let data = STANDARD.encode(b"definitely not an image container");
    let err = decode_base64_image(&data).unwrap_err();
    assert!(err.to_string().starts_with("Invalid base64 image data"));
}

#[test]
fn rejects_truncated_image_bytes() {
    let image = RgbImage::from_pixel(20, 20, Rgb([1, 2, 3]));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    let bytes = buffer.into_inner();
    let truncated = STANDARD.encode(&bytes[..bytes.len() / 2]);
    assert!(decode_base64_image(&truncated).is_err());
}

#[test]
fn decodes_png_and_preserves_dimensions_and_pixels() {
    let image = RgbImage::from_pixel(5, 7, Rgb([10, 20, 30]));
    let decoded = decode_base64_image(&png_base64(&image)).unwrap();
    assert_eq!(decoded.dimensions(), (5, 7));
    assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
}

#[test]
fn tolerates_surrounding_whitespace() {
    let image = RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]));
    let padded = format!("\n{}\n", png_base64(&image));
    assert!(decode_base64_image(&padded).is_ok());
}

#[test]
fn grayscale_source_expands_to_three_channels() {
    let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, Luma([99])));
    let mut buffer = Cursor::new(Vec::new());
    gray.write_to(&mut buffer, ImageFormat::Png).unwrap();
    let decoded = decode_base64_image(&STANDARD.encode(buffer.into_inner())).unwrap();
    assert_eq!(decoded.get_pixel(0, 0).0, [99, 99, 99]);
}

#[test]
fn alpha_channel_is_flattened() {
    let rgba = RgbaImage::from_pixel(4, 4, Rgba([12, 34, 56, 200]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    let decoded = decode_base64_image(&STANDARD.encode(buffer.into_inner())).unwrap();
    assert_eq!(decoded.get_pixel(0, 0).0, [12, 34, 56]);
}

#[test]
fn resize_stretches_to_exact_target_ignoring_aspect_ratio() {
    let image = RgbImage::from_pixel(50, 10, Rgb([1, 2, 3]));
    assert_eq!(resize_for_model(&image, 224).dimensions(), (224, 224));
    assert_eq!(resize_for_model(&image, 300).dimensions(), (300, 300));
}

#[test]
fn normalization_applies_channel_mean_and_std_in_chw_layout() {
    let image = RgbImage::from_pixel(2, 2, Rgb([255, 0, 128]));
    let data = normalized_chw(&image);
    assert_eq!(data.len(), 3 * 2 * 2);

    let red = (1.0 - CHANNEL_MEAN[0]) / CHANNEL_STD[0];
    let green = (0.0 - CHANNEL_MEAN[1]) / CHANNEL_STD[1];
    let blue = (128.0 / 255.0 - CHANNEL_MEAN[2]) / CHANNEL_STD[2];

    // CHW: the four red values first, then green, then blue.
    for i in 0..4 {
        assert!((data[i] - red).abs() < 1e-6);
        assert!((data[4 + i] - green).abs() < 1e-6);
        assert!((data[8 + i] - blue).abs() < 1e-6);
    }
}
