use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// Side length of the square input the classifier was trained on.
pub const INPUT_SIZE: u32 = 96;
pub const INPUT_CHANNELS: u32 = 3;
/// NHWC shape of a single-image batch.
pub const INPUT_SHAPE: [u64; 4] = [1, INPUT_SIZE as u64, INPUT_SIZE as u64, INPUT_CHANNELS as u64];

#[derive(Debug, thiserror::Error)]
#[error("Could not process the provided image")]
pub struct PreprocessError(#[from] image::ImageError);

/// A decoded, resized and normalized image ready to be fed to the model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    shape: [u64; 4],
    data: Vec<f32>,
}

impl ImageInput {
    pub fn new(shape: [u64; 4], data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    pub fn shape(&self) -> [u64; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Decode raw bytes (JPEG, PNG, WEBP), convert to RGB, resize to 96x96 and
/// scale every channel into `[0, 1]`.
pub fn preprocess_image(image_data: &[u8]) -> Result<ImageInput, PreprocessError> {
    let img = image::load_from_memory(image_data)?;
    let resized = resize_rgb(&img, INPUT_SIZE);

    let mut flat_img = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * INPUT_CHANNELS) as usize);
    for pixel in resized.pixels() {
        flat_img.push(pixel[0] as f32 / 255.0);
        flat_img.push(pixel[1] as f32 / 255.0);
        flat_img.push(pixel[2] as f32 / 255.0);
    }

    Ok(ImageInput::new(INPUT_SHAPE, flat_img))
}

// Grayscale and RGBA sources are flattened to plain RGB before resizing.
fn resize_rgb(image: &DynamicImage, target_size: u32) -> RgbImage {
    let rgb = image.to_rgb8();
    image::imageops::resize(&rgb, target_size, target_size, FilterType::CatmullRom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Luma, Rgb};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn output_has_model_shape() {
        let img = ImageBuffer::from_pixel(320, 200, Rgb([10u8, 20, 30]));
        let input = preprocess_image(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();

        assert_eq!(input.shape(), [1, 96, 96, 3]);
        assert_eq!(input.data().len(), 96 * 96 * 3);
    }

    #[test]
    fn values_are_normalized() {
        let img = ImageBuffer::from_pixel(50, 50, Rgb([255u8, 0, 51]));
        let input = preprocess_image(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();

        assert!(input.data().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((input.data()[0] - 1.0).abs() < 1e-6);
        assert!(input.data()[1].abs() < 1e-6);
        assert!((input.data()[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn grayscale_is_expanded_to_rgb() {
        let img = ImageBuffer::from_pixel(96, 96, Luma([128u8]));
        let input = preprocess_image(&encode_png(DynamicImage::ImageLuma8(img))).unwrap();

        let first = &input.data()[..3];
        assert_eq!(first[0], first[1]);
        assert_eq!(first[1], first[2]);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = preprocess_image(b"definitely not an image").unwrap_err();
        assert_eq!(err.to_string(), "Could not process the provided image");
    }
}
