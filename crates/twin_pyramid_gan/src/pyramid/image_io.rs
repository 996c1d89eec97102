use std::path::Path;

use burn::{prelude::Backend, tensor::Tensor, tensor::TensorData};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("failed to load image due to {:?}", .0)]
    LoadingError(#[from] std::io::Error),
    #[error("failed to encode or decode image due to {:?}", .0)]
    CodecError(#[from] image::error::ImageError),
    #[error("failed to read pixel values back from tensor due to {}", .0)]
    TensorReadError(String),
    #[error("tensor of shape {:?} does not describe an rgb raster", .0)]
    LayoutError(Vec<usize>),
}

pub fn open_image(path: &Path) -> Result<DynamicImage, ImageIoError> {
    let image = image::ImageReader::open(path)?;
    Ok(image.decode()?)
}

/// Converts a decoded raster into a [1, 3, height, width] float tensor
/// with values normalized to [-1, 1].
pub fn to_tensor<B: Backend>(image: &DynamicImage, device: &B::Device) -> Tensor<B, 4> {
    let rgb = image.to_rgb8();
    let height = rgb.height() as usize;
    let width = rgb.width() as usize;
    let data = TensorData::new(rgb.into_raw(), vec![1, height, width, 3]);
    let pixels = Tensor::<B, 4>::from_data(data, device).permute([0, 3, 1, 2]);
    (pixels - 127.5) / 127.5
}

/// Writes a [1, 3, height, width] tensor in [-1, 1] back out as an rgb image.
/// The encoding format follows the file extension of `path`.
pub fn save_image<B: Backend>(path: &Path, tensor: Tensor<B, 4>) -> Result<(), ImageIoError> {
    let [_, channels, height, width] = tensor.dims();
    if channels != 3 {
        return Err(ImageIoError::LayoutError(vec![1, channels, height, width]));
    }
    let pixels = (tensor * 127.5 + 127.5).clamp(0.0, 255.0).permute([0, 2, 3, 1]);
    let values = pixels
        .to_data()
        .into_vec::<f32>()
        .map_err(|e| ImageIoError::TensorReadError(format!("{:?}", e)))?;
    let bytes: Vec<u8> = values.iter().map(|v| v.round() as u8).collect();
    let image = RgbImage::from_raw(width as u32, height as u32, bytes)
        .ok_or_else(|| ImageIoError::LayoutError(vec![1, channels, height, width]))?;
    image.save(path)?;
    Ok(())
}
