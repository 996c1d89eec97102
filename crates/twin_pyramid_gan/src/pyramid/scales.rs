use burn::{prelude::Backend, tensor::Tensor};
use image::{DynamicImage, imageops::FilterType};
use thiserror::Error;

use super::image_io;

#[derive(Error, Debug)]
pub enum PyramidError {
    #[error("a pyramid needs at least one stage, got {0}")]
    NoStages(usize),
    #[error("minimum edge {min_size} does not fit a {height}x{width} source image")]
    MinSizeOutOfRange {
        min_size: usize,
        height: usize,
        width: usize,
    },
    #[error("stage {stage} collapses to {height}x{width}, which is too small to train on")]
    DegenerateStage {
        stage: usize,
        height: usize,
        width: usize,
    },
}

/// Resolution ladder shared by both image domains, coarsest entry first.
///
/// Consecutive entries differ by a fixed geometric factor chosen so the
/// coarsest stage lands on `min_size` and the finest matches the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSchedule {
    pub scale_factor: f64,
    pub sizes: Vec<[usize; 2]>,
}

impl ScaleSchedule {
    /// `finest` is the [height, width] of the (already capped) source image.
    pub fn new(
        finest: [usize; 2],
        min_size: usize,
        train_stages: usize,
    ) -> Result<Self, PyramidError> {
        if train_stages == 0 {
            return Err(PyramidError::NoStages(train_stages));
        }
        let [height, width] = finest;
        let min_edge = height.min(width);
        if min_size > min_edge {
            return Err(PyramidError::MinSizeOutOfRange {
                min_size,
                height,
                width,
            });
        }

        let stop_scale = train_stages - 1;
        let scale_factor = if stop_scale == 0 {
            1.0
        } else {
            (min_size as f64 / min_edge as f64).powf(1.0 / stop_scale as f64)
        };

        let mut sizes = Vec::with_capacity(train_stages);
        for stage in 0..train_stages {
            let scale = scale_factor.powi((stop_scale - stage) as i32);
            let h = (height as f64 * scale).round() as usize;
            let w = (width as f64 * scale).round() as usize;
            if h < 2 || w < 2 {
                return Err(PyramidError::DegenerateStage {
                    stage,
                    height: h,
                    width: w,
                });
            }
            sizes.push([h, w]);
        }
        Ok(Self {
            scale_factor,
            sizes,
        })
    }

    pub fn stages(&self) -> usize {
        self.sizes.len()
    }

    pub fn finest(&self) -> [usize; 2] {
        self.sizes[self.sizes.len() - 1]
    }
}

/// Downscales the source so its larger edge is at most `max_size`,
/// preserving the aspect ratio. Smaller sources pass through untouched.
pub fn cap_to_max_size(image: DynamicImage, max_size: usize) -> DynamicImage {
    let height = image.height() as usize;
    let width = image.width() as usize;
    let max_edge = height.max(width);
    if max_edge <= max_size {
        return image;
    }
    let scale = max_size as f64 / max_edge as f64;
    let h = (height as f64 * scale).round() as u32;
    let w = (width as f64 * scale).round() as u32;
    image.resize_exact(w, h, FilterType::CatmullRom)
}

/// Resamples the source onto another raster's exact geometry. The second
/// domain's image is forced onto the first domain's finest resolution so
/// both pyramids share one scale schedule.
pub fn resample_to(image: DynamicImage, size: [usize; 2]) -> DynamicImage {
    let [h, w] = size;
    image.resize_exact(w as u32, h as u32, FilterType::CatmullRom)
}

/// Resamples the source once per schedule entry and converts each copy
/// into a normalized tensor, coarsest first.
pub fn build_pyramid<B: Backend>(
    source: &DynamicImage,
    schedule: &ScaleSchedule,
    device: &B::Device,
) -> Vec<Tensor<B, 4>> {
    schedule
        .sizes
        .iter()
        .map(|[h, w]| {
            let resized = source.resize_exact(*w as u32, *h as u32, FilterType::CatmullRom);
            image_io::to_tensor(&resized, device)
        })
        .collect()
}
