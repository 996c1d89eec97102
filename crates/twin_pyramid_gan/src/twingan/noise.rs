use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::Backend,
    tensor::{Distribution, Tensor, cast::ToElement},
};
use serde::{Deserialize, Serialize};

use super::generator::GrowingGenerator;

/// Selects what the stage-0 entry of the fixed noise history anchors to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainMode {
    /// Unconditional generation: reconstruction anchors to the coarsest real.
    Generation,
    /// Retargeting to new aspect ratios; same anchor as generation.
    Retarget,
    /// Animation: the coarsest stage is driven by pure noise.
    Animation,
}

impl TrainMode {
    pub fn tag(&self) -> &'static str {
        match self {
            TrainMode::Generation => "generation",
            TrainMode::Retarget => "retarget",
            TrainMode::Animation => "animation",
        }
    }
}

/// Dimensions of the noise injected at one stage: image channels at the
/// coarsest stage, feature channels padded by the receptive-field margin
/// everywhere above it.
pub fn stage_noise<B: Backend>(
    stage: usize,
    sizes: &[[usize; 2]],
    nc_im: usize,
    nfc: usize,
    margin: usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    let [h, w] = sizes[stage];
    let shape = if stage == 0 {
        [1, nc_im, h, w]
    } else {
        [1, nfc, h + 2 * margin, w + 2 * margin]
    };
    Tensor::random(shape, Distribution::Normal(0.0, 1.0), device)
}

/// Fresh noise for every stage up to and including the current one, as
/// consumed by [GrowingGenerator::forward].
pub fn sample_noise_set<B: Backend>(
    stages: usize,
    sizes: &[[usize; 2]],
    nc_im: usize,
    nfc: usize,
    margin: usize,
    device: &B::Device,
) -> Vec<Tensor<B, 4>> {
    (0..stages)
        .map(|stage| stage_noise(stage, sizes, nc_im, nfc, margin, device))
        .collect()
}

/// The entry appended to the fixed noise history when `stage` begins.
/// Stage 0 is mode-dependent; later stages always append fresh feature
/// noise that stays pinned for the rest of the run.
pub fn fixed_noise_entry<B: Backend>(
    mode: TrainMode,
    stage: usize,
    reals: &[Tensor<B, 4>],
    sizes: &[[usize; 2]],
    nc_im: usize,
    nfc: usize,
    margin: usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    if stage == 0 {
        match mode {
            TrainMode::Generation | TrainMode::Retarget => reals[0].clone(),
            TrainMode::Animation => stage_noise(0, sizes, nc_im, nfc, margin, device),
        }
    } else {
        stage_noise(stage, sizes, nc_im, nfc, margin, device)
    }
}

/// Appends the noise amplitude for the newest stage.
///
/// Stage 0 is pinned to 1. Later stages run the generator in
/// reconstruction mode with a zero placeholder amplitude for the new
/// block, then overwrite the placeholder with `noise_amp_init` times the
/// root-mean-square reconstruction error against the real image.
pub fn calibrate_noise_amp<B: Backend>(
    amps: &mut Vec<f64>,
    generator: &GrowingGenerator<B>,
    fixed_noise: &[Tensor<B, 4>],
    sizes: &[[usize; 2]],
    real: &Tensor<B, 4>,
    noise_amp_init: f64,
) {
    if amps.is_empty() {
        amps.push(1.0);
        return;
    }
    amps.push(0.0);
    let reconstruction = generator.forward(fixed_noise, sizes, amps);
    let rmse = MseLoss::new()
        .forward(reconstruction, real.clone(), Reduction::Mean)
        .sqrt()
        .into_scalar()
        .to_f64();
    let newest = amps.len() - 1;
    amps[newest] = noise_amp_init * rmse;
}
