use burn::{
    config::Config,
    module::Module,
    nn::{
        Initializer, LeakyRelu, LeakyReluConfig, PaddingConfig2d,
        conv::{Conv2d, Conv2dConfig},
    },
    prelude::Backend,
    tensor::{Distribution, Tensor},
};

use super::generator::ConvBlock;

#[derive(Config, Debug)]
pub struct CriticConfig {
    #[config(default = 3)]
    pub nc_im: usize,
    #[config(default = 64)]
    pub nfc: usize,
    #[config(default = 3)]
    pub num_layer: usize,
    #[config(default = 3)]
    pub ker_size: usize,
}

impl CriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Critic<B> {
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [self.ker_size, self.ker_size])
                .with_padding(PaddingConfig2d::Same)
                .with_initializer(Initializer::Normal {
                    mean: 0.0,
                    std: 0.02,
                })
                .init(device)
        };
        Critic {
            head: conv([self.nc_im, self.nfc]),
            head_lrelu: LeakyReluConfig::new().with_negative_slope(0.2).init(),
            body: (0..self.num_layer)
                .map(|_| {
                    ConvBlock::new(
                        [self.nfc, self.nfc],
                        self.ker_size,
                        PaddingConfig2d::Same,
                        device,
                    )
                })
                .collect(),
            tail: conv([self.nfc, 1]),
        }
    }
}

/// Wasserstein-style patch critic for one domain at one pyramid stage.
/// No normalization on the head layer so the score stays sensitive to the
/// raw input statistics the Lipschitz penalty constrains.
#[derive(Module, Debug)]
pub struct Critic<B: Backend> {
    head: Conv2d<B>,
    head_lrelu: LeakyRelu,
    body: Vec<ConvBlock<B>>,
    tail: Conv2d<B>,
}

impl<B: Backend> Critic<B> {
    /// Patch score map, same spatial resolution as the input.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.head_lrelu.forward(self.head.forward(input));
        for block in self.body.iter() {
            x = block.forward(x);
        }
        self.tail.forward(x)
    }

    /// Scalar Wasserstein score: mean over the patch map.
    pub fn score(&self, input: Tensor<B, 4>) -> Tensor<B, 1> {
        self.forward(input).mean()
    }
}

/// Lipschitz penalty on the chord between a real and a generated sample.
///
/// Draws two independent interpolation points on the segment and penalizes
/// the squared deviation of the finite-difference score slope from 1,
/// scaled by `weight`.
pub fn lipschitz_penalty<B: Backend>(
    critic: &Critic<B>,
    real: Tensor<B, 4>,
    fake: Tensor<B, 4>,
    weight: f64,
) -> Tensor<B, 1> {
    let device = real.device();
    let [n, _, _, _] = real.dims();
    let eps_1 = Tensor::<B, 4>::random([n, 1, 1, 1], Distribution::Uniform(0.0, 1.0), &device);
    let eps_2 = Tensor::<B, 4>::random([n, 1, 1, 1], Distribution::Uniform(0.0, 1.0), &device);
    let mix_1 = real.clone() * eps_1.clone() + fake.clone() * (eps_1.neg() + 1.0);
    let mix_2 = real * eps_2.clone() + fake * (eps_2.neg() + 1.0);
    let distance = (mix_1.clone() - mix_2.clone()).powi_scalar(2).sum().sqrt();
    let slope = (critic.score(mix_1) - critic.score(mix_2)).abs() / (distance + 1e-8);
    (slope - 1.0).powi_scalar(2).mean() * weight
}
