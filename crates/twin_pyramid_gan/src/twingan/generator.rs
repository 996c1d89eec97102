use burn::{
    config::Config,
    module::Module,
    nn::{
        BatchNorm, BatchNormConfig, Initializer, LeakyRelu, LeakyReluConfig, PaddingConfig2d, Tanh,
        conv::{Conv2d, Conv2dConfig},
    },
    prelude::Backend,
    tensor::{
        Tensor,
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};

/// Pixels eaten per side by one stage sub-block: `num_layer` valid
/// convolutions, each trimming half the kernel width. Stage inputs are
/// padded (or upsampled) by this margin so block outputs land back on
/// the nominal stage resolution.
pub fn receptive_margin(num_layer: usize, ker_size: usize) -> usize {
    num_layer * ((ker_size - 1) / 2)
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    lrelu: LeakyRelu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        channels: [usize; 2],
        ker_size: usize,
        padding: PaddingConfig2d,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new(channels, [ker_size, ker_size])
            .with_padding(padding)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std: 0.02,
            })
            .init(device);
        Self {
            conv,
            norm: BatchNormConfig::new(channels[1]).init(device),
            lrelu: LeakyReluConfig::new().with_negative_slope(0.2).init(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.lrelu
            .forward(self.norm.forward(self.conv.forward(input)))
    }
}

/// One growth step of the generator: a run of valid convolutions that
/// consumes the receptive-field margin of its padded input.
#[derive(Module, Debug)]
pub struct StageBlock<B: Backend> {
    layers: Vec<ConvBlock<B>>,
}

impl<B: Backend> StageBlock<B> {
    pub fn new(nfc: usize, num_layer: usize, ker_size: usize, device: &B::Device) -> Self {
        let layers = (0..num_layer)
            .map(|_| ConvBlock::new([nfc, nfc], ker_size, PaddingConfig2d::Valid, device))
            .collect();
        Self { layers }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input;
        for layer in self.layers.iter() {
            x = layer.forward(x);
        }
        x
    }
}

#[derive(Config, Debug)]
pub struct GrowingGeneratorConfig {
    #[config(default = 3)]
    pub nc_im: usize,
    #[config(default = 64)]
    pub nfc: usize,
    #[config(default = 3)]
    pub num_layer: usize,
    #[config(default = 3)]
    pub ker_size: usize,
}

impl GrowingGeneratorConfig {
    /// Builds the single-stage generator the training run starts from.
    pub fn init<B: Backend>(&self, device: &B::Device) -> GrowingGenerator<B> {
        let tail = Conv2dConfig::new([self.nfc, self.nc_im], [self.ker_size, self.ker_size])
            .with_padding(PaddingConfig2d::Same)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std: 0.02,
            })
            .init(device);
        GrowingGenerator {
            head: ConvBlock::new(
                [self.nc_im, self.nfc],
                self.ker_size,
                PaddingConfig2d::Same,
                device,
            ),
            body: vec![StageBlock::new(
                self.nfc,
                self.num_layer,
                self.ker_size,
                device,
            )],
            tail,
            tanh: Tanh::new(),
            nfc: self.nfc,
            num_layer: self.num_layer,
            ker_size: self.ker_size,
        }
    }
}

/// Multi-stage generator that gains one [StageBlock] per training stage.
///
/// The coarsest stage is driven by noise alone; every later stage refines
/// a bilinear upsampling of the previous stage's output, perturbed by
/// amplitude-scaled noise, through its own sub-block with a residual skip.
#[derive(Module, Debug)]
pub struct GrowingGenerator<B: Backend> {
    pub head: ConvBlock<B>,
    pub body: Vec<StageBlock<B>>,
    pub tail: Conv2d<B>,
    tanh: Tanh,
    nfc: usize,
    num_layer: usize,
    ker_size: usize,
}

fn upsample<B: Backend>(x: Tensor<B, 4>, size: [usize; 2]) -> Tensor<B, 4> {
    interpolate(x, size, InterpolateOptions::new(InterpolateMode::Bilinear))
}

impl<B: Backend> GrowingGenerator<B> {
    pub fn stages(&self) -> usize {
        self.body.len()
    }

    pub fn pad_margin(&self) -> usize {
        receptive_margin(self.num_layer, self.ker_size)
    }

    /// Appends a freshly initialized sub-block for the next stage.
    pub fn init_next_stage(mut self, device: &B::Device) -> Self {
        self.body.push(StageBlock::new(
            self.nfc,
            self.num_layer,
            self.ker_size,
            device,
        ));
        self
    }

    /// Marks every sub-block below `first_trainable` as not requiring
    /// gradients, locking the already-converged coarse stages in place.
    pub fn freeze_blocks_below(mut self, first_trainable: usize) -> Self {
        self.body = self
            .body
            .into_iter()
            .enumerate()
            .map(|(idx, block)| {
                if idx < first_trainable {
                    block.no_grad()
                } else {
                    block
                }
            })
            .collect();
        self
    }

    /// Generates an image from a per-stage noise sequence.
    ///
    /// `noise[0]` has image channels at the coarsest resolution; later
    /// entries have feature channels, pre-padded by [Self::pad_margin].
    /// `amps[idx]` scales the noise injected at stage `idx` (unused at
    /// stage 0, where the block is driven by the noise alone).
    pub fn forward(
        &self,
        noise: &[Tensor<B, 4>],
        sizes: &[[usize; 2]],
        amps: &[f64],
    ) -> Tensor<B, 4> {
        let margin = self.pad_margin();
        let x = noise[0].clone().pad((margin, margin, margin, margin), 0.0);
        let mut x = self.body[0].forward(self.head.forward(x));
        for (idx, block) in self.body.iter().enumerate().skip(1) {
            let [h, w] = sizes[idx];
            let carry = upsample(x.clone(), [h, w]);
            let padded = upsample(x, [h + 2 * margin, w + 2 * margin]);
            x = block.forward(padded + noise[idx].clone() * amps[idx]) + carry;
        }
        self.tanh.forward(self.tail.forward(x))
    }

    /// Translates a sample from the other domain into this generator's
    /// domain: the same multi-stage refinement, but seeded by the source
    /// image instead of noise and with no noise injected anywhere.
    pub fn translate(&self, source: Tensor<B, 4>, sizes: &[[usize; 2]]) -> Tensor<B, 4> {
        let margin = self.pad_margin();
        let [h0, w0] = sizes[0];
        let x = upsample(source, [h0, w0]).pad((margin, margin, margin, margin), 0.0);
        let mut x = self.body[0].forward(self.head.forward(x));
        for (idx, block) in self.body.iter().enumerate().skip(1) {
            let [h, w] = sizes[idx];
            let carry = upsample(x.clone(), [h, w]);
            let padded = upsample(x, [h + 2 * margin, w + 2 * margin]);
            x = block.forward(padded) + carry;
        }
        self.tanh.forward(self.tail.forward(x))
    }
}
