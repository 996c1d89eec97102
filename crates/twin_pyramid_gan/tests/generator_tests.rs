#[cfg(test)]
mod generator {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::GradientsParams;
    use burn::tensor::{Distribution, Shape, Tensor};
    use twin_pyramid_gan::twingan::{
        generator::{GrowingGenerator, GrowingGeneratorConfig, receptive_margin},
        noise::sample_noise_set,
    };

    type MyBackend = NdArray<f32>;
    type MyAutodiffBackend = Autodiff<NdArray<f32>>;

    fn small_config() -> GrowingGeneratorConfig {
        GrowingGeneratorConfig::new()
            .with_nfc(8)
            .with_num_layer(2)
            .with_ker_size(3)
    }

    #[test]
    fn margin_follows_depth_and_kernel() {
        assert_eq!(3, receptive_margin(3, 3));
        assert_eq!(4, receptive_margin(2, 5));
        assert_eq!(0, receptive_margin(3, 1));
    }

    #[test]
    fn init() {
        let device = NdArrayDevice::default();

        let generator: GrowingGenerator<MyBackend> = small_config().init(&device);

        assert_eq!(1, generator.stages());
        assert_eq!(2, generator.pad_margin());
    }

    #[test]
    fn coarsest_forward_matches_stage_size() {
        let device = NdArrayDevice::default();

        let generator: GrowingGenerator<MyBackend> = small_config().init(&device);
        let sizes = [[12, 12]];
        let noise = sample_noise_set(1, &sizes, 3, 8, generator.pad_margin(), &device);

        let result = generator.forward(&noise, &sizes, &[1.0]);

        assert_eq!(Shape::new([1, 3, 12, 12]), result.shape());
    }

    #[test]
    fn grown_forward_matches_newest_stage_size() {
        let device = NdArrayDevice::default();

        let generator: GrowingGenerator<MyBackend> = small_config()
            .init(&device)
            .init_next_stage(&device)
            .init_next_stage(&device);
        assert_eq!(3, generator.stages());

        let sizes = [[12, 12], [16, 16], [22, 22]];
        let noise = sample_noise_set(3, &sizes, 3, 8, generator.pad_margin(), &device);
        assert_eq!(Shape::new([1, 8, 20, 20]), noise[1].shape());

        let result = generator.forward(&noise, &sizes, &[1.0, 0.1, 0.1]);

        assert_eq!(Shape::new([1, 3, 22, 22]), result.shape());
    }

    #[test]
    fn translate_matches_newest_stage_size() {
        let device = NdArrayDevice::default();

        let generator: GrowingGenerator<MyBackend> =
            small_config().init(&device).init_next_stage(&device);
        let sizes = [[12, 12], [16, 16]];
        let source = Tensor::<MyBackend, 4>::random(
            [1, 3, 9, 7],
            Distribution::Normal(0.0, 1.0),
            &device,
        );

        let result = generator.translate(source, &sizes);

        assert_eq!(Shape::new([1, 3, 16, 16]), result.shape());
    }

    #[test]
    fn frozen_blocks_stop_collecting_gradients() {
        let device = NdArrayDevice::default();

        let generator: GrowingGenerator<MyAutodiffBackend> = small_config()
            .init(&device)
            .init_next_stage(&device)
            .init_next_stage(&device)
            .init_next_stage(&device);
        let generator = generator.freeze_blocks_below(1);

        let sizes = [[8, 8], [10, 10], [12, 12], [14, 14]];
        let noise = sample_noise_set(4, &sizes, 3, 8, generator.pad_margin(), &device);
        let amps = [1.0, 0.1, 0.1, 0.1];

        let grads = generator.forward(&noise, &sizes, &amps).sum().backward();
        let frozen = GradientsParams::from_grads(grads, &generator.body[0]);
        assert_eq!(0, frozen.len());

        let grads = generator.forward(&noise, &sizes, &amps).sum().backward();
        let newest = GradientsParams::from_grads(grads, &generator.body[3]);
        assert!(newest.len() > 0);
    }
}
