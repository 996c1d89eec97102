#[cfg(test)]
mod calibration {
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::tensor::{Distribution, Shape, Tensor};
    use twin_pyramid_gan::twingan::{
        generator::{GrowingGenerator, GrowingGeneratorConfig},
        noise::{TrainMode, calibrate_noise_amp, fixed_noise_entry, sample_noise_set, stage_noise},
    };

    type MyBackend = NdArray<f32>;

    fn small_generator(stages: usize, device: &NdArrayDevice) -> GrowingGenerator<MyBackend> {
        let mut generator = GrowingGeneratorConfig::new()
            .with_nfc(8)
            .with_num_layer(2)
            .init(device);
        for _ in 1..stages {
            generator = generator.init_next_stage(device);
        }
        generator
    }

    #[test]
    fn noise_shapes_track_stage_geometry() {
        let device = NdArrayDevice::default();
        let sizes = [[10, 12], [14, 18]];

        let noise = sample_noise_set::<MyBackend>(2, &sizes, 3, 8, 2, &device);

        assert_eq!(2, noise.len());
        assert_eq!(Shape::new([1, 3, 10, 12]), noise[0].shape());
        assert_eq!(Shape::new([1, 8, 18, 22]), noise[1].shape());
    }

    #[test]
    fn coarsest_fixed_noise_reproduces_the_source() {
        let device = NdArrayDevice::default();
        let sizes = [[10, 10]];
        let reals = vec![Tensor::<MyBackend, 4>::random(
            [1, 3, 10, 10],
            Distribution::Normal(0.0, 1.0),
            &device,
        )];

        for mode in [TrainMode::Generation, TrainMode::Retarget] {
            let entry = fixed_noise_entry(mode, 0, &reals, &sizes, 3, 8, 2, &device);
            let diff: f32 = (entry - reals[0].clone()).abs().max().into_scalar();
            assert_eq!(0.0, diff);
        }
    }

    #[test]
    fn animation_mode_samples_the_coarsest_entry() {
        let device = NdArrayDevice::default();
        let sizes = [[10, 10]];
        let reals = vec![Tensor::<MyBackend, 4>::zeros([1, 3, 10, 10], &device)];

        let entry = fixed_noise_entry(TrainMode::Animation, 0, &reals, &sizes, 3, 8, 2, &device);

        assert_eq!(Shape::new([1, 3, 10, 10]), entry.shape());
        let magnitude: f32 = entry.abs().max().into_scalar();
        assert!(magnitude > 0.0);
    }

    #[test]
    fn upper_fixed_noise_is_padded_feature_noise() {
        let device = NdArrayDevice::default();
        let sizes = [[10, 10], [14, 14]];
        let reals = vec![Tensor::<MyBackend, 4>::zeros([1, 3, 10, 10], &device)];

        let entry =
            fixed_noise_entry(TrainMode::Generation, 1, &reals, &sizes, 3, 8, 2, &device);

        assert_eq!(Shape::new([1, 8, 18, 18]), entry.shape());
    }

    #[test]
    fn first_stage_amp_is_unity() {
        let device = NdArrayDevice::default();
        let generator = small_generator(1, &device);
        let sizes = [[12, 12]];
        let real = Tensor::<MyBackend, 4>::random(
            [1, 3, 12, 12],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let fixed_noise = vec![real.clone()];

        let mut amps = Vec::new();
        calibrate_noise_amp(&mut amps, &generator, &fixed_noise, &sizes, &real, 0.1);
        assert_eq!(vec![1.0], amps);

        let mut repeated = Vec::new();
        calibrate_noise_amp(&mut repeated, &generator, &fixed_noise, &sizes, &real, 0.1);
        assert_eq!(vec![1.0], repeated);
    }

    #[test]
    fn amp_scales_with_the_init_factor() {
        let device = NdArrayDevice::default();
        let generator = small_generator(2, &device);
        let sizes = [[12, 12], [16, 16]];
        let real = Tensor::<MyBackend, 4>::random(
            [1, 3, 16, 16],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let fixed_noise = vec![
            Tensor::<MyBackend, 4>::random([1, 3, 12, 12], Distribution::Normal(0.0, 1.0), &device),
            stage_noise(1, &sizes, 3, 8, generator.pad_margin(), &device),
        ];

        let mut amps = vec![1.0];
        calibrate_noise_amp(&mut amps, &generator, &fixed_noise, &sizes, &real, 0.1);
        let mut doubled = vec![1.0];
        calibrate_noise_amp(&mut doubled, &generator, &fixed_noise, &sizes, &real, 0.2);

        assert_eq!(2, amps.len());
        assert!(amps[1] > 0.0);
        assert!((doubled[1] - 2.0 * amps[1]).abs() < 1e-9);
    }

    #[test]
    fn mode_tags_are_stable() {
        assert_eq!("generation", TrainMode::Generation.tag());
        assert_eq!("retarget", TrainMode::Retarget.tag());
        assert_eq!("animation", TrainMode::Animation.tag());
    }
}
