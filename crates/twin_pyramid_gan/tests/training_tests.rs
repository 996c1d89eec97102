#[cfg(test)]
mod training {
    use std::path::PathBuf;

    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::Module;
    use burn::record::CompactRecorder;
    use burn::tensor::Shape;
    use image::{Rgb, RgbImage};
    use twin_pyramid_gan::logging::PyramidGanLogger;
    use twin_pyramid_gan::twingan::{
        checkpoint::{RunState, load_tensor_list},
        generator::GrowingGeneratorConfig,
        noise::{TrainMode, sample_noise_set},
        training::{TrainingConfig, generate_run_dir, train_twin_gan},
    };

    type MyAutodiffBackend = Autodiff<NdArray<f32>>;

    fn write_input(path: &PathBuf, width: u32, height: u32, tint: u8) {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 31 % 256) as u8, (y * 23 % 256) as u8, tint])
        });
        image.save(path).unwrap();
    }

    #[test]
    fn run_dir_is_deterministic() {
        let config = TrainingConfig::new("photos/lake.png".to_owned(), "images/city.jpg".to_owned());
        assert_eq!(
            PathBuf::from("runs/lake_city/generation_stages6_alpha10"),
            generate_run_dir(&config)
        );

        let config = config
            .with_train_mode(TrainMode::Animation)
            .with_train_stages(8)
            .with_alpha(0.0);
        assert_eq!(
            PathBuf::from("runs/lake_city/animation_stages8_alpha0"),
            generate_run_dir(&config)
        );
    }

    #[test]
    fn two_stage_run_produces_the_full_artifact_tree() {
        let device = NdArrayDevice::default();
        let scratch = std::env::temp_dir().join("twin_pyramid_gan_e2e");
        let _ = std::fs::remove_dir_all(&scratch);
        std::fs::create_dir_all(&scratch).unwrap();

        let input_a = scratch.join("domain_a.png");
        let input_b = scratch.join("domain_b.png");
        write_input(&input_a, 16, 16, 40);
        write_input(&input_b, 20, 14, 220);

        let config = TrainingConfig::new(
            input_a.to_string_lossy().into_owned(),
            input_b.to_string_lossy().into_owned(),
        )
        .with_out_dir(scratch.join("runs").to_string_lossy().into_owned())
        .with_train_stages(2)
        .with_min_size(12)
        .with_nfc(8)
        .with_num_layer(2)
        .with_niter(10)
        .with_scalar_interval(5)
        .with_image_interval(5)
        .with_seed(7);
        let run_dir = generate_run_dir(&config);
        assert_eq!("generation_stages2_alpha10", run_dir.file_name().unwrap());
        assert_eq!(
            "domain_a_domain_b",
            run_dir.parent().unwrap().file_name().unwrap()
        );

        let (generator_a, generator_b) = train_twin_gan::<MyAutodiffBackend, _>(
            config,
            device,
            PyramidGanLogger::disabled(),
            CompactRecorder::new(),
        )
        .unwrap();

        assert_eq!(2, generator_a.stages());
        assert_eq!(2, generator_b.stages());
        assert!(run_dir.join("training_config.json").exists());

        for stage in 0..2 {
            let stage_dir = run_dir.join(format!("stage_{}", stage));
            for key in ["a", "b"] {
                assert!(stage_dir.join(format!("real_{}.png", key)).exists());
                assert!(stage_dir.join(format!("fake_sample_{}_1.png", key)).exists());
                assert!(stage_dir.join(format!("fake_sample_{}_10.png", key)).exists());
                assert!(
                    stage_dir
                        .join(format!("reconstruction_{}_10.png", key))
                        .exists()
                );
                assert!(stage_dir.join(format!("critic_{}.mpk", key)).exists());
                assert!(stage_dir.join(format!("generator_{}.mpk", key)).exists());
                assert!(stage_dir.join(format!("fixed_noise_{}.bin", key)).exists());
                assert!(stage_dir.join(format!("pyramid_{}.bin", key)).exists());

                let samples = std::fs::read_dir(stage_dir.join(format!("gen_samples_{}", key)))
                    .unwrap()
                    .count();
                assert_eq!(25, samples);
            }
            assert!(stage_dir.join("run_state.ron").exists());
        }

        for key in ["a", "b"] {
            assert!(run_dir.join(format!("generator_{}.mpk", key)).exists());
            assert!(run_dir.join(format!("fixed_noise_{}.bin", key)).exists());
            assert!(run_dir.join(format!("pyramid_{}.bin", key)).exists());
        }

        let run_state = RunState::load(run_dir.join("run_state.ron")).unwrap();
        assert_eq!(TrainMode::Generation, run_state.mode);
        assert_eq!(2, run_state.stages_trained);
        assert_eq!(vec![[12, 12], [16, 16]], run_state.sizes);
        assert_eq!(0.75, run_state.scale_factor);
        assert_eq!(1.0, run_state.noise_amps_a[0]);
        assert_eq!(1.0, run_state.noise_amps_b[0]);
        assert!(run_state.noise_amps_a[1] > 0.0);
        assert!(run_state.noise_amps_b[1] > 0.0);

        let pyramid =
            load_tensor_list::<MyAutodiffBackend>(run_dir.join("pyramid_a.bin"), &device).unwrap();
        assert_eq!(Shape::new([1, 3, 12, 12]), pyramid[0].shape());
        assert_eq!(Shape::new([1, 3, 16, 16]), pyramid[1].shape());

        let fixed_noise =
            load_tensor_list::<MyAutodiffBackend>(run_dir.join("fixed_noise_a.bin"), &device)
                .unwrap();
        assert_eq!(Shape::new([1, 3, 12, 12]), fixed_noise[0].shape());
        assert_eq!(Shape::new([1, 8, 20, 20]), fixed_noise[1].shape());

        let reloaded = GrowingGeneratorConfig::new()
            .with_nfc(8)
            .with_num_layer(2)
            .init::<MyAutodiffBackend>(&device)
            .init_next_stage(&device)
            .load_file(run_dir.join("generator_a"), &CompactRecorder::new(), &device)
            .unwrap();
        let noise = sample_noise_set(2, &run_state.sizes, 3, 8, reloaded.pad_margin(), &device);
        let sample = reloaded.forward(&noise, &run_state.sizes, &run_state.noise_amps_a);
        assert_eq!(Shape::new([1, 3, 16, 16]), sample.shape());

        let _ = std::fs::remove_dir_all(&scratch);
    }
}
