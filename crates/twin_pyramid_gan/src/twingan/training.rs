use std::path::{Path, PathBuf};

use burn::{
    config::Config,
    module::{Module, ModuleVisitor, ParamId},
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::Backend,
    record::{FileRecorder, RecorderError},
    tensor::{Tensor, backend::AutodiffBackend, cast::ToElement},
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::{
    logging::{PyramidGanLogger, StageScalars},
    pyramid::{
        image_io::{ImageIoError, open_image, save_image},
        scales::{PyramidError, ScaleSchedule, build_pyramid, cap_to_max_size, resample_to},
    },
    twingan::{
        checkpoint::{CheckpointError, RunState, save_tensor_list},
        critic::{Critic, CriticConfig, lipschitz_penalty},
        generator::{GrowingGenerator, GrowingGeneratorConfig},
        noise::{TrainMode, calibrate_noise_amp, fixed_noise_entry, sample_noise_set},
        schedule::{LrGroups, MilestoneDecay, first_trainable_block},
    },
};
use thiserror::Error;

const SAMPLE_GRID_CELLS: usize = 25;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to build the image pyramids due to: {0}")]
    PyramidError(#[from] PyramidError),
    #[error("Failed to read or write an image due to: {0}")]
    ImageError(#[from] ImageIoError),
    #[error("Failed to persist run state due to: {0}")]
    CheckpointError(#[from] CheckpointError),
    #[error("Failed to persist model weights due to: {0}")]
    ModelWeightsSerializationError(#[from] RecorderError),
}

/// One of the two image distributions the coupled trainers cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    A,
    B,
}

impl Domain {
    pub fn key(&self) -> &'static str {
        match self {
            Domain::A => "a",
            Domain::B => "b",
        }
    }
}

#[derive(Config)]
pub struct TrainingConfig {
    /// Source image for domain A; its (capped) resolution fixes the
    /// pyramid geometry for both domains.
    pub input_a: String,
    /// Source image for domain B, resampled onto domain A's geometry.
    pub input_b: String,
    #[config(default = "String::from(\"runs\")")]
    pub out_dir: String,
    #[config(default = "TrainMode::Generation")]
    pub train_mode: TrainMode,
    #[config(default = 6)]
    pub train_stages: usize,
    /// How many of the newest generator sub-blocks keep training each
    /// stage; everything older is frozen.
    #[config(default = 3)]
    pub train_depth: usize,
    #[config(default = 25)]
    pub min_size: usize,
    #[config(default = 250)]
    pub max_size: usize,
    #[config(default = 3)]
    pub nc_im: usize,
    #[config(default = 64)]
    pub nfc: usize,
    #[config(default = 3)]
    pub num_layer: usize,
    #[config(default = 3)]
    pub ker_size: usize,
    #[config(default = 2000)]
    pub niter: usize,
    #[config(default = 0.0005)]
    pub lr_g: f64,
    #[config(default = 0.0005)]
    pub lr_d: f64,
    #[config(default = 0.5)]
    pub beta1: f64,
    /// Per-block learning-rate decay for older trainable sub-blocks.
    #[config(default = 0.1)]
    pub lr_scale: f64,
    #[config(default = 0.1)]
    pub gamma: f64,
    /// Fraction of the stage budget after which both rates drop by gamma.
    #[config(default = 0.8)]
    pub milestone_frac: f64,
    #[config(default = 3)]
    pub dsteps: usize,
    #[config(default = 3)]
    pub gsteps: usize,
    #[config(default = 0.1)]
    pub lambda_grad: f64,
    /// Reconstruction loss weight; 0 disables the reconstruction term.
    #[config(default = 10.0)]
    pub alpha: f64,
    /// Cycle-consistency weight; 0 disables the round-trip term.
    #[config(default = 10.0)]
    pub beta: f64,
    #[config(default = 0.1)]
    pub noise_amp_init: f64,
    #[config(default = 250)]
    pub scalar_interval: usize,
    #[config(default = 500)]
    pub image_interval: usize,
    #[config(default = 42)]
    pub seed: u64,
    pub gpu_index: Option<usize>,
}

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_owned())
}

/// Deterministic run directory, derived from the config alone so a
/// re-invoked run lands on top of its previous artifacts.
pub fn generate_run_dir(config: &TrainingConfig) -> PathBuf {
    PathBuf::from(&config.out_dir)
        .join(format!(
            "{}_{}",
            stem(&config.input_a),
            stem(&config.input_b)
        ))
        .join(format!(
            "{}_stages{}_alpha{}",
            config.train_mode.tag(),
            config.train_stages,
            config.alpha
        ))
}

/// Everything one domain carries across stages. The critic is not here:
/// it is rebuilt per stage and only survives as serialized weights.
struct DomainState<B: Backend> {
    pyramid: Vec<Tensor<B, 4>>,
    generator: GrowingGenerator<B>,
    fixed_noise: Vec<Tensor<B, 4>>,
    noise_amps: Vec<f64>,
}

struct ParamIdCollector {
    ids: Vec<ParamId>,
}

impl<B: Backend> ModuleVisitor<B> for ParamIdCollector {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        self.ids.push(id);
    }
}

fn param_ids<B: Backend, M: Module<B>>(module: &M) -> Vec<ParamId> {
    let mut visitor = ParamIdCollector { ids: Vec::new() };
    module.visit(&mut visitor);
    visitor.ids
}

/// Steps the generator once per learning-rate group, feeding each group
/// only its own slice of the gradients.
fn apply_generator_step<B: AutodiffBackend, O: Optimizer<GrowingGenerator<B>, B>>(
    mut generator: GrowingGenerator<B>,
    optimizer: &mut O,
    grads: &mut B::Gradients,
    groups: &LrGroups,
    decay: &MilestoneDecay,
    iter: usize,
) -> GrowingGenerator<B> {
    if let Some(head_lr) = groups.head {
        let ids = param_ids(&generator.head);
        let head_grads = GradientsParams::from_params(grads, &generator.head, &ids);
        generator = optimizer.step(decay.at(head_lr, iter), generator, head_grads);
    }
    for (idx, lr) in groups.body.iter().copied() {
        let ids = param_ids(&generator.body[idx]);
        let block_grads = GradientsParams::from_params(grads, &generator.body[idx], &ids);
        generator = optimizer.step(decay.at(lr, iter), generator, block_grads);
    }
    let ids = param_ids(&generator.tail);
    let tail_grads = GradientsParams::from_params(grads, &generator.tail, &ids);
    optimizer.step(decay.at(groups.tail, iter), generator, tail_grads)
}

/// One critic update: Wasserstein real/fake terms plus the Lipschitz
/// penalty against both the fresh fake and the translated mix. Returns
/// the stepped critic and the three loss terms for logging.
fn critic_phase<B: AutodiffBackend, O: Optimizer<Critic<B>, B>>(
    critic: Critic<B>,
    optimizer: &mut O,
    real: &Tensor<B, 4>,
    fake: Tensor<B, 4>,
    mix: Tensor<B, 4>,
    lambda_grad: f64,
    lr: f64,
) -> (Critic<B>, f64, f64, f64) {
    let loss_real = critic.score(real.clone()).neg();
    let loss_fake = critic.score(mix.clone()) + critic.score(fake.clone());
    let penalty = lipschitz_penalty(&critic, real.clone(), mix, lambda_grad)
        + lipschitz_penalty(&critic, real.clone(), fake, lambda_grad);
    let total = loss_real.clone() + loss_fake.clone() + penalty.clone();
    let grads = GradientsParams::from_grads(total.backward(), &critic);
    let critic = optimizer.step(lr, critic, grads);
    (
        critic,
        loss_real.into_scalar().to_f64(),
        loss_fake.into_scalar().to_f64(),
        penalty.into_scalar().to_f64(),
    )
}

/// One generator update for a single domain: adversarial score against
/// the domain's own critic, optional reconstruction and cycle terms,
/// then a per-group optimizer step. Cross-domain samples come in through
/// `other` and are treated as constants.
fn generator_phase<B: AutodiffBackend, O: Optimizer<GrowingGenerator<B>, B>>(
    generator: GrowingGenerator<B>,
    optimizer: &mut O,
    other: &GrowingGenerator<B>,
    critic: &Critic<B>,
    real: &Tensor<B, 4>,
    noise_set: &[Tensor<B, 4>],
    fixed_noise: &[Tensor<B, 4>],
    amps: &[f64],
    other_amps: &[f64],
    sizes: &[[usize; 2]],
    groups: &LrGroups,
    decay: &MilestoneDecay,
    iter: usize,
    config: &TrainingConfig,
) -> (GrowingGenerator<B>, f64, f64) {
    let device = real.device();
    let fake = generator.forward(noise_set, sizes, amps);
    let other_fake = other.forward(noise_set, sizes, other_amps).detach();
    let mix = generator.translate(other_fake, sizes);
    let scoring_critic = critic.clone().no_grad();
    let adversarial = (scoring_critic.score(fake.clone()) + scoring_critic.score(mix)).neg();

    let reconstruction_loss = if config.alpha != 0.0 {
        let reconstruction = generator.forward(fixed_noise, sizes, amps);
        MseLoss::new().forward(reconstruction, real.clone(), Reduction::Mean) * config.alpha
    } else {
        Tensor::zeros([1], &device)
    };

    let cycle_loss = if config.beta != 0.0 {
        let other_mix = other.translate(fake.clone().detach(), sizes).detach();
        let round_trip = generator.translate(other_mix, sizes);
        MseLoss::new().forward(round_trip, fake.clone(), Reduction::Mean) * config.beta
    } else {
        Tensor::zeros([1], &device)
    };

    let total = adversarial.clone() + reconstruction_loss.clone() + cycle_loss;
    let mut grads = total.backward();
    let generator = apply_generator_step(generator, optimizer, &mut grads, groups, decay, iter);
    (
        generator,
        adversarial.into_scalar().to_f64(),
        reconstruction_loss.into_scalar().to_f64(),
    )
}

/// Writes the periodic sample exports for one domain: the fresh fake and
/// the reconstruction as stage files and dashboard images, plus the
/// 5x5 sample grid whose first cell is the real reference. On the final
/// iteration every grid sample is also written into
/// `gen_samples_<domain>/`.
fn export_stage_images<B: AutodiffBackend>(
    config: &TrainingConfig,
    stage_dir: &Path,
    key: &str,
    state: &DomainState<B>,
    sizes: &[[usize; 2]],
    noise_set: &[Tensor<B, 4>],
    stage: usize,
    iter: usize,
    final_iter: bool,
    logger: &PyramidGanLogger,
    device: &B::Device,
) -> Result<(), TrainingError> {
    let fake = state
        .generator
        .forward(noise_set, sizes, &state.noise_amps)
        .detach();
    save_image(
        &stage_dir.join(format!("fake_sample_{}_{}.png", key, iter + 1)),
        fake.clone(),
    )?;
    logger.log_image(&format!("images/domain_{}/fake_sample", key), fake);

    let reconstruction = state
        .generator
        .forward(&state.fixed_noise, sizes, &state.noise_amps)
        .detach();
    save_image(
        &stage_dir.join(format!("reconstruction_{}_{}.png", key, iter + 1)),
        reconstruction.clone(),
    )?;
    logger.log_image(
        &format!("images/domain_{}/reconstruction", key),
        reconstruction,
    );

    let margin = state.generator.pad_margin();
    let mut cells: Vec<Tensor<B, 4>> = (0..SAMPLE_GRID_CELLS)
        .map(|_| {
            let noise = sample_noise_set(
                stage + 1,
                sizes,
                config.nc_im,
                config.nfc,
                margin,
                device,
            );
            state
                .generator
                .forward(&noise, sizes, &state.noise_amps)
                .detach()
        })
        .collect();
    if final_iter {
        let samples_dir = stage_dir.join(format!("gen_samples_{}", key));
        std::fs::create_dir_all(&samples_dir)?;
        for (idx, sample) in cells.iter().enumerate() {
            save_image(
                &samples_dir.join(format!("gen_sample_{}.png", idx)),
                sample.clone(),
            )?;
        }
    }
    cells[0] = state.pyramid[stage].clone();
    logger.log_sample_grid(&format!("images/domain_{}/samples", key), cells);
    Ok(())
}

fn checkpoint_domain<B: AutodiffBackend, R: FileRecorder<B>>(
    dir: &Path,
    key: &str,
    state: &DomainState<B>,
    recorder: &R,
) -> Result<(), TrainingError> {
    state
        .generator
        .clone()
        .save_file(dir.join(format!("generator_{}", key)), recorder)?;
    save_tensor_list(
        dir.join(format!("fixed_noise_{}.bin", key)),
        &state.fixed_noise,
    )?;
    save_tensor_list(dir.join(format!("pyramid_{}.bin", key)), &state.pyramid)?;
    Ok(())
}

/// Runs one stage for both domains in lockstep: freeze, calibrate,
/// iterate, checkpoint.
fn train_single_stage<B: AutodiffBackend, R: FileRecorder<B>>(
    config: &TrainingConfig,
    stage: usize,
    schedule: &ScaleSchedule,
    run_dir: &Path,
    mut state_a: DomainState<B>,
    mut state_b: DomainState<B>,
    logger: &PyramidGanLogger,
    recorder: &R,
    progress: &MultiProgress,
    style: &ProgressStyle,
    device: &B::Device,
) -> Result<(DomainState<B>, DomainState<B>), TrainingError> {
    let sizes = schedule.sizes.as_slice();
    let stage_dir = run_dir.join(format!("stage_{}", stage));
    let margin = state_a.generator.pad_margin();

    let first_trainable = first_trainable_block(stage + 1, config.train_depth);
    state_a.generator = state_a.generator.freeze_blocks_below(first_trainable);
    state_b.generator = state_b.generator.freeze_blocks_below(first_trainable);

    let groups = LrGroups::for_stage(stage, config.train_depth, config.lr_g, config.lr_scale);
    let decay = MilestoneDecay::new(config.niter, config.milestone_frac, config.gamma);

    let mut opt_g_a = AdamConfig::new().with_beta_1(config.beta1 as f32).init();
    let mut opt_g_b = AdamConfig::new().with_beta_1(config.beta1 as f32).init();
    let mut opt_d_a = AdamConfig::new().with_beta_1(config.beta1 as f32).init();
    let mut opt_d_b = AdamConfig::new().with_beta_1(config.beta1 as f32).init();

    let critic_config = CriticConfig::new()
        .with_nc_im(config.nc_im)
        .with_nfc(config.nfc)
        .with_num_layer(config.num_layer)
        .with_ker_size(config.ker_size);
    let mut critic_a = critic_config.init::<B>(device);
    let mut critic_b = critic_config.init::<B>(device);
    if stage > 0 {
        let prev_dir = run_dir.join(format!("stage_{}", stage - 1));
        critic_a = critic_a.load_file(prev_dir.join("critic_a"), recorder, device)?;
        critic_b = critic_b.load_file(prev_dir.join("critic_b"), recorder, device)?;
    }

    state_a.fixed_noise.push(fixed_noise_entry(
        config.train_mode,
        stage,
        &state_a.pyramid,
        sizes,
        config.nc_im,
        config.nfc,
        margin,
        device,
    ));
    state_b.fixed_noise.push(fixed_noise_entry(
        config.train_mode,
        stage,
        &state_b.pyramid,
        sizes,
        config.nc_im,
        config.nfc,
        margin,
        device,
    ));
    calibrate_noise_amp(
        &mut state_a.noise_amps,
        &state_a.generator,
        &state_a.fixed_noise,
        sizes,
        &state_a.pyramid[stage],
        config.noise_amp_init,
    );
    calibrate_noise_amp(
        &mut state_b.noise_amps,
        &state_b.generator,
        &state_b.fixed_noise,
        sizes,
        &state_b.pyramid[stage],
        config.noise_amp_init,
    );

    log::info!(
        "stage {}: {}x{} | noise amp a {:.4}, b {:.4} | {} trainable blocks",
        stage,
        sizes[stage][0],
        sizes[stage][1],
        state_a.noise_amps[stage],
        state_b.noise_amps[stage],
        groups.body.len()
    );

    let iteration_bar = progress.add(ProgressBar::new(config.niter as u64));
    iteration_bar.set_style(style.clone());
    iteration_bar.set_message(format!("stage {}", stage));

    let mut scalars_a = StageScalars::default();
    let mut scalars_b = StageScalars::default();

    for iter in 0..config.niter {
        let noise_set = sample_noise_set(
            stage + 1,
            sizes,
            config.nc_im,
            config.nfc,
            margin,
            device,
        );

        // Samples the critics see this iteration; constants on the
        // generator side.
        let fake_a = state_a
            .generator
            .forward(&noise_set, sizes, &state_a.noise_amps)
            .detach();
        let fake_b = state_b
            .generator
            .forward(&noise_set, sizes, &state_b.noise_amps)
            .detach();
        let mix_a = state_a.generator.translate(fake_b.clone(), sizes).detach();
        let mix_b = state_b.generator.translate(fake_a.clone(), sizes).detach();

        let lr_d = decay.at(config.lr_d, iter);
        for _ in 0..config.dsteps {
            let (stepped, term_real, term_fake, term_penalty) = critic_phase(
                critic_a,
                &mut opt_d_a,
                &state_a.pyramid[stage],
                fake_a.clone(),
                mix_a.clone(),
                config.lambda_grad,
                lr_d,
            );
            critic_a = stepped;
            scalars_a.critic_real = term_real;
            scalars_a.critic_fake = term_fake;
            scalars_a.critic_penalty = term_penalty;

            let (stepped, term_real, term_fake, term_penalty) = critic_phase(
                critic_b,
                &mut opt_d_b,
                &state_b.pyramid[stage],
                fake_b.clone(),
                mix_b.clone(),
                config.lambda_grad,
                lr_d,
            );
            critic_b = stepped;
            scalars_b.critic_real = term_real;
            scalars_b.critic_fake = term_fake;
            scalars_b.critic_penalty = term_penalty;
        }

        for _ in 0..config.gsteps {
            let (stepped, adversarial, reconstruction) = generator_phase(
                state_a.generator,
                &mut opt_g_a,
                &state_b.generator,
                &critic_a,
                &state_a.pyramid[stage],
                &noise_set,
                &state_a.fixed_noise,
                &state_a.noise_amps,
                &state_b.noise_amps,
                sizes,
                &groups,
                &decay,
                iter,
                config,
            );
            state_a.generator = stepped;
            scalars_a.generator_adv = adversarial;
            scalars_a.generator_rec = reconstruction;

            let (stepped, adversarial, reconstruction) = generator_phase(
                state_b.generator,
                &mut opt_g_b,
                &state_a.generator,
                &critic_b,
                &state_b.pyramid[stage],
                &noise_set,
                &state_b.fixed_noise,
                &state_b.noise_amps,
                &state_a.noise_amps,
                sizes,
                &groups,
                &decay,
                iter,
                config,
            );
            state_b.generator = stepped;
            scalars_b.generator_adv = adversarial;
            scalars_b.generator_rec = reconstruction;
        }

        if iter % config.scalar_interval == 0 || iter + 1 == config.niter {
            logger.set_step(stage * config.niter + iter);
            logger.log_stage_scalars(Domain::A.key(), &scalars_a);
            logger.log_stage_scalars(Domain::B.key(), &scalars_b);
            iteration_bar.set_message(format!(
                "stage {} | G(a) {:.3} rec(a) {:.3} | G(b) {:.3} rec(b) {:.3}",
                stage,
                scalars_a.generator_adv,
                scalars_a.generator_rec,
                scalars_b.generator_adv,
                scalars_b.generator_rec,
            ));
        }

        if iter % config.image_interval == 0 || iter + 1 == config.niter {
            logger.set_step(stage * config.niter + iter);
            let final_iter = iter + 1 == config.niter;
            export_stage_images(
                config,
                &stage_dir,
                Domain::A.key(),
                &state_a,
                sizes,
                &noise_set,
                stage,
                iter,
                final_iter,
                logger,
                device,
            )?;
            export_stage_images(
                config,
                &stage_dir,
                Domain::B.key(),
                &state_b,
                sizes,
                &noise_set,
                stage,
                iter,
                final_iter,
                logger,
                device,
            )?;
        }

        iteration_bar.inc(1);
    }
    progress.remove(&iteration_bar);

    critic_a
        .clone()
        .save_file(stage_dir.join("critic_a"), recorder)?;
    critic_b
        .clone()
        .save_file(stage_dir.join("critic_b"), recorder)?;
    checkpoint_domain(&stage_dir, Domain::A.key(), &state_a, recorder)?;
    checkpoint_domain(&stage_dir, Domain::B.key(), &state_b, recorder)?;
    checkpoint_domain(run_dir, Domain::A.key(), &state_a, recorder)?;
    checkpoint_domain(run_dir, Domain::B.key(), &state_b, recorder)?;

    let run_state = RunState {
        mode: config.train_mode,
        scale_factor: schedule.scale_factor,
        sizes: schedule.sizes.clone(),
        stages_trained: stage + 1,
        noise_amps_a: state_a.noise_amps.clone(),
        noise_amps_b: state_b.noise_amps.clone(),
    };
    run_state.save(stage_dir.join("run_state.ron"))?;
    run_state.save(run_dir.join("run_state.ron"))?;
    log::info!("stage {} checkpointed into {}", stage, stage_dir.display());

    Ok((state_a, state_b))
}

/// Trains the coupled progressive GAN pair end to end and returns both
/// generators at their final depth.
pub fn train_twin_gan<B: AutodiffBackend, R: FileRecorder<B>>(
    config: TrainingConfig,
    device: B::Device,
    logger: PyramidGanLogger,
    recorder: R,
) -> Result<(GrowingGenerator<B>, GrowingGenerator<B>), TrainingError> {
    let run_dir = generate_run_dir(&config);
    std::fs::create_dir_all(&run_dir)?;
    config.save(run_dir.join("training_config.json"))?;

    B::seed(config.seed);

    let source_a = cap_to_max_size(open_image(Path::new(&config.input_a))?, config.max_size);
    let finest = [source_a.height() as usize, source_a.width() as usize];
    let source_b = resample_to(open_image(Path::new(&config.input_b))?, finest);
    let schedule = ScaleSchedule::new(finest, config.min_size, config.train_stages)?;

    let generator_config = GrowingGeneratorConfig::new()
        .with_nc_im(config.nc_im)
        .with_nfc(config.nfc)
        .with_num_layer(config.num_layer)
        .with_ker_size(config.ker_size);

    let mut state_a = DomainState {
        pyramid: build_pyramid::<B>(&source_a, &schedule, &device),
        generator: generator_config.init::<B>(&device),
        fixed_noise: Vec::new(),
        noise_amps: Vec::new(),
    };
    let mut state_b = DomainState {
        pyramid: build_pyramid::<B>(&source_b, &schedule, &device),
        generator: generator_config.init::<B>(&device),
        fixed_noise: Vec::new(),
        noise_amps: Vec::new(),
    };

    log::info!(
        "training {} stages towards {}x{} (scale factor {:.4}) into {}",
        schedule.stages(),
        finest[0],
        finest[1],
        schedule.scale_factor,
        run_dir.display()
    );

    let progress = MultiProgress::new();
    let style =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-");
    let stage_bar = progress.add(ProgressBar::new(config.train_stages as u64));
    stage_bar.set_style(style.clone());
    stage_bar.set_message("Stages");

    for stage in 0..config.train_stages {
        if stage > 0 {
            state_a.generator = state_a.generator.init_next_stage(&device);
            state_b.generator = state_b.generator.init_next_stage(&device);
        }
        let stage_dir = run_dir.join(format!("stage_{}", stage));
        std::fs::create_dir_all(&stage_dir)?;
        save_image(&stage_dir.join("real_a.png"), state_a.pyramid[stage].clone())?;
        save_image(&stage_dir.join("real_b.png"), state_b.pyramid[stage].clone())?;

        let (next_a, next_b) = train_single_stage(
            &config,
            stage,
            &schedule,
            &run_dir,
            state_a,
            state_b,
            &logger,
            &recorder,
            &progress,
            &style,
            &device,
        )?;
        state_a = next_a;
        state_b = next_b;
        stage_bar.inc(1);
    }

    Ok((state_a.generator, state_b.generator))
}
