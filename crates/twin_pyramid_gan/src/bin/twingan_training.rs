use burn::{
    backend::{Autodiff, Wgpu},
    record::CompactRecorder,
};
use twin_pyramid_gan::{
    logging::PyramidGanLogger,
    twingan::training::{TrainingConfig, train_twin_gan},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    type MyBackend = Wgpu<f32, i32>;
    type MyAutodiffBackend = Autodiff<MyBackend>;

    let config = TrainingConfig::new(
        "./data/domain_a.png".to_owned(),
        "./data/domain_b.png".to_owned(),
    );

    let device = match config.gpu_index {
        Some(index) => burn::backend::wgpu::WgpuDevice::DiscreteGpu(index),
        None => burn::backend::wgpu::WgpuDevice::default(),
    };

    let stream = rerun::RecordingStreamBuilder::new("train twin pyramid gan").spawn()?;
    let rec = PyramidGanLogger::new(stream.clone());

    rerun::Logger::new(stream) // recording streams are ref-counted
        .with_path_prefix("logs")
        .with_filter(rerun::default_log_filter())
        .init()?;

    train_twin_gan::<MyAutodiffBackend, _>(config, device, rec, CompactRecorder::new())?;
    Ok(())
}
