use std::{fs::File, path::Path};

use bincode::error::{DecodeError, EncodeError};
use bincode_derive::{Decode, Encode};
use burn::{
    prelude::Backend,
    tensor::{Tensor, TensorData},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::noise::TrainMode;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to encode tensor blob due to {0}")]
    BlobEncodeError(#[from] EncodeError),
    #[error("failed to decode tensor blob due to {0}")]
    BlobDecodeError(#[from] DecodeError),
    #[error("failed to write run manifest due to {0}")]
    ManifestSerializationError(#[from] ron::error::Error),
    #[error("failed to read run manifest due to {0}")]
    ManifestDeserializationError(#[from] ron::error::SpannedError),
    #[error("failed to read tensor values due to {0}")]
    TensorReadError(String),
}

/// Backend-independent snapshot of one float tensor, compact enough to
/// persist whole noise histories and pyramids per run.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct TensorBlob {
    shape: Vec<usize>,
    values: Vec<f32>,
}

impl TensorBlob {
    pub fn from_tensor<B: Backend>(tensor: &Tensor<B, 4>) -> Result<Self, CheckpointError> {
        let shape = tensor.dims().to_vec();
        let values = tensor
            .to_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .map_err(|err| CheckpointError::TensorReadError(format!("{err:?}")))?;
        Ok(Self { shape, values })
    }

    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        Tensor::from_data(
            TensorData::new(self.values.clone(), self.shape.clone()),
            device,
        )
    }
}

pub fn save_tensor_list<B: Backend>(
    path: impl AsRef<Path>,
    tensors: &[Tensor<B, 4>],
) -> Result<(), CheckpointError> {
    let blobs = tensors
        .iter()
        .map(TensorBlob::from_tensor)
        .collect::<Result<Vec<_>, _>>()?;
    let bytes = bincode::encode_to_vec(&blobs, bincode::config::standard())?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load_tensor_list<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<Vec<Tensor<B, 4>>, CheckpointError> {
    let bytes = std::fs::read(path)?;
    let (blobs, _): (Vec<TensorBlob>, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(blobs.iter().map(|blob| blob.to_tensor(device)).collect())
}

/// Human-readable run manifest: everything needed to resample from the
/// persisted generators without re-deriving the schedule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunState {
    pub mode: TrainMode,
    pub scale_factor: f64,
    pub sizes: Vec<[usize; 2]>,
    pub stages_trained: usize,
    pub noise_amps_a: Vec<f64>,
    pub noise_amps_b: Vec<f64>,
}

impl RunState {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        ron::ser::to_writer(file, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        Ok(ron::de::from_reader(file)?)
    }
}
