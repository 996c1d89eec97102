use burn::prelude::{Backend, Int, Tensor};
use rerun::{
    AsComponents, RecordingStream,
    external::ndarray::{self},
};

/// Scalar snapshot of one domain's losses at one iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageScalars {
    pub critic_real: f64,
    pub critic_fake: f64,
    pub critic_penalty: f64,
    pub generator_adv: f64,
    pub generator_rec: f64,
}

/// Dashboard sink for the progressive trainer. Construction is the
/// binary's job; the trainer only ever logs into the stream it is handed.
pub struct PyramidGanLogger {
    stream: RecordingStream,
    pub image_grid_options: ImageGridOptions,
}

fn convert_to_picture<B: Backend>(image_tensor: Tensor<B, 4>) -> Tensor<B, 4, Int> {
    let image_tensor = image_tensor.clamp(-1.0, 1.0) * 127.5 + 127.5;
    let image_tensor = image_tensor.int();
    image_tensor.permute([0, 2, 3, 1])
}

impl PyramidGanLogger {
    pub fn new(stream: RecordingStream) -> Self {
        Self {
            stream,
            image_grid_options: ImageGridOptions::Auto,
        }
    }

    /// Sink that drops everything; used by tests.
    pub fn disabled() -> Self {
        Self::new(RecordingStream::disabled())
    }

    /// Pins all subsequent logs to a run-global iteration index.
    pub fn set_step(&self, step: usize) {
        self.stream.set_time_sequence("iteration", step as i64);
    }

    pub fn log_stage_scalars(&self, domain_key: &str, scalars: &StageScalars) {
        let series = [
            ("critic_real", scalars.critic_real),
            ("critic_fake", scalars.critic_fake),
            ("critic_penalty", scalars.critic_penalty),
            ("generator_adv", scalars.generator_adv),
            ("generator_rec", scalars.generator_rec),
        ];
        for (name, value) in series {
            let _ = self.stream.log(
                format!("graphs/domain_{}/{}", domain_key, name),
                &rerun::Scalar::new(value),
            );
        }
    }

    /// Logs a single [-1, 1] image tensor, shape [1, c, h, w].
    pub fn log_image<B: Backend>(&self, path: &str, image: Tensor<B, 4>) {
        match LogContainer::from_burn_4d_tensoru8(
            convert_to_picture(image),
            self.image_grid_options.clone(),
        ) {
            Ok(c) => {
                let _ = self.stream.log(path.to_owned(), &c);
            }
            Err(e) => {
                let _ = self.stream.log(
                    path.to_owned(),
                    &rerun::TextLog::new(format!("Failed to convert image due to {:?}", e))
                        .with_level(rerun::TextLogLevel::ERROR),
                );
            }
        }
    }

    /// Stitches same-sized sample cells into one grid image and logs it.
    pub fn log_sample_grid<B: Backend>(&self, path: &str, cells: Vec<Tensor<B, 4>>) {
        let batch = Tensor::cat(cells, 0);
        self.log_image(path, batch);
    }
}

pub struct LogContainer<K: ?Sized + AsComponents> {
    component: K,
}

impl<K: ?Sized + AsComponents> AsComponents for LogContainer<K> {
    fn as_serialized_batches(&self) -> Vec<rerun::SerializedComponentBatch> {
        self.component.as_serialized_batches()
    }
    fn to_arrow(
        &self,
    ) -> rerun::SerializationResult<
        Vec<(
            rerun::external::arrow::datatypes::Field,
            rerun::external::arrow::array::ArrayRef,
        )>,
    > {
        self.component.to_arrow()
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum LogContainerParsingError {
    #[error("Failed to parse shape to [usize; {}] due to {}", .0, .1)]
    ShapeParsingError(usize, String),
    #[error("Failed to read tensor data as Vec<{}> due to {}", .0, .1)]
    VecParsingError(String, String),
    #[error("failed to convert from image due to {}", .0)]
    ImageConstructionError(String),
}

fn get_val<IT: Copy, const ID: usize>(
    data: &[IT],
    data_shape: &[usize; ID],
    pos: &[usize; ID],
) -> IT {
    let mut idx = pos[ID - 1];
    for i in 1..ID {
        let mut tmp = pos[i - 1];
        for j in i..ID {
            tmp *= data_shape[j];
        }
        idx += tmp;
    }
    data[idx]
}

impl LogContainer<rerun::Image> {
    /// Converts a burn tensor into a container that logs one image.
    /// Assumes the u8-ranged int tensor shape [height, width, color].
    pub fn from_burn_3d_tensoru8<B: Backend>(
        burn_tensor: Tensor<B, 3, Int>,
    ) -> Result<Self, LogContainerParsingError> {
        let tensor_data = burn_tensor.to_data().convert::<i32>();
        let shape: Result<[usize; 3], _> = tensor_data.shape.clone().try_into();

        if let Err(err) = shape {
            return Err(LogContainerParsingError::ShapeParsingError(
                3,
                format!("{:?}", err),
            ));
        }
        let shape = shape.unwrap();

        let h = shape[0];
        let w = shape[1];
        let c = shape[2];

        let tensor_vec: Result<Vec<i32>, _> = tensor_data.into_vec();

        if let Err(err) = tensor_vec {
            return Err(LogContainerParsingError::VecParsingError(
                "i32".into(),
                format!("{:?}", err),
            ));
        }
        let tensor_vec = tensor_vec.unwrap();

        let ishape: [usize; 3] = [h, w, c];
        let nd = ndarray::Array3::<i32>::from_shape_fn(ishape, |n| {
            let n = n.into();
            get_val(&tensor_vec, &ishape, &n)
        });

        let image;
        if c == 1 {
            image = rerun::Image::from_color_model_and_tensor(rerun::ColorModel::L, nd);
        } else if c == 3 {
            image = rerun::Image::from_color_model_and_tensor(rerun::ColorModel::RGB, nd);
        } else if c == 4 {
            image = rerun::Image::from_color_model_and_tensor(rerun::ColorModel::RGBA, nd);
        } else {
            return Err(LogContainerParsingError::ImageConstructionError(format!(
                "{} is not a valid option for the color channel! choose either 1 (L), 3 (rgb) or 4 (rgba)",
                c
            )));
        }
        if let Err(err) = image {
            return Err(LogContainerParsingError::ImageConstructionError(format!(
                "{:?}",
                err
            )));
        }
        Ok(Self {
            component: image.unwrap(),
        })
    }

    /// Converts a burn tensor into a container that logs a stitched image
    /// grid. Assumes the u8-ranged int tensor shape
    /// [batch, height, width, color].
    pub fn from_burn_4d_tensoru8<B: Backend>(
        burn_tensor: Tensor<B, 4, Int>,
        grid_settings: ImageGridOptions,
    ) -> Result<Self, LogContainerParsingError> {
        let shape: [usize; 4] = burn_tensor.shape().dims();
        let b = shape[0];
        let h = shape[1];
        let w = shape[2];
        let c = shape[3];

        if b == 1 {
            let burn_tensor = burn_tensor.reshape([h, w, c]);
            return Self::from_burn_3d_tensoru8(burn_tensor);
        }

        let (rows, columns) = grid_settings.into_row_column(b);

        let height = rows * h;
        let width = columns * w;
        let mut stitched_tensor: Tensor<B, 3, Int> =
            Tensor::zeros([height, width, c], &burn_tensor.device());

        for i in 0..b {
            let row = i / columns;
            let col = i % columns;
            let start_row = row * h;
            let start_col = col * w;
            let end_row = start_row + h;
            let end_col = start_col + w;

            let slice = burn_tensor.clone().slice([i..i + 1, 0..h, 0..w, 0..c]);
            let reshaped_slice = slice.reshape([h, w, c]);
            stitched_tensor = stitched_tensor.slice_assign(
                [start_row..end_row, start_col..end_col, 0..c],
                reshaped_slice,
            );
        }
        Self::from_burn_3d_tensoru8(stitched_tensor)
    }
}

#[derive(Default, Clone, Debug, PartialEq)]
pub enum ImageGridOptions {
    Columns(usize),
    Rows(usize),
    Exact {
        rows: usize,
        columns: usize,
    },
    #[default]
    Auto,
}

impl ImageGridOptions {
    fn into_row_column(self, batch_size: usize) -> (usize, usize) {
        match self {
            ImageGridOptions::Columns(c) => {
                let r = batch_size as f32 / c as f32;
                (r.floor() as usize + 1, c)
            }
            ImageGridOptions::Rows(r) => {
                let c = batch_size as f32 / r as f32;
                (r, c.floor() as usize + 1)
            }
            ImageGridOptions::Exact { rows, columns } => {
                if rows * columns < batch_size {
                    panic!(
                        "Invalid input! Make sure that {} x {} >= {}",
                        rows, columns, batch_size
                    );
                };
                (rows, columns)
            }
            ImageGridOptions::Auto => {
                let root = (batch_size as f32).sqrt();
                if root % 1. == 0. {
                    (root as usize, root as usize)
                } else {
                    ((root.floor() as usize + 1), root.round() as usize)
                }
            }
        }
    }
}
