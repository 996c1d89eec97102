pub mod logging;
pub mod pyramid;
pub mod twingan;
