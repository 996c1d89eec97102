pub mod checkpoint;
pub mod critic;
pub mod generator;
pub mod noise;
pub mod schedule;
pub mod training;
