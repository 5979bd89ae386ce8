//! Batch construction and multi-task supervision for few-shot recognition
//! training.

mod common;
pub mod config;
pub mod dataset;
pub mod loader;
pub mod processor;
pub mod profiling;
pub mod supervision;
pub mod transform;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use dataset::{BaseDataset, Batch};
pub use loader::ParallelLoader;
