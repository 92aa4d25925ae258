//! Batch conversion of an image list into a CSV dataset.
//!
//! This module provides:
//! - The per-image, per-field extraction loop
//! - CSV header and row output

pub mod csv_writer;
pub mod runner;

pub use runner::{run, BatchJob, Summary};
