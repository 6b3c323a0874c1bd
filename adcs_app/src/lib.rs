//! Sensor replay driver for the ADCS core: reads sensor samples from a CSV
//! file in place of the software bus and runs one control cycle per row.

use adcs::ConfigErrors;
use adcs_result::ResultErrors;
use thiserror::Error;

pub mod replay;

pub use replay::{ReplaySummary, SampleRecord, replay};

#[derive(Debug, Error)]
pub enum AppErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Result(#[from] ResultErrors),
}
