//! Fit/apply pipelines over tables: transform steps, trainer plugins,
//! fitted models, evaluation and cross-validation.

pub mod config;
pub mod evaluate;
pub mod pipeline;
pub mod trainer;
pub mod transform;

pub use config::ExperimentConfig;
pub use evaluate::*;
pub use pipeline::*;
pub use trainer::*;
pub use transform::*;
