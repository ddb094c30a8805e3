//! # tabml
//!
//! Load a delimited file, chain column transforms, train one model, then
//! evaluate, cross-validate and predict.
//!
//! ## Modules
//!
//! - **core**: `Table`, `Schema`, `Row`, `Tensor`, and the shared `MlError`
//! - **preprocessing**: one-hot, min-max, text featurization, train/test and k-fold splits
//! - **linear**: SDCA least-squares regression, logistic regression
//! - **tree**: CART regression tree, random forest ("fast forest")
//! - **metrics**: MAE, MSE, RMSE, R²; accuracy, precision, recall, F1, ROC-AUC, PR-AUC, log loss
//! - **pipeline**: `Pipeline` / `Model`, trainer plugins, evaluation, cross-validation
//! - **io**: `TextLoader`, `write_csv`, JSON model persistence
//!
//! ```no_run
//! use tabml::core::{FieldKind, Row, Schema};
//! use tabml::io::TextLoader;
//! use tabml::pipeline::{Concatenate, NormalizeMinMax, Pipeline, TrainerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::new()
//!     .numeric(1, "PovertyRate")
//!     .label_named(5, "BirthRate", FieldKind::Numeric);
//! let table = TextLoader::new(schema).load("data/poverty.csv")?;
//!
//! let model = Pipeline::new()
//!     .append(NormalizeMinMax::new("PovertyRate", "PovertyRate"))
//!     .append(Concatenate::new("Features", &["PovertyRate"]))
//!     .set_trainer(TrainerConfig::sdca().build(Some(42)))
//!     .with_label("BirthRate")
//!     .fit(&table)?;
//!
//! let prediction = model.predict(&Row::new().with("PovertyRate", 19.7))?;
//! println!("Predicted birth rate: {:.1}", prediction.score());
//! # Ok(())
//! # }
//! ```

/// Tables, schemas and errors.
pub use tabml_core as core;

/// Feature transforms and splitting.
pub use tabml_preprocessing as preprocessing;

/// Linear models.
pub use tabml_linear as linear;

/// Tree-based models.
pub use tabml_tree as tree;

/// Evaluation metrics.
pub use tabml_metrics as metrics;

/// Pipeline API.
pub use tabml_pipeline as pipeline;

/// Loading, writing and persistence.
pub use tabml_io as io;
