use std::fs;
use std::path::Path;

use tabml_core::{MlError, MlResult};
use tabml_pipeline::Model;
use tracing::info;

/// Save a fitted model to a pretty-printed JSON file.
pub fn save_model(model: &Model, path: impl AsRef<Path>) -> MlResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(model).map_err(|e| MlError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(|source| MlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "saved model");
    Ok(())
}

/// Load a model written by [`save_model`].
pub fn load_model(path: impl AsRef<Path>) -> MlResult<Model> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| MlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|e| MlError::Serialization(e.to_string()))
}
