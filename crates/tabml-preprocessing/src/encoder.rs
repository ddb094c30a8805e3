use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabml_core::{MlError, MlResult, Tensor};

/// One-hot encoder for a categorical text column.
///
/// The vocabulary holds the distinct values seen during `fit`, in first-seen
/// order. Values outside the vocabulary encode to an all-zero row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
    category_to_idx: HashMap<String, usize>,
    fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the vocabulary from training values.
    pub fn fit(&mut self, values: &[String]) {
        self.categories.clear();
        self.category_to_idx.clear();
        for v in values {
            if !self.category_to_idx.contains_key(v) {
                self.category_to_idx.insert(v.clone(), self.categories.len());
                self.categories.push(v.clone());
            }
        }
        self.fitted = true;
    }

    /// Encode values as a `[n, n_categories]` indicator matrix.
    pub fn transform(&self, values: &[String]) -> MlResult<Tensor<f64>> {
        if !self.fitted {
            return Err(MlError::NotFitted("OneHotEncoder"));
        }
        let k = self.categories.len();
        let mut data = vec![0.0; values.len() * k];
        for (i, v) in values.iter().enumerate() {
            if let Some(&j) = self.category_to_idx.get(v) {
                data[i * k + j] = 1.0;
            }
        }
        Tensor::new(data, vec![values.len(), k])
    }

    pub fn fit_transform(&mut self, values: &[String]) -> MlResult<Tensor<f64>> {
        self.fit(values);
        self.transform(values)
    }

    pub fn n_categories(&self) -> usize {
        self.categories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_hot_first_seen_order() {
        let mut enc = OneHotEncoder::new();
        let oh = enc
            .fit_transform(&strings(&["Condominium", "Duplex", "Condominium", "Cooperative"]))
            .unwrap();
        assert_eq!(enc.categories, strings(&["Condominium", "Duplex", "Cooperative"]));
        assert_eq!(oh.shape_vec(), vec![4, 3]);
        assert_eq!(oh.row_slice(0).unwrap(), &[1.0, 0.0, 0.0]);
        assert_eq!(oh.row_slice(1).unwrap(), &[0.0, 1.0, 0.0]);
        assert_eq!(oh.row_slice(3).unwrap(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unseen_value_is_zero_vector() {
        let mut enc = OneHotEncoder::new();
        enc.fit(&strings(&["Condominium", "Duplex"]));
        let oh = enc.transform(&strings(&["Mansion"])).unwrap();
        assert_eq!(oh.shape_vec(), vec![1, 2]);
        assert_eq!(oh.row_slice(0).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_transform_before_fit() {
        let enc = OneHotEncoder::new();
        assert!(matches!(
            enc.transform(&strings(&["x"])),
            Err(MlError::NotFitted(_))
        ));
    }
}
