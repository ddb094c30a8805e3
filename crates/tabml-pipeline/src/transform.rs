use serde::{Deserialize, Serialize};
use tabml_core::{Column, MlError, MlResult, Table, Tensor};
use tabml_preprocessing::{MinMaxScaler, OneHotEncoder, TextFeaturizer, TextOptions};
use tracing::debug;

/// A column transform: learns its state from a training table, then maps
/// any table with the same input columns to a new table with `output` added.
pub trait Transformer {
    fn fit(&mut self, table: &Table) -> MlResult<()>;
    fn transform(&self, table: &Table) -> MlResult<Table>;
    fn fit_transform(&mut self, table: &Table) -> MlResult<Table> {
        self.fit(table)?;
        self.transform(table)
    }
    /// Columns read by this step.
    fn inputs(&self) -> Vec<&str>;
    /// Column written by this step.
    fn output(&self) -> &str;
}

/// One-hot encode a text column into a vector column.
///
/// Categories are kept in first-seen order. A value not seen during fit
/// maps to the all-zero vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoding {
    pub input: String,
    pub output: String,
    encoder: OneHotEncoder,
}

impl OneHotEncoding {
    pub fn new(input: &str, output: &str) -> Self {
        OneHotEncoding {
            input: input.to_string(),
            output: output.to_string(),
            encoder: OneHotEncoder::new(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.encoder.categories
    }
}

impl Transformer for OneHotEncoding {
    fn fit(&mut self, table: &Table) -> MlResult<()> {
        self.encoder = OneHotEncoder::new();
        self.encoder.fit(table.text(&self.input)?);
        debug!(
            column = %self.input,
            categories = self.encoder.n_categories(),
            "fitted one-hot encoding"
        );
        Ok(())
    }

    fn transform(&self, table: &Table) -> MlResult<Table> {
        let encoded = self.encoder.transform(table.text(&self.input)?)?;
        table.with_column(&self.output, Column::Vector(encoded))
    }

    fn inputs(&self) -> Vec<&str> {
        vec![self.input.as_str()]
    }

    fn output(&self) -> &str {
        &self.output
    }
}

/// Rescale a numeric or vector column into [0, 1] using the min and max
/// seen at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeMinMax {
    pub input: String,
    pub output: String,
    scaler: MinMaxScaler<f64>,
}

impl NormalizeMinMax {
    pub fn new(input: &str, output: &str) -> Self {
        NormalizeMinMax {
            input: input.to_string(),
            output: output.to_string(),
            scaler: MinMaxScaler::new(),
        }
    }
}

impl Transformer for NormalizeMinMax {
    fn fit(&mut self, table: &Table) -> MlResult<()> {
        self.scaler.fit(&table.matrix(&self.input)?)?;
        debug!(column = %self.input, "fitted min-max normalization");
        Ok(())
    }

    fn transform(&self, table: &Table) -> MlResult<Table> {
        let scaled = self.scaler.transform(&table.matrix(&self.input)?)?;
        // Scalar in, scalar out.
        let column = match table.column(&self.input)? {
            Column::Numeric(_) => Column::Numeric(scaled.into_data()),
            _ => Column::Vector(scaled),
        };
        table.with_column(&self.output, column)
    }

    fn inputs(&self) -> Vec<&str> {
        vec![self.input.as_str()]
    }

    fn output(&self) -> &str {
        &self.output
    }
}

/// Join numeric and vector columns, in the listed order, into one vector
/// column. The total width is recorded at fit and checked afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concatenate {
    pub output: String,
    pub inputs: Vec<String>,
    width: Option<usize>,
}

impl Concatenate {
    pub fn new(output: &str, inputs: &[&str]) -> Self {
        Concatenate {
            output: output.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            width: None,
        }
    }

    pub fn width(&self) -> Option<usize> {
        self.width
    }

    fn join(&self, table: &Table) -> MlResult<Tensor<f64>> {
        if self.inputs.is_empty() {
            return Err(MlError::InvalidConfig(format!(
                "concatenate into '{}' has no input columns",
                self.output
            )));
        }
        let parts = self
            .inputs
            .iter()
            .map(|name| table.matrix(name))
            .collect::<MlResult<Vec<_>>>()?;
        let refs: Vec<&Tensor<f64>> = parts.iter().collect();
        Tensor::hstack(&refs)
    }
}

impl Transformer for Concatenate {
    fn fit(&mut self, table: &Table) -> MlResult<()> {
        let joined = self.join(table)?;
        self.width = Some(joined.cols()?);
        debug!(column = %self.output, width = joined.cols()?, "fitted concatenation");
        Ok(())
    }

    fn transform(&self, table: &Table) -> MlResult<Table> {
        let expected = self.width.ok_or(MlError::NotFitted("Concatenate"))?;
        let joined = self.join(table)?;
        let found = joined.cols()?;
        if found != expected {
            return Err(MlError::FeatureWidth { expected, found });
        }
        table.with_column(&self.output, Column::Vector(joined))
    }

    fn inputs(&self) -> Vec<&str> {
        self.inputs.iter().map(String::as_str).collect()
    }

    fn output(&self) -> &str {
        &self.output
    }
}

/// Turn a free-text column into a bag-of-n-grams vector column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturizeText {
    pub input: String,
    pub output: String,
    featurizer: TextFeaturizer,
}

impl FeaturizeText {
    pub fn new(input: &str, output: &str) -> Self {
        Self::with_options(input, output, TextOptions::default())
    }

    pub fn with_options(input: &str, output: &str, options: TextOptions) -> Self {
        FeaturizeText {
            input: input.to_string(),
            output: output.to_string(),
            featurizer: TextFeaturizer::new(options),
        }
    }

    pub fn options(&self) -> &TextOptions {
        &self.featurizer.options
    }
}

impl Transformer for FeaturizeText {
    fn fit(&mut self, table: &Table) -> MlResult<()> {
        self.featurizer = TextFeaturizer::new(self.featurizer.options.clone());
        self.featurizer.fit(table.text(&self.input)?)?;
        debug!(
            column = %self.input,
            vocabulary = self.featurizer.vocabulary_size(),
            "fitted text featurizer"
        );
        Ok(())
    }

    fn transform(&self, table: &Table) -> MlResult<Table> {
        let features = self.featurizer.transform(table.text(&self.input)?)?;
        table.with_column(&self.output, Column::Vector(features))
    }

    fn inputs(&self) -> Vec<&str> {
        vec![self.input.as_str()]
    }

    fn output(&self) -> &str {
        &self.output
    }
}

/// Closed set of pipeline steps. Stored in [`crate::Pipeline`] and
/// [`crate::Model`] so both can be cloned and serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Step {
    OneHotEncoding(OneHotEncoding),
    NormalizeMinMax(NormalizeMinMax),
    Concatenate(Concatenate),
    FeaturizeText(FeaturizeText),
}

impl Step {
    fn as_transformer(&self) -> &dyn Transformer {
        match self {
            Step::OneHotEncoding(s) => s,
            Step::NormalizeMinMax(s) => s,
            Step::Concatenate(s) => s,
            Step::FeaturizeText(s) => s,
        }
    }

    fn as_transformer_mut(&mut self) -> &mut dyn Transformer {
        match self {
            Step::OneHotEncoding(s) => s,
            Step::NormalizeMinMax(s) => s,
            Step::Concatenate(s) => s,
            Step::FeaturizeText(s) => s,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::OneHotEncoding(_) => "OneHotEncoding",
            Step::NormalizeMinMax(_) => "NormalizeMinMax",
            Step::Concatenate(_) => "Concatenate",
            Step::FeaturizeText(_) => "FeaturizeText",
        }
    }
}

impl Transformer for Step {
    fn fit(&mut self, table: &Table) -> MlResult<()> {
        self.as_transformer_mut().fit(table)
    }

    fn transform(&self, table: &Table) -> MlResult<Table> {
        self.as_transformer().transform(table)
    }

    fn inputs(&self) -> Vec<&str> {
        self.as_transformer().inputs()
    }

    fn output(&self) -> &str {
        self.as_transformer().output()
    }
}

impl From<OneHotEncoding> for Step {
    fn from(s: OneHotEncoding) -> Self {
        Step::OneHotEncoding(s)
    }
}

impl From<NormalizeMinMax> for Step {
    fn from(s: NormalizeMinMax) -> Self {
        Step::NormalizeMinMax(s)
    }
}

impl From<Concatenate> for Step {
    fn from(s: Concatenate) -> Self {
        Step::Concatenate(s)
    }
}

impl From<FeaturizeText> for Step {
    fn from(s: FeaturizeText) -> Self {
        Step::FeaturizeText(s)
    }
}
