use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tabml_core::{MlError, MlResult, Tensor};

/// How n-gram counts are turned into feature values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    /// Raw term frequency.
    Tf,
    /// Term frequency scaled by smoothed inverse document frequency.
    TfIdf,
    /// 1 if the n-gram occurs, else 0.
    Binary,
}

/// Settings for [`TextFeaturizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub lowercase: bool,
    /// Inclusive range of word n-gram lengths; `(0, 0)` disables word n-grams.
    pub word_ngrams: (usize, usize),
    /// Character n-gram length; `0` disables character n-grams.
    pub char_ngram: usize,
    /// Drop n-grams seen in fewer training documents than this.
    pub min_document_count: usize,
    /// Keep only the most frequent n-grams.
    pub max_features: Option<usize>,
    pub weighting: Weighting,
    /// Scale each output row to unit L2 norm.
    pub normalize: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        TextOptions {
            lowercase: true,
            word_ngrams: (1, 2),
            char_ngram: 3,
            min_document_count: 1,
            max_features: Some(4096),
            weighting: Weighting::TfIdf,
            normalize: true,
        }
    }
}

/// Bag-of-n-grams text featurizer.
///
/// Tokens are maximal runs of alphanumeric characters (plus `$`). Word
/// n-grams and character n-grams share one vocabulary, fixed at `fit`;
/// n-grams not in the vocabulary are ignored at `transform`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextFeaturizer {
    pub options: TextOptions,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    fitted: bool,
}

impl TextFeaturizer {
    pub fn new(options: TextOptions) -> Self {
        TextFeaturizer {
            options,
            ..Default::default()
        }
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.options.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        text.split(|c: char| !(c.is_alphanumeric() || c == '$'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// All n-gram keys of one document, with repeats.
    fn ngrams(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let mut grams = Vec::new();

        let (lo, hi) = self.options.word_ngrams;
        if lo > 0 {
            for n in lo..=hi {
                for w in tokens.windows(n) {
                    grams.push(format!("w:{}", w.join(" ")));
                }
            }
        }

        let n = self.options.char_ngram;
        if n > 0 && !tokens.is_empty() {
            let chars: Vec<char> = format!(" {} ", tokens.join(" ")).chars().collect();
            for w in chars.windows(n) {
                grams.push(format!("c:{}", w.iter().collect::<String>()));
            }
        }
        grams
    }

    /// Build the vocabulary and document frequencies from training text.
    pub fn fit(&mut self, documents: &[String]) -> MlResult<()> {
        if documents.is_empty() {
            return Err(MlError::EmptyTable);
        }

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.ngrams(doc).into_iter().collect();
            for gram in unique {
                *document_frequency.entry(gram).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= self.options.min_document_count)
            .collect();
        if let Some(limit) = self.options.max_features {
            // Most frequent first; BTreeMap order breaks ties alphabetically.
            kept.sort_by(|a, b| b.1.cmp(&a.1));
            kept.truncate(limit);
            kept.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let n_docs = documents.len() as f64;
        self.vocabulary = HashMap::with_capacity(kept.len());
        self.idf = Vec::with_capacity(kept.len());
        for (idx, (gram, df)) in kept.into_iter().enumerate() {
            self.vocabulary.insert(gram, idx);
            self.idf.push(((n_docs + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
        }
        self.fitted = true;
        Ok(())
    }

    /// Map each document to a fixed-width `[n, vocabulary_size]` matrix.
    pub fn transform(&self, documents: &[String]) -> MlResult<Tensor<f64>> {
        if !self.fitted {
            return Err(MlError::NotFitted("TextFeaturizer"));
        }
        let width = self.vocabulary.len();
        let mut data = vec![0.0; documents.len() * width];

        for (i, doc) in documents.iter().enumerate() {
            let row = &mut data[i * width..(i + 1) * width];
            for gram in self.ngrams(doc) {
                if let Some(&j) = self.vocabulary.get(&gram) {
                    row[j] += 1.0;
                }
            }
            for (j, v) in row.iter_mut().enumerate() {
                if *v == 0.0 {
                    continue;
                }
                *v = match self.options.weighting {
                    Weighting::Tf => *v,
                    Weighting::TfIdf => *v * self.idf[j],
                    Weighting::Binary => 1.0,
                };
            }
            if self.options.normalize {
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
            }
        }

        Tensor::new(data, vec![documents.len(), width])
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> MlResult<Tensor<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}
