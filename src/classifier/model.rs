//! Linear bag-of-words text model
//!
//! Loads a pre-trained linear classifier exported as JSON: a vocabulary,
//! optional IDF weights and one coefficient row per class (a single row
//! for binary models). Scoring mirrors the usual TF-IDF + linear model
//! pipeline: tokenize, weight, L2-normalize, dot with coefficients.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::{ClassifierError, TextClassifier};

fn default_true() -> bool {
    true
}

/// On-disk model layout
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model_type: String,
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f64>>,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_true")]
    normalize: bool,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    /// Whether the model was trained with probability estimates
    #[serde(default)]
    probability: bool,
}

/// Pre-trained linear text classifier
#[derive(Debug)]
pub struct LinearTextModel {
    artifact: ModelArtifact,
}

impl LinearTextModel {
    /// Load a model from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a model from JSON text
    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::InvalidModel(format!("Malformed model file: {}", e)))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        let n_classes = artifact.classes.len();
        if n_classes < 2 {
            return Err(ClassifierError::InvalidModel(format!(
                "Expected at least 2 classes, found {}",
                n_classes
            )));
        }

        let n_rows = artifact.coef.len();
        let rows_ok = if n_classes == 2 {
            n_rows == 1 || n_rows == 2
        } else {
            n_rows == n_classes
        };
        if !rows_ok {
            return Err(ClassifierError::InvalidModel(format!(
                "{} coefficient rows do not match {} classes",
                n_rows, n_classes
            )));
        }
        if artifact.intercept.len() != n_rows {
            return Err(ClassifierError::InvalidModel(format!(
                "{} intercepts for {} coefficient rows",
                artifact.intercept.len(),
                n_rows
            )));
        }

        let n_features = artifact.coef[0].len();
        if artifact.coef.iter().any(|row| row.len() != n_features) {
            return Err(ClassifierError::InvalidModel(
                "Coefficient rows have different lengths".to_string(),
            ));
        }
        if let Some(idf) = &artifact.idf {
            if idf.len() != n_features {
                return Err(ClassifierError::InvalidModel(format!(
                    "IDF has {} entries, expected {}",
                    idf.len(),
                    n_features
                )));
            }
        }
        if let Some((term, index)) = artifact
            .vocabulary
            .iter()
            .find(|&(_, &index)| index >= n_features)
        {
            return Err(ClassifierError::InvalidModel(format!(
                "Vocabulary term {:?} maps to feature {} of {}",
                term, index, n_features
            )));
        }

        Ok(Self { artifact })
    }

    /// Sparse feature vector for `text`
    fn vectorize(&self, text: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text, self.artifact.lowercase) {
            if let Some(&index) = self.artifact.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut features: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| {
                let tf = if self.artifact.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                let idf = self
                    .artifact
                    .idf
                    .as_ref()
                    .map(|idf| idf[index])
                    .unwrap_or(1.0);
                (index, tf * idf)
            })
            .collect();

        if self.artifact.normalize {
            let norm = features.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, value) in features.iter_mut() {
                    *value /= norm;
                }
            }
        }

        features.sort_unstable_by_key(|(index, _)| *index);
        features
    }

    /// Raw decision scores, one per coefficient row
    fn decision_function(&self, text: &str) -> Vec<f64> {
        let features = self.vectorize(text);
        self.artifact
            .coef
            .iter()
            .zip(&self.artifact.intercept)
            .map(|(row, intercept)| {
                features
                    .iter()
                    .map(|(index, value)| row[*index] * value)
                    .sum::<f64>()
                    + intercept
            })
            .collect()
    }
}

impl TextClassifier for LinearTextModel {
    fn model_type(&self) -> &str {
        &self.artifact.model_type
    }

    fn classes(&self) -> &[String] {
        &self.artifact.classes
    }

    fn supports_probability(&self) -> bool {
        self.artifact.probability
    }

    fn predict(&self, text: &str) -> Result<String, ClassifierError> {
        let scores = self.decision_function(text);
        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };
        Ok(self.artifact.classes[index].clone())
    }

    fn predict_proba(&self, text: &str) -> Result<Option<Vec<f64>>, ClassifierError> {
        if !self.artifact.probability {
            return Ok(None);
        }

        let scores = self.decision_function(text);
        let probabilities = if scores.len() == 1 {
            let positive = 1.0 / (1.0 + (-scores[0]).exp());
            vec![1.0 - positive, positive]
        } else {
            softmax(&scores)
        };
        Ok(Some(probabilities))
    }
}

/// Word tokens of two or more alphanumeric characters
fn tokenize(text: &str, lowercase: bool) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(move |token| {
            if lowercase {
                token.to_lowercase()
            } else {
                token.to_string()
            }
        })
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        })
        .0
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
