//! Mood classifier
//!
//! A multinomial logistic regression fitted on the numeric metrics of a
//! single health log. The model is never persisted: every insight run trains
//! a fresh one and predicts over the same rows it was trained on.
//!
//! Training is deterministic. Features are standardised, weights start at
//! zero and full-batch gradient descent runs for a fixed number of
//! iterations, so identical input always yields identical predictions.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use crate::error::{Error, Result};
use crate::health_log::HealthLog;
use crate::models::{Metric, MOOD_COLUMN};

/// Gradient descent step size (features are standardised)
const LEARNING_RATE: f64 = 0.5;

/// Number of full-batch gradient steps
const MAX_ITERATIONS: usize = 1000;

/// L2 penalty on the weights (not the intercepts)
const L2_PENALTY: f64 = 1e-3;

/// Standard deviations below this are treated as constant features
const MIN_SCALE: f64 = 1e-12;

/// Bijective mapping between mood labels and dense integer codes
///
/// Codes follow sorted label order, so `["sad", "happy", "neutral"]` encodes
/// as happy=0, neutral=1, sad=2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEncoder {
    labels: Vec<String>,
}

impl MoodEncoder {
    /// Build an encoder from observed labels
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            labels: unique.into_iter().map(String::from).collect(),
        }
    }

    /// Code for a label, if it was observed
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
    }

    /// Label for a code produced by this encoder
    pub fn decode(&self, code: usize) -> Result<&str> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| Error::Training(format!("Unknown mood code: {}", code)))
    }

    /// Observed labels in code order
    pub fn classes(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Fitted multinomial logistic regression over a subset of metrics
#[derive(Debug, Clone)]
pub struct MoodClassifier {
    features: Vec<Metric>,
    means: Array1<f64>,
    scales: Array1<f64>,
    /// One row of weights per class
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl MoodClassifier {
    /// Fit a classifier on a feature matrix and encoded targets
    ///
    /// `targets` must hold codes below `n_classes`. With a single class the
    /// result always predicts that class.
    pub fn fit(
        features: Vec<Metric>,
        x: &Array2<f64>,
        targets: &[usize],
        n_classes: usize,
    ) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_classes == 0 {
            return Err(Error::Training("No training rows".into()));
        }
        if n_features != features.len() || targets.len() != n_rows {
            return Err(Error::Training(format!(
                "Shape mismatch: {} rows x {} features, {} targets, {} feature names",
                n_rows,
                n_features,
                targets.len(),
                features.len()
            )));
        }
        if let Some(bad) = targets.iter().find(|t| **t >= n_classes) {
            return Err(Error::Training(format!(
                "Target code {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Training("Empty feature matrix".into()))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > MIN_SCALE { s } else { 1.0 });
        let z = (x - &means) / &scales;

        let mut weights = Array2::<f64>::zeros((n_classes, n_features));
        let mut intercepts = Array1::<f64>::zeros(n_classes);

        if n_classes > 1 {
            let n = n_rows as f64;
            for _ in 0..MAX_ITERATIONS {
                let mut residuals = softmax(z.dot(&weights.t()) + &intercepts);
                for (i, &target) in targets.iter().enumerate() {
                    residuals[[i, target]] -= 1.0;
                }

                let mut grad_w = residuals.t().dot(&z);
                grad_w /= n;
                grad_w.scaled_add(L2_PENALTY, &weights);
                let grad_b = residuals.sum_axis(Axis(0)) / n;

                weights.scaled_add(-LEARNING_RATE, &grad_w);
                intercepts.scaled_add(-LEARNING_RATE, &grad_b);
            }
        }

        Ok(Self {
            features,
            means,
            scales,
            weights,
            intercepts,
        })
    }

    /// Metrics used as features, in training order
    pub fn features(&self) -> &[Metric] {
        &self.features
    }

    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    /// Predict the class code for one feature vector
    ///
    /// `features` must follow [`Self::features`] order. Ties go to the
    /// lowest code.
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        if features.len() != self.features.len() {
            return Err(Error::Training(format!(
                "Expected {} feature values, got {}",
                self.features.len(),
                features.len()
            )));
        }

        let z = (Array1::from(features.to_vec()) - &self.means) / &self.scales;
        let scores = self.weights.dot(&z) + &self.intercepts;

        let mut best = 0;
        for (code, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = code;
            }
        }
        Ok(best)
    }
}

/// Row-wise softmax
fn softmax(mut scores: Array2<f64>) -> Array2<f64> {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    scores
}

/// A classifier together with the encoder needed to decode its predictions
#[derive(Debug, Clone)]
pub struct MoodModel {
    pub classifier: MoodClassifier,
    pub encoder: MoodEncoder,
}

impl MoodModel {
    /// Train on a health log, or `None` when training is not possible
    ///
    /// Returns `None` when the mood column is absent, no metric column is
    /// present, or no row has both a mood label and every feature value.
    pub fn train(log: &HealthLog) -> Result<Option<Self>> {
        if !log.has_mood() {
            debug!("No mood column, skipping classifier training");
            return Ok(None);
        }

        let features = log.metrics().to_vec();
        if features.is_empty() {
            debug!("No metric columns, skipping classifier training");
            return Ok(None);
        }

        let rows: Vec<(Vec<f64>, &str)> = log
            .records()
            .iter()
            .filter_map(|r| Some((r.features(&features)?, r.mood.as_deref()?)))
            .collect();

        if rows.is_empty() {
            debug!("No complete rows, skipping classifier training");
            return Ok(None);
        }
        if rows.len() < log.len() {
            debug!(
                skipped = log.len() - rows.len(),
                "Rows with missing values excluded from training"
            );
        }

        let encoder = MoodEncoder::fit(rows.iter().map(|(_, label)| *label));
        let targets = rows
            .iter()
            .map(|(_, label)| {
                encoder
                    .encode(label)
                    .ok_or_else(|| Error::Training(format!("Unencoded label: {}", label)))
            })
            .collect::<Result<Vec<_>>>()?;

        let flat: Vec<f64> = rows.iter().flat_map(|(x, _)| x.iter().copied()).collect();
        let x = Array2::from_shape_vec((rows.len(), features.len()), flat)
            .map_err(|e| Error::Training(e.to_string()))?;

        let classifier = MoodClassifier::fit(features, &x, &targets, encoder.len())?;

        debug!(
            rows = rows.len(),
            classes = ?encoder.classes(),
            features = ?classifier.features(),
            "Trained mood classifier"
        );

        Ok(Some(Self {
            classifier,
            encoder,
        }))
    }

    /// Train, failing hard when the mood column is absent
    pub fn train_strict(log: &HealthLog) -> Result<Option<Self>> {
        if !log.has_mood() {
            return Err(Error::MissingColumn(MOOD_COLUMN.to_string()));
        }
        Self::train(log)
    }

    /// Predict a mood label for every row of a log (in-sample)
    ///
    /// Rows missing any of the classifier's features yield `None`.
    pub fn predict_labels(&self, log: &HealthLog) -> Result<Vec<Option<String>>> {
        log.records()
            .iter()
            .map(|r| match r.features(self.classifier.features()) {
                Some(x) => {
                    let code = self.classifier.predict(&x)?;
                    Ok(Some(self.encoder.decode(code)?.to_string()))
                }
                None => Ok(None),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_from(csv: &str) -> HealthLog {
        HealthLog::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_encoder_sorted_codes() {
        let encoder = MoodEncoder::fit(["sad", "happy", "neutral", "sad"]);
        assert_eq!(encoder.classes(), &["happy", "neutral", "sad"]);
        assert_eq!(encoder.encode("happy"), Some(0));
        assert_eq!(encoder.encode("sad"), Some(2));
        assert_eq!(encoder.encode("angry"), None);
    }

    #[test]
    fn test_encoder_inverse() {
        let encoder = MoodEncoder::fit(["tired", "calm", "anxious"]);
        for label in ["tired", "calm", "anxious"] {
            let code = encoder.encode(label).unwrap();
            assert_eq!(encoder.decode(code).unwrap(), label);
        }
        assert!(encoder.decode(3).is_err());
    }

    #[test]
    fn test_separable_classes_predicted_in_sample() {
        let log = log_from(
            "date,sleep_hours,hydration_ml,steps,mood
2024-01-01,4.5,1900,3500,sad
2024-01-02,8,2600,9000,happy
2024-01-03,4.5,1900,3500,sad
2024-01-04,8,2600,9000,happy
2024-01-05,6.5,2300,6000,neutral
2024-01-06,6.5,2300,6000,neutral",
        );

        let model = MoodModel::train(&log).unwrap().unwrap();
        let predicted = model.predict_labels(&log).unwrap();
        let actual: Vec<_> = log.records().iter().map(|r| r.mood.clone()).collect();
        assert_eq!(predicted, actual);
    }

    #[test]
    fn test_single_class_is_constant() {
        let log = log_from(
            "date,sleep_hours,mood
2024-01-01,4,happy
2024-01-02,9,happy",
        );
        let model = MoodModel::train(&log).unwrap().unwrap();
        assert_eq!(model.classifier.n_classes(), 1);
        assert_eq!(model.classifier.predict(&[1.0]).unwrap(), 0);
        assert_eq!(model.encoder.decode(0).unwrap(), "happy");
    }

    #[test]
    fn test_training_is_deterministic() {
        let csv = "date,sleep_hours,steps,mood
2024-01-01,5,4000,sad
2024-01-02,7,7000,neutral
2024-01-03,8,11000,happy
2024-01-04,6,5000,neutral
2024-01-05,5.5,4500,sad";
        let first = MoodModel::train(&log_from(csv)).unwrap().unwrap();
        let second = MoodModel::train(&log_from(csv)).unwrap().unwrap();
        assert_eq!(first.classifier.weights, second.classifier.weights);
        assert_eq!(first.classifier.intercepts, second.classifier.intercepts);
    }

    #[test]
    fn test_missing_mood_skips() {
        let log = log_from("date,sleep_hours\n2024-01-01,7");
        assert!(MoodModel::train(&log).unwrap().is_none());
        assert!(matches!(
            MoodModel::train_strict(&log),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn test_no_features_skips() {
        let log = log_from("date,mood\n2024-01-01,happy\n2024-01-02,sad");
        assert!(MoodModel::train(&log).unwrap().is_none());
    }

    #[test]
    fn test_incomplete_rows_excluded() {
        let log = log_from(
            "date,sleep_hours,mood
2024-01-01,4,sad
2024-01-02,,happy
2024-01-03,9,happy
2024-01-04,8,",
        );
        let model = MoodModel::train(&log).unwrap().unwrap();
        let predicted = model.predict_labels(&log).unwrap();
        assert_eq!(predicted[1], None);
        assert_eq!(predicted[0].as_deref(), Some("sad"));
        assert_eq!(predicted[3].as_deref(), Some("happy"));
    }

    #[test]
    fn test_fit_rejects_bad_targets() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let err = MoodClassifier::fit(vec![Metric::Steps], &x, &[0, 5], 2).unwrap_err();
        assert!(matches!(err, Error::Training(_)));
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let classifier = MoodClassifier::fit(vec![Metric::Steps], &x, &[0, 1], 2).unwrap();

        assert!(classifier.predict(&[1.5]).is_ok());
        assert!(matches!(
            classifier.predict(&[1.0, 2.0]),
            Err(Error::Training(_))
        ));
        assert!(matches!(classifier.predict(&[]), Err(Error::Training(_))));
    }
}
