//! Win prediction from a full or partial draft.

pub mod encoder;
pub mod logistic;

use crate::dataset::{load_dataset, MatchRecord};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use encoder::{DraftFeatures, FeatureEncoder, StandardScaler};
use linfa::prelude::*;
use logistic::Classifier;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Bumped whenever the bundle layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 2;

/// Predicted winner. The label follows the dataset's `is_win` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    MainWins,
    EnemyWins,
}

impl Outcome {
    pub fn from_label(label: usize) -> Self {
        if label == 0 {
            Outcome::MainWins
        } else {
            Outcome::EnemyWins
        }
    }

    pub fn label(self) -> u8 {
        match self {
            Outcome::MainWins => 0,
            Outcome::EnemyWins => 1,
        }
    }

    fn of(record: &MatchRecord) -> Self {
        if record.main_won {
            Outcome::MainWins
        } else {
            Outcome::EnemyWins
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::MainWins => write!(f, "Main side wins"),
            Outcome::EnemyWins => write!(f, "Enemy side wins"),
        }
    }
}

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// The persisted model bundle.
    Model,
    /// A model fitted on the fly against the raw dataset.
    OnTheFly,
    /// Neither model nor dataset was usable.
    Fallback,
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionSource::Model => write!(f, "trained model"),
            PredictionSource::OnTheFly => write!(f, "on-the-fly model"),
            PredictionSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub outcome: Outcome,
    pub source: PredictionSource,
}

/// Trained classifier, encoder and scaler, persisted and loaded as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub train_size: usize,
    pub test_accuracy: f64,
    encoder: FeatureEncoder,
    scaler: StandardScaler,
    model: Classifier,
}

struct FittedModel {
    scaler: StandardScaler,
    model: Classifier,
    train_size: usize,
    test_accuracy: f64,
}

/// Scale the encoded rows, split them and fit the classifier on the training part.
fn fit_encoded(records: Array2<f64>, labels: Array1<usize>) -> Result<FittedModel, AppError> {
    let scaler = StandardScaler::fit(&records);
    let (train, test) = logistic::split(scaler.transform(&records), labels);

    let model = logistic::fit(&train)?;
    let test_accuracy = logistic::accuracy(&model, &test);

    Ok(FittedModel {
        scaler,
        model,
        train_size: train.nsamples(),
        test_accuracy,
    })
}

fn labelled_features(matches: &[MatchRecord]) -> (Vec<DraftFeatures>, Array1<usize>) {
    let rows = matches
        .iter()
        .map(|m| DraftFeatures::new(m.draft_slots(), m.main_first))
        .collect();
    let labels = matches.iter().map(|m| usize::from(Outcome::of(m).label())).collect();
    (rows, labels)
}

/// Classify a single encoded draft.
fn classify(model: &Classifier, scaler: &StandardScaler, encoded: Array1<f64>) -> Outcome {
    let sample = scaler.transform(&encoded.insert_axis(Axis(0)));
    let label = model.predict(&sample).get(0).copied().unwrap_or(0);
    Outcome::from_label(label)
}

impl ModelBundle {
    pub fn train(matches: &[MatchRecord]) -> Result<Self, AppError> {
        if matches.is_empty() {
            return Err(AppError::EmptyDataset);
        }

        let (rows, labels) = labelled_features(matches);
        let encoder = FeatureEncoder::fit(&rows);
        let fitted = fit_encoded(encoder.encode_matrix(&rows), labels)?;

        log::info!(
            "Trained win model on {} drafts, held-out accuracy {:.3}",
            fitted.train_size,
            fitted.test_accuracy
        );

        Ok(ModelBundle {
            version: MODEL_FORMAT_VERSION,
            trained_at: Utc::now(),
            train_size: fitted.train_size,
            test_accuracy: fitted.test_accuracy,
            encoder,
            scaler: fitted.scaler,
            model: fitted.model,
        })
    }

    pub fn predict(&self, draft: &DraftFeatures) -> Outcome {
        classify(&self.model, &self.scaler, self.encoder.encode(draft))
    }
}

/// Fit a throwaway model with the requested draft folded into the encoder's
/// category space, then predict it. Cost grows with the whole dataset.
pub fn train_and_predict(matches: &[MatchRecord], draft: &DraftFeatures) -> Result<Outcome, AppError> {
    if matches.is_empty() {
        return Err(AppError::EmptyDataset);
    }

    let (rows, labels) = labelled_features(matches);
    let mut joint = Vec::with_capacity(rows.len() + 1);
    joint.push(draft.clone());
    joint.extend(rows);
    let encoder = FeatureEncoder::fit(&joint);

    let fitted = fit_encoded(encoder.encode_matrix(&joint[1..]), labels)?;
    log::debug!(
        "On-the-fly model: {} training drafts, held-out accuracy {:.3}",
        fitted.train_size,
        fitted.test_accuracy
    );

    Ok(classify(&fitted.model, &fitted.scaler, encoder.encode(draft)))
}

/// Prediction entry point: the persisted bundle when present, otherwise the
/// slow on-the-fly path over the raw dataset.
pub struct WinPredictor<'a> {
    bundle: Option<&'a ModelBundle>,
    dataset_path: &'a Path,
}

impl<'a> WinPredictor<'a> {
    pub fn new(bundle: Option<&'a ModelBundle>, dataset_path: &'a Path) -> Self {
        WinPredictor { bundle, dataset_path }
    }

    pub fn predict(&self, draft: &DraftFeatures) -> Prediction {
        if let Some(bundle) = self.bundle {
            return Prediction {
                outcome: bundle.predict(draft),
                source: PredictionSource::Model,
            };
        }

        log::warn!("No trained model loaded, fitting one on the fly (slow)");
        match load_dataset(self.dataset_path).and_then(|matches| train_and_predict(&matches, draft)) {
            Ok(outcome) => Prediction {
                outcome,
                source: PredictionSource::OnTheFly,
            },
            Err(e) => {
                log::error!("On-the-fly prediction failed: {}", e);
                Prediction {
                    outcome: Outcome::MainWins,
                    source: PredictionSource::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::record;
    use crate::hero::HeroId;
    use std::io::Write;

    /// Main wins whenever it drafts "Strong", loses otherwise.
    fn lopsided_matches() -> Vec<MatchRecord> {
        (0..60)
            .map(|i| {
                let strong = i % 2 == 0;
                let main1 = if strong { "Strong" } else { "Weak" };
                let enemy1 = ["E1", "E2", "E3"][i % 3];
                record([main1, "M2", "", "", ""], [enemy1, "", "", "", ""], false, strong)
            })
            .collect()
    }

    fn draft_with_main1(name: &str) -> DraftFeatures {
        let main1 = HeroId::new(name);
        let e1 = HeroId::new("E1");
        let mut slots = [None; crate::dataset::DRAFT_SLOTS];
        slots[0] = Some(&e1);
        slots[1] = Some(&main1);
        DraftFeatures::new(slots, false)
    }

    #[test]
    fn test_bundle_learns_decisive_hero() {
        let bundle = ModelBundle::train(&lopsided_matches()).unwrap();
        assert_eq!(bundle.version, MODEL_FORMAT_VERSION);
        assert!(bundle.test_accuracy > 0.9);
        assert_eq!(bundle.predict(&draft_with_main1("Strong")), Outcome::MainWins);
        assert_eq!(bundle.predict(&draft_with_main1("Weak")), Outcome::EnemyWins);
    }

    #[test]
    fn test_bundle_predicts_the_same_after_bincode() {
        let bundle = ModelBundle::train(&lopsided_matches()).unwrap();
        let bytes = bincode::serialize(&bundle).unwrap();
        let restored: ModelBundle = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.train_size, bundle.train_size);
        for name in ["Strong", "Weak", "Unseen"] {
            assert_eq!(restored.predict(&draft_with_main1(name)), bundle.predict(&draft_with_main1(name)));
        }
    }

    #[test]
    fn test_one_sided_dataset_fails_to_train() {
        let matches: Vec<MatchRecord> = (0..10)
            .map(|_| record(["Strong", "", "", "", ""], ["E1", "", "", "", ""], false, true))
            .collect();
        assert!(matches!(ModelBundle::train(&matches), Err(AppError::TrainingError(_))));
    }

    #[test]
    fn test_unseen_hero_does_not_fail() {
        let bundle = ModelBundle::train(&lopsided_matches()).unwrap();
        let outcome = bundle.predict(&draft_with_main1("Brand New Hero"));
        assert!(outcome.label() <= 1);
    }

    #[test]
    fn test_on_the_fly_path_reads_dataset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enemy1,main1,enemy2,main2,enemy3,main3,enemy4,main4,enemy5,main5,\
main_pre_b1,enemy_pre_b1,main_pre_b2,enemy_pre_b2,main_post_b,enemy_post_b,is_first,is_win"
        )
        .unwrap();
        for i in 0..40 {
            let (main1, is_win) = if i % 2 == 0 { ("Strong", 0) } else { ("Weak", 1) };
            writeln!(file, "E1,{},,,,,,,,,,,,,,,0,{}", main1, is_win).unwrap();
        }

        let predictor = WinPredictor::new(None, file.path());
        let prediction = predictor.predict(&draft_with_main1("Strong"));
        assert_eq!(prediction.source, PredictionSource::OnTheFly);
        assert_eq!(prediction.outcome, Outcome::MainWins);
    }

    #[test]
    fn test_missing_model_and_dataset_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("drafts_dataset.csv");
        let prediction = WinPredictor::new(None, &missing).predict(&draft_with_main1("Strong"));
        assert_eq!(prediction.source, PredictionSource::Fallback);
        assert_eq!(prediction.outcome.label(), 0);
    }
}
