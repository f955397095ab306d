//! Logistic regression classifier on top of `linfa-logistic`.

use crate::error::AppError;
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const MAX_ITER: u64 = 1000;
/// Share of the shuffled dataset kept for training.
pub const TRAIN_RATIO: f32 = 0.7;
pub const SPLIT_SEED: u64 = 42;
/// L2 penalty on the weights.
const ALPHA: f64 = 1.0;

/// Fitted binary classifier. Labels are `0` (main wins) and `1` (enemy wins).
pub type Classifier = FittedLogisticRegression<f64, usize>;

pub type LabelledDataset = Dataset<f64, usize, ndarray::Ix1>;

/// Seeded shuffle followed by a train/test split.
pub fn split(records: Array2<f64>, labels: Array1<usize>) -> (LabelledDataset, LabelledDataset) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    Dataset::new(records, labels)
        .shuffle(&mut rng)
        .split_with_ratio(TRAIN_RATIO)
}

pub fn fit(train: &LabelledDataset) -> Result<Classifier, AppError> {
    if train.nsamples() == 0 {
        return Err(AppError::TrainingError("no training samples".to_string()));
    }
    LogisticRegression::default()
        .alpha(ALPHA)
        .max_iterations(MAX_ITER)
        .fit(train)
        .map_err(|e| AppError::TrainingError(e.to_string()))
}

/// Fraction of `test` the classifier labels correctly; zero for an empty set.
pub fn accuracy(model: &Classifier, test: &LabelledDataset) -> f64 {
    if test.nsamples() == 0 {
        return 0.0;
    }
    let predicted = model.predict(test.records());
    let correct = predicted
        .iter()
        .zip(test.targets().iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / test.nsamples() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let records = Array2::from_shape_fn((40, 2), |(i, col)| {
            if col == 0 {
                i as f64 / 10.0 - 1.95
            } else {
                0.0
            }
        });
        let labels = records.column(0).mapv(|x| usize::from(x > 0.0));
        (records, labels)
    }

    #[test]
    fn test_fits_separable_data() {
        let (records, labels) = separable();
        let (train, test) = split(records, labels);
        let model = fit(&train).unwrap();

        assert!(accuracy(&model, &test) >= 0.9);
        let predicted = model.predict(&array![[1.5, 0.0], [-1.5, 0.0]]);
        assert_eq!(predicted.to_vec(), vec![1, 0]);
    }

    #[test]
    fn test_single_class_is_a_training_error() {
        let records = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let labels = Array1::zeros(10);
        let (train, _) = split(records, labels);
        assert!(matches!(fit(&train), Err(AppError::TrainingError(_))));
    }

    #[test]
    fn test_split_is_seeded() {
        let (records, labels) = separable();
        let (train, test) = split(records.clone(), labels.clone());
        let (train_again, _) = split(records, labels);

        assert_eq!(train.nsamples() + test.nsamples(), 40);
        assert!(train.nsamples() > test.nsamples());
        assert_eq!(train.records(), train_again.records());
    }

    #[test]
    fn test_empty_test_set_scores_zero() {
        let (records, labels) = separable();
        let (train, _) = split(records, labels);
        let model = fit(&train).unwrap();
        let empty = Dataset::new(Array2::<f64>::zeros((0, 2)), Array1::<usize>::zeros(0));
        assert_eq!(accuracy(&model, &empty), 0.0);
    }
}
