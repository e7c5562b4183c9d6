//! Training and evaluation driver
//!
//! Bridges the dataset reader, the tokenizer, and the model: tokenizes each
//! labeled row, drives `fit`, and reports aggregate error on held-out data.

use crate::config_loader::TrainingConfig;
use crate::dataset::{load_dataset, TrainingExample};
use crate::errors::BedsideResult;
use crate::model::{FitExample, LinearModel, FEATURE_LEN, SCORE_DIMS};
use crate::tokenizer::tokenize;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Aggregate per-dimension error on a held-out dataset
#[derive(Debug, Serialize)]
pub struct EvalReport {
    pub rows: usize,
    pub skipped: usize,
    /// Mean absolute error per output dimension
    pub mae: [f32; SCORE_DIMS],
    /// Mean squared error per output dimension
    pub mse: [f32; SCORE_DIMS],
}

fn to_fit_examples(examples: &[TrainingExample]) -> Vec<FitExample> {
    examples
        .iter()
        .map(|ex| FitExample {
            features: tokenize(&ex.text, FEATURE_LEN),
            targets: ex.targets,
        })
        .collect()
}

/// Train a model from scratch on the dataset at `data_path`.
pub fn train(data_path: &Path, cfg: &TrainingConfig) -> BedsideResult<LinearModel> {
    let (examples, skipped) = load_dataset(data_path)?;
    if skipped > 0 {
        warn!("skipped {skipped} malformed rows in {}", data_path.display());
    }
    info!(
        "training on {} examples from {} ({} epochs, lr {})",
        examples.len(),
        data_path.display(),
        cfg.epochs,
        cfg.learning_rate
    );

    let fit_examples = to_fit_examples(&examples);
    let mut model = LinearModel::random(cfg.seed);
    model.fit(&fit_examples, cfg)?;
    Ok(model)
}

/// Run the model over a held-out dataset and aggregate per-dimension error.
/// Read-only with respect to the model.
pub fn evaluate(model: &LinearModel, data_path: &Path) -> BedsideResult<EvalReport> {
    let (examples, skipped) = load_dataset(data_path)?;
    if skipped > 0 {
        warn!("skipped {skipped} malformed rows in {}", data_path.display());
    }

    let mut abs_sum = [0.0f64; SCORE_DIMS];
    let mut sq_sum = [0.0f64; SCORE_DIMS];
    for ex in &examples {
        let features = tokenize(&ex.text, FEATURE_LEN);
        let raw = model.forward(&features)?;
        for k in 0..SCORE_DIMS {
            let err = f64::from(raw[k] - ex.targets[k]);
            abs_sum[k] += err.abs();
            sq_sum[k] += err * err;
        }
    }

    let rows = examples.len();
    let mut mae = [0.0f32; SCORE_DIMS];
    let mut mse = [0.0f32; SCORE_DIMS];
    if rows > 0 {
        for k in 0..SCORE_DIMS {
            mae[k] = (abs_sum[k] / rows as f64) as f32;
            mse[k] = (sq_sum[k] / rows as f64) as f32;
        }
    }

    Ok(EvalReport {
        rows,
        skipped,
        mae,
        mse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BedsideError;
    use std::io::Write;

    /// Small synthetic corpus whose targets are a fixed linear function of
    /// the tokenized features, so squared error is reducible to near zero.
    fn synthetic_dataset(dir: &Path) -> std::path::PathBuf {
        let oracle = LinearModel::random(2024);
        let phrases = [
            "your recovery is on track",
            "the biopsy came back and we should discuss it",
            "there is nothing to worry about",
            "i am concerned about these numbers",
            "you are doing everything right",
            "this will require urgent surgery",
            "the medication is working well",
            "we found something unexpected on the scan",
        ];

        let path = dir.join("synthetic.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        for phrase in phrases {
            let features = tokenize(phrase, FEATURE_LEN);
            let targets = oracle.forward(&features).unwrap();
            writeln!(
                f,
                "{phrase},{},{},{},{}",
                targets[0], targets[1], targets[2], targets[3]
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn training_error_decreases_monotonically() {
        let dir = tempfile::tempdir().unwrap();
        let path = synthetic_dataset(dir.path());

        let cfg = TrainingConfig {
            epochs: 15,
            learning_rate: 0.01,
            shuffle: false,
            seed: 7,
        };
        let (examples, _) = load_dataset(&path).unwrap();
        let mut model = LinearModel::random(cfg.seed);
        let losses = model.fit(&to_fit_examples(&examples), &cfg).unwrap();

        assert_eq!(losses.len(), cfg.epochs);
        for pair in losses.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-6,
                "loss went up: {} -> {}",
                pair[0],
                pair[1]
            );
        }
        assert!(losses[losses.len() - 1] < losses[0]);
    }

    #[test]
    fn evaluate_reports_near_zero_error_for_the_generating_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = synthetic_dataset(dir.path());

        let oracle = LinearModel::random(2024);
        let report = evaluate(&oracle, &path).unwrap();
        assert_eq!(report.rows, 8);
        assert_eq!(report.skipped, 0);
        for k in 0..SCORE_DIMS {
            assert!(report.mae[k] < 1e-3, "dim {k} mae {}", report.mae[k]);
        }
    }

    #[test]
    fn evaluate_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = synthetic_dataset(dir.path());

        let model = LinearModel::random(11);
        let before = model.clone();
        evaluate(&model, &path).unwrap();
        assert_eq!(model, before);
    }

    #[test]
    fn train_fails_fast_on_missing_dataset() {
        let err = train(Path::new("/no/such/file.csv"), &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, BedsideError::DatasetNotFound { .. }));
    }

    #[test]
    fn empty_dataset_evaluates_to_zero_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::File::create(&path).unwrap();

        let report = evaluate(&LinearModel::zeroed(), &path).unwrap();
        assert_eq!(report.rows, 0);
        assert_eq!(report.mae, [0.0; SCORE_DIMS]);
    }
}
