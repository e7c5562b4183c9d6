//! Linear scoring model: forward pass, SGD training, binary persistence
//!
//! One weight row plus a scalar bias per output dimension. The model is
//! mutated only by `fit`; after startup it is shared immutably, so forward
//! passes from concurrent requests need no locking.

use crate::config_loader::TrainingConfig;
use crate::errors::{BedsideError, BedsideResult};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

/// Input width N shared between training and inference
pub const FEATURE_LEN: usize = 512;
/// Output dimensions K: negativity, judgment, anxiety/stress, empathy/rapport
pub const SCORE_DIMS: usize = 4;

const MODEL_MAGIC: &[u8; 4] = b"BSDL";
const MODEL_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

/// One tokenized training example: features plus target scores
#[derive(Debug, Clone)]
pub struct FitExample {
    pub features: Vec<f32>,
    pub targets: [f32; SCORE_DIMS],
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
}

impl LinearModel {
    /// All-zero parameters. Forward passes score 0.0 on every dimension.
    pub fn zeroed() -> Self {
        Self {
            weights: vec![vec![0.0; FEATURE_LEN]; SCORE_DIMS],
            biases: vec![0.0; SCORE_DIMS],
        }
    }

    /// Small random parameters from a seeded generator, so
    /// training-from-scratch is reproducible run to run.
    pub fn random(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = (0..SCORE_DIMS)
            .map(|_| (0..FEATURE_LEN).map(|_| rng.random_range(-0.05..0.05)).collect())
            .collect();
        let biases = (0..SCORE_DIMS).map(|_| rng.random_range(-0.05..0.05)).collect();
        Self { weights, biases }
    }

    /// One forward pass: per dimension, dot product of the weight row with
    /// the input plus bias. Pure, O(K*N).
    pub fn forward(&self, features: &[f32]) -> BedsideResult<[f32; SCORE_DIMS]> {
        if features.len() != FEATURE_LEN {
            return Err(BedsideError::shape_mismatch(FEATURE_LEN, features.len()));
        }

        let mut raw = [0.0f32; SCORE_DIMS];
        for (k, row) in self.weights.iter().enumerate() {
            let dot: f32 = row.iter().zip(features).map(|(w, x)| w * x).sum();
            raw[k] = dot + self.biases[k];
        }
        Ok(raw)
    }

    /// Train with per-example gradient descent on squared error.
    ///
    /// Examples are visited in file order unless `cfg.shuffle` is set, in
    /// which case the order is drawn per epoch from a generator seeded with
    /// `cfg.seed`. Returns the mean squared error of each epoch.
    pub fn fit(&mut self, examples: &[FitExample], cfg: &TrainingConfig) -> BedsideResult<Vec<f32>> {
        for ex in examples {
            if ex.features.len() != FEATURE_LEN {
                return Err(BedsideError::shape_mismatch(FEATURE_LEN, ex.features.len()));
            }
        }

        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut epoch_losses = Vec::with_capacity(cfg.epochs);

        for epoch in 1..=cfg.epochs {
            if cfg.shuffle {
                order.shuffle(&mut rng);
            }

            let mut squared_sum = 0.0f64;
            let mut terms = 0usize;
            for &i in &order {
                let ex = &examples[i];
                let raw = self.forward(&ex.features)?;
                for k in 0..SCORE_DIMS {
                    let err = raw[k] - ex.targets[k];
                    squared_sum += f64::from(err * err);
                    terms += 1;

                    for (w, &x) in self.weights[k].iter_mut().zip(&ex.features) {
                        *w -= cfg.learning_rate * err * x;
                    }
                    self.biases[k] -= cfg.learning_rate * err;
                }
            }

            let mse = if terms == 0 {
                0.0
            } else {
                (squared_sum / terms as f64) as f32
            };
            info!("epoch {}/{}: mse {:.6}", epoch, cfg.epochs, mse);
            epoch_losses.push(mse);
        }

        Ok(epoch_losses)
    }

    /// Persist as little-endian binary: magic, format version, N, K, then
    /// the KxN weight matrix row-major and K biases, one f32 each.
    pub fn save(&self, path: &Path) -> BedsideResult<()> {
        let mut buf = Vec::with_capacity(HEADER_LEN + (SCORE_DIMS * FEATURE_LEN + SCORE_DIMS) * 4);
        buf.extend_from_slice(MODEL_MAGIC);
        buf.extend_from_slice(&MODEL_VERSION.to_le_bytes());
        buf.extend_from_slice(&(FEATURE_LEN as u32).to_le_bytes());
        buf.extend_from_slice(&(SCORE_DIMS as u32).to_le_bytes());
        for row in &self.weights {
            for w in row {
                buf.extend_from_slice(&w.to_le_bytes());
            }
        }
        for b in &self.biases {
            buf.extend_from_slice(&b.to_le_bytes());
        }

        fs::write(path, &buf)
            .map_err(|e| BedsideError::io(format!("write model {}", path.display()), e))
    }

    /// Load a model persisted by `save`.
    ///
    /// Bad magic, an unsupported version, or a byte count that disagrees
    /// with the declared shape is `CorruptModel`; a declared shape that
    /// disagrees with the compiled-in N/K is `ShapeMismatch` — a model
    /// trained at another shape is rejected, never silently misread.
    pub fn load(path: &Path) -> BedsideResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| BedsideError::io(format!("read model {}", path.display()), e))?;
        let display = path.display().to_string();

        if bytes.len() < HEADER_LEN {
            return Err(BedsideError::corrupt_model(display, "shorter than header"));
        }
        if &bytes[0..4] != MODEL_MAGIC {
            return Err(BedsideError::corrupt_model(display, "bad magic"));
        }
        let version = le_u32(&bytes[4..8]);
        if version != MODEL_VERSION {
            return Err(BedsideError::corrupt_model(
                display,
                format!("unsupported format version {version}"),
            ));
        }

        let n = le_u32(&bytes[8..12]) as usize;
        let k = le_u32(&bytes[12..16]) as usize;
        if n != FEATURE_LEN {
            return Err(BedsideError::shape_mismatch(FEATURE_LEN, n));
        }
        if k != SCORE_DIMS {
            return Err(BedsideError::shape_mismatch(SCORE_DIMS, k));
        }

        let expected_len = HEADER_LEN + (k * n + k) * 4;
        if bytes.len() != expected_len {
            return Err(BedsideError::corrupt_model(
                display,
                format!("expected {expected_len} bytes, found {}", bytes.len()),
            ));
        }

        let mut offset = HEADER_LEN;
        let mut weights = Vec::with_capacity(k);
        for _ in 0..k {
            let mut row = Vec::with_capacity(n);
            for _ in 0..n {
                row.push(le_f32(&bytes[offset..offset + 4]));
                offset += 4;
            }
            weights.push(row);
        }
        let mut biases = Vec::with_capacity(k);
        for _ in 0..k {
            biases.push(le_f32(&bytes[offset..offset + 4]));
            offset += 4;
        }

        Ok(Self { weights, biases })
    }

    /// Write the JSON sidecar manifest next to a saved model file:
    /// SHA-256 of the bytes, shape, and a UTC timestamp.
    pub fn write_manifest(&self, model_path: &Path) -> BedsideResult<()> {
        let data = fs::read(model_path)
            .map_err(|e| BedsideError::io(format!("read model {}", model_path.display()), e))?;
        let mut hasher = Sha256::new();
        hasher.update(&data);

        let manifest = ModelManifest {
            model_file: model_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            sha256: format!("{:x}", hasher.finalize()),
            format_version: MODEL_VERSION,
            feature_len: FEATURE_LEN,
            score_dims: SCORE_DIMS,
            created_at: Utc::now(),
        };

        let manifest_path = model_path.with_extension("manifest.json");
        let manifest_json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| BedsideError::serialization("model manifest", e))?;
        fs::write(&manifest_path, manifest_json)
            .map_err(|e| BedsideError::io(format!("write manifest {}", manifest_path.display()), e))
    }
}

/// Deployment-tracking sidecar written next to the model file
#[derive(Serialize, Debug)]
pub struct ModelManifest {
    pub model_file: String,
    pub sha256: String,
    pub format_version: u32,
    pub feature_len: usize,
    pub score_dims: usize,
    pub created_at: DateTime<Utc>,
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn le_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_vec(hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; FEATURE_LEN];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn zero_model_scores_zero() {
        let model = LinearModel::zeroed();
        let raw = model.forward(&vec![0.3; FEATURE_LEN]).unwrap();
        assert_eq!(raw, [0.0; SCORE_DIMS]);
    }

    #[test]
    fn forward_is_linear() {
        let model = LinearModel::random(7);
        let v1 = unit_vec(3);
        let v2 = unit_vec(200);
        let (a, b) = (2.5f32, -1.5f32);

        let combined: Vec<f32> = v1.iter().zip(&v2).map(|(x, y)| a * x + b * y).collect();
        let lhs = model.forward(&combined).unwrap();
        let r1 = model.forward(&v1).unwrap();
        let r2 = model.forward(&v2).unwrap();
        let bias = model.forward(&vec![0.0; FEATURE_LEN]).unwrap();

        for k in 0..SCORE_DIMS {
            // forward includes the bias term, so linearity holds on the
            // bias-subtracted outputs
            let rhs = a * (r1[k] - bias[k]) + b * (r2[k] - bias[k]) + bias[k];
            assert!((lhs[k] - rhs).abs() < 1e-4, "dim {k}: {} vs {rhs}", lhs[k]);
        }
    }

    #[test]
    fn forward_rejects_wrong_length() {
        let model = LinearModel::zeroed();
        let err = model.forward(&vec![0.0; FEATURE_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            BedsideError::ShapeMismatch { expected: FEATURE_LEN, actual } if actual == FEATURE_LEN - 1
        ));
    }

    #[test]
    fn save_load_round_trips_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = LinearModel::random(99);
        model.save(&path).unwrap();
        let loaded = LinearModel::load(&path).unwrap();
        assert_eq!(model, loaded);
    }

    #[test]
    fn load_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = LinearModel::zeroed();
        model.save(&path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 5);
        std::fs::write(&path, &bytes).unwrap();

        let err = LinearModel::load(&path).unwrap_err();
        assert!(matches!(err, BedsideError::CorruptModel { .. }));
    }

    #[test]
    fn load_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = LinearModel::zeroed();
        model.save(&path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[0] = b'X';
        std::fs::write(&path, &bytes).unwrap();

        let err = LinearModel::load(&path).unwrap_err();
        assert!(matches!(err, BedsideError::CorruptModel { .. }));
    }

    #[test]
    fn load_rejects_foreign_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = LinearModel::zeroed();
        model.save(&path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        // rewrite the declared N to 256
        bytes[8..12].copy_from_slice(&256u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = LinearModel::load(&path).unwrap_err();
        assert!(matches!(
            err,
            BedsideError::ShapeMismatch { expected: FEATURE_LEN, actual: 256 }
        ));
    }

    #[test]
    fn fit_is_deterministic_under_a_fixed_seed() {
        let cfg = TrainingConfig {
            epochs: 5,
            learning_rate: 0.05,
            shuffle: true,
            seed: 1234,
        };
        let examples: Vec<FitExample> = (0..10)
            .map(|i| FitExample {
                features: unit_vec(i * 13),
                targets: [i as f32 * 0.1, 0.5, 1.0, 2.0],
            })
            .collect();

        let mut a = LinearModel::random(5);
        let mut b = LinearModel::random(5);
        a.fit(&examples, &cfg).unwrap();
        b.fit(&examples, &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fit_rejects_misshapen_examples() {
        let cfg = TrainingConfig::default();
        let examples = vec![FitExample {
            features: vec![0.0; 3],
            targets: [0.0; SCORE_DIMS],
        }];
        let err = LinearModel::zeroed().fit(&examples, &cfg).unwrap_err();
        assert!(matches!(err, BedsideError::ShapeMismatch { .. }));
    }

    #[test]
    fn manifest_records_shape_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = LinearModel::random(3);
        model.save(&path).unwrap();
        model.write_manifest(&path).unwrap();

        let manifest: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("model.manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["feature_len"], FEATURE_LEN);
        assert_eq!(manifest["score_dims"], SCORE_DIMS);
        assert_eq!(manifest["sha256"].as_str().unwrap().len(), 64);
    }
}
