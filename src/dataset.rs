//! Delimited dataset reader for training and evaluation
//!
//! Each row holds the input text followed by four numeric target scores.
//! Malformed rows are skipped and counted, never fatal; an unreadable file
//! is fatal to the run.

use crate::errors::{BedsideError, BedsideResult};
use crate::model::SCORE_DIMS;
use std::path::Path;
use tracing::warn;

/// One labeled example: raw text plus target scores
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub text: String,
    pub targets: [f32; SCORE_DIMS],
}

/// Read a CSV dataset. Returns the parsed examples and the number of rows
/// skipped as malformed.
pub fn load_dataset(path: &Path) -> BedsideResult<(Vec<TrainingExample>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|_| BedsideError::dataset_not_found(path.display().to_string()))?;

    let mut examples = Vec::new();
    let mut skipped = 0usize;
    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("{}", BedsideError::dataset_row(row, e.to_string()));
                skipped += 1;
                continue;
            }
        };
        match parse_row(row, &record) {
            Ok(example) => examples.push(example),
            Err(e) => {
                warn!("{e}");
                skipped += 1;
            }
        }
    }

    Ok((examples, skipped))
}

fn parse_row(row: usize, record: &csv::StringRecord) -> BedsideResult<TrainingExample> {
    if record.len() != 1 + SCORE_DIMS {
        return Err(BedsideError::dataset_row(
            row,
            format!("expected {} fields, found {}", 1 + SCORE_DIMS, record.len()),
        ));
    }

    let mut targets = [0.0f32; SCORE_DIMS];
    for (k, target) in targets.iter_mut().enumerate() {
        *target = record[k + 1].trim().parse::<f32>().map_err(|e| {
            BedsideError::dataset_row(row, format!("target {}: {e}", k + 1))
        })?;
    }

    Ok(TrainingExample {
        text: record[0].to_string(),
        targets,
    })
}
