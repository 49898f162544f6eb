//! Per-feature normalization statistics stored as a NumPy `.npz` archive
//! holding `mean` and `std` arrays.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use anyhow::{Context, Result, bail};
use ndarray::{IxDyn, OwnedRepr};
use ndarray_npy::NpzReader;

use crate::core::error::{RecognitionError, RecognitionResult};

const STD_FLOOR: f32 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStats {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl FeatureStats {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        if mean.len() != std.len() {
            bail!(
                "mean has {} entries but std has {}",
                mean.len(),
                std.len()
            );
        }
        if mean.is_empty() {
            bail!("feature stats are empty");
        }
        Ok(Self { mean, std })
    }

    /// Load `mean` and `std` from an `.npz` archive (f32 or f64, any shape).
    pub fn from_npz(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open feature stats {}", path.display()))?;
        let mut npz = NpzReader::new(file)
            .with_context(|| format!("Failed to read npz archive {}", path.display()))?;

        let mean = read_vector(&mut npz, "mean")?;
        let std = read_vector(&mut npz, "std")?;
        Self::new(mean, std)
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Z-score a frame in place: `(x - mean) / max(std, 1e-8)`.
    pub fn apply(&self, frame: &mut [f32]) -> RecognitionResult<()> {
        if frame.len() != self.mean.len() {
            return Err(RecognitionError::InvalidInputShape(format!(
                "feature stats cover {} values, frame has {}",
                self.mean.len(),
                frame.len()
            )));
        }
        for ((value, mean), std) in frame.iter_mut().zip(&self.mean).zip(&self.std) {
            *value = (*value - mean) / std.max(STD_FLOOR);
        }
        Ok(())
    }
}

fn read_vector<R: Read + Seek>(npz: &mut NpzReader<R>, key: &str) -> Result<Vec<f32>> {
    for name in [key.to_string(), format!("{key}.npy")] {
        if let Ok(array) = npz.by_name::<OwnedRepr<f32>, IxDyn>(&name) {
            return Ok(array.iter().copied().collect());
        }
        if let Ok(array) = npz.by_name::<OwnedRepr<f64>, IxDyn>(&name) {
            return Ok(array.iter().map(|v| *v as f32).collect());
        }
    }
    bail!("npz archive has no float array named '{key}'")
}
