//! Locating model artifacts and reading label files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::stabilizer::LabelCase;

/// Resolve an artifact path against the models directory.
///
/// Absolute paths are used as given. The returned path must exist.
pub fn resolve(models_dir: &Path, path: &Path) -> Result<PathBuf> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        models_dir.join(path)
    };

    if !resolved.exists() {
        bail!("Model artifact {:?} does not exist", resolved);
    }

    Ok(resolved)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<serde_json::Value>),
    /// `{"0": "A", "1": "B"}` as written by label encoders.
    Indexed(BTreeMap<String, serde_json::Value>),
}

/// Load class labels in model output order and canonicalize them.
///
/// `.json` files hold either an array or an index-to-label object; any other
/// extension is read as one label per non-empty line.
pub fn load_labels(path: &Path, case: LabelCase) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw = if is_json {
        parse_json_labels(&contents)
            .with_context(|| format!("Failed to parse labels file {}", path.display()))?
    } else {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    };

    if raw.is_empty() {
        bail!("Labels file {} is empty", path.display());
    }

    let labels: Vec<String> = raw.iter().map(|label| case.canonicalize(label)).collect();

    let mut seen = std::collections::HashSet::new();
    for label in &labels {
        if !seen.insert(label) {
            warn!(
                "Label {:?} appears more than once in {}",
                label,
                path.display()
            );
        }
    }

    debug!("Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

fn parse_json_labels(contents: &str) -> Result<Vec<String>> {
    let file: LabelFile = serde_json::from_str(contents)?;
    match file {
        LabelFile::List(values) => Ok(values.into_iter().map(json_label).collect()),
        LabelFile::Indexed(map) => {
            let mut indexed = map
                .into_iter()
                .map(|(key, value)| {
                    key.trim()
                        .parse::<usize>()
                        .map(|index| (index, json_label(value)))
                        .with_context(|| format!("Label index {key:?} is not a number"))
                })
                .collect::<Result<Vec<_>>>()?;
            indexed.sort_by_key(|(index, _)| *index);

            if indexed.iter().enumerate().any(|(pos, (index, _))| pos != *index) {
                bail!("Label indices must be contiguous from 0");
            }
            Ok(indexed.into_iter().map(|(_, label)| label).collect())
        }
    }
}

// Numeric labels (e.g. digits) are kept as their textual form.
fn json_label(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        fs::write(&path, r#"["a", "b", 3]"#).unwrap();

        let labels = load_labels(&path, LabelCase::Upper).unwrap();
        assert_eq!(labels, vec!["A", "B", "3"]);
    }

    #[test]
    fn test_load_json_indexed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        fs::write(&path, r#"{"1": "tuesday", "0": "monday", "10": "x", "2": "a", "3": "b", "4": "c", "5": "d", "6": "e", "7": "f", "8": "g", "9": "h"}"#).unwrap();

        let labels = load_labels(&path, LabelCase::Title).unwrap();
        assert_eq!(labels[0], "Monday");
        assert_eq!(labels[1], "Tuesday");
        assert_eq!(labels[10], "X");
    }

    #[test]
    fn test_load_json_indexed_gap_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        fs::write(&path, r#"{"0": "a", "2": "b"}"#).unwrap();
        assert!(load_labels(&path, LabelCase::AsIs).is_err());
    }

    #[test]
    fn test_load_text_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "red\n\n blue \ngreen\n").unwrap();

        let labels = load_labels(&path, LabelCase::Title).unwrap();
        assert_eq!(labels, vec!["Red", "Blue", "Green"]);
    }

    #[test]
    fn test_empty_labels_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "\n").unwrap();
        assert!(load_labels(&path, LabelCase::AsIs).is_err());
    }

    #[test]
    fn test_resolve_relative_and_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model.onnx"), b"x").unwrap();

        let resolved = resolve(dir.path(), Path::new("model.onnx")).unwrap();
        assert_eq!(resolved, dir.path().join("model.onnx"));
        assert!(resolve(dir.path(), Path::new("missing.onnx")).is_err());
    }
}
