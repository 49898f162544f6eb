//! Startup self-check.
//!
//! This module powers the `edusign check` CLI command. It loads every
//! configured category exactly as the server would, prints what each one
//! expects from clients, and fails if any category cannot be served.
//!
//! ```text
//! $ MODELS_DIR=/srv/models CATEGORIES=letters,words edusign check
//! ```

use anyhow::{Result, bail};
use tracing::error;

use crate::config::ServerConfig;
use crate::core::recognizer::Recognizer;

/// Load every category and report its input shape and label count.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let onnx_config = config.onnx_config();
    let mut failed = Vec::new();

    for category in &config.categories {
        match Recognizer::load(category.clone(), &config.models_dir, &onnx_config).await {
            Ok(recognizer) => {
                let info = recognizer.info();
                let shape = match info.sequence_length {
                    Some(frames) => format!("{frames} x {}", info.input_width),
                    None => info.input_width.to_string(),
                };
                println!(
                    "ok    {:<14} {:<8} input {:<10} model width {:<5} {} labels ({})",
                    info.name, info.mode, shape, info.model_input_width, info.classes, info.backend
                );
            }
            Err(e) => {
                error!("Category '{}' failed to load: {:#}", category.name, e);
                println!("FAIL  {:<14} {:#}", category.name, e);
                failed.push(category.name.clone());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} category(ies) failed to load: {}", failed.len(), failed.join(", "));
    }

    println!("All {} categories loaded", config.categories.len());
    Ok(())
}
