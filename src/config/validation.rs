use std::collections::HashSet;

use crate::core::preprocess::Normalization;

use super::category::{CategoryConfig, CategoryMode};

/// Validate the configured recognition categories
///
/// Rejects:
/// - an empty category list or duplicate (case-insensitive) names
/// - thresholds and ratios outside `[0, 1]`
/// - zero-sized history, vote, stability or stable windows
/// - `min_consistent` larger than `history_size`
/// - sequence categories without a positive `sequence_length`
/// - frame widths that are not whole `(x, y, z)` points
pub fn validate_categories(categories: &[CategoryConfig]) -> Result<(), Box<dyn std::error::Error>> {
    if categories.is_empty() {
        return Err("At least one recognition category must be configured".into());
    }

    let mut seen = HashSet::new();
    for category in categories {
        validate_category(category)?;
        if !seen.insert(category.name.to_lowercase()) {
            return Err(format!("Duplicate category name: {}", category.name).into());
        }
    }

    Ok(())
}

fn validate_category(category: &CategoryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let name = &category.name;

    if name.trim().is_empty() {
        return Err("Category name cannot be empty".into());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "Category name '{name}' must contain only alphanumeric characters, '-', or '_'"
        )
        .into());
    }

    for (field, value) in [
        ("confidence_threshold", category.confidence_threshold),
        ("min_nonzero_ratio", category.min_nonzero_ratio),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("{name}: {field} must be between 0 and 1, got {value}").into());
        }
    }

    if !category.stability.variance_threshold.is_finite()
        || category.stability.variance_threshold < 0.0
    {
        return Err(format!("{name}: stability.variance_threshold must be non-negative").into());
    }

    for (field, value) in [
        ("history_size", category.history_size),
        ("min_consistent", category.min_consistent),
        ("stability.window_size", category.stability.window_size),
        ("stable_window", category.stable_window as usize),
        ("min_stable_count", category.min_stable_count as usize),
    ] {
        if value == 0 {
            return Err(format!("{name}: {field} must be greater than 0").into());
        }
    }

    if category.min_consistent > category.history_size {
        return Err(format!(
            "{name}: min_consistent ({}) cannot exceed history_size ({})",
            category.min_consistent, category.history_size
        )
        .into());
    }

    if category.min_stable_count > category.stable_window {
        return Err(format!(
            "{name}: min_stable_count ({}) cannot exceed stable_window ({})",
            category.min_stable_count, category.stable_window
        )
        .into());
    }

    if category.mode == CategoryMode::Sequence && category.sequence_length.unwrap_or(0) == 0 {
        return Err(format!("{name}: sequence categories require a sequence_length").into());
    }

    if category.frame_width == 0 || category.frame_width % 3 != 0 {
        return Err(format!(
            "{name}: frame_width must be a positive multiple of 3, got {}",
            category.frame_width
        )
        .into());
    }

    if let Some(width) = category.model_input_width
        && (width == 0 || width % 3 != 0)
    {
        return Err(format!(
            "{name}: model_input_width must be a positive multiple of 3, got {width}"
        )
        .into());
    }

    if category.normalization == Normalization::FeatureStats
        && category.stats_path.is_none()
    {
        return Err(format!("{name}: feature_stats normalization requires a stats_path").into());
    }

    Ok(())
}

/// Validate session lifecycle settings
pub fn validate_sessions(
    idle_timeout_seconds: u64,
    reap_interval_seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if idle_timeout_seconds == 0 {
        return Err("Session idle timeout must be greater than 0".into());
    }
    if reap_interval_seconds == 0 {
        return Err("Session reap interval must be greater than 0".into());
    }
    Ok(())
}
