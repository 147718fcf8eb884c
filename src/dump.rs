//! Serialized command trees and render snapshots
//!
//! Trees cross process boundaries (and live in test fixtures) as JSON, YAML
//! or TOML. Rendered trees are compared against stored snapshots with a
//! unified diff.

use std::path::Path;

use similar::{DiffTag, TextDiff};

use crate::ast::Command;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Json,
    Yaml,
    Toml,
}

pub fn detect_format_from_extension(filename: &str) -> Option<TreeFormat> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".json") {
        Some(TreeFormat::Json)
    } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        Some(TreeFormat::Yaml)
    } else if lower.ends_with(".toml") {
        Some(TreeFormat::Toml)
    } else {
        None
    }
}

pub fn parse_tree(text: &str, format: TreeFormat) -> Result<Command> {
    let tree: Command = match format {
        TreeFormat::Json => serde_json::from_str(text)?,
        TreeFormat::Yaml => serde_yaml::from_str(text)?,
        TreeFormat::Toml => toml::from_str(text)?,
    };
    Ok(tree)
}

pub fn to_json(tree: &Command) -> Result<String> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// Load a tree, picking the format from the file extension.
pub fn load_tree(path: &Path) -> Result<Command> {
    let name = path.display().to_string();
    let format =
        detect_format_from_extension(&name).ok_or_else(|| Error::UnknownFormat(name.clone()))?;
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: name.clone(),
        source,
    })?;
    let tree = parse_tree(&text, format)?;
    log::debug!("loaded {} tree from {}", tree.typ(), name);
    Ok(tree)
}

/// Unified diff of a stored render snapshot against a fresh render, or
/// `None` when they match. Hunks carry three lines of context.
pub fn snapshot_diff(
    expected_name: &str,
    actual_name: &str,
    expected: &str,
    actual: &str,
) -> Option<String> {
    if expected == actual {
        return None;
    }
    let diff = TextDiff::from_lines(expected, actual);
    let drifted = diff.ops().iter().filter(|op| op.tag() != DiffTag::Equal).count();
    log::debug!("{} drifted from {} in {} places", actual_name, expected_name, drifted);
    Some(
        diff.unified_diff()
            .context_radius(3)
            .header(expected_name, actual_name)
            .to_string(),
    )
}
