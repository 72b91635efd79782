//
//  bb-cloud
//  config/file.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration File I/O
//!
//! Low-level helpers for reading and writing the YAML files under the
//! configuration directory. A missing file reads as the type's default.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Reads and parses a YAML file, returning `T::default()` when it does not exist.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or is not valid YAML for `T`.
pub fn read_yaml_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serializes `value` as YAML and writes it, creating parent directories.
pub fn write_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
