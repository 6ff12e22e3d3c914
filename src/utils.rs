// ABOUTME: Utility functions for the rstslide converter
// ABOUTME: Provides path validation and directory helpers

use crate::errors::{Result, SlideError};
use log::debug;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlideError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(SlideError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(SlideError::FileReadError)?;
    } else if !path.is_dir() {
        return Err(SlideError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}

/// Delete a directory with everything in it, then create it again empty
pub fn recreate_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        debug!("Removing previous directory {:?}", path);
        fs::remove_dir_all(path).map_err(SlideError::FileReadError)?;
    } else if path.exists() {
        return Err(SlideError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    fs::create_dir_all(path).map_err(SlideError::FileReadError)
}

/// Copy every file under `source` into `destination`, keeping the layout
pub fn copy_directory(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| SlideError::FileReadError(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| SlideError::ValidationError(e.to_string()))?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            ensure_directory_exists(&target)?;
        } else {
            ensure_parent_directory_exists(&target)?;
            fs::copy(entry.path(), &target).map_err(SlideError::FileReadError)?;
        }
    }
    Ok(())
}
