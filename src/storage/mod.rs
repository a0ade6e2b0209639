use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::fs;
use walkdir::WalkDir;

use crate::env::PatchContext;
use crate::error::{PatchError, Result};

/// Check that every marker file exists somewhere under `root`.
///
/// The walk stops as soon as all markers have been seen. On failure the
/// error lists the missing markers in the order they were given.
pub fn validate_install_dir(root: &Path, markers: &[&str]) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(PatchError::MissingRoot {
                path: root.to_path_buf(),
            });
        }
        Err(err) => return Err(PatchError::fs("stat", root, err)),
    }

    let mut found: HashSet<&str> = HashSet::with_capacity(markers.len());
    if !markers.is_empty() {
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(marker) = markers.iter().find(|m| **m == name) {
                debug!("validate: found {} at {}", marker, entry.path().display());
                found.insert(*marker);
                if found.len() == markers.len() {
                    break;
                }
            }
        }
    }

    let missing: Vec<String> = markers
        .iter()
        .filter(|m| !found.contains(*m))
        .map(|m| (*m).to_owned())
        .collect();
    if missing.is_empty() {
        info!("validate: {} looks like a pod directory", root.display());
        Ok(())
    } else {
        Err(PatchError::Validation { missing })
    }
}

/// Filesystem operations on the pod directory and its staging folder.
#[derive(Clone, Debug)]
pub struct StorageManager {
    temp_dir: PathBuf,
}

impl StorageManager {
    pub fn new(ctx: &PatchContext) -> Self {
        Self {
            temp_dir: ctx.temp_dir(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub async fn prepare_temp_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| PatchError::fs("create temp directory", &self.temp_dir, e))
    }

    pub async fn remove_temp_dir(&self) -> Result<()> {
        if fs::metadata(&self.temp_dir).await.is_ok() {
            fs::remove_dir_all(&self.temp_dir)
                .await
                .map_err(|e| PatchError::fs("remove temp directory", &self.temp_dir, e))?;
        }
        Ok(())
    }
}

/// Move a verified download over the installed file.
pub async fn replace_file(staged: &Path, dest: &Path) -> Result<()> {
    if fs::metadata(dest).await.is_ok() {
        fs::remove_file(dest)
            .await
            .map_err(|e| PatchError::fs("delete", dest, e))?;
    }
    fs::rename(staged, dest)
        .await
        .map_err(|e| PatchError::fs("move download into", dest, e))
}
