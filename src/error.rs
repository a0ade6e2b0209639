use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("path {} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    /// The directory does not look like a Path of Diablo install.
    #[error("not a valid POD path, could not find files: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse file list: {0}")]
    Parse(#[from] quick_xml::DeError),

    #[error("file list entry {name:?} points outside the pod directory")]
    UnsafeEntry { name: String },

    #[error("failed to {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid checksum for file {file}, expecting {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("download task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl PatchError {
    pub fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn network(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_owned(),
            source,
        }
    }

    /// Process exit status reported for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            PatchError::MissingRoot { .. } | PatchError::Validation { .. } => 2,
            PatchError::Network { .. } => 3,
            PatchError::Parse(_) | PatchError::UnsafeEntry { .. } => 4,
            PatchError::Filesystem { .. } => 5,
            PatchError::ChecksumMismatch { .. } => 6,
            PatchError::Worker(_) => 1,
        }
    }
}

impl From<walkdir::Error> for PatchError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
        PatchError::Filesystem {
            action: "walk",
            path,
            source,
        }
    }
}

pub type Result<T, E = PatchError> = std::result::Result<T, E>;
