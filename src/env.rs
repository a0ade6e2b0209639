use std::path::{Path, PathBuf};

/// Remote file list published by the PoD launcher project.
pub const MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/GreenDude120/PoD-Launcher/master/files.xml";

/// Files that must exist somewhere under a pod directory.
pub const MARKER_FILES: [&str; 3] = ["Path of Diablo Launcher.exe", "Diablo II.exe", "Game.exe"];

/// Prefix of download links fetched over an encrypted connection.
pub const SECURE_SCHEME: &str = "https://";

/// Staging folder for downloads, relative to the pod directory.
pub const TEMP_DIR_NAME: &str = "temp";

/// Per-run settings shared by every stage of an update.
#[derive(Clone, Debug)]
pub struct PatchContext {
    pub root: PathBuf,
    pub manifest_url: String,
    pub force: bool,
    /// Download links must start with this prefix to be used.
    pub link_scheme: String,
}

impl PatchContext {
    pub fn new(root: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            root: root.into(),
            manifest_url: MANIFEST_URL.to_owned(),
            force,
            link_scheme: SECURE_SCHEME.to_owned(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    /// Accept download links with another prefix, e.g. a plain-http test server.
    #[cfg(test)]
    #[must_use]
    pub fn with_link_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.link_scheme = scheme.into();
        self
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR_NAME)
    }

    /// Final location of a manifest entry inside the pod directory.
    pub fn destination(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn staging_path(&self, relative: &Path) -> PathBuf {
        self.temp_dir().join(relative)
    }
}
