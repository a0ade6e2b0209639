// How an update run finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    UpToDate,
    Updated {
        downloaded: usize,
        /// Outdated entries without an https link.
        skipped: Vec<String>,
        restart_required: bool,
        /// Updated entries flagged to be announced to the player.
        announced: Vec<String>,
    },
}

impl RunOutcome {
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::UpToDate => "All files are up to date".into(),
            RunOutcome::Updated { downloaded, .. } => {
                format!("Downloaded {downloaded} files successfully")
            }
        }
    }
}
