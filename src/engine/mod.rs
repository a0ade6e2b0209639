use std::path::PathBuf;

use log::{debug, info, warn};
use tokio::task::JoinSet;

use crate::checksum::crc32_file;
use crate::engine::models::{FileRecord, Manifest};
use crate::engine::state::RunOutcome;
use crate::env::{MARKER_FILES, PatchContext};
use crate::error::{PatchError, Result};
use crate::networking::NetworkClient;
use crate::progress::Progress;
use crate::storage::{self, StorageManager};

pub mod models;
pub mod state;

/// An outdated file paired with the link it will be fetched from.
#[derive(Clone, Debug)]
pub struct UpdateJob {
    pub record: FileRecord,
    pub relative: PathBuf,
    pub url: String,
}

/// Select the manifest entries whose installed copy should be replaced.
///
/// Entries without a local file are never picked; this tool only refreshes
/// files that are already installed.
pub fn plan_updates(ctx: &PatchContext, manifest: &Manifest) -> Result<Vec<FileRecord>> {
    let mut outdated = Vec::new();
    for record in &manifest.files {
        let relative = record.relative_path()?;
        let local = ctx.destination(&relative);
        match std::fs::metadata(&local) {
            Ok(meta) if meta.is_file() => {}
            _ => {
                debug!("plan: {} not installed, skipping", record.name);
                continue;
            }
        }

        let local_crc = crc32_file(&local)?;
        if ctx.force || (!record.crc.is_empty() && local_crc != record.crc) {
            debug!(
                "plan: {} outdated (local {}, expected {:?})",
                record.name, local_crc, record.crc
            );
            outdated.push(record.clone());
        }
    }
    Ok(outdated)
}

/// Pair each outdated entry with its first link starting with `scheme`.
///
/// Entries without one are returned by name and never downloaded.
pub fn schedule(
    outdated: Vec<FileRecord>,
    scheme: &str,
) -> Result<(Vec<UpdateJob>, Vec<String>)> {
    let mut jobs = Vec::with_capacity(outdated.len());
    let mut skipped = Vec::new();
    for record in outdated {
        let Some(url) = record.link_with_scheme(scheme).map(str::to_owned) else {
            warn!(
                "plan: {} has no {} link, not updating it",
                record.name, scheme
            );
            skipped.push(record.name);
            continue;
        };
        let relative = record.relative_path()?;
        jobs.push(UpdateJob {
            record,
            relative,
            url,
        });
    }
    Ok((jobs, skipped))
}

pub struct PatchEngine {
    ctx: PatchContext,
    networking: NetworkClient,
    storage: StorageManager,
}

impl PatchEngine {
    pub fn new(ctx: PatchContext) -> Self {
        let storage = StorageManager::new(&ctx);
        Self {
            ctx,
            networking: NetworkClient::new(),
            storage,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        storage::validate_install_dir(&self.ctx.root, &MARKER_FILES)?;

        let manifest = self.fetch_manifest().await?;
        info!("manifest: {} entries", manifest.files.len());

        let outdated = plan_updates(&self.ctx, &manifest)?;
        if outdated.is_empty() {
            info!("plan: nothing to update");
            return Ok(RunOutcome::UpToDate);
        }

        let (jobs, skipped) = schedule(outdated, &self.ctx.link_scheme)?;
        let restart_required = jobs.iter().any(|job| job.record.restart_required());
        let announced: Vec<String> = jobs
            .iter()
            .filter(|job| job.record.shows_dialog())
            .map(|job| job.record.name.clone())
            .collect();

        self.storage.prepare_temp_dir().await?;
        debug!(
            "storage: staging downloads in {}",
            self.storage.temp_dir().display()
        );
        println!("Will download {} outdated files", jobs.len());

        let progress = Progress::new(jobs.len());
        let downloaded = self.apply_updates(jobs, &progress).await?;
        debug!("progress: {} downloads finished", progress.completed());

        self.storage.remove_temp_dir().await?;
        progress.finish();

        Ok(RunOutcome::Updated {
            downloaded,
            skipped,
            restart_required,
            announced,
        })
    }

    pub async fn fetch_manifest(&self) -> Result<Manifest> {
        info!("manifest: fetching {}", self.ctx.manifest_url);
        let text = self.networking.fetch_text(&self.ctx.manifest_url).await?;
        Manifest::parse(&text)
    }

    /// Download and install every job concurrently, one task per file.
    ///
    /// Returns on the first failure; the remaining tasks are aborted when
    /// the set is dropped. Files already replaced stay replaced.
    pub async fn apply_updates(&self, jobs: Vec<UpdateJob>, progress: &Progress) -> Result<usize> {
        let mut tasks = JoinSet::new();
        for job in jobs {
            let client = self.networking.clone();
            let ctx = self.ctx.clone();
            tasks.spawn(async move { download_and_replace(&client, &ctx, job).await });
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            let name = joined??;
            progress.complete_one(&name);
            completed += 1;
        }
        Ok(completed)
    }
}

async fn download_and_replace(
    client: &NetworkClient,
    ctx: &PatchContext,
    job: UpdateJob,
) -> Result<String> {
    let staged = ctx.staging_path(&job.relative);
    let dest = ctx.destination(&job.relative);

    debug!("worker: fetching {} from {}", job.record.name, job.url);
    let downloaded = client.download_to_path(&job.url, &staged).await?;

    if !job.record.crc.is_empty() && downloaded.checksum != job.record.crc {
        return Err(PatchError::ChecksumMismatch {
            file: job.record.name,
            expected: job.record.crc,
            actual: downloaded.checksum,
        });
    }

    storage::replace_file(&staged, &dest).await?;
    info!(
        "worker: updated {} ({} bytes)",
        job.record.name, downloaded.bytes
    );
    Ok(job.record.name)
}
