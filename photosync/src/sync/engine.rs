use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use photosync_core::{
    ArchiveClient, DecodeError, FetchError, RemoteFile, decode_file_list, decode_folder_list,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::planner::{FolderDisposition, PlannedFolder, join_name, plan};
use super::progress::{Diagnostic, ProgressEvent, ProgressSink};
use crate::config::{ConfigError, ConfigSource, EndpointConfig};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a sync run is already in progress")]
    AlreadyRunning,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not build http client: {0}")]
    Client(#[source] FetchError),
    #[error("folder discovery failed: {0}")]
    Discovery(#[source] ManifestError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunPhase {
    #[default]
    Idle,
    Discovering,
    Fetching,
    Downloading,
    Finalizing,
    Done,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub folders_discovered: usize,
    pub folders_synced: usize,
    /// Folders whose local path already existed.
    pub folders_skipped: usize,
    /// Folders whose directory could not be created or whose manifest could
    /// not be fetched.
    pub folders_failed: usize,
    pub files_downloaded: usize,
    pub files_failed: usize,
    pub remove_old_ok: bool,
}

#[derive(Debug, Default)]
struct HandleState {
    running: AtomicBool,
    phase: Mutex<RunPhase>,
}

/// Cheap view of the engine for a host UI: whether a run is active and
/// where it is. Holds no run state.
#[derive(Debug, Clone, Default)]
pub struct SyncHandle {
    inner: Arc<HandleState>,
}

impl SyncHandle {
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> RunPhase {
        self.inner
            .phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(RunPhase::Error)
    }

    fn set_phase(&self, phase: RunPhase) {
        if let Ok(mut current) = self.inner.phase.lock() {
            *current = phase;
        }
    }

    fn try_begin(&self) -> Option<RunGuard> {
        self.inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                handle: self.clone(),
            })
    }
}

struct RunGuard {
    handle: SyncHandle,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.handle.inner.running.store(false, Ordering::Release);
    }
}

pub struct SyncEngine {
    config: Box<dyn ConfigSource>,
    handle: SyncHandle,
}

impl SyncEngine {
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self {
            config: Box::new(config),
            handle: SyncHandle::default(),
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Runs one full sync into `dest_root`. Only one run may be active per
    /// engine; a concurrent call returns `AlreadyRunning` and emits nothing.
    pub async fn run(
        &self,
        dest_root: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<SyncReport, SyncError> {
        let Some(_guard) = self.handle.try_begin() else {
            return Err(SyncError::AlreadyRunning);
        };

        match self.run_inner(dest_root, sink).await {
            Ok(report) => {
                self.handle.set_phase(RunPhase::Done);
                info!(
                    synced = report.folders_synced,
                    skipped = report.folders_skipped,
                    failed = report.folders_failed,
                    files = report.files_downloaded,
                    files_failed = report.files_failed,
                    "sync run complete"
                );
                sink.on_run_complete(&report);
                Ok(report)
            }
            Err(err) => {
                self.handle.set_phase(RunPhase::Error);
                error!(error = %err, "sync run failed");
                sink.on_run_failed(&err);
                Err(err)
            }
        }
    }

    async fn run_inner(
        &self,
        dest_root: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<SyncReport, SyncError> {
        self.handle.set_phase(RunPhase::Discovering);
        let config = self.config.load()?;
        let is_dir = tokio::fs::metadata(dest_root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ConfigError::DestinationMissing(dest_root.to_path_buf()).into());
        }
        if config.http.accept_invalid_certs {
            warn!("TLS certificate verification is disabled by configuration");
        }
        let client = ArchiveClient::with_options(&config.http.client_options())
            .map_err(SyncError::Client)?;

        info!(dest = %dest_root.display(), url = %config.urls.folders, "discovering folders");
        let folders = fetch_manifest(&client, &config.urls.folders, decode_folder_list)
            .await
            .map_err(SyncError::Discovery)?;

        let mut report = SyncReport {
            folders_discovered: folders.len(),
            ..SyncReport::default()
        };
        let planned = plan(dest_root, folders).await;

        for folder in &planned {
            match &folder.disposition {
                FolderDisposition::Create => {
                    self.sync_folder(&client, &config.urls, folder, sink, &mut report)
                        .await;
                }
                FolderDisposition::AlreadyExists => report.folders_skipped += 1,
                FolderDisposition::CreateFailed(error) => {
                    report.folders_failed += 1;
                    sink.on_diagnostic(&Diagnostic::FolderCreateFailed {
                        folder_name: folder.folder.name.clone(),
                        path: folder.local_path.clone(),
                        error: error.clone(),
                    });
                }
            }
        }

        self.handle.set_phase(RunPhase::Finalizing);
        report.remove_old_ok = remove_old(&client, &config.urls.remove_old, sink).await;
        Ok(report)
    }

    async fn sync_folder(
        &self,
        client: &ArchiveClient,
        urls: &EndpointConfig,
        planned: &PlannedFolder,
        sink: &dyn ProgressSink,
        report: &mut SyncReport,
    ) {
        let folder_name = planned.folder.name.as_str();
        self.handle.set_phase(RunPhase::Fetching);
        sink.on_folder_discovered(folder_name);

        let url = urls.photos_url_for(&planned.folder.id);
        let files = match fetch_manifest(client, &url, decode_file_list).await {
            Ok(files) => files,
            Err(err) => {
                warn!(folder = folder_name, %url, error = %err, "skipping folder, manifest unavailable");
                report.folders_failed += 1;
                sink.on_diagnostic(&Diagnostic::FolderFetchFailed {
                    folder_name: folder_name.to_string(),
                    url,
                    error: err.to_string(),
                });
                return;
            }
        };

        self.handle.set_phase(RunPhase::Downloading);
        report.folders_synced += 1;
        info!(folder = folder_name, files = files.len(), "downloading folder");

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            if download(client, planned, file, sink).await {
                report.files_downloaded += 1;
            } else {
                report.files_failed += 1;
            }
            sink.on_progress(&ProgressEvent {
                folder_name: folder_name.to_string(),
                current_file_name: file.name.clone(),
                files_completed: index + 1,
                files_total: total,
            });
            sink.pump();
            tokio::task::yield_now().await;
        }
    }
}

async fn fetch_manifest<T>(
    client: &ArchiveClient,
    url: &str,
    decode: fn(&[u8]) -> Result<Vec<T>, DecodeError>,
) -> Result<Vec<T>, ManifestError> {
    let body = client.fetch_text(url).await?;
    Ok(decode(&body)?)
}

// A failed file still counts toward folder progress; the error only goes to
// the log and the sink.
async fn download(
    client: &ArchiveClient,
    planned: &PlannedFolder,
    file: &RemoteFile,
    sink: &dyn ProgressSink,
) -> bool {
    let dest = join_name(&planned.local_path, &file.name);
    match client.fetch_to_file(&file.url, &dest).await {
        Ok(bytes) => {
            debug!(folder = %planned.folder.name, file = %file.name, bytes, "file downloaded");
            true
        }
        Err(err) => {
            warn!(
                folder = %planned.folder.name,
                file = %file.name,
                url = %file.url,
                error = %err,
                "file download failed"
            );
            sink.on_diagnostic(&Diagnostic::FileDownloadFailed {
                folder_name: planned.folder.name.clone(),
                file_name: file.name.clone(),
                url: file.url.clone(),
                error: err.to_string(),
            });
            false
        }
    }
}

// The response body is never interpreted.
async fn remove_old(client: &ArchiveClient, url: &str, sink: &dyn ProgressSink) -> bool {
    match client.fetch_text(url).await {
        Ok(_) => {
            debug!(url, "remove-old request sent");
            true
        }
        Err(err) => {
            warn!(url, error = %err, "remove-old request failed");
            sink.on_diagnostic(&Diagnostic::RemoveOldFailed {
                url: url.to_string(),
                error: err.to_string(),
            });
            false
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
