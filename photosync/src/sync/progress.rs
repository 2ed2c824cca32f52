use std::path::PathBuf;

use tokio::sync::mpsc;

use super::engine::{SyncError, SyncReport};

/// Emitted after each file of a folder finishes, whether or not the
/// download succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub folder_name: String,
    pub current_file_name: String,
    pub files_completed: usize,
    pub files_total: usize,
}

impl ProgressEvent {
    /// Completed share of the folder, clamped to (0, 1].
    pub fn fraction(&self) -> f64 {
        if self.files_total == 0 {
            return 1.0;
        }
        let raw = self.files_completed as f64 / self.files_total as f64;
        raw.clamp(f64::MIN_POSITIVE, 1.0)
    }
}

/// Errors the pipeline recovers from. They never stop a run but are always
/// reported so a dropped file is distinguishable from a downloaded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    FolderCreateFailed {
        folder_name: String,
        path: PathBuf,
        error: String,
    },
    FolderFetchFailed {
        folder_name: String,
        url: String,
        error: String,
    },
    FileDownloadFailed {
        folder_name: String,
        file_name: String,
        url: String,
        error: String,
    },
    RemoveOldFailed {
        url: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    FolderDiscovered(String),
    Progress(ProgressEvent),
    Diagnostic(Diagnostic),
    RunComplete(SyncReport),
    RunFailed(String),
}

/// Receiver of pipeline events, implemented by the host (a UI, a log, a
/// channel to another task).
pub trait ProgressSink: Send + Sync {
    /// Called once per folder that is about to be synced, before any of its
    /// files are fetched.
    fn on_folder_discovered(&self, folder_name: &str);

    fn on_progress(&self, event: &ProgressEvent);

    fn on_run_complete(&self, report: &SyncReport);

    fn on_run_failed(&self, error: &SyncError);

    fn on_diagnostic(&self, _diagnostic: &Diagnostic) {}

    /// Yield point invoked after every progress event. Hosts that drive the
    /// pipeline from their own event loop drain pending work here.
    fn pump(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_folder_discovered(&self, _folder_name: &str) {}

    fn on_progress(&self, _event: &ProgressEvent) {}

    fn on_run_complete(&self, _report: &SyncReport) {}

    fn on_run_failed(&self, _error: &SyncError) {}
}

/// Forwards every event to a channel, for hosts that run the pipeline on a
/// worker task and render progress elsewhere. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressSink for ChannelSink {
    fn on_folder_discovered(&self, folder_name: &str) {
        self.send(SyncEvent::FolderDiscovered(folder_name.to_string()));
    }

    fn on_progress(&self, event: &ProgressEvent) {
        self.send(SyncEvent::Progress(event.clone()));
    }

    fn on_run_complete(&self, report: &SyncReport) {
        self.send(SyncEvent::RunComplete(report.clone()));
    }

    fn on_run_failed(&self, error: &SyncError) {
        self.send(SyncEvent::RunFailed(error.to_string()));
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.send(SyncEvent::Diagnostic(diagnostic.clone()));
    }
}
