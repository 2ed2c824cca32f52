//! In-memory sink used by the pipeline tests.

use std::sync::Mutex;

use super::engine::{SyncError, SyncReport};
use super::progress::{Diagnostic, ProgressEvent, ProgressSink, SyncEvent};

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
    pumps: Mutex<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn progress_for(&self, folder_name: &str) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::Progress(progress) if progress.folder_name == folder_name => {
                    Some(progress)
                }
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::Diagnostic(diagnostic) => Some(diagnostic),
                _ => None,
            })
            .collect()
    }

    pub fn pump_count(&self) -> usize {
        self.pumps.lock().map(|count| *count).unwrap_or_default()
    }

    fn push(&self, event: SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for RecordingSink {
    fn on_folder_discovered(&self, folder_name: &str) {
        self.push(SyncEvent::FolderDiscovered(folder_name.to_string()));
    }

    fn on_progress(&self, event: &ProgressEvent) {
        self.push(SyncEvent::Progress(event.clone()));
    }

    fn on_run_complete(&self, report: &SyncReport) {
        self.push(SyncEvent::RunComplete(report.clone()));
    }

    fn on_run_failed(&self, error: &SyncError) {
        self.push(SyncEvent::RunFailed(error.to_string()));
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.push(SyncEvent::Diagnostic(diagnostic.clone()));
    }

    fn pump(&self) {
        if let Ok(mut pumps) = self.pumps.lock() {
            *pumps += 1;
        }
    }
}

mod tests {
    use super::*;

    #[test]
    fn recording_sink_counts_pumps() {
        let sink = RecordingSink::new();
        sink.pump();
        sink.pump();
        assert_eq!(sink.pump_count(), 2);
    }
}
