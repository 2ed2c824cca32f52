use crate::sync::{Diagnostic, ProgressEvent, ProgressSink, SyncError, SyncReport};

/// Terminal frontend: one line per folder and per finished file on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn on_folder_discovered(&self, folder_name: &str) {
        println!("{folder_name}");
    }

    fn on_progress(&self, event: &ProgressEvent) {
        println!("{}", format_progress(event));
    }

    fn on_run_complete(&self, report: &SyncReport) {
        println!("{}", format_summary(report));
    }

    fn on_run_failed(&self, error: &SyncError) {
        println!("sync failed: {error}");
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        println!("  ! {}", format_diagnostic(diagnostic));
    }
}

pub fn format_progress(event: &ProgressEvent) -> String {
    format!(
        "  [{:>3}%] {}/{} {}",
        (event.fraction() * 100.0).round() as u32,
        event.files_completed,
        event.files_total,
        event.current_file_name
    )
}

pub fn format_summary(report: &SyncReport) -> String {
    let mut line = format!(
        "done: {} new folder(s), {} skipped, {} failed; {} file(s) downloaded",
        report.folders_synced, report.folders_skipped, report.folders_failed, report.files_downloaded
    );
    if report.files_failed > 0 {
        line.push_str(&format!(", {} failed", report.files_failed));
    }
    if !report.remove_old_ok {
        line.push_str("; remove-old request failed");
    }
    line
}

pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::FolderCreateFailed {
            folder_name, error, ..
        } => format!("could not create folder {folder_name}: {error}"),
        Diagnostic::FolderFetchFailed {
            folder_name, error, ..
        } => format!("could not list folder {folder_name}: {error}"),
        Diagnostic::FileDownloadFailed {
            folder_name,
            file_name,
            error,
            ..
        } => format!("could not download {folder_name}/{file_name}: {error}"),
        Diagnostic::RemoveOldFailed { error, .. } => format!("remove-old request failed: {error}"),
    }
}
