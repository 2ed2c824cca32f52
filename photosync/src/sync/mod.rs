pub mod engine;
pub mod planner;
pub mod progress;
#[cfg(test)]
mod recording;

pub use engine::{ManifestError, RunPhase, SyncEngine, SyncError, SyncHandle, SyncReport};
pub use planner::{FolderDisposition, PlannedFolder, plan};
pub use progress::{ChannelSink, Diagnostic, NoopSink, ProgressEvent, ProgressSink, SyncEvent};
