use std::path::{Component, Path, PathBuf};

use photosync_core::RemoteFolder;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderDisposition {
    /// The directory did not exist and was created for this run.
    Create,
    /// Something already occupies the path; the folder is skipped whole.
    AlreadyExists,
    /// Creating the directory failed; the folder is skipped.
    CreateFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFolder {
    pub folder: RemoteFolder,
    pub local_path: PathBuf,
    pub disposition: FolderDisposition,
}

impl PlannedFolder {
    pub fn should_sync(&self) -> bool {
        self.disposition == FolderDisposition::Create
    }
}

/// Decides, once and in remote order, which folders get synced. New folders
/// have their directory created here; anything already at the path is left
/// untouched regardless of its contents.
///
/// Folder names are joined onto `dest_root` with [`join_name`]. A name with
/// `..` segments is not rejected.
pub async fn plan(dest_root: &Path, folders: Vec<RemoteFolder>) -> Vec<PlannedFolder> {
    let mut planned = Vec::with_capacity(folders.len());
    for folder in folders {
        let local_path = join_name(dest_root, &folder.name);
        let disposition = decide(&local_path).await;
        match &disposition {
            FolderDisposition::Create => {
                debug!(folder = %folder.name, path = %local_path.display(), "folder created")
            }
            FolderDisposition::AlreadyExists => {
                debug!(folder = %folder.name, path = %local_path.display(), "folder exists, skipping")
            }
            FolderDisposition::CreateFailed(error) => warn!(
                folder = %folder.name,
                path = %local_path.display(),
                %error,
                "could not create folder, skipping"
            ),
        }
        planned.push(PlannedFolder {
            folder,
            local_path,
            disposition,
        });
    }
    planned
}

/// Appends a remote name under `base`. Leading separators and drive prefixes
/// are dropped so an absolute name still lands below `base`; `..` segments are
/// kept verbatim and can climb out of it.
pub fn join_name(base: &Path, name: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => continue,
            Component::ParentDir | Component::Normal(_) => out.push(component),
        }
    }
    out
}

async fn decide(local_path: &Path) -> FolderDisposition {
    if tokio::fs::symlink_metadata(local_path).await.is_ok() {
        return FolderDisposition::AlreadyExists;
    }
    match create_dir(local_path).await {
        Ok(()) => FolderDisposition::Create,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            FolderDisposition::AlreadyExists
        }
        Err(err) => FolderDisposition::CreateFailed(err.to_string()),
    }
}

async fn create_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await
}
