mod client;
mod manifest;

pub use client::{ArchiveClient, ClientOptions, DEFAULT_USER_AGENT, FetchError};
pub use manifest::{
    DecodeError, RemoteFile, RemoteFolder, decode_file_list, decode_folder_list,
};
