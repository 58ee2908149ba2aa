//! External source trees.
//!
//! - **Resolution**: pick git submodules or archive download for the batch
//! - **Archives**: download, unpack and mark snapshot archives
//! - **Download**: the HTTP client behind archive fetching

mod archive;
mod download;
mod resolve;

pub use archive::{
    ArchiveFetcher, ExtractedEntry, FetchOutcome, archive_file_name, archive_url,
    extract_archive, is_installed, marker_path, restore_permissions,
};
pub use download::{Download, HttpDownloader};
pub use resolve::{Mode, Resolved, resolve_all};
