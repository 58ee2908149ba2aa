//! Snapshot archives for source trees that are not git checkouts.
//!
//! A dependency fetched this way gets a zero-byte marker named after its
//! pinned revision. The marker is written last, so its presence means every
//! earlier step finished.

use super::download::Download;
use crate::config::{Dependency, EXTERNALS_DIR};
use crate::error::BootstrapError;
use anyhow::{Context, Result};
use colored::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Result of [`ArchiveFetcher::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyInstalled,
    Installed,
}

/// `<url>/archive/<rev>.zip`, after dropping a trailing `/` or `.git`.
pub fn archive_url(repository_url: &str, rev: &str) -> String {
    let base = repository_url.trim_end_matches('/');
    let base = base.strip_suffix(".git").unwrap_or(base);
    format!("{}/archive/{}.zip", base, rev)
}

pub fn archive_file_name(rev: &str) -> String {
    format!("{}.zip", rev)
}

/// Path of the marker proving `dep` was installed from an archive.
pub fn marker_path(dep: &Dependency, root: &Path) -> PathBuf {
    dep.local_path(root).join(&dep.rev)
}

pub fn is_installed(dep: &Dependency, root: &Path) -> bool {
    marker_path(dep, root).is_file()
}

pub struct ArchiveFetcher<D: Download> {
    root: PathBuf,
    downloader: D,
}

impl<D: Download> ArchiveFetcher<D> {
    pub fn new(root: &Path, downloader: D) -> Self {
        Self {
            root: root.to_path_buf(),
            downloader,
        }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn fetch(&self, dep: &Dependency) -> Result<FetchOutcome> {
        let local_path = dep.local_path(&self.root);
        if is_installed(dep, &self.root) {
            tracing::debug!(name = %dep.name, "marker present, skipping");
            return Ok(FetchOutcome::AlreadyInstalled);
        }

        println!("{} Downloading {} '{}'", "⬇".blue(), dep.name, dep.rev);

        let url = archive_url(&dep.url, &dep.rev);
        let archive = self.root.join(archive_file_name(&dep.rev));

        if archive.exists() {
            println!("   {} Using local archive {}", "⚡".green(), archive.display());
        } else {
            self.download(dep, &url, &archive)?;
        }

        let externals = self.root.join(EXTERNALS_DIR);
        fs::create_dir_all(&externals)
            .with_context(|| format!("Failed to create {}", externals.display()))?;
        extract_archive(&archive, &externals)?;

        let unpacked = externals.join(format!("{}-{}", dep.name, dep.rev));
        if !unpacked.is_dir() {
            return Err(BootstrapError::ArchiveLayout {
                archive,
                expected: format!("{}-{}", dep.name, dep.rev),
            }
            .into());
        }
        move_into_place(&unpacked, &local_path, &dep.rev)?;

        fs::remove_file(&archive)
            .with_context(|| format!("Failed to delete {}", archive.display()))?;

        File::create(marker_path(dep, &self.root))
            .with_context(|| format!("Failed to write marker in {}", local_path.display()))?;

        println!("   {} {} ready in {}", "✓".green(), dep.name, dep.path);
        Ok(FetchOutcome::Installed)
    }

    fn download(&self, dep: &Dependency, url: &str, archive: &Path) -> Result<()> {
        let partial = archive.with_extension("zip.part");
        let result = self
            .downloader
            .download(url, &partial)
            .and_then(|()| fs::rename(&partial, archive).map_err(Into::into));

        result.map_err(|e| {
            let _ = fs::remove_file(&partial);
            BootstrapError::Download {
                name: dep.name.clone(),
                url: url.to_string(),
                root: self.root.clone(),
                reason: format!("{:#}", e),
            }
            .into()
        })
    }
}

fn move_into_place(unpacked: &Path, local_path: &Path, rev: &str) -> Result<()> {
    if local_path.exists() {
        let empty = fs::read_dir(local_path)
            .with_context(|| format!("Failed to read {}", local_path.display()))?
            .next()
            .is_none();
        if !empty {
            return Err(BootstrapError::Occupied {
                path: local_path.to_path_buf(),
                rev: rev.to_string(),
            }
            .into());
        }
        // Source tarballs carry empty directories where submodules live.
        fs::remove_dir(local_path)?;
    }
    if let Some(parent) = local_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(unpacked, local_path).with_context(|| {
        format!(
            "Failed to move {} to {}",
            unpacked.display(),
            local_path.display()
        )
    })
}

/// A file written during extraction and the mode stored for it.
#[derive(Debug, Clone)]
pub struct ExtractedEntry {
    pub path: PathBuf,
    /// `external_attributes >> 16`; zero when the archive stores none.
    pub stored_mode: u32,
}

/// Unpack `archive_path` into `target_dir`, then restore stored permissions.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<Vec<ExtractedEntry>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", archive_path.display()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                tracing::warn!("skipping unsafe archive entry {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent()
                && !p.exists()
            {
                fs::create_dir_all(p)?;
            }
            let mut outfile = File::create(&outpath)
                .with_context(|| format!("Failed to create {}", outpath.display()))?;
            std::io::copy(&mut file, &mut outfile)?;
        }

        entries.push(ExtractedEntry {
            path: outpath,
            stored_mode: file.unix_mode().unwrap_or(0),
        });
    }

    restore_permissions(&entries)?;
    tracing::debug!(count = entries.len(), "archive extracted");
    Ok(entries)
}

/// Apply each entry's stored mode. Entries with a zero mode keep whatever
/// the filesystem gave them.
pub fn restore_permissions(entries: &[ExtractedEntry]) -> Result<()> {
    for entry in entries.iter().filter(|e| e.stored_mode != 0) {
        set_mode(&entry.path, entry.stored_mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(mode & 0o7777);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    // Only the owner write bit maps onto a non-Unix filesystem.
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}
