//! Archive download over HTTPS.

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Fetches a URL into a local file.
pub trait Download {
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Blocking `ureq` client with a progress bar.
#[derive(Default)]
pub struct HttpDownloader;

impl Download for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!(url, dest = %dest.display(), "downloading");

        let response = ureq::get(url)
            .header("User-Agent", concat!("mesonup/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| anyhow!("{}", e))?;

        let total_size = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let pb = if total_size > 0 {
            ProgressBar::new(total_size)
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.blue} [{elapsed_precise}] [{bar:40.green/black}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━╸"),
        );

        let mut file =
            File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut reader = response.into_body().into_reader();
        let mut buffer = [0; 8192];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    pb.abandon();
                    drop(file);
                    let _ = fs::remove_file(dest);
                    return Err(anyhow!("transfer interrupted: {}", e));
                }
            };
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])?;
            pb.inc(n as u64);
        }
        file.flush()?;

        pb.finish_and_clear();
        Ok(())
    }
}
