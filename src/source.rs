//! Source retrieval: download, verify and unpack upstream archives.
//!
//! Archives are cached under `~/.cache/cvr/downloads` and re-verified before
//! reuse. After extraction the versioned top-level directory is renamed to
//! the folder the build expects:
//!
//! ```text
//! opencv-4.0.1/          -> source_subfolder/
//! opencv_contrib-4.0.1/  -> contrib/
//! ```
//!
//! OpenCV's bundled `3rdparty/` tree is deleted (except for Android, whose
//! toolchain files live there) so the build can only see declared
//! dependencies.

use crate::error::{RecipeError, Result};
use crate::settings::Os;
use anyhow::Context;
use flate2::read::GzDecoder;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinSet;

/// One upstream archive and where it ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArchive {
    /// Short name for progress output
    pub name: String,
    pub url: String,
    pub sha256: String,
    /// Top-level directory inside the archive
    pub top_dir: String,
    /// Folder the top-level directory is renamed to
    pub target: PathBuf,
}

impl SourceArchive {
    /// Cache file name, unique per archive and version
    pub fn file_name(&self) -> String {
        format!("{}.tar.gz", self.top_dir)
    }
}

/// Download cache directory
pub fn cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache/cvr/downloads")
}

/// SHA256 of a file as lowercase hex
pub async fn sha256_file(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Download an archive into `cache`, reusing a verified cached copy
pub async fn download(
    archive: &SourceArchive,
    cache: &Path,
    progress: Option<&MultiProgress>,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(cache)
        .await
        .context("Failed to create download cache")?;
    let output_path = cache.join(archive.file_name());

    if output_path.exists() {
        if sha256_file(&output_path).await? == archive.sha256 {
            tracing::debug!("Using cached {}", output_path.display());
            return Ok(output_path);
        }
        tokio::fs::remove_file(&output_path).await?;
    }

    let pb = if let Some(mp) = progress {
        let pb = mp.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("⬇ {}", archive.name));
        Some(pb)
    } else {
        None
    };

    tracing::info!("Downloading {}", archive.url);
    let client = reqwest::Client::new();
    let mut response = client.get(&archive.url).send().await?.error_for_status()?;

    if let Some(pb) = &pb
        && let Some(total) = response.content_length()
    {
        pb.set_length(total);
    }

    let mut file = tokio::fs::File::create(&output_path)
        .await
        .context("Failed to create output file")?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(pb) = &pb {
            pb.set_position(downloaded);
        }
    }

    file.flush().await?;

    if let Some(pb) = &pb {
        pb.finish_with_message(format!("✓ {}", archive.name));
    }

    verify(&output_path, &archive.sha256).await?;
    Ok(output_path)
}

/// Check a file against its expected checksum, deleting it on mismatch
pub async fn verify(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path).await?;
    if actual != expected {
        tokio::fs::remove_file(path).await?;
        return Err(RecipeError::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Unpack a tar.gz into `root` and rename its top directory to `target`
pub fn extract(archive_path: &Path, root: &Path, top_dir: &str, target: &Path) -> Result<PathBuf> {
    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create directory: {}", root.display()))?;

    let file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(root)
        .with_context(|| format!("Failed to extract archive to: {}", root.display()))?;

    let extracted = root.join(top_dir);
    if !extracted.is_dir() {
        return Err(anyhow::anyhow!(
            "Extraction failed: {} not found in {}",
            top_dir,
            archive_path.display()
        )
        .into());
    }

    if target.exists() {
        fs::remove_dir_all(target)
            .with_context(|| format!("Failed to remove old sources: {}", target.display()))?;
    }
    fs::rename(&extracted, target).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            extracted.display(),
            target.display()
        )
    })?;

    Ok(target.to_path_buf())
}

/// Remove the bundled third-party sources unless the target needs them
///
/// Returns true when the directory was removed.
pub fn prune_vendored(source_folder: &Path, os: &Os) -> Result<bool> {
    if matches!(os, Os::Android { .. }) {
        return Ok(false);
    }
    let vendored = source_folder.join("3rdparty");
    if !vendored.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&vendored)
        .with_context(|| format!("Failed to remove {}", vendored.display()))?;
    tracing::debug!("Removed bundled sources: {}", vendored.display());
    Ok(true)
}

/// Download and unpack all archives in parallel
///
/// The first failure aborts the downloads still in flight.
pub async fn fetch_all(archives: &[SourceArchive], root: &Path, cache: &Path) -> Result<()> {
    let mp = MultiProgress::new();
    let mut tasks = JoinSet::new();

    for archive in archives {
        let archive = archive.clone();
        let cache = cache.to_path_buf();
        let mp = mp.clone();
        tasks.spawn(async move {
            let path = download(&archive, &cache, Some(&mp)).await;
            (archive, path)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .context("Download task failed")
            .map_err(RecipeError::from)
            .and_then(|(archive, path)| {
                let path = path?;
                extract(&path, root, &archive.top_dir, &archive.target)
            });
        if let Err(err) = outcome {
            tasks.abort_all();
            tracing::debug!("Aborted {} pending download(s)", tasks.len());
            return Err(err);
        }
    }

    Ok(())
}
