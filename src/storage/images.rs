use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::error::{DownloadError, FetchError};
use crate::net::HttpSession;

/// Path the body is streamed to before it is moved into place
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Download one image to `dest`, returning the number of bytes written
///
/// The body goes to `<dest>.part` first and is renamed onto `dest` once
/// complete, so a failed transfer never leaves a truncated image behind.
/// An existing file at `dest` is replaced.
pub async fn download_image(
    session: &HttpSession,
    url: &str,
    dest: &Path,
    chunk_size: usize,
) -> Result<u64, DownloadError> {
    let part = part_path(dest);

    let written = match stream_to_file(session, url, &part, chunk_size).await {
        Ok(written) => written,
        Err(e) => {
            discard(&part).await;
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&part, dest).await {
        discard(&part).await;
        return Err(DownloadError::io("rename", dest, e));
    }

    debug!("Saved {} ({} bytes)", dest.display(), written);
    Ok(written)
}

async fn stream_to_file(
    session: &HttpSession,
    url: &str,
    path: &Path,
    chunk_size: usize,
) -> Result<u64, DownloadError> {
    let mut response = session.get(url).await?;

    let file = File::create(path)
        .await
        .map_err(|e| DownloadError::io("create", path, e))?;
    let mut writer = BufWriter::with_capacity(chunk_size, file);

    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(FetchError::from)? {
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io("write", path, e))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io("flush", path, e))?;

    Ok(written)
}

async fn discard(part: &Path) {
    match fs::remove_file(part).await {
        Ok(()) => debug!("Removed partial file {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", part.display(), e),
    }
}
