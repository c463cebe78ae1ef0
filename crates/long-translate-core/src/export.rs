//! Saving a finished translation as a text file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Error, Result};
use crate::util::unix_millis;

fn export_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |cause| Error::Export {
        path: path.to_path_buf(),
        cause,
    }
}

/// Create the first free `translation_<stamp>[_n].txt` in `dir`.
///
/// Uses `create_new`, so a file that appears between attempts is skipped
/// rather than truncated.
async fn create_unique(dir: &Path, stamp: u128) -> Result<(PathBuf, File)> {
    let mut path = dir.join(format!("translation_{stamp}.txt"));
    let mut n = 1u32;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                path = dir.join(format!("translation_{stamp}_{n}.txt"));
                n += 1;
            }
            Err(e) => return Err(export_error(&path)(e)),
        }
    }
}

/// Write `text` to `translation_<unix-millis>.txt` inside `dir`.
///
/// Creates `dir` if needed. Never overwrites: a name already taken gets a
/// numeric suffix.
pub async fn save_to_file(text: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await.map_err(export_error(dir))?;

    let (path, mut file) = create_unique(dir, unix_millis()).await?;
    file.write_all(text.as_bytes())
        .await
        .map_err(export_error(&path))?;
    file.flush().await.map_err(export_error(&path))?;

    info!("Saved translation to {}", path.display());
    Ok(path)
}
