//! The file store and its temp-file allocator.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use depot_core::BlobKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::{Error, Result, StorageConfig, BLOB_FILE_PREFIX, TEMP_FILE_PREFIX};

/// Upper bound (exclusive) of the random temp-file name space.
const TEMP_NAME_RANGE: u32 = 10_000;

/// A per-process directory of content-addressed blob files.
///
/// Blobs are published exclusively through [`FileStore::promote`], which
/// renames a finished temp file onto its final `blob_<hex(key)>` name.
/// Concurrent readers of a published file are safe; the rename never exposes
/// partial contents.
pub struct FileStore {
    directory: PathBuf,
    rng: Mutex<StdRng>,
}

impl FileStore {
    /// Opens (and creates, if missing) the storage directory
    /// `<base>/blob-<user>-<pid>`.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let directory = config.resolve_base().join(directory_name());
        fs::create_dir_all(&directory)
            .await
            .map_err(|source| Error::CreateDirectory {
                path: directory.clone(),
                source,
            })?;

        // Canonicalize so the file: URLs handed out later are absolute.
        let directory = fs::canonicalize(&directory).await?;
        info!(directory = %directory.display(), "opened blob storage directory");

        Ok(Self {
            directory,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// The storage directory path.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Allocates a fresh temp file `tmp-<n>` with a random `n`.
    ///
    /// The name generator is serialized, and the file is created with
    /// `create_new`, so a chosen name is claimed atomically: concurrent
    /// allocations can never end up sharing a temp file. The returned handle
    /// deletes the file on drop unless it is promoted.
    pub async fn alloc_temp(&self) -> Result<TempFile> {
        loop {
            let n: u32 = self
                .rng
                .lock()
                .expect("temp name generator poisoned")
                .random_range(0..TEMP_NAME_RANGE);
            let path = self.directory.join(format!("{}{}", TEMP_FILE_PREFIX, n));

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    debug!(path = %path.display(), "allocated temp file");
                    return Ok(TempFile {
                        path,
                        file: Some(file),
                        armed: true,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Publishes a finished temp file under its content key.
    ///
    /// The temp file is flushed, closed and renamed to `blob_<hex(key)>`.
    /// Losing a promotion race to another writer counts as success: the
    /// final name is a pure function of the verified contents, so the file
    /// already in place is byte-identical.
    pub async fn promote(&self, mut temp: TempFile, key: &BlobKey) -> Result<PathBuf> {
        temp.close().await?;

        let target = self.blob_path(key);
        match fs::rename(&temp.path, &target).await {
            Ok(()) => {
                temp.armed = false;
                debug!(key = %key, path = %target.display(), "published blob");
                Ok(target)
            }
            Err(e) => {
                if fs::try_exists(&target).await.unwrap_or(false) {
                    debug!(key = %key, "blob already published by concurrent writer");
                    Ok(target)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Returns the path of the blob with the given key, if it is present.
    pub async fn lookup(&self, key: &BlobKey) -> Option<PathBuf> {
        let path = self.blob_path(key);
        match fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => None,
        }
    }

    /// Opens the blob with the given key for reading, or `None` on a miss.
    pub async fn open_blob(&self, key: &BlobKey) -> Result<Option<File>> {
        match File::open(self.blob_path(key)).await {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a `file:` URL for the blob with the given key, if present.
    ///
    /// The URL stays valid only as long as the storage directory does.
    pub async fn url_for(&self, key: &BlobKey) -> Option<Url> {
        let path = self.lookup(key).await?;
        Url::from_file_path(&path).ok()
    }

    /// Deletes every published blob, then removes the directory if empty.
    /// Best-effort: individual deletion failures are logged and skipped.
    pub async fn wipe(&self) {
        match fs::read_dir(&self.directory).await {
            Ok(mut entries) => loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        if entry
                            .file_name()
                            .to_string_lossy()
                            .starts_with(BLOB_FILE_PREFIX)
                        {
                            if let Err(e) = fs::remove_file(entry.path()).await {
                                warn!(path = %entry.path().display(), error = %e, "failed to delete blob file");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "failed to list storage directory");
                        break;
                    }
                }
            },
            Err(e) => {
                warn!(directory = %self.directory.display(), error = %e, "failed to open storage directory for wiping");
                return;
            }
        }

        if let Err(e) = fs::remove_dir(&self.directory).await {
            debug!(directory = %self.directory.display(), error = %e, "storage directory left in place");
        }

        info!(directory = %self.directory.display(), "wiped blob storage directory");
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.directory.join(format!("{}{}", BLOB_FILE_PREFIX, key))
    }
}

/// An in-flight temp file.
///
/// Dropping an unpromoted handle deletes the underlying file, so every error
/// exit of a transfer cleans up after itself.
pub struct TempFile {
    path: PathBuf,
    file: Option<File>,
    armed: bool,
}

impl TempFile {
    /// The temp file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open file handle to stream payload bytes into.
    pub fn writer(&mut self) -> &mut File {
        self.file.as_mut().expect("temp file already closed")
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to delete temp file");
            }
        }
    }
}

/// `blob-<user>-<pid>`, the per-process storage directory name.
fn directory_name() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string());
    format!("blob-{}-{}", user, std::process::id())
}
