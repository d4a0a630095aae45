use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use bytes::Bytes;
use cachet_driver::{Driver, DriverError, DriverLabel, DriverResult, Lookup, Raw, ttl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::FileError;

const EXTENSION: &str = "cache";

#[derive(Serialize, Deserialize)]
struct Envelope {
    expires_at: Option<DateTime<Utc>>,
    #[serde(with = "serde_bytes")]
    value: Vec<u8>,
}

impl Envelope {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Disk-based cache driver storing one file per key.
///
/// Files are named after the SHA-1 of the key with a `.cache` extension and
/// hold a small envelope with the value and its absolute expiry. Writes are
/// staged into a temporary file in the same directory and renamed into place,
/// so readers never see a half-written entry.
///
/// ```no_run
/// use cachet_file::FileDriver;
///
/// let driver = FileDriver::builder()
///     .directory("/var/cache/myapp")
///     .build()?;
/// # Ok::<(), cachet_file::FileError>(())
/// ```
///
/// Cloning is cheap, clones share the same directory.
#[derive(Clone, Debug)]
pub struct FileDriver {
    directory: Arc<PathBuf>,
    label: DriverLabel,
}

impl FileDriver {
    /// Starts building a new driver.
    pub fn builder() -> FileDriverBuilder {
        FileDriverBuilder::default()
    }

    /// Driver rooted at `directory`, created if missing.
    pub fn new(directory: impl AsRef<Path>) -> Result<Self, FileError> {
        Self::builder().directory(directory).build()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Location of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha1::digest(key.as_bytes());
        self.directory
            .join(format!("{}.{}", hex::encode(digest), EXTENSION))
    }

    async fn blocking<T, F>(&self, f: F) -> DriverResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> DriverResult<T> + Send + 'static,
    {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || f(&directory))
            .await
            .map_err(DriverError::internal)?
    }
}

/// Builder for [`FileDriver`].
pub struct FileDriverBuilder {
    directory: Option<PathBuf>,
    label: DriverLabel,
}

impl Default for FileDriverBuilder {
    fn default() -> Self {
        Self {
            directory: None,
            label: DriverLabel::new_static("file"),
        }
    }
}

impl FileDriverBuilder {
    /// Root directory for cache files.
    ///
    /// Default: `cachet-cache` inside the system temp directory.
    pub fn directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Identifies this driver in chains and logs.
    pub fn label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the driver, creating the directory if needed.
    pub fn build(self) -> Result<FileDriver, FileError> {
        if !FileDriver::is_supported() {
            return Err(FileError::Unsupported);
        }
        let directory = self
            .directory
            .unwrap_or_else(|| std::env::temp_dir().join("cachet-cache"));

        if directory.exists() && !directory.is_dir() {
            return Err(FileError::NotADirectory(
                directory.to_string_lossy().into_owned(),
            ));
        }
        std::fs::create_dir_all(&directory)?;
        debug!(directory = %directory.display(), "File cache directory ready");

        Ok(FileDriver {
            directory: Arc::new(directory),
            label: self.label,
        })
    }
}

fn discard(path: &Path, reason: &dyn std::fmt::Display) {
    warn!(path = %path.display(), reason = %reason, "Discarding unreadable cache entry");
    if let Err(error) = std::fs::remove_file(path)
        && error.kind() != ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %error, "Failed to remove unreadable cache entry");
    }
}

fn read_entry(path: &Path) -> Lookup<Raw> {
    let encoded = match std::fs::read(path) {
        Ok(encoded) => encoded,
        Err(error) if error.kind() == ErrorKind::NotFound => return Lookup::Miss,
        Err(error) => {
            discard(path, &error);
            return Lookup::Miss;
        }
    };

    let envelope: Envelope = match decode_from_slice(&encoded, bincode_config()) {
        Ok((envelope, _)) => envelope,
        Err(error) => {
            discard(path, &error);
            return Lookup::Miss;
        }
    };

    if envelope.is_expired(Utc::now()) {
        // Another writer may have replaced it in between; losing that write
        // only costs a miss.
        let _ = std::fs::remove_file(path);
        return Lookup::Miss;
    }

    Lookup::Hit(Bytes::from(envelope.value))
}

fn write_entry(directory: &Path, path: &Path, envelope: &Envelope) -> Result<(), FileError> {
    let encoded = encode_to_vec(envelope, bincode_config())?;
    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(&encoded)?;
    staged.flush()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

fn remove_entry(path: &Path) -> Result<(), FileError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

fn remove_all(directory: &Path) -> Result<(), FileError> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error.into()),
    };
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == EXTENSION) {
            remove_entry(&path)?;
        }
    }
    Ok(())
}

#[async_trait]
impl Driver for FileDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        let path = self.path_for(key);
        self.blocking(move |_| Ok(read_entry(&path))).await
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        let path = self.path_for(key);
        let envelope = Envelope {
            expires_at: ttl::expires_at(ttl, Utc::now()),
            value: value.to_vec(),
        };
        self.blocking(move |directory| Ok(write_entry(directory, &path, &envelope)?))
            .await
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        let path = self.path_for(key);
        self.blocking(move |_| Ok(remove_entry(&path)?)).await
    }

    async fn clear(&self) -> DriverResult<()> {
        self.blocking(|directory| Ok(remove_all(directory)?)).await
    }

    fn label(&self) -> DriverLabel {
        self.label.clone()
    }

    /// Staged writes rely on `rename` replacing the target in one step.
    fn is_supported() -> bool {
        cfg!(any(unix, windows))
    }
}
