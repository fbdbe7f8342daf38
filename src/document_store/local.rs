//! # Local Filesystem Byte Sink

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use rand::{distributions::Alphanumeric, Rng};

use super::backend::{ByteSink, ContentHandle};
use super::errors::{DocumentError, DocumentResult};

/// Byte sink storing each document as one file in a single directory
#[derive(Debug)]
pub struct LocalByteSink {
    root: PathBuf,
}

impl LocalByteSink {
    /// Create a new local sink rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a sink path to a file directly inside the root.
    ///
    /// Only a single plain file-name component is accepted.
    fn full_path(&self, path: &str) -> DocumentResult<PathBuf> {
        let invalid = || DocumentError::InvalidPath(path.to_string());

        if path.is_empty() || path.contains(&['/', '\\', '\0'][..]) {
            return Err(invalid());
        }

        let mut components = Path::new(path).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(path)),
            _ => Err(invalid()),
        }
    }

    fn temp_path(&self, path: &str) -> PathBuf {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        self.root.join(format!(".{}.{}.partial", path, suffix))
    }
}

impl ByteSink for LocalByteSink {
    fn write_all(&self, path: &str, reader: &mut dyn Read) -> DocumentResult<u64> {
        let full_path = self.full_path(path)?;

        fs::create_dir_all(&self.root)?;

        // Stage next to the target and rename over it, so open readers keep
        // the old content and a failed copy never truncates the target.
        let temp_path = self.temp_path(path);
        let staged = File::create(&temp_path).and_then(|mut file| {
            let written = io::copy(reader, &mut file)?;
            file.sync_all()?;
            Ok(written)
        });

        let written = match staged.and_then(|n| fs::rename(&temp_path, &full_path).map(|_| n)) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e.into());
            }
        };

        Ok(written)
    }

    fn delete(&self, path: &str) -> DocumentResult<()> {
        let full_path = self.full_path(path)?;

        fs::remove_file(&full_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DocumentError::FileMissing(path.to_string())
            } else {
                DocumentError::Io(e.to_string())
            }
        })
    }

    fn open_readable(&self, path: &str) -> DocumentResult<Option<ContentHandle>> {
        let full_path = self.full_path(path)?;

        let file = match File::open(&full_path) {
            Ok(file) => file,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };

        if !file.metadata()?.is_file() {
            return Ok(None);
        }

        Ok(Some(Box::new(file)))
    }

    fn file_len(&self, path: &str) -> DocumentResult<Option<u64>> {
        let full_path = self.full_path(path)?;

        match fs::metadata(&full_path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
