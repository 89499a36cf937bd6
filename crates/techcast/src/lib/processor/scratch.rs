use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Directory holding one run's transient files: synthesized segments, the
/// concat manifest and the staged output. Exclusive to a single run.
///
/// [`ScratchDir::cleanup`] must be awaited on every exit path; dropping an
/// uncleaned scratch dir (a cancelled or panicking run) falls back to a
/// blocking cleanup.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    cleaned: bool,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cleaned: false,
        }
    }

    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.path).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Deletes every file in the directory, then the directory itself once
    /// empty. Failures are logged and never returned. Returns the number of
    /// files removed.
    pub async fn cleanup(&mut self) -> usize {
        self.cleaned = true;

        let mut entries = match tokio::fs::read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(error = ?e, path = ?self.path, "Failed to read temp directory");
                return 0;
            }
        };

        let mut removed = 0;
        let mut remaining = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = ?e, path = ?self.path, "Failed to list temp directory");
                    remaining += 1;
                    break;
                }
            };

            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| !t.is_dir()).unwrap_or(false);
            if !is_file {
                remaining += 1;
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = ?path, "Removed temp file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, path = ?path, "Failed to remove temp file");
                    remaining += 1;
                }
            }
        }

        if remaining == 0 {
            match tokio::fs::remove_dir(&self.path).await {
                Ok(()) => tracing::info!(path = ?self.path, "Cleaned up temp directory"),
                Err(e) => {
                    tracing::warn!(error = ?e, path = ?self.path, "Failed to remove temp directory")
                }
            }
        }

        removed
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.cleaned || !self.path.exists() {
            return;
        }

        let Ok(entries) = std::fs::read_dir(&self.path) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(error = ?e, path = ?path, "Failed to remove temp file");
                }
            }
        }
        if let Err(e) = std::fs::remove_dir(&self.path) {
            tracing::warn!(error = ?e, path = ?self.path, "Failed to clean up temp directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_removes_files_and_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut scratch = ScratchDir::new(root.path().join("temp_podcast_audios"));
        scratch.prepare().await.unwrap();
        std::fs::write(scratch.file("segment_01.wav"), b"a").unwrap();
        std::fs::write(scratch.file("concat_list.txt"), b"b").unwrap();

        assert_eq!(scratch.cleanup().await, 2);
        assert!(!scratch.path().exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_missing_dir_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        let mut scratch = ScratchDir::new(root.path().join("never-created"));
        assert_eq!(scratch.cleanup().await, 0);
    }

    #[test]
    fn test_drop_falls_back_to_blocking_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("scratch");
        {
            let scratch = ScratchDir::new(&path);
            std::fs::create_dir_all(scratch.path()).unwrap();
            std::fs::write(scratch.file("partial.wav"), b"x").unwrap();
        }
        assert!(!path.exists());
    }
}
