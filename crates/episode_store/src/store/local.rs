use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{store::ArtifactStatus, ArtifactKind, EpisodeDate, EpisodeStore};

/// Episode artifacts stored under a single output root on the local
/// filesystem, one sub directory per [`ArtifactKind`].
#[derive(Debug, Clone)]
pub struct LocalEpisodeStore {
    root: PathBuf,
}

impl LocalEpisodeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalEpisodeStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl EpisodeStore for LocalEpisodeStore {
    fn artifact_path(&self, kind: ArtifactKind, date: EpisodeDate) -> PathBuf {
        self.root.join(kind.dir_name()).join(kind.file_name(date))
    }

    async fn prepare(&self) -> anyhow::Result<()> {
        for kind in [ArtifactKind::Audio, ArtifactKind::Video] {
            let dir = self.root.join(kind.dir_name());
            tokio::fs::create_dir_all(&dir)
                .await
                .inspect_err(
                    |e| tracing::error!(error = ?e, path = ?dir, "Failed to create output directory"),
                )
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    async fn load_script(&self, date: EpisodeDate) -> anyhow::Result<Option<String>> {
        let path = self.artifact_path(ArtifactKind::Script, date);
        tracing::debug!(path = ?path, "Loading podcast script");

        match tokio::fs::read_to_string(&path).await {
            Ok(script) => Ok(Some(script)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn status(&self, date: EpisodeDate) -> ArtifactStatus {
        let mut present = Vec::with_capacity(ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            let exists = tokio::fs::try_exists(self.artifact_path(kind, date))
                .await
                .unwrap_or(false);
            present.push((kind, exists));
        }
        ArtifactStatus { date, present }
    }
}
