use std::{future::Future, path::PathBuf};

use crate::{ArtifactKind, EpisodeDate};

pub mod local;

pub trait EpisodeStore {
    /// Path the artifact of `kind` for `date` lives at, whether or not it exists
    fn artifact_path(&self, kind: ArtifactKind, date: EpisodeDate) -> PathBuf;

    /// Creates the directories artifacts are written into
    fn prepare(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Reads the day's podcast script. `Ok(None)` when no script was written
    /// for `date`.
    fn load_script(
        &self,
        date: EpisodeDate,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    fn status(&self, date: EpisodeDate) -> impl Future<Output = ArtifactStatus> + Send;
}

/// Which of an episode's artifacts exist on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub date: EpisodeDate,
    pub present: Vec<(ArtifactKind, bool)>,
}

impl ArtifactStatus {
    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.present
            .iter()
            .any(|(k, present)| *k == kind && *present)
    }

    pub fn completed(&self) -> usize {
        self.present.iter().filter(|(_, present)| *present).count()
    }

    pub fn total(&self) -> usize {
        self.present.len()
    }
}
