pub mod builder;
mod concat;
pub mod run_state;
mod scratch;
pub mod synthesis;

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use episode_store::{ArtifactKind, EpisodeDate, EpisodeStore};

use crate::{
    error::Error,
    notify::Notifier,
    script::{
        segmenter::{segment, SegmentationStrategy},
        ScriptParser,
    },
    transcoder::Transcoder,
    tts::SpeechSynthesizer,
};

pub use concat::ConcatManifest;
pub use run_state::{RunState, RunToken};
pub use scratch::ScratchDir;
pub use synthesis::{RetryPolicy, SegmentSynthesizer, SynthesizedSegment};

/// Steps of the audio stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStage {
    Init,
    LoadScript,
    Segment,
    SynthesizeAll,
    Concatenate,
    Finalize,
    Cleanup,
}

impl fmt::Display for AudioStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioStage::Init => "init",
            AudioStage::LoadScript => "load script",
            AudioStage::Segment => "segment",
            AudioStage::SynthesizeAll => "synthesize",
            AudioStage::Concatenate => "concatenate",
            AudioStage::Finalize => "finalize",
            AudioStage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Artifacts produced by a full episode run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeOutput {
    pub audio: PathBuf,
    pub video: Option<PathBuf>,
}

// The daily podcast pipeline: script to final audio, optionally muxed with
// the cover image into a video
#[derive(Debug)]
pub struct PodcastProcessor<E, S, T, N>
where
    E: EpisodeStore + Send + Sync + 'static,
    S: SpeechSynthesizer + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    temp_dir: PathBuf,
    store: E,
    synthesizer: SegmentSynthesizer<S>,
    transcoder: T,
    notifier: N,
    parser: ScriptParser,
    segmentation: SegmentationStrategy,
    inter_segment_pause: Duration,
    cover_image: Option<PathBuf>,
    run_state: RunState,
}

impl<E, S, T, N> PodcastProcessor<E, S, T, N>
where
    E: EpisodeStore + Send + Sync + 'static,
    S: SpeechSynthesizer + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn store(&self) -> &E {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    pub fn cover_image(&self) -> Option<&Path> {
        self.cover_image.as_deref()
    }

    /// Runs the audio stage for `date` and returns the final audio path
    #[tracing::instrument(skip_all, fields(date = %date))]
    pub async fn generate_audio(&self, date: EpisodeDate) -> anyhow::Result<PathBuf> {
        let _token = self.begin()?;
        self.audio_stage(date).await
    }

    /// Muxes the existing final audio of `date` with the cover image
    #[tracing::instrument(skip_all, fields(date = %date))]
    pub async fn generate_video(&self, date: EpisodeDate) -> anyhow::Result<PathBuf> {
        let _token = self.begin()?;
        self.video_stage(date).await
    }

    /// Audio stage followed by the video stage when a cover image is set
    #[tracing::instrument(skip_all, fields(date = %date))]
    pub async fn produce_episode(&self, date: EpisodeDate) -> anyhow::Result<EpisodeOutput> {
        let _token = self.begin()?;

        let audio = self.audio_stage(date).await?;
        let video = match self.cover_image {
            Some(_) => Some(self.video_stage(date).await?),
            None => {
                tracing::info!("No cover image configured, skipping video stage");
                None
            }
        };

        Ok(EpisodeOutput { audio, video })
    }

    fn begin(&self) -> Result<RunToken<'_>, Error> {
        self.run_state.try_begin().ok_or_else(|| {
            tracing::warn!("Rejected trigger, a run is already in progress");
            Error::RunInProgress
        })
    }

    async fn audio_stage(&self, date: EpisodeDate) -> anyhow::Result<PathBuf> {
        tracing::info!("Starting podcast audio generation");
        self.notifier
            .notify(&format!("🎙️ Starting podcast audio generation for {date}"))
            .await;

        let mut scratch = ScratchDir::new(&self.temp_dir);
        let mut stage = AudioStage::Init;
        let result = self.run_audio_stages(date, &scratch, &mut stage).await;

        tracing::debug!(stage = %AudioStage::Cleanup, "Cleaning up temporary audio files");
        let removed = scratch.cleanup().await;
        tracing::info!(removed, "Temporary audio files cleaned up");

        match &result {
            Ok(path) => {
                tracing::info!(path = ?path, "Podcast audio generated");
                self.notifier
                    .notify(&format!("🎉 Podcast audio for {date} generated successfully!"))
                    .await;
            }
            Err(e) => {
                tracing::error!(error = ?e, stage = %stage, "Podcast audio generation failed");
                self.notifier
                    .notify(&format!(
                        "❌ Podcast audio generation for {date} failed during {stage}: {e:#}"
                    ))
                    .await;
            }
        }

        result
    }

    async fn run_audio_stages(
        &self,
        date: EpisodeDate,
        scratch: &ScratchDir,
        stage: &mut AudioStage,
    ) -> anyhow::Result<PathBuf> {
        *stage = AudioStage::Init;
        self.store
            .prepare()
            .await
            .context("Failed to prepare output directories")?;
        scratch
            .prepare()
            .await
            .context("Failed to create temp directory")?;

        *stage = AudioStage::LoadScript;
        let content = self
            .store
            .load_script(date)
            .await?
            .ok_or_else(|| Error::ScriptNotFound(self.store.artifact_path(ArtifactKind::Script, date)))?;
        let script = self.parser.parse(&content);
        tracing::info!(
            lines = script.lines().len(),
            turns = script.turn_count(),
            "Script loaded"
        );

        *stage = AudioStage::Segment;
        let segments = segment(&script, &self.segmentation)?;
        if segments.is_empty() {
            return Err(Error::EmptyScript.into());
        }

        *stage = AudioStage::SynthesizeAll;
        let total = segments.len();
        let mut segment_paths = Vec::with_capacity(total);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 && !self.inter_segment_pause.is_zero() {
                tokio::time::sleep(self.inter_segment_pause).await;
            }

            tracing::info!(segment = %segment.id(), position = i + 1, total, "Processing segment");
            let synthesized = self
                .synthesizer
                .synthesize(segment, scratch.path(), date)
                .await?;
            if !synthesized.failures.is_empty() {
                tracing::warn!(
                    segment = %segment.id(),
                    attempts = synthesized.attempts,
                    failures = ?synthesized.failures,
                    "Segment synthesized after failed attempts"
                );
            }
            segment_paths.push(synthesized.path);
        }

        *stage = AudioStage::Concatenate;
        let staged = self.concatenate(&segment_paths, scratch, date).await?;

        *stage = AudioStage::Finalize;
        let final_path = self.store.artifact_path(ArtifactKind::Audio, date);
        move_into_place(&staged, &final_path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to finalize podcast audio"))?;

        Ok(final_path)
    }

    /// Writes the concat manifest and transcodes the segments into a staged
    /// mp3 inside the scratch directory
    #[tracing::instrument(skip_all, fields(date = %date, segments = segment_paths.len()))]
    async fn concatenate(
        &self,
        segment_paths: &[PathBuf],
        scratch: &ScratchDir,
        date: EpisodeDate,
    ) -> anyhow::Result<PathBuf> {
        let manifest = ConcatManifest::resolve(segment_paths)
            .await
            .context("Failed to resolve segment paths")?;
        let manifest_path = scratch.file(format!("concat_list_{date}.txt"));
        manifest
            .write_to(&manifest_path)
            .await
            .context("Failed to write concat manifest")?;

        let staged = scratch.file(format!("final_{date}.mp3"));
        tracing::info!(segments = manifest.entries().len(), "Concatenating segments");
        let report = self
            .transcoder
            .concat_audio(&manifest_path, &staged)
            .await
            .map_err(Into::<anyhow::Error>::into)
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to concatenate segments"))?;

        if let Some(warnings) = report.warnings {
            tracing::warn!(%warnings, "Transcoder reported diagnostics");
        }

        Ok(staged)
    }

    async fn video_stage(&self, date: EpisodeDate) -> anyhow::Result<PathBuf> {
        tracing::info!("Starting audio and image merge");
        self.notifier
            .notify(&format!("🎬 Starting video generation for {date}"))
            .await;

        let result = self.merge_video(date).await;
        match &result {
            Ok(path) => {
                tracing::info!(path = ?path, "Podcast video generated");
                self.notifier
                    .notify(&format!("🎉 Podcast video for {date} generated successfully!"))
                    .await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Podcast video generation failed");
                self.notifier
                    .notify(&format!("❌ Podcast video generation for {date} failed: {e:#}"))
                    .await;
            }
        }

        result
    }

    async fn merge_video(&self, date: EpisodeDate) -> anyhow::Result<PathBuf> {
        let image = self
            .cover_image
            .as_deref()
            .context("No cover image configured")?;
        let audio = self.store.artifact_path(ArtifactKind::Audio, date);

        if !tokio::fs::try_exists(&audio).await.unwrap_or(false) {
            anyhow::bail!("Audio file not found: {}", audio.display());
        }
        if !tokio::fs::try_exists(image).await.unwrap_or(false) {
            anyhow::bail!("Cover image not found: {}", image.display());
        }

        self.store.prepare().await?;
        let output = self.store.artifact_path(ArtifactKind::Video, date);

        let report = match self
            .transcoder
            .mux_still_image(image, &audio, &output)
            .await
            .map_err(Into::<anyhow::Error>::into)
        {
            Ok(report) => report,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&output).await {
                    tracing::debug!(error = ?remove_err, path = ?output, "No partial video to remove");
                }
                return Err(e.context("Failed to merge audio and image"));
            }
        };
        if let Some(warnings) = report.warnings {
            tracing::warn!(%warnings, "Transcoder reported diagnostics");
        }

        let size = tokio::fs::metadata(&output)
            .await
            .with_context(|| format!("Video file was not created: {}", output.display()))?
            .len();
        tracing::info!(size_mb = (size as f64 / (1024.0 * 1024.0)), "Video file ready");

        Ok(output)
    }
}

/// Moves the staged artifact onto its final path. Rename is atomic on the
/// same filesystem; otherwise the file is copied and the staged copy
/// removed. A copy that fails midway leaves no final file behind.
async fn move_into_place(staged: &Path, final_path: &Path) -> anyhow::Result<()> {
    let size = tokio::fs::metadata(staged)
        .await
        .with_context(|| format!("Transcoder did not produce {}", staged.display()))?
        .len();
    if size == 0 {
        anyhow::bail!("Transcoder produced an empty file: {}", staged.display());
    }

    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Err(e) = tokio::fs::rename(staged, final_path).await {
        tracing::debug!(error = ?e, "Rename failed, falling back to copy");
        if let Err(e) = tokio::fs::copy(staged, final_path).await {
            let _ = tokio::fs::remove_file(final_path).await;
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to move {} to {}",
                staged.display(),
                final_path.display()
            )));
        }
        tokio::fs::remove_file(staged).await?;
    }

    tracing::info!(path = ?final_path, size, "Final audio in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_into_place_creates_parent_and_removes_staged() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("final.mp3");
        std::fs::write(&staged, b"mp3").unwrap();
        let final_path = dir.path().join("output/audio/audio_2025-06-01.mp3");

        move_into_place(&staged, &final_path).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(final_path).unwrap(), b"mp3");
    }

    #[tokio::test]
    async fn test_move_into_place_rejects_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("final.mp3");
        std::fs::write(&staged, b"").unwrap();
        let final_path = dir.path().join("audio.mp3");

        assert!(move_into_place(&staged, &final_path).await.is_err());
        assert!(!final_path.exists());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(AudioStage::SynthesizeAll.to_string(), "synthesize");
        assert_eq!(AudioStage::LoadScript.to_string(), "load script");
    }
}
