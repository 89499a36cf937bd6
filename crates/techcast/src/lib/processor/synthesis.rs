use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{prelude::BASE64_STANDARD, Engine};
use episode_store::EpisodeDate;
use futures::StreamExt;
use tokio::{
    fs::File,
    io::{AsyncSeekExt, AsyncWriteExt, BufWriter},
};

use crate::{
    audio::{wav_header, AudioFormat, WAV_HEADER_LEN},
    error::Error,
    script::{segmenter::Segment, SpeakerLabels},
    tts::{InlineAudio, SpeechChunk, SpeechRequest, SpeechSynthesizer, VoiceMapping},
};

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Outcome of a segment synthesis that eventually succeeded
#[derive(Debug, Clone)]
pub struct SynthesizedSegment {
    pub path: PathBuf,
    pub attempts: u32,
    /// Errors of the attempts that failed before the successful one
    pub failures: Vec<String>,
}

/// Turns one script segment into one audio file on disk
#[derive(Debug)]
pub struct SegmentSynthesizer<S> {
    provider: S,
    labels: SpeakerLabels,
    voices: VoiceMapping,
    temperature: f32,
    retry: RetryPolicy,
}

impl<S> SegmentSynthesizer<S>
where
    S: SpeechSynthesizer + Send + Sync,
{
    pub fn new(
        provider: S,
        labels: SpeakerLabels,
        voices: VoiceMapping,
        temperature: f32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            labels,
            voices,
            temperature,
            retry,
        }
    }

    /// Synthesizes `segment` into `{out_dir}/{segment id}_{date}.{ext}`.
    ///
    /// Every failed attempt is logged and followed by the policy delay; the
    /// error of the last attempt is returned once the attempts run out.
    #[tracing::instrument(skip_all, fields(segment = %segment.id()))]
    pub async fn synthesize(
        &self,
        segment: &Segment<'_>,
        out_dir: &Path,
        date: EpisodeDate,
    ) -> anyhow::Result<SynthesizedSegment> {
        let segment_id = segment.id();
        let stem = out_dir.join(format!("{segment_id}_{date}"));
        let request = SpeechRequest::new(segment.text(), &self.labels, &self.voices, self.temperature);
        let max_attempts = self.retry.max_attempts.max(1);

        let mut failures = Vec::new();
        let mut attempt = 1;
        loop {
            tracing::info!(attempt, max_attempts, "Synthesizing segment");

            match self.attempt(request.clone(), &stem, &segment_id).await {
                Ok(path) => {
                    tracing::info!(path = ?path, attempt, "Segment audio saved");
                    return Ok(SynthesizedSegment {
                        path,
                        attempts: attempt,
                        failures,
                    });
                }
                Err(e) => {
                    tracing::error!(error = ?e, attempt, max_attempts, "Segment synthesis attempt failed");
                    failures.push(format!("{e:#}"));

                    if attempt >= max_attempts {
                        return Err(e.context(format!(
                            "Failed to synthesize {segment_id} after {max_attempts} attempts"
                        )));
                    }
                }
            }

            tracing::info!(delay = ?self.retry.delay, "Retrying segment synthesis");
            tokio::time::sleep(self.retry.delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        request: SpeechRequest,
        stem: &Path,
        segment_id: &str,
    ) -> anyhow::Result<PathBuf> {
        let mut stream = self
            .provider
            .stream_speech(request)
            .await
            .map_err(Into::<anyhow::Error>::into)?;

        let mut writer = SegmentWriter::new(stem, segment_id);
        let drained = async {
            while let Some(chunk) = stream.next().await {
                match chunk.map_err(Into::<anyhow::Error>::into)? {
                    SpeechChunk::Audio(audio) => writer.append(&audio).await?,
                    SpeechChunk::Text(text) => tracing::debug!(%text, "Provider emitted text"),
                }
            }
            anyhow::Ok(())
        }
        .await;

        match drained {
            Ok(()) => Ok(writer.finish().await?),
            Err(e) => {
                writer.abort().await;
                Err(e)
            }
        }
    }
}

struct OpenSegmentFile {
    path: PathBuf,
    file: BufWriter<File>,
    format: AudioFormat,
    mime_type: String,
    data_len: u64,
}

/// Streams decoded audio chunks into a segment file. The file is created
/// on the first audio chunk so its extension follows the payload format.
/// Raw PCM is written behind a placeholder header that is rewritten with
/// the final data length once the stream ends.
struct SegmentWriter {
    stem: PathBuf,
    segment_id: String,
    open: Option<OpenSegmentFile>,
}

impl SegmentWriter {
    fn new(stem: &Path, segment_id: &str) -> Self {
        Self {
            stem: stem.to_path_buf(),
            segment_id: segment_id.to_string(),
            open: None,
        }
    }

    async fn append(&mut self, audio: &InlineAudio) -> Result<(), Error> {
        let bytes = BASE64_STANDARD.decode(audio.data.as_bytes())?;
        let format = AudioFormat::classify(&audio.mime_type)?;

        let open = match &mut self.open {
            Some(open) => open,
            slot @ None => slot.insert(create_segment_file(&self.stem, format, &audio.mime_type).await?),
        };

        if open.format != format {
            return Err(Error::MixedAudioFormats {
                segment: self.segment_id.clone(),
                first: open.mime_type.clone(),
                second: audio.mime_type.clone(),
            });
        }

        open.data_len += bytes.len() as u64;
        if matches!(format, AudioFormat::RawPcm(_)) && open.data_len > max_wav_data_len() {
            return Err(Error::PayloadTooLarge(open.data_len));
        }
        open.file.write_all(&bytes).await?;
        Ok(())
    }

    async fn finish(self) -> Result<PathBuf, Error> {
        let Some(open) = self.open else {
            return Err(Error::NoAudioReceived(self.segment_id));
        };

        let path = open.path.clone();
        match finalize(open).await {
            Ok(()) => Ok(path),
            Err(e) => {
                remove_partial(&path).await;
                Err(e)
            }
        }
    }

    async fn abort(self) {
        if let Some(open) = self.open {
            drop(open.file);
            remove_partial(&open.path).await;
        }
    }
}

async fn create_segment_file(
    stem: &Path,
    format: AudioFormat,
    mime_type: &str,
) -> Result<OpenSegmentFile, Error> {
    let path = PathBuf::from(format!("{}.{}", stem.display(), format.extension()));
    let mut file = BufWriter::new(File::create(&path).await?);
    if let AudioFormat::RawPcm(descriptor) = &format {
        file.write_all(&wav_header(0, descriptor)).await?;
    }
    tracing::debug!(path = ?path, mime_type, "Opened segment file");

    Ok(OpenSegmentFile {
        path,
        file,
        format,
        mime_type: mime_type.to_string(),
        data_len: 0,
    })
}

async fn finalize(open: OpenSegmentFile) -> Result<(), Error> {
    let mut file = open.file;
    file.flush().await?;

    let mut file = file.into_inner();
    if let AudioFormat::RawPcm(descriptor) = &open.format {
        // bounded by max_wav_data_len in append
        let data_len = u32::try_from(open.data_len).map_err(|_| Error::PayloadTooLarge(open.data_len))?;
        file.seek(SeekFrom::Start(0)).await?;
        file.write_all(&wav_header(data_len, descriptor)).await?;
        file.flush().await?;
    }
    file.sync_all().await?;
    Ok(())
}

/// Largest PCM payload whose RIFF chunk size still fits in 32 bits
fn max_wav_data_len() -> u64 {
    u64::from(u32::MAX) - (WAV_HEADER_LEN as u64 - 8)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(error = ?e, path = ?path, "Failed to remove partial segment file");
    }
}
