use std::{path::PathBuf, time::Duration};

use episode_store::EpisodeStore;

use crate::{
    notify::Notifier,
    processor::{run_state::RunState, synthesis::SegmentSynthesizer, RetryPolicy},
    script::{segmenter::SegmentationStrategy, ScriptParser, SpeakerLabels},
    transcoder::Transcoder,
    tts::{SpeechSynthesizer, VoiceMapping},
    PodcastProcessor,
};

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub labels: SpeakerLabels,
    pub voices: VoiceMapping,
    pub temperature: f32,
    pub retry: RetryPolicy,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            labels: SpeakerLabels::default(),
            voices: VoiceMapping::default(),
            temperature: 1.0,
            retry: RetryPolicy::default(),
        }
    }
}

pub struct PodcastProcessorBuilder<E = (), S = (), T = (), N = ()> {
    temp_dir: PathBuf,
    store: E,
    synthesizer: S,
    transcoder: T,
    notifier: N,
    synthesis: SynthesisConfig,
    segmentation: SegmentationStrategy,
    inter_segment_pause: Duration,
    cover_image: Option<PathBuf>,
}

impl PodcastProcessorBuilder {
    pub const DEFAULT_INTER_SEGMENT_PAUSE: Duration = Duration::from_secs(2);

    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            store: (),
            synthesizer: (),
            transcoder: (),
            notifier: (),
            synthesis: SynthesisConfig::default(),
            segmentation: SegmentationStrategy::default(),
            inter_segment_pause: Self::DEFAULT_INTER_SEGMENT_PAUSE,
            cover_image: None,
        }
    }
}

impl<E, S, T, N> PodcastProcessorBuilder<E, S, T, N> {
    pub fn store<E2: EpisodeStore + Send + Sync + 'static>(
        self,
        store: E2,
    ) -> PodcastProcessorBuilder<E2, S, T, N> {
        PodcastProcessorBuilder {
            temp_dir: self.temp_dir,
            store,
            synthesizer: self.synthesizer,
            transcoder: self.transcoder,
            notifier: self.notifier,
            synthesis: self.synthesis,
            segmentation: self.segmentation,
            inter_segment_pause: self.inter_segment_pause,
            cover_image: self.cover_image,
        }
    }

    pub fn synthesizer<S2: SpeechSynthesizer + Send + Sync + 'static>(
        self,
        synthesizer: S2,
    ) -> PodcastProcessorBuilder<E, S2, T, N> {
        PodcastProcessorBuilder {
            temp_dir: self.temp_dir,
            store: self.store,
            synthesizer,
            transcoder: self.transcoder,
            notifier: self.notifier,
            synthesis: self.synthesis,
            segmentation: self.segmentation,
            inter_segment_pause: self.inter_segment_pause,
            cover_image: self.cover_image,
        }
    }

    pub fn transcoder<T2: Transcoder + Send + Sync + 'static>(
        self,
        transcoder: T2,
    ) -> PodcastProcessorBuilder<E, S, T2, N> {
        PodcastProcessorBuilder {
            temp_dir: self.temp_dir,
            store: self.store,
            synthesizer: self.synthesizer,
            transcoder,
            notifier: self.notifier,
            synthesis: self.synthesis,
            segmentation: self.segmentation,
            inter_segment_pause: self.inter_segment_pause,
            cover_image: self.cover_image,
        }
    }

    pub fn notifier<N2: Notifier + Send + Sync + 'static>(
        self,
        notifier: N2,
    ) -> PodcastProcessorBuilder<E, S, T, N2> {
        PodcastProcessorBuilder {
            temp_dir: self.temp_dir,
            store: self.store,
            synthesizer: self.synthesizer,
            transcoder: self.transcoder,
            notifier,
            synthesis: self.synthesis,
            segmentation: self.segmentation,
            inter_segment_pause: self.inter_segment_pause,
            cover_image: self.cover_image,
        }
    }

    pub fn speaker_labels(mut self, labels: SpeakerLabels) -> Self {
        self.synthesis.labels = labels;
        self
    }

    pub fn voices(mut self, voices: VoiceMapping) -> Self {
        self.synthesis.voices = voices;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.synthesis.temperature = temperature;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.synthesis.retry = retry;
        self
    }

    pub fn segmentation(mut self, segmentation: SegmentationStrategy) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Pause between two consecutive segment synthesis calls
    pub fn inter_segment_pause(mut self, pause: Duration) -> Self {
        self.inter_segment_pause = pause;
        self
    }

    /// Enables the video stage with `cover_image` as the still frame
    pub fn with_video(mut self, cover_image: impl Into<PathBuf>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }
}

impl<E, S, T, N> PodcastProcessorBuilder<E, S, T, N>
where
    E: EpisodeStore + Send + Sync + 'static,
    S: SpeechSynthesizer + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn build(self) -> PodcastProcessor<E, S, T, N> {
        let SynthesisConfig {
            labels,
            voices,
            temperature,
            retry,
        } = self.synthesis;

        PodcastProcessor {
            temp_dir: self.temp_dir,
            store: self.store,
            parser: ScriptParser::new(&labels),
            synthesizer: SegmentSynthesizer::new(self.synthesizer, labels, voices, temperature, retry),
            transcoder: self.transcoder,
            notifier: self.notifier,
            segmentation: self.segmentation,
            inter_segment_pause: self.inter_segment_pause,
            cover_image: self.cover_image,
            run_state: RunState::default(),
        }
    }
}
