//! Daily podcast audio pipeline.
//!
//! A dialogue script is cut into speaker-balanced segments, each segment is
//! voiced by a streaming speech provider, and the resulting clips are joined
//! by an external transcoder into the episode's final mp3. Temporary files
//! are removed on every exit path.

pub mod audio;
mod error;
pub mod notify;
mod processor;
pub mod script;
pub mod tracing;
pub mod transcoder;
pub mod tts;

pub use error::Error;
pub use notify::{telegram::TelegramNotifier, Notifier};
pub use processor::{
    builder::{PodcastProcessorBuilder, SynthesisConfig},
    AudioStage, ConcatManifest, EpisodeOutput, PodcastProcessor, RetryPolicy, RunState, RunToken,
    ScratchDir, SegmentSynthesizer, SynthesizedSegment,
};
pub use script::{
    segmenter::{segment, Segment, SegmentationStrategy},
    Script, ScriptParser, Speaker, SpeakerLabels,
};
pub use transcoder::{ffmpeg::Ffmpeg, TranscodeReport, Transcoder};
pub use tts::{
    gemini::GeminiClient, InlineAudio, SpeechChunk, SpeechRequest, SpeechStream, SpeechSynthesizer,
    VoiceMapping,
};
