pub mod gemini;
mod sse;

use std::future::Future;

use futures::stream::BoxStream;

use crate::script::{Speaker, SpeakerLabels};

/// Lazy, finite, non restartable stream of provider response chunks
pub type SpeechStream<E> = BoxStream<'static, Result<SpeechChunk, E>>;

pub trait SpeechSynthesizer {
    const TTS_MODEL: &'static str;

    type Error: Into<anyhow::Error> + Send + 'static;

    /// Opens a streaming multi speaker synthesis for `request`
    fn stream_speech(
        &self,
        request: SpeechRequest,
    ) -> impl Future<Output = Result<SpeechStream<Self::Error>, Self::Error>> + Send;
}

/// Prebuilt voice names assigned to the two hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMapping {
    pub first: String,
    pub second: String,
}

impl Default for VoiceMapping {
    fn default() -> Self {
        Self {
            first: "Zephyr".into(),
            second: "Puck".into(),
        }
    }
}

impl VoiceMapping {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn voice(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::One => &self.first,
            Speaker::Two => &self.second,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice: String,
}

/// A single synthesis request: the segment text plus the speaker label to
/// voice bindings the provider needs to tell the hosts apart.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub temperature: f32,
    pub speakers: Vec<SpeakerVoice>,
}

impl SpeechRequest {
    pub fn new(
        text: impl Into<String>,
        labels: &SpeakerLabels,
        voices: &VoiceMapping,
        temperature: f32,
    ) -> Self {
        let speakers = [Speaker::One, Speaker::Two]
            .into_iter()
            .map(|speaker| SpeakerVoice {
                speaker: labels.label(speaker).to_string(),
                voice: voices.voice(speaker).to_string(),
            })
            .collect();

        Self {
            text: text.into(),
            temperature,
            speakers,
        }
    }
}

/// One event of a synthesis stream
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechChunk {
    /// Text the model emitted alongside the audio; carries no speech
    Text(String),
    Audio(InlineAudio),
}

/// Base64 encoded audio bytes tagged with their MIME type
#[derive(Debug, Clone, PartialEq)]
pub struct InlineAudio {
    pub mime_type: String,
    pub data: String,
}
