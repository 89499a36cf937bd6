use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use base64::{prelude::BASE64_STANDARD, Engine};
use futures::{stream, StreamExt};
use techcast::{InlineAudio, SpeechChunk, SpeechRequest, SpeechStream, SpeechSynthesizer};

/// Scripted outcome of one `stream_speech` call
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// mp3 chunks whose bytes are the request text
    Echo,
    Audio {
        mime_type: String,
        chunks: Vec<Vec<u8>>,
    },
    /// Stream ends without any audio chunk
    NoAudio,
    /// Request is rejected before streaming starts
    Fail(String),
    /// One audio chunk, then a stream error
    FailMidStream(String),
}

#[derive(Clone)]
pub struct MockSpeechSynthesizer {
    pub calls: Arc<Mutex<Vec<SpeechRequest>>>,
    pub responses: Arc<Mutex<VecDeque<MockResponse>>>,
    pub fallback: MockResponse,
    pub latency: Option<Duration>,
}

impl Default for MockSpeechSynthesizer {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockResponse::Echo,
            latency: None,
        }
    }
}

impl MockSpeechSynthesizer {
    /// Plays `responses` in order, then echoes
    pub fn scripted(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fallback: MockResponse::Fail(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

fn audio_chunk(mime_type: &str, bytes: &[u8]) -> SpeechChunk {
    SpeechChunk::Audio(InlineAudio {
        mime_type: mime_type.to_string(),
        data: BASE64_STANDARD.encode(bytes),
    })
}

impl SpeechSynthesizer for MockSpeechSynthesizer {
    const TTS_MODEL: &'static str = "mock-tts";
    type Error = anyhow::Error;

    async fn stream_speech(
        &self,
        request: SpeechRequest,
    ) -> anyhow::Result<SpeechStream<anyhow::Error>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let text = request.text.clone();
        self.calls.lock().unwrap().push(request);

        let items: Vec<anyhow::Result<SpeechChunk>> = match response {
            MockResponse::Echo => vec![
                Ok(SpeechChunk::Text("mock transcript".into())),
                Ok(audio_chunk("audio/mpeg", text.as_bytes())),
            ],
            MockResponse::Audio { mime_type, chunks } => chunks
                .iter()
                .map(|chunk| Ok(audio_chunk(&mime_type, chunk)))
                .collect(),
            MockResponse::NoAudio => vec![Ok(SpeechChunk::Text("no audio today".into()))],
            MockResponse::Fail(msg) => return Err(anyhow::anyhow!("{}", msg)),
            MockResponse::FailMidStream(msg) => vec![
                Ok(audio_chunk("audio/mpeg", b"partial")),
                Err(anyhow::anyhow!("{}", msg)),
            ],
        };

        Ok(stream::iter(items).boxed())
    }
}
