use futures::{future, stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;

use crate::tts::{
    sse::SseDecoder, InlineAudio, SpeechChunk, SpeechRequest, SpeechStream, SpeechSynthesizer,
};

/// Google Gemini speech generation over the streaming REST endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: Self::TTS_MODEL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(request: &SpeechRequest) -> serde_json::Value {
        let speaker_voice_configs = request
            .speakers
            .iter()
            .map(|sv| {
                serde_json::json!({
                    "speaker": sv.speaker,
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": sv.voice }
                    }
                })
            })
            .collect::<Vec<_>>();

        serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": request.text }]
                }
            ],
            "generationConfig": {
                "temperature": request.temperature,
                "responseModalities": ["audio"],
                "speechConfig": {
                    "multiSpeakerVoiceConfig": {
                        "speakerVoiceConfigs": speaker_voice_configs
                    }
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

/// Maps one SSE payload onto speech chunks. Chunks without candidates (usage
/// metadata, safety feedback) produce nothing.
fn parse_chunk(payload: &str) -> Result<Vec<SpeechChunk>, GeminiError> {
    let chunk = serde_json::from_str::<StreamChunk>(payload)?;

    let chunks = chunk
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| match (part.inline_data, part.text) {
            (Some(inline), _) => Some(SpeechChunk::Audio(InlineAudio {
                mime_type: inline.mime_type,
                data: inline.data,
            })),
            (None, Some(text)) => Some(SpeechChunk::Text(text)),
            (None, None) => None,
        })
        .collect();

    Ok(chunks)
}

fn decode_events(payloads: Vec<String>) -> Vec<Result<SpeechChunk, GeminiError>> {
    payloads
        .iter()
        .flat_map(|payload| match parse_chunk(payload) {
            Ok(chunks) => chunks.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
        .collect()
}

impl SpeechSynthesizer for GeminiClient {
    const TTS_MODEL: &'static str = "gemini-2.5-pro-preview-tts";
    type Error = GeminiError;

    #[tracing::instrument(skip_all, fields(model = %self.model, chars = request.text.len()))]
    async fn stream_speech(
        &self,
        request: SpeechRequest,
    ) -> Result<SpeechStream<Self::Error>, Self::Error> {
        let resp = self
            .client
            .post(format!(
                "{}/models/{}:streamGenerateContent",
                self.base_url, self.model
            ))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&request))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }

        let chunks = resp
            .bytes_stream()
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(SseDecoder::default(), |decoder, next| {
                let events = match next {
                    Some(Ok(bytes)) => decode_events(decoder.push(&bytes)),
                    Some(Err(e)) => vec![Err(GeminiError::Request(e))],
                    None => decode_events(decoder.finish()),
                };
                future::ready(Some(stream::iter(events)))
            })
            .flatten()
            .boxed();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{script::SpeakerLabels, tts::VoiceMapping};

    #[test]
    fn test_request_body_shape() {
        let request = SpeechRequest::new(
            "Speaker 1: Hi",
            &SpeakerLabels::default(),
            &VoiceMapping::new("Kore", "Charon"),
            1.0,
        );
        let body = GeminiClient::request_body(&request);

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Speaker 1: Hi");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "audio");
        let configs =
            &body["generationConfig"]["speechConfig"]["multiSpeakerVoiceConfig"]["speakerVoiceConfigs"];
        assert_eq!(configs[0]["speaker"], "Speaker 1");
        assert_eq!(
            configs[0]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
        assert_eq!(configs[1]["speaker"], "Speaker 2");
        assert_eq!(
            configs[1]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Charon"
        );
    }

    #[test]
    fn test_parse_inline_audio_chunk() {
        let payload = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAEC"}
                    }]
                }
            }]
        }"#;

        let chunks = parse_chunk(payload).expect("valid chunk");
        assert_eq!(
            chunks,
            vec![SpeechChunk::Audio(InlineAudio {
                mime_type: "audio/L16;codec=pcm;rate=24000".into(),
                data: "AAEC".into(),
            })]
        );
    }

    #[test]
    fn test_parse_text_and_metadata_chunks() {
        let text = r#"{"candidates":[{"content":{"parts":[{"text":"thinking"}]}}]}"#;
        assert_eq!(
            parse_chunk(text).unwrap(),
            vec![SpeechChunk::Text("thinking".into())]
        );

        let usage = r#"{"usageMetadata":{"promptTokenCount":12}}"#;
        assert!(parse_chunk(usage).unwrap().is_empty());

        let finished = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert!(parse_chunk(finished).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_a_decode_error() {
        let events = decode_events(vec!["not json".into()]);
        assert!(matches!(events.as_slice(), [Err(GeminiError::Decode(_))]));
    }
}
