use std::sync::LazyLock;

use regex::Regex;

use crate::{audio::WavDescriptor, error::Error};

/// Linear PCM subtype marker, the digits being the bit depth (`L16`, `L24`)
static LINEAR_PCM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Ll](\d{1,2})$").expect("valid linear pcm regex"));

/// How a provider payload has to be written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Already wrapped in a container; bytes are written unchanged
    Container { extension: &'static str },
    /// Headerless PCM that must be prefixed with a WAV header
    RawPcm(WavDescriptor),
}

impl AudioFormat {
    /// Classifies a payload by its MIME type. Types with a known file
    /// extension are containers, everything else is treated as raw PCM and
    /// must carry enough parameters to build a WAV header.
    pub fn classify(mime_type: &str) -> Result<Self, Error> {
        match container_extension(mime_type) {
            Some(extension) => Ok(AudioFormat::Container { extension }),
            None => parse_wav_descriptor(mime_type).map(AudioFormat::RawPcm),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Container { extension } => extension,
            AudioFormat::RawPcm(_) => "wav",
        }
    }
}

/// File extension registered for an audio MIME type, ignoring parameters.
pub fn container_extension(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next()?.trim().to_ascii_lowercase();

    let extension = match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => "wav",
        "audio/ogg" => "oga",
        "audio/opus" => "opus",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/aac" | "audio/x-aac" => "aac",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/webm" => "weba",
        "audio/aiff" | "audio/x-aiff" => "aif",
        "audio/basic" => "au",
        _ => return None,
    };
    Some(extension)
}

/// Parses a PCM MIME type such as `audio/L16;codec=pcm;rate=24000` into the
/// parameters of a WAV header.
///
/// The bit depth comes from the `L<N>` subtype and the sample rate from the
/// `rate` parameter; both are required. `channels` is optional and defaults
/// to mono.
pub fn parse_wav_descriptor(mime_type: &str) -> Result<WavDescriptor, Error> {
    let mut parts = mime_type.split(';').map(str::trim);
    let essence = parts.next().unwrap_or_default();
    let subtype = essence.split_once('/').map(|(_, sub)| sub.trim());

    let invalid = |key: &str| Error::InvalidMimeParameter {
        mime_type: mime_type.to_string(),
        key: key.to_string(),
    };

    let bits_per_sample = match subtype.and_then(|sub| LINEAR_PCM_RE.captures(sub)) {
        Some(caps) => Some(caps[1].parse::<u16>().map_err(|_| invalid("bits"))?),
        None => None,
    };

    let mut sample_rate = None;
    let mut num_channels = 1u16;

    for param in parts {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().trim_matches('"');

        match key.as_str() {
            "rate" => sample_rate = Some(value.parse::<u32>().map_err(|_| invalid("rate"))?),
            "channels" => num_channels = value.parse::<u16>().map_err(|_| invalid("channels"))?,
            _ => {}
        }
    }

    let bits_per_sample = bits_per_sample.ok_or_else(|| Error::IncompleteWavDescriptor {
        mime_type: mime_type.to_string(),
        missing: "bits per sample",
    })?;
    let sample_rate = sample_rate.ok_or_else(|| Error::IncompleteWavDescriptor {
        mime_type: mime_type.to_string(),
        missing: "sample rate",
    })?;

    if bits_per_sample == 0 || bits_per_sample % 8 != 0 {
        return Err(invalid("bits"));
    }
    if sample_rate == 0 {
        return Err(invalid("rate"));
    }
    if num_channels == 0 {
        return Err(invalid("channels"));
    }

    let descriptor = WavDescriptor {
        num_channels,
        sample_rate,
        bits_per_sample,
    };
    if descriptor.checked_block_align().is_none() {
        return Err(invalid("channels"));
    }
    if descriptor.checked_byte_rate().is_none() {
        return Err(invalid("rate"));
    }

    Ok(descriptor)
}
