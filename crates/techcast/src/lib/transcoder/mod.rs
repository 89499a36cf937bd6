pub mod ffmpeg;

use std::{future::Future, path::Path};

/// External audio/video processing tool. Both operations return once the
/// underlying process has exited.
pub trait Transcoder {
    type Error: Into<anyhow::Error> + Send + 'static;

    /// Losslessly concatenates the inputs listed in a concat manifest and
    /// re-encodes them into a single compressed audio file at `output`
    fn concat_audio(
        &self,
        manifest: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<TranscodeReport, Self::Error>> + Send;

    /// Loops a still `image` for the length of `audio` into a video file
    fn mux_still_image(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<TranscodeReport, Self::Error>> + Send;
}

/// Diagnostics of a successful transcoder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeReport {
    /// Diagnostic output that did not look like progress telemetry
    pub warnings: Option<String>,
}
