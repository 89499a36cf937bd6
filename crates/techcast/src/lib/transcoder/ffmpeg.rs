use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::transcoder::{TranscodeReport, Transcoder};

/// `ffmpeg` command line wrapper
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run<I, S>(&self, args: I) -> Result<TranscodeReport, FfmpegError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-y"])
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FfmpegError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(FfmpegError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let warnings = (!stderr.is_empty() && !is_progress_telemetry(&stderr)).then_some(stderr);
        Ok(TranscodeReport { warnings })
    }
}

/// ffmpeg writes its progress lines (`frame=... size=... time=...`) to
/// stderr, which is not a sign of trouble.
pub fn is_progress_telemetry(stderr: &str) -> bool {
    stderr.contains("frame=") || (stderr.contains("size=") && stderr.contains("time="))
}

impl Transcoder for Ffmpeg {
    type Error = FfmpegError;

    #[tracing::instrument(skip(self))]
    async fn concat_audio(
        &self,
        manifest: &Path,
        output: &Path,
    ) -> Result<TranscodeReport, Self::Error> {
        tracing::info!("Concatenating and re-encoding audio to mp3");
        self.run([
            OsStr::new("-f"),
            OsStr::new("concat"),
            OsStr::new("-safe"),
            OsStr::new("0"),
            OsStr::new("-i"),
            manifest.as_os_str(),
            OsStr::new("-c:a"),
            OsStr::new("libmp3lame"),
            OsStr::new("-q:a"),
            OsStr::new("2"),
            output.as_os_str(),
        ])
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to concatenate audio"))
    }

    #[tracing::instrument(skip(self))]
    async fn mux_still_image(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<TranscodeReport, Self::Error> {
        tracing::info!("Merging audio with still image");
        self.run([
            OsStr::new("-loop"),
            OsStr::new("1"),
            OsStr::new("-i"),
            image.as_os_str(),
            OsStr::new("-i"),
            audio.as_os_str(),
            OsStr::new("-c:v"),
            OsStr::new("libx264"),
            OsStr::new("-tune"),
            OsStr::new("stillimage"),
            OsStr::new("-c:a"),
            OsStr::new("aac"),
            OsStr::new("-b:a"),
            OsStr::new("192k"),
            OsStr::new("-pix_fmt"),
            OsStr::new("yuv420p"),
            OsStr::new("-shortest"),
            output.as_os_str(),
        ])
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to merge audio with image"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines_are_not_warnings() {
        assert!(is_progress_telemetry(
            "size=    1024kB time=00:01:05.44 bitrate= 128.2kbits/s speed=40x"
        ));
        assert!(is_progress_telemetry("frame=  120 fps= 30 q=28.0 size= 256kB"));
        assert!(!is_progress_telemetry(
            "[mp3 @ 0x55d] Estimating duration from bitrate, this may be inaccurate"
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg-binary");
        let err = ffmpeg
            .concat_audio(Path::new("list.txt"), Path::new("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, FfmpegError::Spawn { .. }));
    }
}
