use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use techcast::{TranscodeReport, Transcoder};

/// Concatenates the manifest inputs byte for byte, recording what it saw
#[derive(Clone, Default)]
pub struct MockTranscoder {
    pub manifests: Arc<Mutex<Vec<String>>>,
    /// Every concat input as (path, bytes) at the time of the call
    pub inputs: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    pub mux_calls: Arc<Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>>,
    pub fail_with: Option<String>,
}

impl MockTranscoder {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

fn manifest_paths(manifest: &str) -> Vec<PathBuf> {
    manifest
        .lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|quoted| PathBuf::from(quoted.replace(r"'\''", "'")))
        .collect()
}

impl Transcoder for MockTranscoder {
    type Error = anyhow::Error;

    async fn concat_audio(&self, manifest: &Path, output: &Path) -> anyhow::Result<TranscodeReport> {
        let content = tokio::fs::read_to_string(manifest).await?;
        self.manifests.lock().unwrap().push(content.clone());

        if let Some(ref msg) = self.fail_with {
            tokio::fs::write(output, b"half written").await?;
            return Err(anyhow::anyhow!("{}", msg));
        }

        let mut joined = Vec::new();
        for path in manifest_paths(&content) {
            let bytes = tokio::fs::read(&path).await?;
            joined.extend_from_slice(&bytes);
            self.inputs.lock().unwrap().push((path, bytes));
        }
        tokio::fs::write(output, joined).await?;

        Ok(TranscodeReport::default())
    }

    async fn mux_still_image(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
    ) -> anyhow::Result<TranscodeReport> {
        self.mux_calls.lock().unwrap().push((
            image.to_path_buf(),
            audio.to_path_buf(),
            output.to_path_buf(),
        ));

        if let Some(ref msg) = self.fail_with {
            tokio::fs::write(output, b"half written").await?;
            return Err(anyhow::anyhow!("{}", msg));
        }

        let audio = tokio::fs::read(audio).await?;
        tokio::fs::write(output, [b"VIDEO".as_slice(), audio.as_slice()].concat()).await?;
        Ok(TranscodeReport {
            warnings: Some("mock: deprecated pixel format".into()),
        })
    }
}
