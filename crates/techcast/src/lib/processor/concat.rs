use std::path::{Path, PathBuf};

use itertools::Itertools;

/// Input list for the ffmpeg concat demuxer: one `file '<path>'` line per
/// segment, in playback order. Paths are absolute so the manifest does not
/// depend on the working directory of the transcoder process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatManifest {
    entries: Vec<PathBuf>,
}

impl ConcatManifest {
    /// Resolves every path to its canonical absolute form. Fails if any of
    /// the segment files does not exist.
    pub async fn resolve(paths: &[PathBuf]) -> std::io::Result<Self> {
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            entries.push(tokio::fs::canonicalize(path).await?);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|path| format!("file '{}'", escape_path(path)))
            .join("\n")
    }

    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut content = self.render();
        content.push('\n');
        tokio::fs::write(path, content).await
    }
}

/// Single quotes cannot be escaped inside a quoted concat entry, so the
/// quote is closed, an escaped quote emitted and the quote reopened.
fn escape_path(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_order_and_quotes() {
        let manifest = ConcatManifest {
            entries: vec![
                PathBuf::from("/tmp/run/segment_01_2025-06-01.wav"),
                PathBuf::from("/tmp/run/segment_02_2025-06-01.wav"),
            ],
        };

        assert_eq!(
            manifest.render(),
            "file '/tmp/run/segment_01_2025-06-01.wav'\nfile '/tmp/run/segment_02_2025-06-01.wav'"
        );
    }

    #[test]
    fn test_single_quotes_are_escaped() {
        let manifest = ConcatManifest {
            entries: vec![PathBuf::from("/tmp/host's run/segment_01.wav")],
        };
        assert_eq!(manifest.render(), r"file '/tmp/host'\''s run/segment_01.wav'");
    }

    #[tokio::test]
    async fn test_resolve_makes_paths_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let segment = dir.path().join("segment_01.wav");
        std::fs::write(&segment, b"x").unwrap();

        let manifest = ConcatManifest::resolve(&[segment.clone()]).await.unwrap();
        assert!(manifest.entries()[0].is_absolute());
        assert_eq!(manifest.entries()[0], segment.canonicalize().unwrap());

        let missing = ConcatManifest::resolve(&[dir.path().join("missing.wav")]).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_write_to_ends_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ConcatManifest {
            entries: vec![PathBuf::from("/a.wav")],
        };
        let out = dir.path().join("concat_list.txt");
        manifest.write_to(&out).await.unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "file '/a.wav'\n");
    }
}
