//! # Script Parser
//!
//! Classifies each line of a two-host podcast script once, so segmentation
//! decisions work on tagged lines instead of re-scanning raw text for
//! speaker markers.

pub mod segmenter;

use std::fmt;

use regex::Regex;

/// One of the two presenter voices of the show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    One,
    Two,
}

/// The labels the script writer uses to mark each speaker's turn, e.g.
/// `Speaker 1:`. The same labels are bound to voices in the synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerLabels {
    pub first: String,
    pub second: String,
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self {
            first: "Speaker 1".into(),
            second: "Speaker 2".into(),
        }
    }
}

impl SpeakerLabels {
    /// Surrounding whitespace (common in env values) is trimmed
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into().trim().to_string(),
            second: second.into().trim().to_string(),
        }
    }

    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::One => &self.first,
            Speaker::Two => &self.second,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    SpeakerTurn(Speaker),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub text: String,
    pub kind: LineKind,
}

impl ScriptLine {
    pub fn is_turn(&self) -> bool {
        matches!(self.kind, LineKind::SpeakerTurn(_))
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Recognises speaker markers at the start of a line. Markdown emphasis
/// around the label (`**Speaker 1:**`) is tolerated since generated scripts
/// occasionally carry it.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    marker_re: Regex,
}

impl ScriptParser {
    pub fn new(labels: &SpeakerLabels) -> Self {
        let pattern = format!(
            r"^[\s*_]*(?:(?P<one>{})|(?P<two>{}))[\s*_]*:",
            regex::escape(&labels.first),
            regex::escape(&labels.second),
        );
        let marker_re = Regex::new(&pattern).expect("escaped labels always form a valid regex");
        Self { marker_re }
    }

    pub fn classify(&self, line: &str) -> LineKind {
        match self.marker_re.captures(line) {
            Some(caps) if caps.name("one").is_some() => LineKind::SpeakerTurn(Speaker::One),
            Some(_) => LineKind::SpeakerTurn(Speaker::Two),
            None => LineKind::Other,
        }
    }

    pub fn parse(&self, content: &str) -> Script {
        let lines = content
            .lines()
            .map(|text| ScriptLine {
                kind: self.classify(text),
                text: text.to_string(),
            })
            .collect();
        Script { lines }
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new(&SpeakerLabels::default())
    }
}

/// A parsed podcast script. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    lines: Vec<ScriptLine>,
}

impl Script {
    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn turn_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_turn()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(ScriptLine::is_blank)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&line.text)?;
        }
        Ok(())
    }
}
