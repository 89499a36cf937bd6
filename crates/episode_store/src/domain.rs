use std::{fmt, str::FromStr};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date an episode is published for, formatted as `YYYY-MM-DD`
/// in every artifact file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeDate(NaiveDate);

impl EpisodeDate {
    pub fn new(date: NaiveDate) -> Self {
        EpisodeDate(date)
    }

    /// Today's date as observed in `tz`. All artifacts of one run must be
    /// keyed with the same zone.
    pub fn today_in(tz: Tz) -> Self {
        EpisodeDate(Utc::now().with_timezone(&tz).date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for EpisodeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for EpisodeDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(EpisodeDate)
    }
}

impl From<NaiveDate> for EpisodeDate {
    fn from(value: NaiveDate) -> Self {
        EpisodeDate(value)
    }
}

/// The artifacts produced over one episode's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    News,
    Script,
    Audio,
    Video,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::News,
        ArtifactKind::Script,
        ArtifactKind::Audio,
        ArtifactKind::Video,
    ];

    /// Sub directory of the output root holding this kind of artifact
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::News => "news",
            ArtifactKind::Script => "script",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Video => "video",
        }
    }

    pub fn file_name(&self, date: EpisodeDate) -> String {
        match self {
            ArtifactKind::News => format!("news_{date}.json"),
            ArtifactKind::Script => format!("podcast_script_{date}.txt"),
            ArtifactKind::Audio => format!("audio_{date}.mp3"),
            ArtifactKind::Video => format!("podcast_video_{date}.mp4"),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
