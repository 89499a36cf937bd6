use std::ops::Range;

use itertools::Itertools;

use crate::{
    error::Error,
    script::{Script, ScriptLine},
};

/// How a script is cut into independently synthesized segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentationStrategy {
    /// Close a segment every `max_turns` speaker turns
    TurnCount {
        max_turns: usize,
        /// Emit the under-threshold remainder as a final short segment
        /// instead of dropping it
        keep_trailing: bool,
    },
    /// Cut into `target_segments` even slices, each boundary snapped forward
    /// (by at most `snap_window` lines) onto the next speaker turn
    Size {
        target_segments: usize,
        snap_window: usize,
    },
}

impl SegmentationStrategy {
    pub const DEFAULT_MAX_TURNS: usize = 14;
    pub const DEFAULT_TARGET_SEGMENTS: usize = 5;
    pub const DEFAULT_SNAP_WINDOW: usize = 10;

    pub fn turn_count(max_turns: usize, keep_trailing: bool) -> Self {
        SegmentationStrategy::TurnCount {
            max_turns,
            keep_trailing,
        }
    }

    pub fn size(target_segments: usize) -> Self {
        SegmentationStrategy::Size {
            target_segments,
            snap_window: Self::DEFAULT_SNAP_WINDOW,
        }
    }
}

impl Default for SegmentationStrategy {
    fn default() -> Self {
        Self::turn_count(Self::DEFAULT_MAX_TURNS, true)
    }
}

/// A contiguous run of script lines sent to the speech provider as one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub index: usize,
    pub lines: &'a [ScriptLine],
}

impl Segment<'_> {
    /// Stable identifier used in temp file names and logs
    pub fn id(&self) -> String {
        format!("segment_{:02}", self.index + 1)
    }

    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).join("\n")
    }

    pub fn turns(&self) -> usize {
        self.lines.iter().filter(|l| l.is_turn()).count()
    }
}

fn has_content(lines: &[ScriptLine]) -> bool {
    lines.iter().any(|l| !l.is_blank())
}

/// Splits `script` into ordered segments according to `strategy`.
///
/// Segments never overlap and follow script order. Lines that are not
/// speaker turns stay attached to the segment being built, so with
/// `keep_trailing` the segments joined back together reproduce the script.
#[tracing::instrument(skip(script), fields(lines = script.lines().len()))]
pub fn segment<'a>(
    script: &'a Script,
    strategy: &SegmentationStrategy,
) -> Result<Vec<Segment<'a>>, Error> {
    let lines = script.lines();

    let ranges = match *strategy {
        SegmentationStrategy::TurnCount {
            max_turns,
            keep_trailing,
        } => turn_count_ranges(lines, max_turns, keep_trailing)?,
        SegmentationStrategy::Size {
            target_segments,
            snap_window,
        } => size_ranges(lines, target_segments, snap_window)?,
    };

    let segments = ranges
        .into_iter()
        .map(|range| &lines[range])
        .filter(|slice| has_content(slice))
        .enumerate()
        .map(|(index, lines)| Segment { index, lines })
        .collect::<Vec<_>>();

    tracing::info!(count = segments.len(), "Script segmented");
    Ok(segments)
}

fn turn_count_ranges(
    lines: &[ScriptLine],
    max_turns: usize,
    keep_trailing: bool,
) -> Result<Vec<Range<usize>>, Error> {
    if max_turns == 0 {
        return Err(Error::InvalidSegmentation("max turns must be greater than zero"));
    }

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut turns = 0;

    for (i, line) in lines.iter().enumerate() {
        if line.is_turn() {
            turns += 1;
        }
        if turns == max_turns {
            ranges.push(start..i + 1);
            start = i + 1;
            turns = 0;
        }
    }

    let trailing = &lines[start..];
    if has_content(trailing) {
        if keep_trailing {
            ranges.push(start..lines.len());
        } else {
            tracing::warn!(
                dropped_turns = turns,
                dropped_lines = trailing.len(),
                "Dropping trailing segment below the turn threshold"
            );
        }
    }

    Ok(ranges)
}

fn size_ranges(
    lines: &[ScriptLine],
    target_segments: usize,
    snap_window: usize,
) -> Result<Vec<Range<usize>>, Error> {
    if target_segments == 0 {
        return Err(Error::InvalidSegmentation("target segments must be greater than zero"));
    }

    let total = lines.len();
    let mut bounds = vec![0];

    for k in 1..target_segments {
        let boundary = k * total / target_segments;
        let snapped = (boundary..(boundary + snap_window).min(total))
            .find(|&j| lines[j].is_turn())
            .unwrap_or(boundary);
        // snapping may overtake the next even boundary; keep cuts monotonic
        let previous = bounds.last().copied().unwrap_or_default();
        bounds.push(snapped.max(previous));
    }
    bounds.push(total);

    Ok(bounds
        .into_iter()
        .tuple_windows()
        .filter(|(start, end)| start < end)
        .map(|(start, end)| start..end)
        .collect())
}
