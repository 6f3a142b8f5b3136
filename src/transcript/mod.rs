//! Transcript assembly: merges fragmented speech segments into readable,
//! speaker-attributed utterances and renders the final transcript text.
//!
//! The assembler is deterministic and runs in two passes: normalize every
//! segment (default missing speakers, trim text, derive a whole-second
//! timestamp), then walk the sequence once, folding short or unattributed
//! segments into the preceding retained segment.

pub mod vtt;

use crate::defaults;
use serde::{Deserialize, Serialize};

/// One recognized span of speech, as produced by the model gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (always after start)
    pub end: f64,
    /// Speaker label; None when diarization could not attribute the span
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, speaker: Option<&str>, text: &str) -> Self {
        Self {
            start,
            end,
            speaker: speaker.map(str::to_string),
            text: text.to_string(),
        }
    }
}

/// A normalized, possibly merged utterance.
///
/// Same shape as [`Segment`] plus the pre-formatted HH:MM:SS timestamp
/// derived from the truncated start time. The merge pass may extend `end`
/// and append to `text`; nothing else mutates after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedUtterance {
    pub start: f64,
    pub end: f64,
    pub timestamp: String,
    pub speaker: String,
    pub text: String,
}

/// Tuning for the merge pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Maximum gap (seconds) for a short segment to merge into its predecessor
    pub merge_threshold_seconds: f64,
    /// Maximum word count for a segment to count as "short"
    pub short_segment_word_count: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            merge_threshold_seconds: defaults::MERGE_THRESHOLD_SECONDS,
            short_segment_word_count: defaults::SHORT_SEGMENT_WORD_COUNT,
        }
    }
}

impl From<&crate::config::AssemblerConfig> for MergeConfig {
    fn from(cfg: &crate::config::AssemblerConfig) -> Self {
        Self {
            merge_threshold_seconds: cfg.merge_threshold_seconds,
            short_segment_word_count: cfg.short_segment_word_count,
        }
    }
}

/// Formats whole seconds as HH:MM:SS.
pub fn format_timestamp(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Normalizes raw segments: defaults absent speakers to UNKNOWN, trims
/// text, and derives the whole-second timestamp string.
pub fn normalize(segments: &[Segment]) -> Vec<MergedUtterance> {
    segments
        .iter()
        .map(|seg| MergedUtterance {
            start: seg.start,
            end: seg.end,
            timestamp: format_timestamp(seg.start.max(0.0) as u64),
            speaker: seg
                .speaker
                .clone()
                .unwrap_or_else(|| defaults::UNKNOWN_SPEAKER.to_string()),
            text: seg.text.trim().to_string(),
        })
        .collect()
}

/// Merge pass: folds short filler utterances and unattributed speech into
/// the preceding retained segment.
///
/// The first segment is always retained. A subsequent segment merges when
/// it starts within the threshold of the last retained end AND is at most
/// `short_segment_word_count` words long, or when its speaker is UNKNOWN.
/// Merging appends the text with a separating space and extends `end`.
pub fn merge(segments: Vec<MergedUtterance>, config: &MergeConfig) -> Vec<MergedUtterance> {
    let mut merged: Vec<MergedUtterance> = Vec::with_capacity(segments.len());

    for current in segments {
        let Some(prev) = merged.last_mut() else {
            merged.push(current);
            continue;
        };

        let gap = current.start - prev.end;
        let word_count = current.text.split_whitespace().count();
        let is_short_followup = gap < config.merge_threshold_seconds
            && word_count <= config.short_segment_word_count;

        if is_short_followup || current.speaker == defaults::UNKNOWN_SPEAKER {
            prev.text.push(' ');
            prev.text.push_str(&current.text);
            prev.end = current.end;
        } else {
            merged.push(current);
        }
    }

    merged
}

/// Renders the speaker-grouped transcript.
///
/// One line per speaker turn: `[HH:MM:SS] [speaker]: text...`. Consecutive
/// same-speaker segments are concatenated onto the current line; a new
/// line starts only when the speaker changes.
pub fn render_transcript(merged: &[MergedUtterance]) -> String {
    let Some(first) = merged.first() else {
        return defaults::EMPTY_TRANSCRIPT_MESSAGE.to_string();
    };

    let mut lines: Vec<String> = Vec::new();
    let mut current_speaker = first.speaker.clone();
    lines.push(format!("[{}] [{}]:", first.timestamp, current_speaker));

    for segment in merged {
        if segment.speaker == current_speaker {
            // Same turn: append text to the open line (this also places the
            // first segment's own text).
            let last = lines
                .last_mut()
                .expect("lines is seeded with the first turn header");
            last.push(' ');
            last.push_str(&segment.text);
        } else {
            lines.push(format!(
                "\n[{}] [{}]: {}",
                segment.timestamp, segment.speaker, segment.text
            ));
            current_speaker = segment.speaker.clone();
        }
    }

    lines.concat()
}

/// Full assembly: normalize, merge, render.
pub fn assemble_transcript(segments: &[Segment], config: &MergeConfig) -> String {
    render_transcript(&merge(normalize(segments), config))
}
