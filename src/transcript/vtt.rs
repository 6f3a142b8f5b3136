//! WebVTT caption-track rendering.
//!
//! Captions are rendered from the original, unmerged segment list: one cue
//! per recognized segment, millisecond-precision timestamps, speaker label
//! inline in the cue text.

use crate::defaults;
use crate::transcript::Segment;

/// Formats seconds as a WebVTT timestamp (HH:MM:SS.mmm).
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds as u64;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;
    let millis = ((seconds - whole as f64) * 1000.0) as u64;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// Renders a WebVTT document with one cue per segment.
///
/// Empty input produces a bare, valid caption file (header only).
pub fn render_vtt(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "WEBVTT\n\n".to_string();
    }

    let mut lines: Vec<String> = vec!["WEBVTT".to_string(), String::new()];

    for segment in segments {
        let speaker = segment
            .speaker
            .as_deref()
            .unwrap_or(defaults::UNKNOWN_SPEAKER);

        lines.push(format!(
            "{} --> {}",
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end)
        ));
        lines.push(format!("<{}> {}", speaker, segment.text.trim()));
        // Blank line between cues
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    #[test]
    fn test_format_vtt_timestamp() {
        assert_eq!(format_vtt_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_vtt_timestamp(1.5), "00:00:01.500");
        assert_eq!(format_vtt_timestamp(61.042), "00:01:01.042");
        // Milliseconds truncate, never round; 3661.999 is not exactly
        // representable and sits just below .999
        assert_eq!(format_vtt_timestamp(3661.999), "01:01:01.998");
        assert_eq!(format_vtt_timestamp(3661.25), "01:01:01.250");
    }

    #[test]
    fn test_render_empty_is_bare_header() {
        assert_eq!(render_vtt(&[]), "WEBVTT\n\n");
    }

    #[test]
    fn test_render_single_cue() {
        let segments = vec![Segment::new(0.0, 1.5, Some("SPEAKER_01"), "Hello there")];
        let vtt = render_vtt(&segments);
        assert_eq!(
            vtt,
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\n<SPEAKER_01> Hello there\n"
        );
    }

    #[test]
    fn test_render_cue_count_equals_segment_count() {
        // Caption rendering is independent of the merge pass: every
        // original segment gets its own cue.
        let segments = vec![
            Segment::new(0.0, 1.0, Some("S1"), "Hello"),
            Segment::new(1.5, 1.8, None, "um"),
            Segment::new(2.0, 5.0, Some("S1"), "how are you"),
        ];
        let vtt = render_vtt(&segments);
        let cue_count = vtt.matches(" --> ").count();
        assert_eq!(cue_count, segments.len());
    }

    #[test]
    fn test_render_missing_speaker_uses_unknown_label() {
        let segments = vec![Segment::new(0.0, 1.0, None, "who said this")];
        let vtt = render_vtt(&segments);
        assert!(vtt.contains("<UNKNOWN> who said this"));
    }

    #[test]
    fn test_render_trims_cue_text() {
        let segments = vec![Segment::new(0.0, 1.0, Some("S1"), "  spaced out  ")];
        let vtt = render_vtt(&segments);
        assert!(vtt.contains("<S1> spaced out\n"));
    }
}
