//! Model and transcoder gateway.
//!
//! Thin adapter over the external speech models and the media transcoder.
//! All models are loaded exactly once at startup into a [`ModelRegistry`]
//! that is passed by reference into the worker; nothing else touches the
//! loaded models. Traits at the seams allow swapping implementations
//! (real sidecar/ffmpeg vs mocks).

pub mod sidecar;
pub mod transcode;

use crate::config::ModelConfig;
use crate::error::{Result, ScribedError};
use crate::task::{AudioFormat, DiarizeTuning};
use crate::transcript::Segment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One speaker-labeled time span from the diarization model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSpan {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

/// Speech recognition: audio in, time-stamped text segments out
/// (no speaker labels).
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
        batch_size: u32,
    ) -> Result<Vec<Segment>>;
}

/// Timestamp alignment: refines segment timings against the audio.
/// Always invoked after transcription; output has the same shape.
#[async_trait]
pub trait AlignModel: Send + Sync {
    async fn align(&self, segments: Vec<Segment>, audio: &Path) -> Result<Vec<Segment>>;
}

/// Speaker diarization.
///
/// `configure` mutates the loaded model's live tuning (last-write-wins)
/// and must be called before `diarize`. Safe only because the worker is
/// the sole caller; if this is ever parallelized the tuning must become a
/// per-invocation parameter instead.
#[async_trait]
pub trait DiarizeModel: Send + Sync {
    async fn configure(&self, tuning: &DiarizeTuning) -> Result<()>;

    async fn diarize(
        &self,
        audio: &Path,
        min_speakers: u32,
        max_speakers: u32,
    ) -> Result<Vec<SpeakerSpan>>;
}

/// Media transcoding to mono 16 kHz audio with fixed per-format encoder
/// settings.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, source: &Path, output: &Path, format: AudioFormat) -> Result<()>;
}

/// The loaded models and transcoder, created once at process startup.
#[derive(Clone)]
pub struct ModelRegistry {
    pub asr: Arc<dyn SpeechModel>,
    pub aligner: Arc<dyn AlignModel>,
    pub diarizer: Arc<dyn DiarizeModel>,
    pub transcoder: Arc<dyn Transcoder>,
}

impl ModelRegistry {
    pub fn new(
        asr: Arc<dyn SpeechModel>,
        aligner: Arc<dyn AlignModel>,
        diarizer: Arc<dyn DiarizeModel>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            asr,
            aligner,
            diarizer,
            transcoder,
        }
    }

    /// Loads all models synchronously via the sidecar host. The server
    /// must not start the worker until this returns.
    pub async fn load(config: &ModelConfig) -> Result<Self> {
        let host = Arc::new(sidecar::SidecarHost::spawn(config).await?);
        Ok(Self {
            asr: host.clone(),
            aligner: host.clone(),
            diarizer: host,
            transcoder: Arc::new(transcode::FfmpegTranscoder::new()),
        })
    }
}

/// Joins diarized speaker spans onto aligned segments by temporal overlap.
///
/// Each segment takes the speaker of the span it overlaps the most;
/// segments overlapping no span keep no label (rendered as UNKNOWN
/// downstream).
pub fn assign_speakers(spans: &[SpeakerSpan], segments: Vec<Segment>) -> Vec<Segment> {
    segments
        .into_iter()
        .map(|mut segment| {
            let mut best: Option<(&SpeakerSpan, f64)> = None;
            for span in spans {
                let overlap = span.end.min(segment.end) - span.start.max(segment.start);
                if overlap > 0.0 && best.map(|(_, b)| overlap > b).unwrap_or(true) {
                    best = Some((span, overlap));
                }
            }
            if let Some((span, _)) = best {
                segment.speaker = Some(span.speaker.clone());
            }
            segment
        })
        .collect()
}

// ── Mock implementations for tests ───────────────────────────────────────

/// Mock speech model returning canned segments.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechModel {
    segments: Vec<Segment>,
    should_fail: bool,
}

impl MockSpeechModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl SpeechModel for MockSpeechModel {
    async fn transcribe(
        &self,
        _audio: &Path,
        _language: &str,
        _batch_size: u32,
    ) -> Result<Vec<Segment>> {
        if self.should_fail {
            Err(ScribedError::ProcessingFailed {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.segments.clone())
        }
    }
}

/// Mock aligner that passes segments through unchanged.
#[derive(Debug, Clone, Default)]
pub struct MockAlignModel {
    should_fail: bool,
}

impl MockAlignModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl AlignModel for MockAlignModel {
    async fn align(&self, segments: Vec<Segment>, _audio: &Path) -> Result<Vec<Segment>> {
        if self.should_fail {
            Err(ScribedError::ProcessingFailed {
                message: "mock alignment failure".to_string(),
            })
        } else {
            Ok(segments)
        }
    }
}

/// Mock diarizer returning canned spans and recording applied tunings.
#[derive(Debug, Default)]
pub struct MockDiarizeModel {
    spans: Vec<SpeakerSpan>,
    should_fail: bool,
    configured: std::sync::Mutex<Vec<DiarizeTuning>>,
}

impl MockDiarizeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spans(mut self, spans: Vec<SpeakerSpan>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Tunings applied via `configure`, in call order.
    pub fn configured_tunings(&self) -> Vec<DiarizeTuning> {
        self.configured.lock().expect("tuning lock").clone()
    }
}

#[async_trait]
impl DiarizeModel for MockDiarizeModel {
    async fn configure(&self, tuning: &DiarizeTuning) -> Result<()> {
        self.configured
            .lock()
            .expect("tuning lock")
            .push(tuning.clone());
        Ok(())
    }

    async fn diarize(
        &self,
        _audio: &Path,
        _min_speakers: u32,
        _max_speakers: u32,
    ) -> Result<Vec<SpeakerSpan>> {
        if self.should_fail {
            Err(ScribedError::ProcessingFailed {
                message: "mock diarization failure".to_string(),
            })
        } else {
            Ok(self.spans.clone())
        }
    }
}

/// Mock transcoder that creates an empty output file (so cleanup paths
/// behave like the real thing) and records its calls.
#[derive(Debug, Default)]
pub struct MockTranscoder {
    should_fail: bool,
    calls: std::sync::Mutex<Vec<(std::path::PathBuf, AudioFormat)>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> Vec<(std::path::PathBuf, AudioFormat)> {
        self.calls.lock().expect("call lock").clone()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, _source: &Path, output: &Path, format: AudioFormat) -> Result<()> {
        if self.should_fail {
            return Err(ScribedError::MediaTranscodeFailed {
                message: "mock transcode failure".to_string(),
            });
        }
        tokio::fs::write(output, b"").await?;
        self.calls
            .lock()
            .expect("call lock")
            .push((output.to_path_buf(), format));
        Ok(())
    }
}

/// Registry wired entirely with mocks; the common test starting point.
pub fn mock_registry() -> ModelRegistry {
    ModelRegistry::new(
        Arc::new(MockSpeechModel::new()),
        Arc::new(MockAlignModel::new()),
        Arc::new(MockDiarizeModel::new()),
        Arc::new(MockTranscoder::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64, speaker: &str) -> SpeakerSpan {
        SpeakerSpan {
            start,
            end,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn test_assign_speakers_by_overlap() {
        let spans = vec![span(0.0, 2.0, "SPEAKER_00"), span(2.0, 5.0, "SPEAKER_01")];
        let segments = vec![
            Segment::new(0.2, 1.5, None, "hello"),
            Segment::new(2.5, 4.0, None, "hi there"),
        ];

        let labeled = assign_speakers(&spans, segments);
        assert_eq!(labeled[0].speaker.as_deref(), Some("SPEAKER_00"));
        assert_eq!(labeled[1].speaker.as_deref(), Some("SPEAKER_01"));
    }

    #[test]
    fn test_assign_speakers_picks_largest_overlap() {
        let spans = vec![span(0.0, 1.0, "SPEAKER_00"), span(1.0, 5.0, "SPEAKER_01")];
        // Overlaps SPEAKER_00 for 0.5s and SPEAKER_01 for 2.0s
        let segments = vec![Segment::new(0.5, 3.0, None, "crossing")];

        let labeled = assign_speakers(&spans, segments);
        assert_eq!(labeled[0].speaker.as_deref(), Some("SPEAKER_01"));
    }

    #[test]
    fn test_assign_speakers_no_overlap_leaves_unlabeled() {
        let spans = vec![span(10.0, 12.0, "SPEAKER_00")];
        let segments = vec![Segment::new(0.0, 1.0, None, "orphan")];

        let labeled = assign_speakers(&spans, segments);
        assert!(labeled[0].speaker.is_none());
    }

    #[test]
    fn test_assign_speakers_touching_spans_do_not_count() {
        // A span ending exactly where the segment starts has zero overlap
        let spans = vec![span(0.0, 1.0, "SPEAKER_00")];
        let segments = vec![Segment::new(1.0, 2.0, None, "after")];

        let labeled = assign_speakers(&spans, segments);
        assert!(labeled[0].speaker.is_none());
    }

    #[test]
    fn test_assign_speakers_empty_spans() {
        let segments = vec![Segment::new(0.0, 1.0, None, "a")];
        let labeled = assign_speakers(&[], segments);
        assert_eq!(labeled.len(), 1);
        assert!(labeled[0].speaker.is_none());
    }

    #[tokio::test]
    async fn test_mock_speech_model_returns_segments() {
        let model =
            MockSpeechModel::new().with_segments(vec![Segment::new(0.0, 1.0, None, "hello")]);
        let segments = model
            .transcribe(Path::new("/tmp/a.wav"), "en", 16)
            .await
            .unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hello");
    }

    #[tokio::test]
    async fn test_mock_speech_model_failure() {
        let model = MockSpeechModel::new().with_failure();
        let result = model.transcribe(Path::new("/tmp/a.wav"), "en", 16).await;
        match result {
            Err(ScribedError::ProcessingFailed { message }) => {
                assert_eq!(message, "mock transcription failure");
            }
            other => panic!("expected ProcessingFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_mock_diarizer_records_configured_tunings() {
        let model = MockDiarizeModel::new();
        let tuning = DiarizeTuning {
            threshold: Some(0.7),
            ..Default::default()
        };
        model.configure(&tuning).await.unwrap();
        model.diarize(Path::new("/tmp/a.wav"), 2, 25).await.unwrap();

        let applied = model.configured_tunings();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].threshold, Some(0.7));
    }

    #[tokio::test]
    async fn test_mock_transcoder_creates_output_and_records_call() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.wav");

        let transcoder = MockTranscoder::new();
        transcoder
            .transcode(Path::new("/tmp/in.mp4"), &output, AudioFormat::Wav)
            .await
            .unwrap();

        assert!(output.exists());
        let calls = transcoder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, AudioFormat::Wav);
    }

    #[tokio::test]
    async fn test_mock_transcoder_failure_is_transcode_error() {
        let transcoder = MockTranscoder::new().with_failure();
        let result = transcoder
            .transcode(
                Path::new("/tmp/in.mp4"),
                Path::new("/tmp/out.wav"),
                AudioFormat::Mp3,
            )
            .await;
        assert!(matches!(
            result,
            Err(ScribedError::MediaTranscodeFailed { .. })
        ));
    }

    #[test]
    fn test_mock_registry_builds() {
        let registry = mock_registry();
        // All four seams are populated
        let _ = registry.clone();
    }
}
