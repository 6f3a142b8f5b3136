//! Task descriptors for the job queue.
//!
//! A [`Task`] identifies one unit of work. It is created by the request
//! layer, immutable once enqueued, and consumed exactly once by the worker.

pub mod queue;

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One unit of work, dispatched by variant in the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// Transcribe with speaker attribution
    Diarize(DiarizeTask),
    /// Convert a media file to an audio format
    Convert(ConvertTask),
}

impl Task {
    /// Caller-supplied job key; doubles as the output-record key.
    pub fn key(&self) -> &str {
        match self {
            Task::Diarize(task) => &task.key,
            Task::Convert(task) => &task.key,
        }
    }
}

/// Parameters for a speaker-attributed transcription job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizeTask {
    pub key: String,
    /// Source media file (video or audio)
    pub source: PathBuf,
    pub model: String,
    pub device: String,
    pub compute_type: String,
    /// true: write transcript/captions to disk and notify the callback URL;
    /// false: deliver through the in-memory result store
    pub save_to_file: bool,
    pub tuning: DiarizeTuning,
}

impl DiarizeTask {
    /// Transcript output path: `<stem>_whisper.txt` next to the source.
    pub fn transcript_path(&self) -> PathBuf {
        self.output_path("txt")
    }

    /// Caption-track output path: `<stem>_whisper.vtt` next to the source.
    pub fn captions_path(&self) -> PathBuf {
        self.output_path("vtt")
    }

    /// Intermediate extracted-audio path, removed after the job finishes.
    pub fn working_audio_path(&self) -> PathBuf {
        self.source.with_extension("wav")
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.source
            .with_file_name(format!("{}{}.{}", stem, defaults::OUTPUT_SUFFIX, extension))
    }
}

/// Diarization tuning overrides, applied to the loaded model before each
/// invocation. Absent fields keep the model's current configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiarizeTuning {
    /// Clustering threshold override
    pub threshold: Option<f64>,
    /// Minimum non-speech duration override, in seconds
    pub min_nonspeech: Option<f64>,
    pub min_speakers: Option<u32>,
    pub max_speakers: Option<u32>,
}

impl DiarizeTuning {
    pub fn min_speakers_or_default(&self) -> u32 {
        self.min_speakers.unwrap_or(defaults::DEFAULT_MIN_SPEAKERS)
    }

    pub fn max_speakers_or_default(&self) -> u32 {
        self.max_speakers.unwrap_or(defaults::DEFAULT_MAX_SPEAKERS)
    }
}

/// Parameters for an audio-conversion job. Always delivered via
/// file + callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertTask {
    pub key: String,
    pub source: PathBuf,
    pub format: AudioFormat,
}

impl ConvertTask {
    /// Conversion output path: source with the target extension.
    pub fn output_path(&self) -> PathBuf {
        self.source.with_extension(self.format.extension())
    }
}

/// Supported conversion targets, each with fixed encoder settings
/// (mono, 16 kHz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// libmp3lame at 192k
    Mp3,
    /// 16-bit PCM
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    /// ffmpeg audio codec name for this target.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Wav => "pcm_s16le",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            other => Err(format!("unsupported audio format: {}", other)),
        }
    }
}
