//! Default configuration constants for scribed.
//!
//! Shared constants used across configuration types and job handlers to
//! ensure consistency and eliminate duplication.

/// Merge window for the transcript assembler, in seconds.
///
/// A segment starting within this many seconds of the previous retained
/// segment's end is a merge candidate. Folds short backchannel utterances
/// into the preceding speaker turn instead of creating spurious speaker
/// changes.
pub const MERGE_THRESHOLD_SECONDS: f64 = 2.0;

/// Maximum word count for a segment to be considered "short" by the merge
/// pass. Segments above this length always start their own entry unless
/// their speaker is unattributed.
pub const SHORT_SEGMENT_WORD_COUNT: usize = 3;

/// Speaker label used when diarization could not attribute a segment.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Transcript body emitted when a job produced no speech segments at all.
pub const EMPTY_TRANSCRIPT_MESSAGE: &str = "Nothing to transcribe.";

/// Default ASR model name.
pub const DEFAULT_MODEL: &str = "large-v3";

/// Default inference device.
pub const DEFAULT_DEVICE: &str = "cuda";

/// Default compute precision for the ASR model.
///
/// float16 halves model memory on GPU; use float32 on CPU.
pub const DEFAULT_COMPUTE_TYPE: &str = "float16";

/// Default language hint passed to the ASR model.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// Default ASR batch size.
pub const DEFAULT_BATCH_SIZE: u32 = 16;

/// Default minimum number of speakers hinted to the diarization model.
pub const DEFAULT_MIN_SPEAKERS: u32 = 2;

/// Default maximum number of speakers hinted to the diarization model.
pub const DEFAULT_MAX_SPEAKERS: u32 = 25;

/// Timeout for completion-callback HTTP requests, in seconds.
///
/// Callbacks are fire-and-forget: on timeout or error the failure is
/// logged and never retried.
pub const CALLBACK_TIMEOUT_SECS: u64 = 10;

/// Sample rate for extracted/converted audio in Hz.
///
/// 16kHz mono is what the speech models expect and what downstream STT
/// services (Clova, Google) accept.
pub const AUDIO_SAMPLE_RATE: u32 = 16000;

/// Bitrate for lossy (mp3) conversion output.
pub const MP3_BITRATE: &str = "192k";

/// Filename suffix for generated transcript/caption files.
///
/// `meeting.mp4` produces `meeting_whisper.txt` and `meeting_whisper.vtt`
/// next to the source file.
pub const OUTPUT_SUFFIX: &str = "_whisper";

/// Grace period for the worker to finish its in-flight job on shutdown,
/// in seconds. After the deadline the job is abandoned with the process.
pub const SHUTDOWN_GRACE_SECS: u64 = 2;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5001;
