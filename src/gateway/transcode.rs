//! ffmpeg-backed media transcoding.
//!
//! Every target format downmixes to mono at 16 kHz, matching what the
//! speech models expect. ffmpeg is invoked per job; only its stderr tail
//! survives into the error message.

use crate::defaults;
use crate::error::{Result, ScribedError};
use crate::gateway::Transcoder;
use crate::task::AudioFormat;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder;

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, source: &Path, output: &Path, format: AudioFormat) -> Result<()> {
        let mut command = Command::new("ffmpeg");
        command.arg("-i").arg(source);
        command.arg("-acodec").arg(format.codec());
        if format == AudioFormat::Mp3 {
            command.arg("-b:a").arg(defaults::MP3_BITRATE);
        }
        command
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg(defaults::AUDIO_SAMPLE_RATE.to_string())
            .arg("-y")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = command
            .output()
            .await
            .map_err(|e| ScribedError::MediaTranscodeFailed {
                message: format!("failed to run ffmpeg: {}", e),
            })?;

        if result.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr);
            // Keep the last lines; ffmpeg front-loads banner noise.
            let tail: Vec<&str> = stderr.lines().rev().take(4).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            Err(ScribedError::MediaTranscodeFailed {
                message: format!(
                    "ffmpeg exited with {}: {}",
                    result.status,
                    tail.join(" | ")
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_input_is_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("does-not-exist.mp4");
        let output = dir.path().join("out.wav");

        let transcoder = FfmpegTranscoder::new();
        let result = transcoder.transcode(&source, &output, AudioFormat::Wav).await;

        // Fails whether ffmpeg is absent or rejects the missing input
        assert!(matches!(
            result,
            Err(ScribedError::MediaTranscodeFailed { .. })
        ));
    }
}
