//! Long-lived model-host sidecar process.
//!
//! The heavy speech models (ASR, alignment, diarization) live in a child
//! process that loads them once at startup and keeps them resident for the
//! process lifetime. Requests and responses are newline-delimited JSON on
//! the child's stdin/stdout. The channel is mutex-guarded; the worker is
//! the only caller, so requests never actually contend.

use crate::config::ModelConfig;
use crate::error::{Result, ScribedError};
use crate::gateway::{AlignModel, DiarizeModel, SpeakerSpan, SpeechModel};
use crate::task::DiarizeTuning;
use crate::transcript::Segment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Requests sent to the model host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SidecarRequest {
    /// Load all models; must be the first request.
    Load {
        model: String,
        device: String,
        compute_type: String,
    },
    Transcribe {
        audio: PathBuf,
        language: String,
        batch_size: u32,
    },
    Align {
        audio: PathBuf,
        segments: Vec<Segment>,
    },
    /// Mutate the diarization model's live tuning (last-write-wins).
    Configure {
        threshold: Option<f64>,
        min_nonspeech: Option<f64>,
    },
    Diarize {
        audio: PathBuf,
        min_speakers: u32,
        max_speakers: u32,
    },
}

/// Responses from the model host, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SidecarResponse {
    Ready,
    Ok,
    Segments { segments: Vec<Segment> },
    Spans { spans: Vec<SpeakerSpan> },
    Error { message: String },
}

struct Channel {
    // Held so the child is killed when the host drops
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Handle to the running model host. Implements the three model traits.
pub struct SidecarHost {
    model: String,
    channel: Mutex<Channel>,
}

impl SidecarHost {
    /// Spawns the sidecar and blocks until all models are resident.
    pub async fn spawn(config: &ModelConfig) -> Result<Self> {
        let mut child = Command::new(&config.sidecar_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScribedError::SidecarStartup {
                message: format!("failed to spawn '{}': {}", config.sidecar_command, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| ScribedError::SidecarStartup {
            message: "sidecar stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| ScribedError::SidecarStartup {
            message: "sidecar stdout unavailable".to_string(),
        })?;

        let host = Self {
            model: config.model.clone(),
            channel: Mutex::new(Channel {
                _child: child,
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
        };

        // Load handshake: the worker must not start until this completes.
        match host
            .request(&SidecarRequest::Load {
                model: config.model.clone(),
                device: config.device.clone(),
                compute_type: config.compute_type.clone(),
            })
            .await?
        {
            SidecarResponse::Ready => Ok(host),
            SidecarResponse::Error { message } => Err(ScribedError::SidecarStartup { message }),
            _ => Err(ScribedError::ModelNotLoaded {
                model: host.model.clone(),
            }),
        }
    }

    async fn request(&self, request: &SidecarRequest) -> Result<SidecarResponse> {
        let mut line = serde_json::to_string(request).map_err(|e| {
            ScribedError::SidecarProtocol {
                message: format!("request encode failed: {}", e),
            }
        })?;
        line.push('\n');

        let mut channel = self.channel.lock().await;
        channel.stdin.write_all(line.as_bytes()).await?;
        channel.stdin.flush().await?;

        let reply = channel
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| ScribedError::SidecarProtocol {
                message: "sidecar closed its stdout".to_string(),
            })?;

        serde_json::from_str(&reply).map_err(|e| ScribedError::SidecarProtocol {
            message: format!("bad response line: {} ({})", reply, e),
        })
    }

    /// Maps an Error response to ProcessingFailed with the original cause.
    fn unexpected(&self, response: SidecarResponse) -> ScribedError {
        match response {
            SidecarResponse::Error { message } => ScribedError::ProcessingFailed { message },
            other => ScribedError::SidecarProtocol {
                message: format!("unexpected response: {:?}", other),
            },
        }
    }
}

#[async_trait]
impl SpeechModel for SidecarHost {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
        batch_size: u32,
    ) -> Result<Vec<Segment>> {
        let response = self
            .request(&SidecarRequest::Transcribe {
                audio: audio.to_path_buf(),
                language: language.to_string(),
                batch_size,
            })
            .await?;
        match response {
            SidecarResponse::Segments { segments } => Ok(segments),
            other => Err(self.unexpected(other)),
        }
    }
}

#[async_trait]
impl AlignModel for SidecarHost {
    async fn align(&self, segments: Vec<Segment>, audio: &Path) -> Result<Vec<Segment>> {
        let response = self
            .request(&SidecarRequest::Align {
                audio: audio.to_path_buf(),
                segments,
            })
            .await?;
        match response {
            SidecarResponse::Segments { segments } => Ok(segments),
            other => Err(self.unexpected(other)),
        }
    }
}

#[async_trait]
impl DiarizeModel for SidecarHost {
    async fn configure(&self, tuning: &DiarizeTuning) -> Result<()> {
        let response = self
            .request(&SidecarRequest::Configure {
                threshold: tuning.threshold,
                min_nonspeech: tuning.min_nonspeech,
            })
            .await?;
        match response {
            SidecarResponse::Ok => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    async fn diarize(
        &self,
        audio: &Path,
        min_speakers: u32,
        max_speakers: u32,
    ) -> Result<Vec<SpeakerSpan>> {
        let response = self
            .request(&SidecarRequest::Diarize {
                audio: audio.to_path_buf(),
                min_speakers,
                max_speakers,
            })
            .await?;
        match response {
            SidecarResponse::Spans { spans } => Ok(spans),
            other => Err(self.unexpected(other)),
        }
    }
}
