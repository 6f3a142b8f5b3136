//! In-memory result store for poll-mode jobs.
//!
//! Keyed by the caller-supplied job key. Entries live for the process
//! lifetime; a repeated key overwrites the earlier record (last write
//! wins). The store holds finished text, never file paths.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lifecycle record for one poll-mode job.
///
/// Serializes to the poll wire shape: `{"status": ..., "data": ...}` with
/// `data` null while processing, the rendered outputs on completion, and
/// the error text on failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum JobResult {
    Processing,
    Completed { txt: String, vtt: String },
    Failed(String),
}

impl Serialize for JobResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("JobResult", 2)?;
        match self {
            JobResult::Processing => {
                state.serialize_field("status", "processing")?;
                // Pollers see an explicit null until the job settles
                state.serialize_field("data", &())?;
            }
            JobResult::Completed { txt, vtt } => {
                #[derive(Serialize)]
                struct Outputs<'a> {
                    txt: &'a str,
                    vtt: &'a str,
                }
                state.serialize_field("status", "completed")?;
                state.serialize_field("data", &Outputs { txt, vtt })?;
            }
            JobResult::Failed(error) => {
                state.serialize_field("status", "failed")?;
                state.serialize_field("data", error)?;
            }
        }
        state.end()
    }
}

/// Shared handle to the poll-mode result map, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<Mutex<HashMap<String, JobResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a job was accepted and is queued or running.
    pub fn mark_processing(&self, key: &str) {
        self.insert(key, JobResult::Processing);
    }

    /// Records the finished transcript and caption track.
    pub fn complete(&self, key: &str, txt: String, vtt: String) {
        self.insert(key, JobResult::Completed { txt, vtt });
    }

    /// Records a terminal failure with its error text.
    pub fn fail(&self, key: &str, error: String) {
        self.insert(key, JobResult::Failed(error));
    }

    /// Current record for a key, if the key has ever been submitted.
    pub fn get(&self, key: &str) -> Option<JobResult> {
        self.inner.lock().expect("result store lock").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("result store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: &str, result: JobResult) {
        self.inner
            .lock()
            .expect("result store lock")
            .insert(key.to_string(), result);
    }
}
