//! Completion callbacks to the originating CMS.
//!
//! File-mode jobs announce their outcome with a single GET request whose
//! query string carries the job key, the output path, and (on failure) the
//! error text. The request is fire-and-forget with a short timeout; a
//! failed delivery is the caller's problem to log, never the job's.

use crate::error::{Result, ScribedError};
use std::path::Path;
use std::time::Duration;

/// HTTP client wrapper for completion callbacks.
#[derive(Debug, Clone)]
pub struct CallbackNotifier {
    client: reqwest::Client,
}

impl CallbackNotifier {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScribedError::CallbackDeliveryFailed {
                message: format!("failed to build callback client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Announces a successful job: `?key=...&path=...` plus any extras.
    pub async fn notify_success(
        &self,
        url: &str,
        key: &str,
        path: &Path,
        extra: &[(&str, &str)],
    ) -> Result<()> {
        let mut params: Vec<(&str, String)> = vec![
            ("key", key.to_string()),
            ("path", path.to_string_lossy().into_owned()),
        ];
        for (name, value) in extra {
            params.push((name, value.to_string()));
        }
        self.get(url, &params).await
    }

    /// Announces a failed job: `?key=...&path=...&error=...` plus any
    /// extras.
    pub async fn notify_failure(
        &self,
        url: &str,
        key: &str,
        path: &Path,
        error: &str,
        extra: &[(&str, &str)],
    ) -> Result<()> {
        let mut params: Vec<(&str, String)> = vec![
            ("key", key.to_string()),
            ("path", path.to_string_lossy().into_owned()),
            ("error", error.to_string()),
        ];
        for (name, value) in extra {
            params.push((name, value.to_string()));
        }
        self.get(url, &params).await
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<()> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ScribedError::CallbackDeliveryFailed {
                message: format!("GET {} failed: {}", url, e),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ScribedError::CallbackDeliveryFailed {
                message: format!("GET {} returned {}", url, response.status()),
            })
        }
    }
}
