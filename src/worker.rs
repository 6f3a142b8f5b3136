//! The single background worker.
//!
//! Exactly one worker drains the job queue, so jobs never run concurrently
//! and completion order matches enqueue order. A job failure is contained
//! to that job: the error is delivered through the job's own channel
//! (callback or poll store) and the loop moves on.

use crate::config::Config;
use crate::delivery::{CallbackNotifier, ResultStore};
use crate::error::Result;
use crate::gateway::{assign_speakers, ModelRegistry};
use crate::task::{queue::JobConsumer, AudioFormat, ConvertTask, DiarizeTask, Task};
use crate::transcript::{assemble_transcript, vtt::render_vtt, MergeConfig};
use tokio::sync::watch;

pub struct Worker {
    registry: ModelRegistry,
    store: ResultStore,
    notifier: CallbackNotifier,
    config: Config,
    quiet: bool,
}

impl Worker {
    pub fn new(
        registry: ModelRegistry,
        store: ResultStore,
        config: Config,
        quiet: bool,
    ) -> Result<Self> {
        let notifier = CallbackNotifier::new(config.callbacks.timeout_secs)?;
        Ok(Self {
            registry,
            store,
            notifier,
            config,
            quiet,
        })
    }

    fn log(&self, message: &str) {
        if !self.quiet {
            eprintln!("scribed: {}", message);
        }
    }

    /// Drains the queue until every producer is gone or shutdown is
    /// signaled. The job in flight always runs to completion.
    pub async fn run(self, mut consumer: JobConsumer, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                task = consumer.recv() => {
                    match task {
                        Some(task) => self.process(task).await,
                        None => break,
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        self.log("worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Runs one job end to end, including result delivery. Never returns
    /// an error; failures are delivered through the job's channel.
    pub async fn process(&self, task: Task) {
        match task {
            Task::Diarize(task) => self.process_diarize(task).await,
            Task::Convert(task) => self.process_convert(task).await,
        }
    }

    async fn process_diarize(&self, task: DiarizeTask) {
        self.log(&format!(
            "transcribing {} (key {})",
            task.source.display(),
            task.key
        ));

        let outcome = self.diarize_pipeline(&task).await;

        // The extracted audio is intermediate on both outcomes
        let _ = tokio::fs::remove_file(task.working_audio_path()).await;

        match outcome {
            Ok((txt, vtt)) => {
                self.log(&format!("job {} completed", task.key));
                if task.save_to_file {
                    self.deliver_files(&task, &txt, &vtt).await;
                } else {
                    self.store.complete(&task.key, txt, vtt);
                }
            }
            Err(e) => {
                let error = e.to_string();
                self.log(&format!("job {} failed: {}", task.key, error));
                if task.save_to_file {
                    // The transcript file carries the error text so the CMS
                    // has something to show alongside the callback.
                    if let Err(write_err) =
                        tokio::fs::write(task.transcript_path(), &error).await
                    {
                        self.log(&format!(
                            "job {}: could not write error transcript: {}",
                            task.key, write_err
                        ));
                    }
                    if let Err(cb_err) = self
                        .notifier
                        .notify_failure(
                            &self.config.callbacks.speaker_url,
                            &task.key,
                            &task.transcript_path(),
                            &error,
                            &[],
                        )
                        .await
                    {
                        self.log(&format!("job {}: {}", task.key, cb_err));
                    }
                } else {
                    self.store.fail(&task.key, error);
                }
            }
        }
    }

    /// Transcode, transcribe, align, diarize, assemble. Returns the
    /// rendered transcript and caption track.
    async fn diarize_pipeline(&self, task: &DiarizeTask) -> Result<(String, String)> {
        let audio = task.working_audio_path();
        self.registry
            .transcoder
            .transcode(&task.source, &audio, AudioFormat::Wav)
            .await?;

        let segments = self
            .registry
            .asr
            .transcribe(
                &audio,
                &self.config.models.language,
                self.config.models.batch_size,
            )
            .await?;
        let aligned = self.registry.aligner.align(segments, &audio).await?;

        self.registry.diarizer.configure(&task.tuning).await?;
        let spans = self
            .registry
            .diarizer
            .diarize(
                &audio,
                task.tuning.min_speakers_or_default(),
                task.tuning.max_speakers_or_default(),
            )
            .await?;

        let labeled = assign_speakers(&spans, aligned);
        let merge_config = MergeConfig::from(&self.config.assembler);
        let txt = assemble_transcript(&labeled, &merge_config);
        let vtt = render_vtt(&labeled);
        Ok((txt, vtt))
    }

    async fn deliver_files(&self, task: &DiarizeTask, txt: &str, vtt: &str) {
        let transcript_path = task.transcript_path();
        let written = async {
            tokio::fs::write(&transcript_path, txt).await?;
            tokio::fs::write(task.captions_path(), vtt).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        // The CMS must hear about the job either way: a write failure on a
        // finished job becomes a failure callback.
        let callback = match written {
            Ok(()) => {
                self.notifier
                    .notify_success(
                        &self.config.callbacks.speaker_url,
                        &task.key,
                        &transcript_path,
                        &[],
                    )
                    .await
            }
            Err(e) => {
                let error = crate::error::ScribedError::Io(e).to_string();
                self.log(&format!(
                    "job {}: could not write outputs: {}",
                    task.key, error
                ));
                self.notifier
                    .notify_failure(
                        &self.config.callbacks.speaker_url,
                        &task.key,
                        &transcript_path,
                        &error,
                        &[],
                    )
                    .await
            }
        };
        if let Err(e) = callback {
            self.log(&format!("job {}: {}", task.key, e));
        }
    }

    async fn process_convert(&self, task: ConvertTask) {
        self.log(&format!(
            "converting {} to {} (key {})",
            task.source.display(),
            task.format,
            task.key
        ));

        let output = task.output_path();
        let outcome = self
            .registry
            .transcoder
            .transcode(&task.source, &output, task.format)
            .await;

        let callback = match outcome {
            Ok(()) => {
                self.log(&format!("job {} completed", task.key));
                self.notifier
                    .notify_success(
                        &self.config.callbacks.audio_url,
                        &task.key,
                        &output,
                        &[("type", task.format.extension())],
                    )
                    .await
            }
            Err(e) => {
                let error = e.to_string();
                self.log(&format!("job {} failed: {}", task.key, error));
                self.notifier
                    .notify_failure(
                        &self.config.callbacks.audio_url,
                        &task.key,
                        &output,
                        &error,
                        &[("type", task.format.extension())],
                    )
                    .await
            }
        };

        if let Err(e) = callback {
            self.log(&format!("job {}: {}", task.key, e));
        }
    }
}
