use crate::defaults;
use crate::error::{Result, ScribedError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelConfig,
    pub callbacks: CallbackConfig,
    pub assembler: AssemblerConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Model loading configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub device: String,
    pub compute_type: String,
    pub language: String,
    pub batch_size: u32,
    /// Command used to spawn the model-host sidecar process
    pub sidecar_command: String,
}

/// Completion callback configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CallbackConfig {
    /// Endpoint notified when a transcription job finishes
    pub speaker_url: String,
    /// Endpoint notified when a conversion job finishes
    pub audio_url: String,
    pub timeout_secs: u64,
}

/// Transcript assembler tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssemblerConfig {
    pub merge_threshold_seconds: f64,
    pub short_segment_word_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::DEFAULT_PORT,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            device: defaults::DEFAULT_DEVICE.to_string(),
            compute_type: defaults::DEFAULT_COMPUTE_TYPE.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            sidecar_command: "scribed-models".to_string(),
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            speaker_url: "http://127.0.0.1/speaker_success.php".to_string(),
            audio_url: "http://127.0.0.1/audio_success.php".to_string(),
            timeout_secs: defaults::CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            merge_threshold_seconds: defaults::MERGE_THRESHOLD_SECONDS,
            short_segment_word_count: defaults::SHORT_SEGMENT_WORD_COUNT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribedError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScribedError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file
    /// doesn't exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ScribedError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SCRIBED_MODEL → models.model
    /// - SCRIBED_DEVICE → models.device
    /// - SCRIBED_LANGUAGE → models.language
    /// - SCRIBED_SPEAKER_CALLBACK_URL → callbacks.speaker_url
    /// - SCRIBED_AUDIO_CALLBACK_URL → callbacks.audio_url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SCRIBED_MODEL")
            && !model.is_empty()
        {
            self.models.model = model;
        }

        if let Ok(device) = std::env::var("SCRIBED_DEVICE")
            && !device.is_empty()
        {
            self.models.device = device;
        }

        if let Ok(language) = std::env::var("SCRIBED_LANGUAGE")
            && !language.is_empty()
        {
            self.models.language = language;
        }

        if let Ok(url) = std::env::var("SCRIBED_SPEAKER_CALLBACK_URL")
            && !url.is_empty()
        {
            self.callbacks.speaker_url = url;
        }

        if let Ok(url) = std::env::var("SCRIBED_AUDIO_CALLBACK_URL")
            && !url.is_empty()
        {
            self.callbacks.audio_url = url;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/scribed/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("scribed")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_scribed_env() {
        remove_env("SCRIBED_MODEL");
        remove_env("SCRIBED_DEVICE");
        remove_env("SCRIBED_LANGUAGE");
        remove_env("SCRIBED_SPEAKER_CALLBACK_URL");
        remove_env("SCRIBED_AUDIO_CALLBACK_URL");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.models.model, "large-v3");
        assert_eq!(config.models.device, "cuda");
        assert_eq!(config.models.compute_type, "float16");
        assert_eq!(config.models.batch_size, 16);
        assert_eq!(config.callbacks.timeout_secs, 10);
        assert_eq!(config.assembler.merge_threshold_seconds, 2.0);
        assert_eq!(config.assembler.short_segment_word_count, 3);
    }

    #[test]
    fn test_load_full_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[models]
model = "medium"
device = "cpu"
compute_type = "float32"
language = "en"

[callbacks]
speaker_url = "http://cms.local/speaker_done"
timeout_secs = 5

[assembler]
merge_threshold_seconds = 1.5
short_segment_word_count = 5
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.models.model, "medium");
        assert_eq!(config.models.device, "cpu");
        assert_eq!(config.models.compute_type, "float32");
        assert_eq!(config.models.language, "en");
        assert_eq!(config.callbacks.speaker_url, "http://cms.local/speaker_done");
        assert_eq!(config.callbacks.timeout_secs, 5);
        assert_eq!(config.assembler.merge_threshold_seconds, 1.5);
        assert_eq!(config.assembler.short_segment_word_count, 5);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[models]
model = "small"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.models.model, "small");
        // Everything else falls back to defaults
        assert_eq!(config.models.device, "cuda");
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.assembler.merge_threshold_seconds, 2.0);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not = valid [ toml").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ScribedError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_not_found_error() {
        assert!(matches!(
            Config::load(Path::new("/nonexistent/scribed.toml")),
            Err(ScribedError::ConfigFileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/scribed.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not [ valid").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_scribed_env();

        set_env("SCRIBED_MODEL", "medium");
        set_env("SCRIBED_LANGUAGE", "en");
        set_env("SCRIBED_SPEAKER_CALLBACK_URL", "http://cms/ok");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.models.model, "medium");
        assert_eq!(config.models.language, "en");
        assert_eq!(config.callbacks.speaker_url, "http://cms/ok");
        // Untouched fields keep defaults
        assert_eq!(config.models.device, "cuda");

        clear_scribed_env();
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_scribed_env();

        set_env("SCRIBED_MODEL", "");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.models.model, "large-v3");

        clear_scribed_env();
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
