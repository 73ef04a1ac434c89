use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Stageboard
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StageboardConfig {
    /// Shared board document
    pub board: BoardConfig,
    /// Display client polling settings
    pub poller: PollerConfig,
    /// Sound and speech commands
    pub audio: AudioConfig,
    /// Client identity
    pub client: ClientConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Path of the JSON board file
    pub path: PathBuf,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".stageboard/board.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between ticks
    pub interval_ms: u64,
    /// How long an item alert stays up
    pub alert_lifetime_secs: u64,
    /// Source failure warnings logged per minute before suppressing
    pub failure_logs_per_minute: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            alert_lifetime_secs: 8,
            failure_logs_per_minute: 6,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn alert_lifetime(&self) -> Duration {
        Duration::from_secs(self.alert_lifetime_secs)
    }
}

/// Audio is never switched on from here; only `watch --audio` opens the gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Pause between tone and speech
    pub speech_delay_ms: u64,
    /// Command that speaks text given as its last argument
    pub speech_command: Vec<String>,
    /// Command that plays a sound file given as its last argument
    pub player_command: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            speech_delay_ms: 700,
            speech_command: vec!["espeak".to_string()],
            player_command: vec!["aplay".to_string(), "-q".to_string()],
        }
    }
}

impl AudioConfig {
    pub fn speech_delay(&self) -> Duration {
        Duration::from_millis(self.speech_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Display client id (defaults to the hostname)
    pub id: Option<String>,
}

impl ClientConfig {
    pub fn resolved_id(&self) -> String {
        self.id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(default_client_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Log poll metrics when a client stops
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
            metrics_enabled: true,
        }
    }
}

impl StageboardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (stageboard.toml, .stageboard-rc)
    /// 3. Environment variables (prefixed with STAGEBOARD_)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`StageboardConfig::load`] with files looked up in `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_file = dir.join("stageboard.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".stageboard-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        // STAGEBOARD_POLLER__INTERVAL_MS=500
        builder = builder.add_source(
            Environment::with_prefix("STAGEBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Hostname of this machine, or "display" when it cannot be read.
pub fn default_client_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "display".to_string())
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<StageboardConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = StageboardConfig::load_env_file();
        StageboardConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static StageboardConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
