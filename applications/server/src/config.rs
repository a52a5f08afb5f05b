/// Server configuration
use crate::error::{Result, ServerError};
use elocute_pipeline::{minimum_max_age, ProtocolOptions, WaitStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_shared")]
    pub shared: SharedSettings,

    #[serde(default = "default_converter")]
    pub converter: ConverterSettings,

    #[serde(default = "default_analysis")]
    pub analysis: AnalysisSettings,

    #[serde(default = "default_sweeper")]
    pub sweeper: SweeperSettings,

    #[serde(default = "default_cors")]
    pub cors: CorsSettings,

    #[serde(default = "default_upload")]
    pub upload: UploadSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Directories exchanged with the analysis engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SharedSettings {
    /// Must match the engine's own root
    #[serde(default = "default_shared_root")]
    pub root: PathBuf,

    /// Private scratch space for conversion
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConverterSettings {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_timeout_intervals")]
    pub timeout_intervals: u32,

    #[serde(default)]
    pub wait_strategy: WaitStrategy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsSettings {
    /// `"*"` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl AnalysisSettings {
    pub fn protocol_options(&self) -> ProtocolOptions {
        ProtocolOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout_intervals: self.timeout_intervals,
            wait_strategy: self.wait_strategy,
        }
    }
}

impl SweeperSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl ServerConfig {
    /// Load configuration from file and environment.
    ///
    /// `path` defaults to `config.toml` in the working directory; a missing
    /// default file is not an error, a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables, e.g. ELOCUTE__SHARED__ROOT
        settings = settings.add_source(
            config::Environment::with_prefix("ELOCUTE")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config("server.port must be non-zero".to_string()));
        }

        if self.shared.root.as_os_str().is_empty() {
            return Err(ServerError::Config(
                "shared.root is required (set ELOCUTE__SHARED__ROOT)".to_string(),
            ));
        }

        if self.analysis.poll_interval_ms == 0 {
            return Err(ServerError::Config(
                "analysis.poll_interval_ms must be non-zero".to_string(),
            ));
        }

        if self.analysis.timeout_intervals == 0 {
            return Err(ServerError::Config(
                "analysis.timeout_intervals must be non-zero".to_string(),
            ));
        }

        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            return Err(ServerError::Config(
                "sweeper.interval_secs must be non-zero when the sweeper is enabled".to_string(),
            ));
        }

        if self.sweeper.enabled {
            let floor = minimum_max_age(&self.analysis.protocol_options());
            if self.sweeper.max_age() <= floor {
                return Err(ServerError::Config(format!(
                    "sweeper.max_age_secs ({}s) must exceed the analysis bound plus margin ({:?})",
                    self.sweeper.max_age_secs, floor
                )));
            }
        }

        if self.upload.max_bytes == 0 {
            return Err(ServerError::Config(
                "upload.max_bytes must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shared() -> SharedSettings {
    SharedSettings {
        root: default_shared_root(),
        staging_dir: default_staging_dir(),
    }
}

fn default_shared_root() -> PathBuf {
    PathBuf::from("/tmp/shared_data")
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("elocute-staging")
}

fn default_converter() -> ConverterSettings {
    ConverterSettings {
        ffmpeg_path: default_ffmpeg_path(),
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_analysis() -> AnalysisSettings {
    AnalysisSettings {
        poll_interval_ms: default_poll_interval_ms(),
        timeout_intervals: default_timeout_intervals(),
        wait_strategy: WaitStrategy::default(),
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_timeout_intervals() -> u32 {
    30
}

fn default_sweeper() -> SweeperSettings {
    SweeperSettings {
        enabled: default_enabled(),
        interval_secs: default_sweep_interval_secs(),
        max_age_secs: default_max_age_secs(),
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_age_secs() -> u64 {
    300
}

fn default_cors() -> CorsSettings {
    CorsSettings {
        allowed_origins: default_allowed_origins(),
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_upload() -> UploadSettings {
    UploadSettings {
        max_bytes: default_max_bytes(),
    }
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            shared: default_shared(),
            converter: default_converter(),
            analysis: default_analysis(),
            sweeper: default_sweeper(),
            cors: default_cors(),
            upload: default_upload(),
        }
    }
}
