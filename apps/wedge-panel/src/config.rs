//! Panel configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/wedge/panel.toml`
//! - Windows: `%APPDATA%/wedge/panel.toml`
//!
//! `--config <path>` on the command line points at another file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub obs: ObsConfig,

    #[serde(default)]
    pub spotify: SpotifyConfig,

    #[serde(default)]
    pub volume: VolumeConfig,

    /// Scene buttons, in display order.
    #[serde(default = "default_scenes")]
    pub scenes: Vec<SceneButton>,
}

/// OBS WebSocket endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct ObsConfig {
    #[serde(default = "default_obs_url")]
    pub url: String,

    /// Empty when OBS authentication is disabled.
    #[serde(default)]
    pub password: String,
}

/// Spotify application credentials and endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub refresh_token: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Quiet window before a dragged value is sent.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Slider position at startup.
    #[serde(default = "default_initial_volume")]
    pub initial: u8,
}

/// One scene button: the label shown and the OBS scene it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneButton {
    pub label: String,
    pub scene: String,
}

fn default_obs_url() -> String {
    "ws://127.0.0.1:4455".into()
}

fn default_token_url() -> String {
    wedge_spotify::auth::DEFAULT_TOKEN_URL.into()
}

fn default_api_base_url() -> String {
    wedge_spotify::client::DEFAULT_API_BASE_URL.into()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_initial_volume() -> u8 {
    50
}

fn default_scenes() -> Vec<SceneButton> {
    (1..=6)
        .map(|n| SceneButton {
            label: format!("OBS Scene {n}"),
            scene: format!("Scene {n}"),
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            obs: ObsConfig::default(),
            spotify: SpotifyConfig::default(),
            volume: VolumeConfig::default(),
            scenes: default_scenes(),
        }
    }
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            url: default_obs_url(),
            password: String::new(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            initial: default_initial_volume(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ObsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObsConfig")
            .field("url", &self.url)
            .field("password_set", &!self.password.is_empty())
            .finish()
    }
}

impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from `path`, or writes and returns the defaults
    /// if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.volume.initial = config.volume.initial.min(100);
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Holds the OBS password and Spotify secrets.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Resolves the configuration path from the command line arguments
/// (program name excluded).
pub fn path_from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<PathBuf> {
    match args.next().as_deref() {
        None => config_path(),
        Some("--config") => match args.next() {
            Some(path) => Ok(PathBuf::from(path)),
            None => anyhow::bail!("--config requires a path"),
        },
        Some(other) => anyhow::bail!("unknown argument: {other}"),
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("wedge")
            .join("panel.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("wedge").join("panel.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/wedge/panel.toml"))
    }
}
