use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use spindle::Tuning;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    #[strum(serialize = "layer", serialize = "overlay")]
    Layer,
    #[strum(serialize = "windowed", serialize = "window")]
    Windowed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Fast,
    #[default]
    Good,
    Best,
}

impl RenderQuality {
    pub fn filter(self) -> cairo::Filter {
        match self {
            Self::Fast => cairo::Filter::Fast,
            Self::Good => cairo::Filter::Good,
            Self::Best => cairo::Filter::Best,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub mode: WindowMode,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            mode: WindowMode::default(),
            width: 1600,
            height: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub quality: RenderQuality,
    pub wheel_step_px: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: RenderQuality::default(),
            wheel_step_px: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub manifest: Option<PathBuf>,
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub tuning: Tuning,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "troia", "rondo").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("RONDO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(environment())
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn parse_toml(text: &str) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(text, config::FileFormat::Toml))
        .build()?;
    Ok(s.try_deserialize()?)
}

pub fn load_or_setup() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Falling back to default config: {}", e);
            Config::default()
        }
    }
}

/// Writes the commented default file unless one is already there.
pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = get_config_path()?;
    if path.exists() {
        log::debug!("keeping existing config at {}", path.display());
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(&path, DEFAULT_CONFIG)?;
    log::info!("wrote default config to {}", path.display());
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// What a change to `path` means for the running app.
fn classify(path: &Path, config_path: &Path, manifest: Option<&Path>) -> Option<AppEvent> {
    if path == config_path {
        Some(AppEvent::ConfigReload)
    } else if manifest == Some(path) {
        Some(AppEvent::ManifestChanged)
    } else {
        None
    }
}

/// Watches the config file, and the manifest when there is one, until the
/// receiving side goes away.
pub async fn run_async_watcher(tx: Sender<AppEvent>, manifest: Option<PathBuf>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let Some(config_dir) = config_path.parent().map(Path::to_path_buf) else {
        return;
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    let dirs: BTreeSet<PathBuf> = std::iter::once(config_dir)
        .chain(manifest.as_deref().and_then(Path::parent).map(Path::to_path_buf))
        .collect();
    for dir in &dirs {
        if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
            log::error!("Failed to watch {}: {}", dir.display(), e);
        }
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );
                if !meaningful_event {
                    continue;
                }
                let reaction = event
                    .paths
                    .iter()
                    .find_map(|p| classify(p, &config_path, manifest.as_deref()));
                if let Some(app_event) = reaction
                    && tx.send(app_event).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
