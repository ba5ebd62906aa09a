use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CONFIG_DIR: &str = ".config/padlink";
const CONFIG_FILE: &str = "config.toml";

/// Settings the gamepad subsystem reads and reacts to
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct JoystickSettings {
    /// Device to use, negative means first available
    pub preferred_device: i32,

    /// Fraction of the axis range a trigger must exceed to count as pressed
    pub press_threshold: f32,

    /// Fraction of the axis range reported as zero
    pub deadzone: f32,

    /// Backend controller mapping, applied when the backend starts
    pub controller_mapping: String,

    /// Host joystick preference, `None` when the host does not provide one
    pub joystick_enabled: Option<bool>,

    /// Skip opening the backend entirely
    #[serde(skip)]
    pub disable_at_startup: bool,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            preferred_device: -1,
            press_threshold: 0.3,
            deadzone: 0.2,
            controller_mapping: String::new(),
            joystick_enabled: Some(true),
            disable_at_startup: false,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub joystick: JoystickSettings,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Write a default config file if none exists yet
    pub async fn ensure_default(path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            info!("Creating default configuration at {}", path.display());
            Config::default().save(path).await?;
        }
        Ok(())
    }
}

/// Re-read the config file on an interval and publish joystick settings when the file changed
///
/// The first read only records a baseline, so values overridden at startup survive until
/// the file is edited. `disable_at_startup` is carried over from the current value.
pub fn start_reload_task(
    path: PathBuf,
    settings_tx: watch::Sender<JoystickSettings>,
    interval_seconds: u64,
) -> JoinHandle<()> {
    if interval_seconds == 0 {
        warn!("Config reload interval of 0s is not allowed, using 1s");
    }
    let interval_seconds = interval_seconds.max(1);
    info!(
        "Starting config reload task for {} with interval: {}s",
        path.display(),
        interval_seconds
    );

    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds));
        let mut last_loaded: Option<JoystickSettings> = None;

        loop {
            interval.tick().await;

            match Config::load(&path).await {
                Ok(config) => {
                    let loaded = config.joystick;
                    let changed = last_loaded.as_ref().is_some_and(|last| *last != loaded);
                    last_loaded = Some(loaded.clone());

                    if changed {
                        let mut next = loaded;
                        next.disable_at_startup = settings_tx.borrow().disable_at_startup;
                        info!("Joystick settings changed on disk: {:?}", next);
                        settings_tx.send_replace(next);
                    }
                }
                Err(e) => error!("Failed to reload configuration: {}", e),
            }

            if settings_tx.is_closed() {
                debug!("No settings receivers left, stopping reload task");
                break;
            }
        }
    })
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = JoystickSettings::default();
        assert_eq!(settings.preferred_device, -1);
        assert_eq!(settings.press_threshold, 0.3);
        assert_eq!(settings.deadzone, 0.2);
        assert!(settings.controller_mapping.is_empty());
        assert_eq!(settings.joystick_enabled, Some(true));
        assert!(!settings.disable_at_startup);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str("[joystick]\ndeadzone = 0.1\n").unwrap();
        assert_eq!(config.joystick.deadzone, 0.1);
        assert_eq!(config.joystick.press_threshold, 0.3);
        assert_eq!(config.joystick.preferred_device, -1);
    }

    #[test]
    fn startup_flag_is_not_persisted() {
        let mut config = Config::default();
        config.joystick.disable_at_startup = true;
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("disable_at_startup"));
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn ensure_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        Config::ensure_default(&path).await.unwrap();
        assert!(path.exists());

        let mut config = Config::load(&path).await.unwrap();
        assert_eq!(config, Config::default());

        config.joystick.controller_mapping = "030000005e040000,Pad,a:b0".to_string();
        config.joystick.preferred_device = 2;
        config.save(&path).await.unwrap();
        Config::ensure_default(&path).await.unwrap();

        let reloaded = Config::load(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn zero_reload_interval_keeps_task_running() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = watch::channel(JoystickSettings::default());
        let handle = start_reload_task(dir.path().join(CONFIG_FILE), tx, 0);

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "joystick = 3").await.unwrap();
        assert!(Config::load(&path).await.is_err());
    }
}
