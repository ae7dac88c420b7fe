use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Solace";
const APP_NAME: &str = "solace";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Finds `config.toml` and turns it into an [`AppConfig`].
pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        Ok(Self {
            paths: ConfigPaths::discover()?,
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Loads the config file, creating it with defaults on first run.
    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if self.paths.config_file.exists() {
            return self.load();
        }
        let mut cfg = AppConfig::default();
        cfg.post_load(&self.paths);
        let rendered = toml::to_string_pretty(&cfg).context("serializing default config")?;
        let target = &self.paths.config_file;
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating config dir {}", dir.display()))?;
        }
        fs::write(target, rendered)
            .with_context(|| format!("writing default config {}", target.display()))?;
        tracing::info!(path = %target.display(), "wrote default config");
        Ok(cfg)
    }

    pub fn load(&self) -> Result<AppConfig> {
        let target = &self.paths.config_file;
        let raw = fs::read_to_string(target)
            .with_context(|| format!("reading config {}", target.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", target.display()))?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }
}

/// Filesystem locations used by the journal.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    /// Resolves XDG locations, honouring `SOLACE_CONFIG` (a file or a directory)
    /// and `SOLACE_DATA`.
    pub fn discover() -> Result<Self> {
        let dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let (config_dir, config_file) = match env::var_os("SOLACE_CONFIG").map(PathBuf::from) {
            Some(path) if path.is_dir() => (path.clone(), path.join(CONFIG_FILE_NAME)),
            Some(path) if path.is_file() || path.extension().is_some() => {
                let dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (dir, path)
            }
            Some(path) => (path.clone(), path.join(CONFIG_FILE_NAME)),
            None => {
                let dir = dirs.config_dir().to_path_buf();
                let file = dir.join(CONFIG_FILE_NAME);
                (dir, file)
            }
        };

        let data_dir = env::var_os("SOLACE_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| dirs.data_dir().to_path_buf());
        let state_dir = match dirs.state_dir() {
            Some(dir) => dir.to_path_buf(),
            None => data_dir.join("state"),
        };

        Ok(Self {
            config_dir,
            config_file,
            database_path: data_dir.join("journal.db"),
            export_dir: data_dir.join("exports"),
            log_dir: state_dir.join("logs"),
            data_dir,
            state_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        [&self.config_dir, &self.data_dir, &self.state_dir, &self.log_dir]
            .into_iter()
            .try_for_each(|dir| {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating directory {}", dir.display()))
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageOptions,
    pub export: ExportConfig,
    pub ui: UiOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        self.export.resolve(paths);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub database_path: PathBuf,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::new(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where exported journals are saved. Defaults to the user's download directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip)]
    resolved_dir: PathBuf,
}

impl ExportConfig {
    pub fn output_dir(&self) -> &Path {
        &self.resolved_dir
    }

    fn resolve(&mut self, paths: &ConfigPaths) {
        self.resolved_dir = self
            .output_dir
            .clone()
            .or_else(|| {
                UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            })
            .unwrap_or_else(|| paths.export_dir.clone());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    pub tick_rate_ms: u64,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self { tick_rate_ms: 250 }
    }
}

impl UiOptions {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths_under(root: &Path) -> ConfigPaths {
        ConfigPaths {
            config_dir: root.join("config"),
            config_file: root.join("config/config.toml"),
            data_dir: root.join("data"),
            database_path: root.join("data/journal.db"),
            export_dir: root.join("data/exports"),
            log_dir: root.join("state/logs"),
            state_dir: root.join("state"),
        }
    }

    #[test]
    fn partial_config_keeps_defaults() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let paths = paths_under(temp.path());
        let mut cfg: AppConfig = toml::from_str(
            r#"
            [export]
            output_dir = "/tmp/journals"
            "#,
        )?;
        cfg.post_load(&paths);
        assert_eq!(cfg.export.output_dir(), Path::new("/tmp/journals"));
        assert_eq!(cfg.storage.wal_autocheckpoint, 1000);
        assert_eq!(cfg.storage.database_path, paths.database_path);
        assert_eq!(cfg.ui.tick_rate(), Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn load_or_init_writes_default_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let loader = ConfigLoader {
            paths: paths_under(temp.path()),
        };
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert!(!cfg.export.output_dir().as_os_str().is_empty());

        let reloaded = loader.load()?;
        assert_eq!(reloaded.ui.tick_rate_ms, cfg.ui.tick_rate_ms);
        Ok(())
    }
}
