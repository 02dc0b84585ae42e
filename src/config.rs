use std::{fs, io::Read, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

pub const FILE_ENV: &str = "SCRIBBLE_FILE";
pub const CONFIG_ENV: &str = "SCRIBBLE_CONFIG";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScribbleConfig {
    /// Where the notes JSON lives. Falls back to the platform data dir.
    #[serde(default)]
    pub notes_file: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
        }
    }
}

impl ServerConfig {
    fn default_addr() -> String {
        "127.0.0.1:3000".to_string()
    }
}

impl ScribbleConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "scribble", "scribble")
    }

    /// Default config location: `$SCRIBBLE_CONFIG`, then the platform config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from an explicit path, or from the default location when `None`.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_config_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut file = fs::File::open(path)
            .with_context(|| format!("Failed to open config at {}", path.display()))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        let cfg = toml::from_str::<Self>(&buf)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(cfg)
    }

    /// Pick the backing file: flag, then `$SCRIBBLE_FILE`, then config, then
    /// the platform data dir, then `./notes.json`.
    pub fn notes_path(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag {
            return path.to_path_buf();
        }
        if let Some(path) = std::env::var_os(FILE_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.notes_file {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("notes.json"))
            .unwrap_or_else(|| PathBuf::from("notes.json"))
    }

    /// Pick the bind address: flag, then `$PORT` on localhost, then config.
    pub fn server_addr(&self, flag: Option<&str>) -> String {
        if let Some(addr) = flag {
            return addr.trim().to_string();
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            if let Ok(port) = port.trim().parse::<u16>() {
                return format!("127.0.0.1:{port}");
            }
        }
        self.server.addr.clone()
    }
}
