use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Suffix a directory entry must end with (case-insensitive) to be recorded.
    #[serde(default = "default_media_extension")]
    pub media_extension: String,
    /// Suffix appended to a file name while it is being recreated.
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    // Genericizer
    #[serde(default = "default_playlist_extension")]
    pub playlist_extension: String,
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,
    #[serde(default = "default_replacement")]
    pub replacement: String,

    /// When set, logs are also written to a daily-rotated file in this directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_media_extension() -> String { ".mp3".into() }
fn default_temp_suffix() -> String { ".temp".into() }
fn default_playlist_extension() -> String { ".m3u".into() }
fn default_source_prefix() -> String { "/home/undeemiss/Music".into() }
fn default_replacement() -> String { "..".into() }

impl Default for Config {
    fn default() -> Self {
        Self {
            media_extension: default_media_extension(),
            temp_suffix: default_temp_suffix(),
            playlist_extension: default_playlist_extension(),
            source_prefix: default_source_prefix(),
            replacement: default_replacement(),
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path` if given, otherwise fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("media_extension", &self.media_extension),
            ("temp_suffix", &self.temp_suffix),
            ("playlist_extension", &self.playlist_extension),
            ("source_prefix", &self.source_prefix),
        ];
        for (name, value) in required {
            if value.is_empty() {
                anyhow::bail!("config field `{}` must not be empty", name);
            }
        }
        Ok(())
    }
}
