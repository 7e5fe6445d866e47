use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lyrics::SegmentOptions;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "lyricblocks";
const APPLICATION: &str = "lyricblocks";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub segment: SegmentConfig,
    pub playback: PlaybackConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Keep "[Verse]"-style labels in block text
    pub include_section_tags: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How often `follow` samples the playhead
    pub poll_interval_ms: u64,
    /// Playback speed for `follow`
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            rate: 1.0,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION);
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join(APPLICATION));
        Self { data_dir }
    }
}

impl Config {
    pub fn segment_options(&self, force_tags: bool) -> SegmentOptions {
        SegmentOptions {
            include_section_tags: force_tags || self.segment.include_section_tags,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.playback.poll_interval_ms)
    }

    pub fn database_path(&self) -> PathBuf {
        self.paths.data_dir.join("songs.db")
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(&path, cfg)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the config, writing the defaults first if the file does not exist
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&path, &cfg)?;
        tracing::info!(path = %path.display(), "wrote default config");
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    parse(&raw).with_context(|| format!("parse {}", path.display()))
}

pub fn parse(raw: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str::<Config>(raw)?)
}

fn write_config(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let cfg = parse("[segment]\ninclude_section_tags = true\n").unwrap();
        assert!(cfg.segment.include_section_tags);
        assert_eq!(cfg.playback, PlaybackConfig::default());

        let cfg = parse("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut cfg = Config::default();
        cfg.playback.poll_interval_ms = 250;
        cfg.paths.data_dir = PathBuf::from("/tmp/lyricblocks-test");
        let raw = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(parse(&raw).unwrap(), cfg);
    }

    #[test]
    fn test_segment_options_override() {
        let cfg = Config::default();
        assert!(!cfg.segment_options(false).include_section_tags);
        assert!(cfg.segment_options(true).include_section_tags);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(500));
        assert!(cfg.database_path().ends_with("songs.db"));
    }

    #[test]
    fn test_load_writes_defaults_once() {
        let dir = std::env::temp_dir().join(format!("lyricblocks-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let first = load(Some(&path)).unwrap();
        assert!(path.exists());

        let mut changed = first.clone();
        changed.segment.include_section_tags = true;
        save(&changed, Some(&path)).unwrap();
        assert_eq!(load(Some(&path)).unwrap(), changed);

        let _ = fs::remove_dir_all(&dir);
    }
}
