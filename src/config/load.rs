use crate::config::types::{Config, MediaFormatTable, PipelineSettings, SettingsFile};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

/// 編譯時嵌入的媒體格式設定（不需要外部檔案）
const MEDIA_FORMATS_JSON: &str = include_str!("../data/media_formats.json");

impl Config {
    pub fn new() -> Result<Self> {
        Self::from_path(Path::new(SETTINGS_FILE))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let media_formats = Self::load_embedded_media_formats()?;
        let settings = Self::load_settings(path).unwrap_or_else(|e| {
            warn!("設定檔讀取失敗，使用預設值: {e:#}");
            SettingsFile::default()
        });

        let mut pipeline = settings.pipeline;
        apply_env_overrides(&mut pipeline, |key| std::env::var(key).ok());

        Ok(Self {
            media_formats,
            pipeline,
            preferences: settings.preferences,
        })
    }

    fn load_settings(path: &Path) -> Result<SettingsFile> {
        if !path.exists() {
            return Ok(SettingsFile::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 從編譯時嵌入的 JSON 載入媒體格式表
    pub fn load_embedded_media_formats() -> Result<MediaFormatTable> {
        serde_json::from_str(MEDIA_FORMATS_JSON).context("無法解析嵌入的媒體格式設定")
    }
}

/// 套用環境變數覆寫（於設定檔之後）
pub fn apply_env_overrides<F>(settings: &mut PipelineSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let parse_u64 = |key: &str| -> Option<u64> {
        let raw = lookup(key)?;
        match raw.trim().parse::<u64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("忽略無效的環境變數 {key}={raw}");
                None
            }
        }
    };

    if let Some(v) = parse_u64("MAX_GRID_SIZE").and_then(|v| u32::try_from(v).ok()) {
        settings.max_grid_size = v;
    }
    if let Some(v) = parse_u64("MIN_GRID_SIZE").and_then(|v| u32::try_from(v).ok()) {
        settings.min_grid_size = v.max(1);
    }
    if let Some(v) = parse_u64("MAX_FILE_SIZE_MB") {
        settings.max_file_size_mb = v;
    }
    if let Some(v) = parse_u64("MAX_VIDEO_DURATION") {
        settings.max_video_duration_secs = v;
    }
    if let Some(v) = parse_u64("PROCESSING_TIMEOUT") {
        settings.codec_timeout_secs = v;
    }
    if let Some(dir) = lookup("CACHE_DIR").filter(|d| !d.trim().is_empty()) {
        settings.cache_root = PathBuf::from(dir.trim());
    }

    debug!(
        "流程設定: grid {}..={}, 檔案上限 {} MB, 影片上限 {}s, 逾時 {}s",
        settings.min_grid_size,
        settings.max_grid_size,
        settings.max_file_size_mb,
        settings.max_video_duration_secs,
        settings.codec_timeout_secs
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaKind;
    use std::collections::HashMap;

    #[test]
    fn test_embedded_media_formats() {
        let table = Config::load_embedded_media_formats().unwrap();
        assert_eq!(
            table.classify(Path::new("/tmp/cat.PNG")),
            Some(MediaKind::Image)
        );
        assert_eq!(
            table.classify(Path::new("/tmp/clip.mp4")),
            Some(MediaKind::Video)
        );
        assert_eq!(table.classify(Path::new("/tmp/readme.txt")), None);
        assert_eq!(table.classify(Path::new("/tmp/noext")), None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MAX_GRID_SIZE", "6"),
            ("MAX_FILE_SIZE_MB", "not-a-number"),
            ("PROCESSING_TIMEOUT", "90"),
            ("CACHE_DIR", "/var/cache/emoji"),
        ]
        .into_iter()
        .collect();

        let mut settings = PipelineSettings::default();
        apply_env_overrides(&mut settings, |key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(settings.max_grid_size, 6);
        assert_eq!(settings.max_file_size_mb, 50);
        assert_eq!(settings.codec_timeout_secs, 90);
        assert_eq!(settings.cache_root, PathBuf::from("/var/cache/emoji"));
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_path(&dir.path().join("settings.json")).unwrap();
        assert_eq!(config.pipeline.max_clip_bytes, 64 * 1024);
        assert_eq!(config.preferences.grid_x, 2);
    }

    #[test]
    fn test_save_and_reload_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut config = Config::from_path(&path).unwrap();
        config.preferences.grid_x = 4;
        config.preferences.fps = 24;
        crate::config::save::save_settings_to(&config, &path).unwrap();

        let reloaded = Config::from_path(&path).unwrap();
        assert_eq!(reloaded.preferences.grid_x, 4);
        assert_eq!(reloaded.preferences.fps, 24);
    }
}
