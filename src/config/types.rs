use crate::component::image_grid::{AdaptationMethod, BackgroundMode, EnhanceLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_RECENT_PATHS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFormatTable {
    #[serde(rename = "IMAGE_FILE")]
    pub image_file: Vec<String>,
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaFormatTable {
    fn extensions_set(list: &[String]) -> HashSet<String> {
        list.iter().map(|ext| ext.to_lowercase()).collect()
    }

    /// 依副檔名判斷媒體種類
    #[must_use]
    pub fn classify(&self, path: &Path) -> Option<MediaKind> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))?;

        if Self::extensions_set(&self.image_file).contains(&ext) {
            Some(MediaKind::Image)
        } else if Self::extensions_set(&self.video_file).contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    Uniform,
    #[default]
    Scene,
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uniform => write!(f, "均勻取樣"),
            Self::Scene => write!(f, "場景偵測"),
        }
    }
}

/// 處理流程設定（每個請求以值傳入，不共享可變狀態）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub max_grid_size: u32,
    pub min_grid_size: u32,
    pub max_file_size_mb: u64,
    pub max_video_duration_secs: u64,
    /// 單次 ffmpeg / ffprobe 呼叫的逾時秒數
    pub codec_timeout_secs: u64,
    pub max_clip_bytes: usize,
    pub static_cell_size: u32,
    pub animated_cell_size: u32,
    pub scene_threshold: f64,
    pub sampling_strategy: SamplingStrategy,
    /// 未設定時依影片長度自動決定
    pub max_frames: Option<usize>,
    /// 未設定時依 CPU 閒置量決定
    pub max_workers: Option<usize>,
    pub cache_root: PathBuf,
    pub cache_max_age_hours: u64,
    pub pad_color: [u8; 4],
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_grid_size: 8,
            min_grid_size: 1,
            max_file_size_mb: 50,
            max_video_duration_secs: 300,
            codec_timeout_secs: 60,
            max_clip_bytes: 64 * 1024,
            static_cell_size: 512,
            animated_cell_size: 100,
            scene_threshold: 30.0,
            sampling_strategy: SamplingStrategy::Scene,
            max_frames: None,
            max_workers: None,
            cache_root: PathBuf::from("data/cache"),
            cache_max_age_hours: 1,
            pad_color: [255, 255, 255, 255],
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub const fn codec_timeout(&self) -> Duration {
        Duration::from_secs(self.codec_timeout_secs)
    }

    #[must_use]
    pub const fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_hours * 3600)
    }
}

/// 互動介面的使用者偏好
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub grid_x: u32,
    pub grid_y: u32,
    pub adaptation_method: AdaptationMethod,
    pub background_mode: BackgroundMode,
    pub enhancement: EnhanceLevel,
    pub fps: u32,
    pub duration_seconds: f64,
    pub recent_paths: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            grid_x: 2,
            grid_y: 2,
            adaptation_method: AdaptationMethod::Pad,
            background_mode: BackgroundMode::Keep,
            enhancement: EnhanceLevel::Off,
            fps: 10,
            duration_seconds: 3.0,
            recent_paths: Vec::new(),
        }
    }
}

/// settings.json 的檔案結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub pipeline: PipelineSettings,
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub media_formats: MediaFormatTable,
    pub pipeline: PipelineSettings,
    pub preferences: UserPreferences,
}

impl Config {
    #[must_use]
    pub fn to_settings_file(&self) -> SettingsFile {
        SettingsFile {
            pipeline: self.pipeline.clone(),
            preferences: self.preferences.clone(),
        }
    }
}
