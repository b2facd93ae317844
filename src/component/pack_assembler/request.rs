use crate::component::animation_encoder::{AnimationParams, CodecTier, Container};
use crate::component::image_grid::{AdaptationMethod, BackgroundMode, EnhanceLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 輸出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackMode {
    #[default]
    Static,
    Animated,
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Animated => write!(f, "animated"),
        }
    }
}

impl FromStr for PackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "animated" => Ok(Self::Animated),
            other => Err(format!("未知的模式: {other}")),
        }
    }
}

/// 單次處理請求
///
/// 由呼叫端建立並以值傳入，處理過程中不共享任何可變設定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub media_path: PathBuf,
    pub grid_x: u32,
    pub grid_y: u32,
    pub adaptation_method: AdaptationMethod,
    pub mode: PackMode,
    /// 只在動態模式使用；未指定時為 10 fps、3 秒
    pub animation: Option<AnimationParams>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub background: BackgroundMode,
    /// 移除背景前先套用
    #[serde(default)]
    pub enhancement: EnhanceLevel,
    /// 未指定時以檔案雜湊產生
    #[serde(default)]
    pub pack_name: Option<String>,
}

impl ProcessRequest {
    #[must_use]
    pub fn new(media_path: &Path, grid_x: u32, grid_y: u32, output_dir: &Path) -> Self {
        Self {
            media_path: media_path.to_path_buf(),
            grid_x,
            grid_y,
            adaptation_method: AdaptationMethod::default(),
            mode: PackMode::Static,
            animation: None,
            output_dir: output_dir.to_path_buf(),
            background: BackgroundMode::default(),
            enhancement: EnhanceLevel::default(),
            pack_name: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: AdaptationMethod) -> Self {
        self.adaptation_method = method;
        self
    }

    #[must_use]
    pub fn animated(mut self, params: AnimationParams) -> Self {
        self.mode = PackMode::Animated;
        self.animation = Some(params);
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: BackgroundMode) -> Self {
        self.background = background;
        self
    }

    #[must_use]
    pub fn with_enhancement(mut self, level: EnhanceLevel) -> Self {
        self.enhancement = level;
        self
    }

    #[must_use]
    pub fn with_pack_name(mut self, name: impl Into<String>) -> Self {
        self.pack_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.grid_x as usize) * (self.grid_y as usize)
    }
}

/// 表情包中繼資料（同時寫入 `<pack>_metadata.json`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackMetadata {
    pub pack_name: String,
    pub emoji_count: usize,
    pub emoji_files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub format: String,
    pub size: String,
    pub grid_x: u32,
    pub grid_y: u32,
    pub adaptation_method: AdaptationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted_positions: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codecs: Vec<CodecTier>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 依使用到的編碼層決定格式標籤
#[must_use]
pub fn format_tag(mode: PackMode, codecs: &[CodecTier]) -> String {
    match mode {
        PackMode::Static => "static_png".to_string(),
        PackMode::Animated => {
            let webm = codecs.iter().any(|c| c.container() == Container::Webm);
            let mp4 = codecs.iter().any(|c| c.container() == Container::Mp4);
            match (webm, mp4) {
                (true, true) => "animated_mixed".to_string(),
                (false, true) => "animated_mp4".to_string(),
                _ => "animated_webm".to_string(),
            }
        }
    }
}

/// 處理完成的結果
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// 靜態：橫列優先；動態：依位置排序（略過的位置不在其中）
    pub artifact_files: Vec<PathBuf>,
    pub archive_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: PackMetadata,
}

impl ProcessResult {
    /// 是否有位置被略過
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.metadata.omitted_positions.is_empty()
    }
}
