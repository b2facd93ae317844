//! 核心流程的錯誤型別
//!
//! 驗證錯誤原樣回報給呼叫端；單一格子或單一編碼器的失敗在元件內部吸收，
//! 只有所有備援都用盡時才升級為 `PackError`。

use std::path::PathBuf;
use std::time::Duration;

/// 使用者可見訊息中技術原因的最大長度
const MAX_REASON_CHARS: usize = 200;

/// 輸入驗證錯誤（處理開始前即拒絕）
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("檔案不存在: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("不支援的檔案格式: {0}")]
    UnsupportedFormat(String),

    #[error("檔案過大: {size_mb:.1} MB（上限 {limit_mb} MB）")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("網格尺寸 {grid_x}x{grid_y} 超出範圍 {min}..={max}")]
    GridSize {
        grid_x: u32,
        grid_y: u32,
        min: u32,
        max: u32,
    },

    #[error("動畫參數無效: {0}")]
    InvalidAnimation(String),

    #[error("影片過長: {duration:.1}s（上限 {limit}s）")]
    VideoTooLong { duration: f64, limit: u64 },

    #[error("模式與媒體不符: {0}")]
    ModeMismatch(String),
}

/// 長寬比調整與切割錯誤
#[derive(Debug, thiserror::Error)]
pub enum AdaptationError {
    #[error("未知的調整方式: {0}")]
    UnknownMethod(String),

    #[error("圖片為空（寬或高為 0）")]
    EmptyImage,

    #[error("圖片 {width}x{height} 小於網格 {grid_x}x{grid_y}")]
    ImageTooSmall {
        width: u32,
        height: u32,
        grid_x: u32,
        grid_y: u32,
    },

    #[error("無法解碼圖片 {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

/// 影片取樣錯誤
#[derive(Debug, thiserror::Error)]
pub enum SamplingError {
    #[error("無法開啟影片: {0}")]
    Open(String),

    #[error("影片沒有任何幀")]
    EmptyVideo,

    #[error("無法讀取第 {index} 幀: {reason}")]
    FrameRead { index: usize, reason: String },

    #[error("沒有任何可讀取的幀")]
    NoReadableFrames,

    #[error("幀尺寸不一致: {0}")]
    FrameMismatch(String),

    #[error("取樣數量必須至少為 1")]
    ZeroBudget,
}

/// 動畫編碼錯誤
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("找不到編碼器: {0}")]
    EncoderUnavailable(String),

    #[error("編碼器執行失敗: {0}")]
    Tool(#[from] ToolError),

    #[error("編碼結果過大: {size} bytes（上限 {limit} bytes）")]
    OverBudget { size: usize, limit: usize },

    #[error("輸出檔案無效: {0}")]
    InvalidContainer(String),

    #[error("沒有可編碼的幀")]
    NoFrames,

    #[error("編碼暫存檔錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("位置 {position} 所有編碼器皆失敗: {}", .reasons.join("; "))]
    AllTiersFailed {
        position: usize,
        reasons: Vec<String>,
    },

    #[error("所有位置皆編碼失敗，未產生任何動態貼圖")]
    NoClipsProduced,
}

/// 封存檔錯誤
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("封存檔 I/O 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("封存檔寫入錯誤: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("無法寫入中繼資料: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// 外部程序（ffmpeg / ffprobe）執行錯誤
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("無法啟動 {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} 執行逾時（{:.0}s）", .timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    #[error("{0} 已因中斷信號終止")]
    Cancelled(String),

    #[error("{program} 結束碼 {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// 表情包建立流程的總錯誤
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Adaptation(#[from] AdaptationError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("輸出檔案 I/O 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("處理已取消")]
    Cancelled,
}

impl PackError {
    /// 可操作的提示
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::VideoTooLong { .. }) => "影片太長，請剪短後再試",
            Self::Validation(ValidationError::FileTooLarge { .. }) => "檔案太大，請壓縮後再試",
            Self::Validation(ValidationError::UnsupportedFormat(_)) => {
                "請使用 JPG / PNG / WebP 圖片或 MP4 / MOV / WebM 影片"
            }
            Self::Validation(ValidationError::GridSize { .. }) => "請選擇較小的網格尺寸",
            Self::Validation(ValidationError::ModeMismatch(_)) => "動態表情包需要影片來源",
            Self::Validation(_) => "請檢查輸入參數",
            Self::Adaptation(AdaptationError::ImageTooSmall { .. }) => {
                "圖片解析度太低，請改用較小的網格"
            }
            Self::Adaptation(_) => "圖片可能已損壞，請換一張圖片",
            Self::Sampling(_) => "影片可能已損壞或格式不支援",
            Self::Encoding(_) => "找不到相容的編碼器，請確認已安裝含 libvpx 的 ffmpeg",
            Self::Archive(_) | Self::Io(_) => "請確認輸出目錄可寫入且空間足夠",
            Self::Cancelled => "可重新送出請求",
        }
    }

    /// 截斷後的技術原因加上提示
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("{}（{}）", truncate_reason(&self.to_string()), self.hint())
    }
}

/// 截斷過長的錯誤原因（以字元為單位，避免切斷多位元組字元）
#[must_use]
pub fn truncate_reason(reason: &str) -> String {
    let trimmed = reason.trim();
    if trimmed.chars().count() <= MAX_REASON_CHARS {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_REASON_CHARS).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_reason_short() {
        assert_eq!(truncate_reason("  ffmpeg 失敗 "), "ffmpeg 失敗");
    }

    #[test]
    fn test_truncate_reason_long() {
        let long = "錯".repeat(500);
        let truncated = truncate_reason(&long);
        assert_eq!(truncated.chars().count(), MAX_REASON_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_user_message_contains_hint() {
        let err = PackError::from(ValidationError::VideoTooLong {
            duration: 400.0,
            limit: 300,
        });
        let message = err.user_message();
        assert!(message.contains("400.0"));
        assert!(message.contains("影片太長"));
    }

    #[test]
    fn test_encoding_hint() {
        let err = PackError::from(EncodingError::NoClipsProduced);
        assert!(err.hint().contains("編碼器"));
    }
}
