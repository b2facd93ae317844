use super::request::{PackMode, ProcessRequest};
use crate::component::animation_encoder::AnimationParams;
use crate::config::{MediaFormatTable, MediaKind, PipelineSettings};
use crate::error::ValidationError;
use log::debug;
use std::fs;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 通過驗證的請求資訊
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRequest {
    pub kind: MediaKind,
    pub size_bytes: u64,
    /// 動態模式的參數（已驗證）
    pub animation: Option<AnimationParams>,
}

/// 在任何重度處理前驗證請求
///
/// 檢查順序：檔案存在、格式、大小、網格尺寸、模式與媒體、動畫參數。
/// 影片長度需要開啟影片後才能得知，由 [`validate_video_duration`] 另外檢查。
pub fn validate_request(
    request: &ProcessRequest,
    formats: &MediaFormatTable,
    settings: &PipelineSettings,
) -> Result<ValidatedRequest, ValidationError> {
    let path = &request.media_path;
    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(ValidationError::MissingFile(path.clone())),
    };

    let kind = formats.classify(path).ok_or_else(|| {
        ValidationError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        )
    })?;

    let size_bytes = metadata.len();
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    if size_mb > settings.max_file_size_mb as f64 {
        return Err(ValidationError::FileTooLarge {
            size_mb,
            limit_mb: settings.max_file_size_mb,
        });
    }

    validate_grid(request.grid_x, request.grid_y, settings)?;

    let animation = match request.mode {
        PackMode::Static => None,
        PackMode::Animated => {
            if kind != MediaKind::Video {
                return Err(ValidationError::ModeMismatch(
                    "動態表情包只接受影片".to_string(),
                ));
            }
            let params = request.animation.unwrap_or_default();
            Some(AnimationParams::new(params.fps, params.duration_seconds)?)
        }
    };

    debug!(
        "驗證通過: {} ({kind:?}, {size_mb:.2} MB, {}x{}, {})",
        path.display(),
        request.grid_x,
        request.grid_y,
        request.mode
    );

    Ok(ValidatedRequest {
        kind,
        size_bytes,
        animation,
    })
}

pub fn validate_grid(
    grid_x: u32,
    grid_y: u32,
    settings: &PipelineSettings,
) -> Result<(), ValidationError> {
    let min = settings.min_grid_size.max(1);
    let max = settings.max_grid_size.max(min);
    let in_range = |v: u32| (min..=max).contains(&v);

    if in_range(grid_x) && in_range(grid_y) {
        Ok(())
    } else {
        Err(ValidationError::GridSize {
            grid_x,
            grid_y,
            min,
            max,
        })
    }
}

pub fn validate_video_duration(
    duration_seconds: Option<f64>,
    settings: &PipelineSettings,
) -> Result<(), ValidationError> {
    match duration_seconds {
        Some(duration) if duration > settings.max_video_duration_secs as f64 => {
            Err(ValidationError::VideoTooLong {
                duration,
                limit: settings.max_video_duration_secs,
            })
        }
        _ => Ok(()),
    }
}
