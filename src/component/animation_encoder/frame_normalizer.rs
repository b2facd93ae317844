use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// 平台限制：動態表情最高幀率
pub const MAX_FPS: u32 = 30;

/// 平台限制：動態表情最長秒數
pub const MAX_DURATION_SECONDS: f64 = 3.0;

/// 動畫參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub fps: u32,
    pub duration_seconds: f64,
}

impl AnimationParams {
    /// 建立並驗證參數：`1 ≤ fps ≤ 30`，`0 < duration ≤ 3.0`
    pub fn new(fps: u32, duration_seconds: f64) -> Result<Self, ValidationError> {
        if !(1..=MAX_FPS).contains(&fps) {
            return Err(ValidationError::InvalidAnimation(format!(
                "幀率 {fps} 必須介於 1 到 {MAX_FPS}"
            )));
        }
        if !duration_seconds.is_finite()
            || duration_seconds <= 0.0
            || duration_seconds > MAX_DURATION_SECONDS
        {
            return Err(ValidationError::InvalidAnimation(format!(
                "長度 {duration_seconds}s 必須大於 0 且不超過 {MAX_DURATION_SECONDS}s"
            )));
        }
        Ok(Self {
            fps,
            duration_seconds,
        })
    }

    /// 目標幀數：`round(fps * duration)`，至少 1
    #[must_use]
    pub fn target_frames(&self) -> usize {
        ((f64::from(self.fps) * self.duration_seconds).round() as usize).max(1)
    }
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            fps: 10,
            duration_seconds: MAX_DURATION_SECONDS,
        }
    }
}

/// 將幀數調整為 `target`
///
/// 輸出第 `i` 幀取自來源 `floor(i * len / target)`：
/// 幀數過多時等距抽取，過少時以最近鄰重複補足（不做插值）。
#[must_use]
pub fn normalize_frame_count<T: Clone>(frames: &[T], target: usize) -> Vec<T> {
    let len = frames.len();
    if len == 0 || target == 0 {
        return Vec::new();
    }
    if len == target {
        return frames.to_vec();
    }

    (0..target)
        .map(|i| frames[(i * len / target).min(len - 1)].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_validation() {
        assert!(AnimationParams::new(30, 3.0).is_ok());
        assert!(AnimationParams::new(1, 0.1).is_ok());
        assert!(AnimationParams::new(0, 1.0).is_err());
        assert!(AnimationParams::new(31, 1.0).is_err());
        assert!(AnimationParams::new(10, 0.0).is_err());
        assert!(AnimationParams::new(10, 3.5).is_err());
        assert!(AnimationParams::new(10, f64::NAN).is_err());
    }

    #[test]
    fn test_target_frames() {
        assert_eq!(AnimationParams::new(30, 3.0).unwrap().target_frames(), 90);
        assert_eq!(AnimationParams::new(10, 2.5).unwrap().target_frames(), 25);
        assert_eq!(AnimationParams::new(1, 0.1).unwrap().target_frames(), 1);
    }

    #[test]
    fn test_upsample_by_repetition() {
        let frames: Vec<usize> = (0..12).collect();
        let normalized = normalize_frame_count(&frames, 90);
        assert_eq!(normalized.len(), 90);
        assert_eq!(normalized[0], 0);
        assert_eq!(normalized[89], 11);
        // 只重複，不產生新值，順序不倒退
        assert!(normalized.windows(2).all(|w| w[0] <= w[1]));
        for value in &frames {
            assert!(normalized.contains(value));
        }
    }

    #[test]
    fn test_downsample_evenly() {
        let frames: Vec<usize> = (0..100).collect();
        let normalized = normalize_frame_count(&frames, 4);
        assert_eq!(normalized, vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_same_length_is_identity() {
        let frames = vec!['a', 'b', 'c'];
        assert_eq!(normalize_frame_count(&frames, 3), frames);
        assert!(normalize_frame_count::<char>(&[], 5).is_empty());
    }
}
