use super::frame_source::FrameSource;
use super::scene_detector::{DEFAULT_SCENE_THRESHOLD, detect_scene_changes};
use super::uniform_selector::{evenly_spaced_positions, padding_indices, uniform_indices};
use crate::config::SamplingStrategy;
use crate::error::SamplingError;
use image::RgbaImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// 場景偵測時預先解碼的最大幀數
pub const MAX_SCENE_SAMPLE: usize = 150;

/// 依影片長度自動決定的取樣上限
pub const MIN_AUTO_FRAMES: usize = 5;
pub const MAX_AUTO_FRAMES: usize = 20;
const UNKNOWN_DURATION_FRAMES: usize = 10;

/// 取樣後的單一影格
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// 來源影片中的幀索引
    pub index: usize,
    /// 來源時間點（秒）
    pub timestamp: f64,
    pub image: RgbaImage,
}

/// 依影片長度決定取樣數量：`min(20, max(5, duration / 2))`
#[must_use]
pub fn frame_budget_for_duration(duration_seconds: Option<f64>) -> usize {
    match duration_seconds {
        Some(duration) if duration > 0.0 => {
            ((duration / 2.0) as usize).clamp(MIN_AUTO_FRAMES, MAX_AUTO_FRAMES)
        }
        _ => UNKNOWN_DURATION_FRAMES,
    }
}

/// 平行讀取指定索引的影格，無法讀取的幀會被略過
///
/// 回傳值保持 `indices` 的順序；全部失敗時回傳錯誤。
pub fn extract_frames(
    source: &dyn FrameSource,
    indices: &[usize],
) -> Result<Vec<SampledFrame>, SamplingError> {
    let frames: Vec<SampledFrame> = indices
        .par_iter()
        .filter_map(|&index| match source.read_frame(index) {
            Ok(image) => Some(SampledFrame {
                index,
                timestamp: source.timestamp_of(index),
                image,
            }),
            Err(e) => {
                warn!("略過無法讀取的幀: {e}");
                None
            }
        })
        .collect();

    if frames.is_empty() {
        return Err(SamplingError::NoReadableFrames);
    }

    Ok(frames)
}

/// 影格取樣器
///
/// 兩種策略：
/// - 均勻取樣：直接在整段影片上均勻選取
/// - 場景取樣：先解碼較多的均勻樣本，選出差異超過門檻的關鍵幀，
///   太多時平均抽取，太少時以均勻取樣補足
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    strategy: SamplingStrategy,
    scene_threshold: f64,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(SamplingStrategy::Scene, DEFAULT_SCENE_THRESHOLD)
    }
}

impl FrameSampler {
    #[must_use]
    pub const fn new(strategy: SamplingStrategy, scene_threshold: f64) -> Self {
        Self {
            strategy,
            scene_threshold,
        }
    }

    /// 取得 `1..=max_frames` 個依時間排序的影格
    pub fn sample(
        &self,
        source: &dyn FrameSource,
        max_frames: usize,
    ) -> Result<Vec<SampledFrame>, SamplingError> {
        if max_frames == 0 {
            return Err(SamplingError::ZeroBudget);
        }
        let total = source.frame_count();
        if total == 0 {
            return Err(SamplingError::EmptyVideo);
        }

        info!(
            "取樣影片: {total} 幀，上限 {max_frames} 幀，策略 {}",
            self.strategy
        );

        let frames = match self.strategy {
            SamplingStrategy::Uniform => self.sample_uniform(source, max_frames)?,
            SamplingStrategy::Scene => match self.extract_key_frames(source, max_frames) {
                Ok(frames) => frames,
                Err(e) => {
                    warn!("場景偵測失敗，改用均勻取樣: {e}");
                    self.sample_uniform(source, max_frames)?
                }
            },
        };

        debug!(
            "取樣完成: {:?}",
            frames.iter().map(|f| f.index).collect::<Vec<_>>()
        );

        Ok(frames)
    }

    /// 取出一張代表畫面（影片中點）
    pub fn representative_frame(
        &self,
        source: &dyn FrameSource,
    ) -> Result<SampledFrame, SamplingError> {
        let total = source.frame_count();
        if total == 0 {
            return Err(SamplingError::EmptyVideo);
        }

        let middle = total / 2;
        let mut candidates = vec![middle];
        if middle != 0 {
            candidates.push(0);
        }

        for index in candidates {
            match source.read_frame(index) {
                Ok(image) => {
                    return Ok(SampledFrame {
                        index,
                        timestamp: source.timestamp_of(index),
                        image,
                    });
                }
                Err(e) => warn!("代表畫面讀取失敗: {e}"),
            }
        }

        Err(SamplingError::NoReadableFrames)
    }

    fn sample_uniform(
        &self,
        source: &dyn FrameSource,
        max_frames: usize,
    ) -> Result<Vec<SampledFrame>, SamplingError> {
        extract_frames(source, &uniform_indices(source.frame_count(), max_frames))
    }

    fn extract_key_frames(
        &self,
        source: &dyn FrameSource,
        max_frames: usize,
    ) -> Result<Vec<SampledFrame>, SamplingError> {
        let total = source.frame_count();
        let sample_count = max_frames.saturating_mul(3).min(MAX_SCENE_SAMPLE);
        let sampled = extract_frames(source, &uniform_indices(total, sample_count))?;

        let images: Vec<&RgbaImage> = sampled.iter().map(|f| &f.image).collect();
        let key_positions = detect_scene_changes(&images, self.scene_threshold)?;

        debug!(
            "場景偵測: 樣本 {} 幀，關鍵幀 {} 個",
            sampled.len(),
            key_positions.len()
        );

        let key_positions = if key_positions.len() > max_frames {
            evenly_spaced_positions(key_positions.len(), max_frames)
                .into_iter()
                .map(|p| key_positions[p])
                .collect()
        } else {
            key_positions
        };

        let mut slots: Vec<Option<SampledFrame>> = sampled.into_iter().map(Some).collect();
        let mut frames: Vec<SampledFrame> = key_positions
            .into_iter()
            .filter_map(|p| slots.get_mut(p).and_then(Option::take))
            .collect();

        if frames.len() < max_frames {
            self.pad_with_uniform(source, &mut frames, max_frames);
        }

        Ok(frames)
    }

    /// 以整段影片的均勻取樣補足數量，並依來源索引排序
    fn pad_with_uniform(
        &self,
        source: &dyn FrameSource,
        frames: &mut Vec<SampledFrame>,
        max_frames: usize,
    ) {
        let taken: BTreeSet<usize> = frames.iter().map(|f| f.index).collect();
        let needed = max_frames - frames.len();
        let extra = padding_indices(source.frame_count(), max_frames, &taken, needed);

        if !extra.is_empty() {
            match extract_frames(source, &extra) {
                Ok(padding) => frames.extend(padding),
                Err(e) => warn!("補足取樣失敗，保留 {} 幀: {e}", frames.len()),
            }
        }

        frames.sort_by_key(|f| f.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 每 `scene_len` 幀換一個亮度的合成影片
    struct SyntheticVideo {
        frames: usize,
        fps: f64,
        scene_len: usize,
        unreadable: Vec<usize>,
        /// 奇數幀尺寸不同，讓場景偵測失敗
        varying_size: bool,
    }

    impl FrameSource for SyntheticVideo {
        fn frame_count(&self) -> usize {
            self.frames
        }

        fn frame_rate(&self) -> f64 {
            self.fps
        }

        fn duration_seconds(&self) -> Option<f64> {
            Some(self.frames as f64 / self.fps)
        }

        fn read_frame(&self, index: usize) -> Result<RgbaImage, SamplingError> {
            if self.unreadable.contains(&index) {
                return Err(SamplingError::FrameRead {
                    index,
                    reason: "損壞".to_string(),
                });
            }
            let value = ((index / self.scene_len) * 40 % 256) as u8;
            let size = if self.varying_size && index % 2 == 1 { 5 } else { 4 };
            Ok(RgbaImage::from_pixel(size, size, Rgba([value, value, value, 255])))
        }
    }

    fn video(frames: usize, scene_len: usize) -> SyntheticVideo {
        SyntheticVideo {
            frames,
            fps: 30.0,
            scene_len,
            unreadable: Vec::new(),
            varying_size: false,
        }
    }

    fn assert_strictly_increasing(frames: &[SampledFrame]) {
        assert!(frames.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_frame_budget_for_duration() {
        assert_eq!(frame_budget_for_duration(Some(4.0)), 5);
        assert_eq!(frame_budget_for_duration(Some(20.0)), 10);
        assert_eq!(frame_budget_for_duration(Some(120.0)), 20);
        assert_eq!(frame_budget_for_duration(None), 10);
        assert_eq!(frame_budget_for_duration(Some(0.0)), 10);
    }

    #[test]
    fn test_scene_sampling_pads_to_budget() {
        let source = video(300, 60);
        let sampler = FrameSampler::default();
        let frames = sampler.sample(&source, 10).unwrap();

        assert_eq!(frames.len(), 10);
        assert_strictly_increasing(&frames);
        // 五個場景起點都在結果中
        for start in [0, 60, 120, 180, 240] {
            assert!(frames.iter().any(|f| f.index == start));
        }
    }

    #[test]
    fn test_scene_sampling_subsamples_candidates() {
        // 每 10 幀換場景，30 個樣本全部都是關鍵幀
        let source = video(300, 10);
        let frames = FrameSampler::default().sample(&source, 10).unwrap();
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0].index, 0);
        assert_eq!(frames[9].index, 290);
        assert_strictly_increasing(&frames);
    }

    #[test]
    fn test_uniform_sampling() {
        let sampler = FrameSampler::new(SamplingStrategy::Uniform, 30.0);
        let frames = sampler.sample(&video(100, 100), 4).unwrap();
        let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_unreadable_frame_is_skipped() {
        let mut source = video(100, 100);
        source.unreadable = vec![25];
        let sampler = FrameSampler::new(SamplingStrategy::Uniform, 30.0);
        let frames = sampler.sample(&source, 4).unwrap();
        let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 50, 75]);
    }

    #[test]
    fn test_scene_failure_falls_back_to_uniform() {
        let mut source = video(100, 100);
        source.varying_size = true;
        let frames = FrameSampler::default().sample(&source, 4).unwrap();
        let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_empty_video_is_fatal() {
        let source = video(0, 1);
        assert!(matches!(
            FrameSampler::default().sample(&source, 5),
            Err(SamplingError::EmptyVideo)
        ));
        assert!(matches!(
            FrameSampler::default().sample(&video(10, 1), 0),
            Err(SamplingError::ZeroBudget)
        ));
    }

    #[test]
    fn test_short_video_returns_all_frames() {
        let frames = FrameSampler::default().sample(&video(3, 1), 10).unwrap();
        let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_representative_frame_is_middle() {
        let frame = FrameSampler::default()
            .representative_frame(&video(90, 30))
            .unwrap();
        assert_eq!(frame.index, 45);
        assert!((frame.timestamp - 1.5).abs() < 1e-9);
    }
}
