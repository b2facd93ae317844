//! 影片影格取樣元件
//!
//! 均勻取樣或場景變換取樣，結果依時間排序且不重複。

mod frame_source;
mod main;
mod scene_detector;
mod uniform_selector;

pub use frame_source::{FfmpegFrameSource, FfmpegOpener, FrameSource, FrameSourceOpener};
pub use main::{
    FrameSampler, MAX_AUTO_FRAMES, MAX_SCENE_SAMPLE, MIN_AUTO_FRAMES, SampledFrame,
    extract_frames, frame_budget_for_duration,
};
pub use scene_detector::{DEFAULT_SCENE_THRESHOLD, detect_scene_changes, mean_abs_diff};
pub use uniform_selector::{evenly_spaced_positions, padding_indices, uniform_indices};
