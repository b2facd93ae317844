//! 圖片網格元件
//!
//! 1. 長寬比調整（補邊 / 拉伸 / 裁切）
//! 2. 依橫列優先切割並縮放為固定尺寸
//! 3. 選擇性強化畫質
//! 4. 選擇性移除格子背景

mod aspect_adapter;
mod background;
mod enhance;
mod grid_partitioner;

pub use aspect_adapter::{
    AdaptationMethod, DEFAULT_PAD_COLOR, RATIO_EPSILON, adapt, aspect_ratio,
};
pub use background::{BLACK_THRESHOLD, BackgroundMode, WHITE_THRESHOLD, strip_background};
pub use enhance::{EnhanceLevel, enhance};
pub use grid_partitioner::{Cell, split};
