//! 動態表情編碼元件
//!
//! 依 VP9/WebM → VP8/WebM → H.264/MP4 的順序嘗試編碼，
//! 每個片段都必須通過容器檢查且不超過大小上限。

mod codec_command;
mod container;
mod ffmpeg_encoder;
mod frame_normalizer;
mod main;

pub use codec_command::{
    CodecTier, Container, FRAME_PATTERN, QualityLevel, RateControl, build_encode_command,
    rate_control,
};
pub use container::verify_container;
pub use ffmpeg_encoder::{FfmpegEncoder, discover_encoders, parse_encoder_list};
pub use frame_normalizer::{
    AnimationParams, MAX_DURATION_SECONDS, MAX_FPS, normalize_frame_count,
};
pub use main::{AnimationEncoder, EncodeReport, EncodedClip, Encoder, PositionClip};
