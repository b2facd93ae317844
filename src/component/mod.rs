//! 功能元件模組
//!
//! 每個子模組處理流程中的一個階段，`pack_assembler` 負責串接。

pub mod animation_encoder;
pub mod emoji_pack_generator;
pub mod frame_sampler;
pub mod image_grid;
pub mod pack_assembler;
pub mod temporal_organizer;

pub use animation_encoder::AnimationEncoder;
pub use emoji_pack_generator::EmojiPackGenerator;
pub use frame_sampler::FrameSampler;
pub use pack_assembler::PackAssembler;
