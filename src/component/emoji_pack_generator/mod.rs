//! 互動式表情包建立流程
//!
//! 詢問來源與參數後交給 `PackAssembler` 處理，並以進度條顯示各階段。

mod main;

pub use main::EmojiPackGenerator;
