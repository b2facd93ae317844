//! 表情包組裝元件
//!
//! 驗證請求、串接各處理階段、寫出表情檔案與封存檔。
//! 失敗時刪除本次請求建立的所有檔案。

mod archive;
mod main;
mod output_guard;
mod request;
mod validation;

pub use archive::{MANIFEST_NAME, archive_entries, build_manifest, create_archive, write_metadata};
pub use main::PackAssembler;
pub use output_guard::OutputGuard;
pub use request::{PackMetadata, PackMode, ProcessRequest, ProcessResult, format_tag};
pub use validation::{
    ValidatedRequest, validate_grid, validate_request, validate_video_duration,
};
