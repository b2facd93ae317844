pub mod cache_cleaner;
pub mod cpu_monitor;
pub mod ffmpeg_runner;
pub mod ffprobe_info;
pub mod file_hasher;
pub mod file_tools;
pub mod path_validator;
pub mod progress;

pub use cache_cleaner::{CacheStats, CleanupReport, cache_stats, cleanup_cache, request_output_dir};
pub use cpu_monitor::CpuMonitor;
pub use ffmpeg_runner::{ToolOutput, ToolRunner};
pub use ffprobe_info::{ClipProbe, VideoInfo, get_video_info, probe_clip};
pub use file_hasher::{calculate_file_hash, default_pack_name};
pub use file_tools::{format_file_size, safe_filename};
pub use path_validator::{ensure_directory_exists, validate_file_exists};
pub use progress::{ProgressCallback, ProgressEvent, Stage, no_progress};
