use crate::error::SamplingError;
use crate::tools::ffmpeg_runner::ToolRunner;
use crate::tools::ffprobe_info::{VideoInfo, get_video_info};
use image::RgbaImage;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 可依索引隨機讀取的影格來源
pub trait FrameSource: Sync {
    fn frame_count(&self) -> usize;

    fn frame_rate(&self) -> f64;

    /// 影片長度（秒），無法取得時為 `None`
    fn duration_seconds(&self) -> Option<f64>;

    fn read_frame(&self, index: usize) -> Result<RgbaImage, SamplingError>;

    /// 影格在來源中的時間點（秒）
    fn timestamp_of(&self, index: usize) -> f64 {
        let fps = self.frame_rate();
        if fps > 0.0 { index as f64 / fps } else { 0.0 }
    }
}

/// 開啟影片並建立影格來源
pub trait FrameSourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, SamplingError>;
}

/// 以 ffprobe 取得資訊、以 ffmpeg 擷取單一影格的來源
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    runner: ToolRunner,
    /// 擷取出的 PNG 暫存目錄，隨來源一起刪除
    work_dir: TempDir,
}

impl FfmpegFrameSource {
    pub fn open(runner: ToolRunner, path: &Path) -> Result<Self, SamplingError> {
        let info = get_video_info(&runner, path)
            .map_err(|e| SamplingError::Open(format!("{}: {e}", path.display())))?;
        let work_dir = tempfile::Builder::new()
            .prefix("emoji_frames_")
            .tempdir()
            .map_err(|e| SamplingError::Open(format!("無法建立暫存目錄: {e}")))?;

        debug!(
            "開啟影片 {}: {}x{}, {:.2}s, {:.2} fps, {} 幀",
            path.display(),
            info.width,
            info.height,
            info.duration_seconds,
            info.frame_rate,
            info.frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            runner,
            work_dir,
        })
    }

    #[must_use]
    pub const fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// 兩段式 seek：
    /// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
    /// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
    fn extract_command(&self, timestamp: f64, output: &Path) -> Command {
        let t0 = (timestamp - SEEK_MARGIN).max(0.0);
        let delta = timestamp - t0;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        if t0 > 0.0 {
            cmd.arg("-ss").arg(format!("{t0:.3}"));
        }
        cmd.arg("-i").arg(&self.path);
        if delta > 0.0 {
            cmd.arg("-ss").arg(format!("{delta:.3}"));
        }
        cmd.args([
            "-frames:v", "1", "-an", "-sn", "-dn", "-threads", "1", "-y",
        ])
        .arg(output);
        cmd
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self) -> usize {
        usize::try_from(self.info.frame_count).unwrap_or(usize::MAX)
    }

    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn duration_seconds(&self) -> Option<f64> {
        (self.info.duration_seconds > 0.0).then_some(self.info.duration_seconds)
    }

    fn read_frame(&self, index: usize) -> Result<RgbaImage, SamplingError> {
        let timestamp = self.timestamp_of(index);
        let output = self.work_dir.path().join(format!("frame_{index:06}.png"));

        debug!("擷取第 {index} 幀 ({timestamp:.3}s)");

        self.runner
            .run(self.extract_command(timestamp, &output))
            .map_err(|e| SamplingError::FrameRead {
                index,
                reason: e.to_string(),
            })?;

        if !output.exists() {
            return Err(SamplingError::FrameRead {
                index,
                reason: "幀檔案未建立".to_string(),
            });
        }

        let decoded = image::open(&output).map_err(|e| SamplingError::FrameRead {
            index,
            reason: e.to_string(),
        });
        if let Err(e) = fs::remove_file(&output) {
            debug!("無法刪除暫存幀 {}: {e}", output.display());
        }

        Ok(decoded?.to_rgba8())
    }
}

/// 建立 [`FfmpegFrameSource`] 的開啟器
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    runner: ToolRunner,
}

impl FfmpegOpener {
    #[must_use]
    pub const fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

impl FrameSourceOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, SamplingError> {
        Ok(Box::new(FfmpegFrameSource::open(self.runner.clone(), path)?))
    }
}
