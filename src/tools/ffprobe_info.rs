use crate::error::ToolError;
use crate::tools::ffmpeg_runner::ToolRunner;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// 串流中的總幀數（容器未記錄時由長度與幀率推算）
    pub frame_count: u64,
}

/// 編碼後片段的容器資訊
#[derive(Debug, Clone)]
pub struct ClipProbe {
    pub format_name: String,
    pub has_video_stream: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("無法解析 ffprobe 輸出: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("找不到視訊串流")]
    NoVideoStream,

    #[error("缺少欄位: {0}")]
    MissingField(&'static str),
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

fn ffprobe_command(path: &Path) -> Command {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ])
    .arg(path);
    cmd
}

fn run_ffprobe(runner: &ToolRunner, path: &Path) -> Result<FfprobeOutput, ProbeError> {
    let output = runner.run(ffprobe_command(path))?;
    Ok(serde_json::from_slice(&output.stdout)?)
}

/// 使用 ffprobe 取得影片資訊
pub fn get_video_info(runner: &ToolRunner, path: &Path) -> Result<VideoInfo, ProbeError> {
    parse_video_info(run_ffprobe(runner, path)?)
}

fn parse_video_info(probe: FfprobeOutput) -> Result<VideoInfo, ProbeError> {
    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or(ProbeError::NoVideoStream)?;

    let width = video_stream.width.ok_or(ProbeError::MissingField("width"))?;
    let height = video_stream
        .height
        .ok_or(ProbeError::MissingField("height"))?;

    // 取得影片長度（優先從 format，其次從 stream）
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or(ProbeError::MissingField("duration"))?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_ref()
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| (duration_seconds * frame_rate).round().max(0.0) as u64);

    Ok(VideoInfo {
        duration_seconds,
        width,
        height,
        frame_rate,
        frame_count,
    })
}

/// 檢查編碼後的檔案容器與視訊串流
pub fn probe_clip(runner: &ToolRunner, path: &Path) -> Result<ClipProbe, ProbeError> {
    Ok(parse_clip_probe(run_ffprobe(runner, path)?))
}

fn parse_clip_probe(probe: FfprobeOutput) -> ClipProbe {
    let video_stream = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    ClipProbe {
        format_name: probe
            .format
            .as_ref()
            .and_then(|f| f.format_name.clone())
            .unwrap_or_default(),
        has_video_stream: video_stream.is_some(),
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
    }
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
