use super::frame_normalizer::AnimationParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Command;

/// 暫存影格的檔名格式（ffmpeg image2 pattern）
pub const FRAME_PATTERN: &str = "frame_%04d.png";

/// 輸出容器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

/// 編碼器備援順序中的一層
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecTier {
    /// VP9 / WebM：支援透明且壓縮率最佳
    Vp9Webm,
    /// VP8 / WebM：支援透明
    Vp8Webm,
    /// H.264 / MP4：不支援透明，背景為白色
    H264Mp4,
}

impl CodecTier {
    /// 優先順序
    pub const CASCADE: [Self; 3] = [Self::Vp9Webm, Self::Vp8Webm, Self::H264Mp4];

    #[must_use]
    pub const fn encoder_name(self) -> &'static str {
        match self {
            Self::Vp9Webm => "libvpx-vp9",
            Self::Vp8Webm => "libvpx",
            Self::H264Mp4 => "libx264",
        }
    }

    #[must_use]
    pub const fn container(self) -> Container {
        match self {
            Self::Vp9Webm | Self::Vp8Webm => Container::Webm,
            Self::H264Mp4 => Container::Mp4,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self.container() {
            Container::Webm => "webm",
            Container::Mp4 => "mp4",
        }
    }

    #[must_use]
    pub const fn supports_alpha(self) -> bool {
        matches!(self, Self::Vp9Webm | Self::Vp8Webm)
    }

    /// ffmpeg `-f` 參數
    #[must_use]
    pub const fn muxer(self) -> &'static str {
        match self.container() {
            Container::Webm => "webm",
            Container::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for CodecTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vp9Webm => write!(f, "VP9/WebM"),
            Self::Vp8Webm => write!(f, "VP8/WebM"),
            Self::H264Mp4 => write!(f, "H.264/MP4"),
        }
    }
}

/// 編碼品質；超過大小上限時改用 `Reduced` 重新編碼一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Standard,
    Reduced,
}

impl QualityLevel {
    pub const LADDER: [Self; 2] = [Self::Standard, Self::Reduced];
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "標準"),
            Self::Reduced => write!(f, "降低"),
        }
    }
}

/// 各層的位元率與量化參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateControl {
    pub bitrate: &'static str,
    pub crf: u32,
}

#[must_use]
pub const fn rate_control(tier: CodecTier, quality: QualityLevel) -> RateControl {
    match (tier, quality) {
        (CodecTier::Vp9Webm, QualityLevel::Standard) => RateControl {
            bitrate: "256k",
            crf: 35,
        },
        (CodecTier::Vp9Webm, QualityLevel::Reduced) => RateControl {
            bitrate: "128k",
            crf: 50,
        },
        (CodecTier::Vp8Webm, QualityLevel::Standard) => RateControl {
            bitrate: "256k",
            crf: 30,
        },
        (CodecTier::Vp8Webm, QualityLevel::Reduced) => RateControl {
            bitrate: "128k",
            crf: 45,
        },
        (CodecTier::H264Mp4, QualityLevel::Standard) => RateControl {
            bitrate: "200k",
            crf: 28,
        },
        (CodecTier::H264Mp4, QualityLevel::Reduced) => RateControl {
            bitrate: "100k",
            crf: 38,
        },
    }
}

/// 建立將暫存影格編碼為片段的 ffmpeg 命令（輸出路徑固定為最後一個參數）
#[must_use]
#[rustfmt::skip]
pub fn build_encode_command(
    program: &Path,
    tier: CodecTier,
    quality: QualityLevel,
    params: &AnimationParams,
    frames_dir: &Path,
    output: &Path,
) -> Command {
    let rate = rate_control(tier, quality);
    let fps = params.fps.to_string();
    let crf = rate.crf.to_string();

    let mut cmd = Command::new(program);
    cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"]);
    cmd.args(["-framerate", &fps, "-i"]).arg(frames_dir.join(FRAME_PATTERN));
    cmd.args(["-an", "-sn", "-dn", "-map_metadata", "-1"]);
    cmd.args(["-t", &format!("{:.3}", params.duration_seconds)]);
    cmd.args(["-r", &fps]);

    match tier {
        CodecTier::Vp9Webm => {
            cmd.args([
                "-c:v", "libvpx-vp9",
                "-pix_fmt", "yuva420p",
                "-b:v", rate.bitrate,
                "-crf", &crf,
                "-deadline", "good",
                "-cpu-used", "4",
                "-row-mt", "1",
                "-auto-alt-ref", "0",
            ]);
        }
        CodecTier::Vp8Webm => {
            cmd.args([
                "-c:v", "libvpx",
                "-pix_fmt", "yuva420p",
                "-b:v", rate.bitrate,
                "-crf", &crf,
                "-g", "15",
                "-auto-alt-ref", "0",
                "-lag-in-frames", "0",
                "-error-resilient", "1",
            ]);
        }
        CodecTier::H264Mp4 => {
            cmd.args([
                "-c:v", "libx264",
                "-pix_fmt", "yuv420p",
                "-preset", "slow",
                "-crf", &crf,
                "-maxrate", rate.bitrate,
                "-bufsize", rate.bitrate,
                "-movflags", "+faststart",
            ]);
        }
    }

    cmd.args(["-f", tier.muxer(), "-y"]).arg(output);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(OsStr::to_string_lossy)
            .map(|s| s.to_string())
            .collect()
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }

    #[test]
    fn test_cascade_order() {
        assert_eq!(
            CodecTier::CASCADE.map(CodecTier::encoder_name),
            ["libvpx-vp9", "libvpx", "libx264"]
        );
        assert!(CodecTier::Vp9Webm.supports_alpha());
        assert!(!CodecTier::H264Mp4.supports_alpha());
        assert_eq!(CodecTier::H264Mp4.extension(), "mp4");
    }

    #[test]
    fn test_vp8_command_arguments() {
        let params = AnimationParams::new(15, 2.0).unwrap();
        let cmd = build_encode_command(
            Path::new("ffmpeg"),
            CodecTier::Vp8Webm,
            QualityLevel::Standard,
            &params,
            Path::new("/tmp/frames"),
            Path::new("/tmp/out.webm"),
        );
        let args = args_of(&cmd);
        assert_eq!(cmd.get_program(), "ffmpeg");
        assert_eq!(value_after(&args, "-c:v").as_deref(), Some("libvpx"));
        assert_eq!(value_after(&args, "-pix_fmt").as_deref(), Some("yuva420p"));
        assert_eq!(value_after(&args, "-framerate").as_deref(), Some("15"));
        assert_eq!(value_after(&args, "-f").as_deref(), Some("webm"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.webm"));
    }

    #[test]
    fn test_reduced_quality_lowers_bitrate() {
        for tier in CodecTier::CASCADE {
            let standard = rate_control(tier, QualityLevel::Standard);
            let reduced = rate_control(tier, QualityLevel::Reduced);
            assert!(reduced.crf > standard.crf);
        }
    }

    #[test]
    fn test_h264_is_opaque() {
        let params = AnimationParams::default();
        let cmd = build_encode_command(
            Path::new("ffmpeg"),
            CodecTier::H264Mp4,
            QualityLevel::Reduced,
            &params,
            Path::new("frames"),
            Path::new("out.mp4"),
        );
        let args = args_of(&cmd);
        assert_eq!(value_after(&args, "-pix_fmt").as_deref(), Some("yuv420p"));
        assert_eq!(value_after(&args, "-crf").as_deref(), Some("38"));
    }
}
