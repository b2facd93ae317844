use super::codec_command::{CodecTier, QualityLevel, build_encode_command};
use super::container::verify_container;
use super::frame_normalizer::AnimationParams;
use super::main::{EncodedClip, Encoder};
use crate::error::{EncodingError, ToolError};
use crate::tools::ffmpeg_runner::ToolRunner;
use crate::tools::ffprobe_info::probe_clip;
use image::{Rgba, RgbaImage};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// `ffmpeg -encoders` 中的視訊編碼器行，例如 ` V....D libvpx-vp9   libvpx VP9`
static VIDEO_ENCODER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*V[A-Z.]{5}\s+(\S+)").expect("valid regex"));

/// 不支援透明的層使用的背景色
const OPAQUE_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// 解析 `ffmpeg -encoders` 輸出中的視訊編碼器名稱
#[must_use]
pub fn parse_encoder_list(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| VIDEO_ENCODER_LINE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|name| name != "=")
        .collect()
}

/// 查詢本機 ffmpeg 可用的視訊編碼器
pub fn discover_encoders(runner: &ToolRunner) -> Result<HashSet<String>, ToolError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-encoders"]);
    let output = runner.run(cmd)?;
    let encoders = parse_encoder_list(&output.stdout_lossy());
    debug!("可用的視訊編碼器: {} 個", encoders.len());
    Ok(encoders)
}

/// 將不透明層的影格鋪到白色背景上
fn flatten_onto(image: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), background);
    image::imageops::overlay(&mut canvas, image, 0, 0);
    canvas
}

/// 透過 ffmpeg 子程序編碼的單一層
pub struct FfmpegEncoder {
    tier: CodecTier,
    runner: ToolRunner,
    available: bool,
    program: PathBuf,
}

impl FfmpegEncoder {
    #[must_use]
    pub fn new(tier: CodecTier, runner: ToolRunner, available: bool) -> Self {
        Self {
            tier,
            runner,
            available,
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// 改用指定的 ffmpeg 執行檔
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// 依優先順序建立所有層，並標記本機是否有對應的編碼器
    #[must_use]
    pub fn cascade(runner: &ToolRunner) -> Vec<Box<dyn Encoder>> {
        let available = match discover_encoders(runner) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!("無法查詢 ffmpeg 編碼器，逐層嘗試: {e}");
                None
            }
        };

        CodecTier::CASCADE
            .into_iter()
            .map(|tier| {
                let present = available
                    .as_ref()
                    .is_none_or(|set| set.contains(tier.encoder_name()));
                info!(
                    "編碼層 {tier} ({}): {}",
                    tier.encoder_name(),
                    if present { "可用" } else { "未安裝" }
                );
                Box::new(Self::new(tier, runner.clone(), present)) as Box<dyn Encoder>
            })
            .collect()
    }

    fn write_frames(&self, frames: &[RgbaImage], dir: &Path) -> Result<(), EncodingError> {
        for (i, frame) in frames.iter().enumerate() {
            let path = dir.join(format!("frame_{:04}.png", i + 1));
            let result = if self.tier.supports_alpha() {
                frame.save(&path)
            } else {
                flatten_onto(frame, OPAQUE_BACKGROUND).save(&path)
            };
            result.map_err(|e| {
                EncodingError::Io(std::io::Error::other(format!(
                    "無法寫入暫存影格 {}: {e}",
                    path.display()
                )))
            })?;
        }
        Ok(())
    }
}

impl Encoder for FfmpegEncoder {
    fn tier(&self) -> CodecTier {
        self.tier
    }

    fn encode(
        &self,
        frames: &[RgbaImage],
        params: &AnimationParams,
        quality: QualityLevel,
    ) -> Result<EncodedClip, EncodingError> {
        if !self.available {
            return Err(EncodingError::EncoderUnavailable(
                self.tier.encoder_name().to_string(),
            ));
        }
        if frames.is_empty() {
            return Err(EncodingError::NoFrames);
        }

        // 暫存目錄在離開函式時自動刪除（成功或失敗皆同）
        let work_dir = tempfile::Builder::new().prefix("emoji_clip_").tempdir()?;
        self.write_frames(frames, work_dir.path())?;

        let output = work_dir.path().join(format!("clip.{}", self.tier.extension()));
        let cmd = build_encode_command(
            &self.program,
            self.tier,
            quality,
            params,
            work_dir.path(),
            &output,
        );

        debug!(
            "{} 編碼 {} 幀（品質 {quality}）",
            self.tier,
            frames.len()
        );
        self.runner.run(cmd)?;

        let bytes = fs::read(&output)?;
        verify_container(&bytes, self.tier.container())?;

        let probe = probe_clip(&self.runner, &output)
            .map_err(|e| EncodingError::InvalidContainer(e.to_string()))?;
        if !probe.has_video_stream {
            return Err(EncodingError::InvalidContainer(format!(
                "{} 沒有視訊串流（{}）",
                self.tier, probe.format_name
            )));
        }

        Ok(EncodedClip {
            bytes,
            tier: self.tier,
            quality,
            frame_count: frames.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn runner() -> ToolRunner {
        ToolRunner::new(Duration::from_secs(10), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_parse_encoder_list() {
        let output = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libvpx               libvpx VP8 (codec vp8)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
";
        let encoders = parse_encoder_list(output);
        assert!(encoders.contains("libx264"));
        assert!(encoders.contains("libvpx"));
        assert!(encoders.contains("libvpx-vp9"));
        assert!(!encoders.contains("aac"));
        assert!(!encoders.contains("="));
    }

    #[test]
    fn test_unavailable_encoder_fails_fast() {
        let encoder = FfmpegEncoder::new(CodecTier::Vp9Webm, runner(), false);
        let frames = vec![RgbaImage::new(4, 4)];
        let err = encoder
            .encode(&frames, &AnimationParams::default(), QualityLevel::Standard)
            .unwrap_err();
        assert!(matches!(err, EncodingError::EncoderUnavailable(name) if name == "libvpx-vp9"));
    }

    #[test]
    fn test_flatten_removes_alpha() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let flat = flatten_onto(&image, OPAQUE_BACKGROUND);
        assert_eq!(*flat.get_pixel(0, 0), OPAQUE_BACKGROUND);
        assert_eq!(*flat.get_pixel(1, 0), Rgba([10, 20, 30, 255]));
    }

    /// 將最後一個參數（輸出路徑）寫成文字檔的假 ffmpeg
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-ffmpeg");
        fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\nprintf 'not a clip' > \"$last\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_output_with_wrong_signature() {
        let tmp = tempfile::TempDir::new().unwrap();
        let program = fake_ffmpeg(tmp.path());
        let frames = vec![RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])); 3];

        for tier in CodecTier::CASCADE {
            let encoder = FfmpegEncoder::new(tier, runner(), true).with_program(&program);
            let err = encoder
                .encode(&frames, &AnimationParams::default(), QualityLevel::Standard)
                .unwrap_err();
            assert!(
                matches!(err, EncodingError::InvalidContainer(_)),
                "{tier}: {err:?}"
            );
        }
    }
}
