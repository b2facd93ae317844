//! E2E Integration Tests
//!
//! 使用真正的 ffmpeg / ffprobe 測試完整流程；找不到 ffmpeg 時跳過。

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use emoji_grid_pack::component::animation_encoder::{
    AnimationParams, CodecTier, discover_encoders,
};
use emoji_grid_pack::component::frame_sampler::{FfmpegFrameSource, FrameSampler, FrameSource};
use emoji_grid_pack::component::pack_assembler::{PackAssembler, ProcessRequest, archive_entries};
use emoji_grid_pack::config::Config;
use emoji_grid_pack::tools::ffmpeg_runner::ToolRunner;
use emoji_grid_pack::tools::ffprobe_info::probe_clip;
use emoji_grid_pack::tools::progress::no_progress;
use tempfile::TempDir;

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|program| {
        Command::new(program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    })
}

fn runner() -> ToolRunner {
    ToolRunner::new(Duration::from_secs(60), Arc::new(AtomicBool::new(false)))
}

/// 以 ffmpeg 內建的測試畫面產生 4 秒 160x90 影片
fn generate_test_video(dir: &Path) -> PathBuf {
    let path = dir.join("testsrc.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=4:size=160x90:rate=10",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "無法產生測試影片");
    path
}

fn test_config(dir: &Path) -> Config {
    let mut config = Config::from_path(&dir.join("settings.json")).unwrap();
    config.pipeline.max_workers = Some(2);
    config.pipeline.cache_root = dir.join("cache");
    config
}

/// 測試 ffmpeg 影格來源
#[test]
fn test_ffmpeg_frame_source_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg / ffprobe");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let video = generate_test_video(tmp.path());

    let source = FfmpegFrameSource::open(runner(), &video).unwrap();
    println!(
        "影片資訊: {} 幀, {:.2} fps, {:?}s",
        source.frame_count(),
        source.frame_rate(),
        source.duration_seconds()
    );
    assert!(source.frame_count() >= 30);

    let frame = source.read_frame(15).unwrap();
    assert_eq!(frame.dimensions(), (160, 90));

    let frames = FrameSampler::default().sample(&source, 5).unwrap();
    assert!(!frames.is_empty() && frames.len() <= 5);
    assert!(frames.windows(2).all(|w| w[0].index < w[1].index));

    println!("✓ 影格來源測試通過");
}

/// 測試影片轉靜態表情包
#[test]
fn test_static_pack_from_video_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg / ffprobe");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let video = generate_test_video(tmp.path());
    let config = test_config(tmp.path());
    let out = tmp.path().join("static");

    let assembler = PackAssembler::new(&config, Arc::new(AtomicBool::new(false)));
    let request = ProcessRequest::new(&video, 3, 2, &out).with_pack_name("testsrc");
    let result = assembler.process(&request, &no_progress).unwrap();

    assert_eq!(result.artifact_files.len(), 6);
    for file in &result.artifact_files {
        let image = image::open(file).unwrap();
        assert_eq!((image.width(), image.height()), (512, 512));
    }
    assert_eq!(archive_entries(&result.archive_path).unwrap().len(), 7);

    println!("✓ 靜態表情包測試通過");
}

/// 測試影片轉動態表情包
#[test]
fn test_animated_pack_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg / ffprobe");
        return;
    }
    let encoders = discover_encoders(&runner()).unwrap_or_default();
    if !CodecTier::CASCADE
        .iter()
        .any(|tier| encoders.contains(tier.encoder_name()))
    {
        println!("跳過測試：ffmpeg 沒有可用的 VP9 / VP8 / H.264 編碼器");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let video = generate_test_video(tmp.path());
    let config = test_config(tmp.path());
    let out = tmp.path().join("animated");

    let assembler = PackAssembler::new(&config, Arc::new(AtomicBool::new(false)));
    let request = ProcessRequest::new(&video, 2, 2, &out)
        .animated(AnimationParams::new(5, 1.0).unwrap())
        .with_pack_name("testsrc");
    let result = assembler.process(&request, &no_progress).unwrap();

    println!(
        "產生 {} 個動態表情（{}），略過 {:?}",
        result.artifact_files.len(),
        result.metadata.format,
        result.metadata.omitted_positions
    );
    assert_eq!(
        result.artifact_files.len() + result.metadata.omitted_positions.len(),
        4
    );

    for file in &result.artifact_files {
        let size = fs::metadata(file).unwrap().len() as usize;
        assert!(size <= config.pipeline.max_clip_bytes);

        let probe = probe_clip(&runner(), file).unwrap();
        assert!(probe.has_video_stream);
        assert_eq!(probe.width, Some(100));
        assert_eq!(probe.height, Some(100));
    }

    println!("✓ 動態表情包測試通過");
}
