use super::archive::{build_manifest, create_archive, write_metadata};
use super::output_guard::OutputGuard;
use super::request::{PackMetadata, PackMode, ProcessRequest, ProcessResult, format_tag};
use super::validation::{validate_request, validate_video_duration};
use crate::component::animation_encoder::{
    AnimationEncoder, AnimationParams, CodecTier, Encoder, FfmpegEncoder,
};
use crate::component::frame_sampler::{
    FfmpegOpener, FrameSampler, FrameSource, FrameSourceOpener, frame_budget_for_duration,
};
use crate::component::image_grid::{adapt, enhance, split, strip_background};
use crate::component::temporal_organizer::organize;
use crate::config::{Config, MediaFormatTable, MediaKind, PipelineSettings};
use crate::error::{AdaptationError, EncodingError, PackError, ToolError, ValidationError};
use crate::tools::ffmpeg_runner::ToolRunner;
use crate::tools::file_hasher::default_pack_name;
use crate::tools::file_tools::safe_filename;
use crate::tools::progress::{ProgressCallback, ProgressEvent, Stage, no_progress};
use chrono::Utc;
use image::{Rgba, RgbaImage};
use log::{debug, error, info};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// 產出檔案與編碼統計
struct Artifacts {
    files: Vec<PathBuf>,
    cell_size: u32,
    omitted: Vec<usize>,
    codecs: Vec<CodecTier>,
    animation: Option<AnimationParams>,
}

/// 表情包組裝器
///
/// 每個請求依序經過：驗證 → 取樣（影片）→ 調整比例 → 切割 →
/// 編碼（動態）或儲存（靜態）→ 封存。任何階段失敗都會刪除本次請求寫出的檔案。
pub struct PackAssembler {
    settings: PipelineSettings,
    formats: MediaFormatTable,
    opener: Box<dyn FrameSourceOpener>,
    encoder: AnimationEncoder,
    shutdown_signal: Arc<AtomicBool>,
}

impl PackAssembler {
    /// 使用 ffmpeg / ffprobe 作為影片來源與編碼器
    #[must_use]
    pub fn new(config: &Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        let runner = ToolRunner::new(
            config.pipeline.codec_timeout(),
            Arc::clone(&shutdown_signal),
        );
        let opener = Box::new(FfmpegOpener::new(runner.clone()));
        let encoders = FfmpegEncoder::cascade(&runner);

        Self::with_backends(
            config.pipeline.clone(),
            config.media_formats.clone(),
            opener,
            encoders,
            shutdown_signal,
        )
    }

    /// 指定影片來源與編碼層（測試時可注入替身）
    #[must_use]
    pub fn with_backends(
        settings: PipelineSettings,
        formats: MediaFormatTable,
        opener: Box<dyn FrameSourceOpener>,
        encoders: Vec<Box<dyn Encoder>>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        let encoder = AnimationEncoder::new(
            encoders,
            settings.max_clip_bytes,
            settings.max_workers,
            Arc::clone(&shutdown_signal),
        );
        Self {
            settings,
            formats,
            opener,
            encoder,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 處理單一請求
    pub fn process(
        &self,
        request: &ProcessRequest,
        progress: ProgressCallback<'_>,
    ) -> Result<ProcessResult, PackError> {
        let started = Instant::now();
        info!(
            "開始處理 {}（{}，{}x{}，{}）",
            request.media_path.display(),
            request.mode,
            request.grid_x,
            request.grid_y,
            request.adaptation_method
        );

        let result = self.run_pipeline(request, progress, started);

        match &result {
            Ok(result) => {
                info!(
                    "處理完成: {} 個檔案，耗時 {} ms",
                    result.artifact_files.len(),
                    result.metadata.elapsed_ms
                );
                progress(&ProgressEvent::stage_change(Stage::Done, "完成"));
            }
            Err(e) => {
                error!("處理失敗: {e}");
                progress(&ProgressEvent::stage_change(Stage::Failed, e.user_message()));
            }
        }

        result
    }

    fn check_cancelled(&self) -> Result<(), PackError> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(PackError::Cancelled);
        }
        Ok(())
    }

    fn run_pipeline(
        &self,
        request: &ProcessRequest,
        progress: ProgressCallback<'_>,
        started: Instant,
    ) -> Result<ProcessResult, PackError> {
        progress(&ProgressEvent::stage_change(Stage::Validating, "驗證輸入"));
        let validated = validate_request(request, &self.formats, &self.settings)?;
        self.check_cancelled()?;

        let mut guard = OutputGuard::new(&request.output_dir)?;
        let pack_name = resolve_pack_name(request)?;

        let artifacts = match (validated.kind, request.mode) {
            (MediaKind::Image, PackMode::Static) => {
                let image = load_image(&request.media_path)?;
                self.build_static(&image, request, &pack_name, &mut guard, progress)?
            }
            (MediaKind::Video, PackMode::Static) => {
                let source = self.open_video(&request.media_path)?;
                progress(&ProgressEvent::stage_change(Stage::Sampling, "擷取代表畫面"));
                let frame = FrameSampler::default().representative_frame(source.as_ref())?;
                self.build_static(&frame.image, request, &pack_name, &mut guard, progress)?
            }
            (MediaKind::Video, PackMode::Animated) => {
                let params = validated.animation.unwrap_or_default();
                self.build_animated(request, params, &pack_name, &mut guard, progress)?
            }
            (MediaKind::Image, PackMode::Animated) => {
                let reason = "動態表情包只接受影片".to_string();
                return Err(ValidationError::ModeMismatch(reason).into());
            }
        };

        self.check_cancelled()?;
        progress(&ProgressEvent::stage_change(Stage::Archiving, "建立封存檔"));

        let total_positions = request.cell_count();
        let note = (!artifacts.omitted.is_empty()).then(|| {
            format!(
                "{} / {total_positions} 個位置編碼失敗已略過",
                artifacts.omitted.len()
            )
        });

        let metadata = PackMetadata {
            pack_name: pack_name.clone(),
            emoji_count: artifacts.files.len(),
            emoji_files: artifacts.files.iter().map(|p| file_name_of(p)).collect(),
            created_at: Utc::now(),
            format: format_tag(request.mode, &artifacts.codecs),
            size: format!("{0}x{0}", artifacts.cell_size),
            grid_x: request.grid_x,
            grid_y: request.grid_y,
            adaptation_method: request.adaptation_method,
            fps: artifacts.animation.map(|a| a.fps),
            duration_seconds: artifacts.animation.map(|a| a.duration_seconds),
            omitted_positions: artifacts.omitted,
            codecs: artifacts.codecs,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            note,
        };

        let metadata_path = guard.track(&format!("{pack_name}_metadata.json"));
        write_metadata(&metadata, &metadata_path)?;

        let archive_path = guard.track(&format!("{pack_name}.zip"));
        create_archive(&archive_path, &artifacts.files, &build_manifest(&metadata))?;

        guard.commit();

        Ok(ProcessResult {
            artifact_files: artifacts.files,
            archive_path,
            metadata_path,
            metadata,
        })
    }

    fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, PackError> {
        let source = self.opener.open(path)?;
        validate_video_duration(source.duration_seconds(), &self.settings)?;
        Ok(source)
    }

    fn build_static(
        &self,
        image: &RgbaImage,
        request: &ProcessRequest,
        pack_name: &str,
        guard: &mut OutputGuard,
        progress: ProgressCallback<'_>,
    ) -> Result<Artifacts, PackError> {
        let cell_size = self.settings.static_cell_size;

        progress(&ProgressEvent::stage_change(Stage::Adapting, "調整長寬比"));
        let adapted = adapt(
            image,
            request.grid_x,
            request.grid_y,
            request.adaptation_method,
            Rgba(self.settings.pad_color),
        )?;
        self.check_cancelled()?;

        let cells = split(&adapted, request.grid_x, request.grid_y, cell_size, progress)?;
        self.check_cancelled()?;

        let total = cells.len();
        let mut files = Vec::with_capacity(total);
        for cell in cells {
            let path = guard.track(&format!("{pack_name}_emoji_{:03}.png", cell.index + 1));
            finish_cell(&cell.image, request)
                .save(&path)
                .map_err(|e| {
                    PackError::Io(io::Error::other(format!("無法儲存 {}: {e}", path.display())))
                })?;
            debug!("已儲存 {}", path.display());
            files.push(path);

            progress(&ProgressEvent::new(
                Stage::Saving,
                files.len(),
                total,
                format!("儲存表情 {}/{total}", files.len()),
            ));
        }

        Ok(Artifacts {
            files,
            cell_size,
            omitted: Vec::new(),
            codecs: Vec::new(),
            animation: None,
        })
    }

    fn build_animated(
        &self,
        request: &ProcessRequest,
        params: AnimationParams,
        pack_name: &str,
        guard: &mut OutputGuard,
        progress: ProgressCallback<'_>,
    ) -> Result<Artifacts, PackError> {
        let cell_size = self.settings.animated_cell_size;
        let source = self.open_video(&request.media_path)?;

        let max_frames = self
            .settings
            .max_frames
            .unwrap_or_else(|| frame_budget_for_duration(source.duration_seconds()));
        progress(&ProgressEvent::stage_change(
            Stage::Sampling,
            format!("取樣最多 {max_frames} 幀"),
        ));
        let sampler = FrameSampler::new(
            self.settings.sampling_strategy,
            self.settings.scene_threshold,
        );
        let frames = sampler.sample(source.as_ref(), max_frames)?;
        drop(source);
        self.check_cancelled()?;

        progress(&ProgressEvent::stage_change(Stage::Adapting, "調整每一幀的長寬比"));
        let pad_color = Rgba(self.settings.pad_color);
        let total_frames = frames.len();
        let partitioned = AtomicUsize::new(0);

        let grids: Vec<Vec<RgbaImage>> = frames
            .par_iter()
            .map(|frame| -> Result<Vec<RgbaImage>, AdaptationError> {
                let adapted = adapt(
                    &frame.image,
                    request.grid_x,
                    request.grid_y,
                    request.adaptation_method,
                    pad_color,
                )?;
                let cells = split(
                    &adapted,
                    request.grid_x,
                    request.grid_y,
                    cell_size,
                    &no_progress,
                )?;
                let done = partitioned.fetch_add(1, Ordering::SeqCst) + 1;
                progress(&ProgressEvent::new(
                    Stage::Partitioning,
                    done,
                    total_frames,
                    format!("切割第 {done}/{total_frames} 幀"),
                ));
                Ok(cells
                    .into_iter()
                    .map(|cell| finish_cell(&cell.image, request))
                    .collect())
            })
            .collect::<Result<_, _>>()?;
        self.check_cancelled()?;

        let sequences = organize(grids, request.cell_count());
        let report = self
            .encoder
            .encode_all(&sequences, &params, progress)
            .map_err(cancellation_aware)?;
        self.check_cancelled()?;

        let mut files = Vec::with_capacity(report.clips.len());
        for entry in &report.clips {
            let path = guard.track(&format!(
                "{pack_name}_emoji_{:03}.{}",
                entry.position + 1,
                entry.clip.extension()
            ));
            fs::write(&path, &entry.clip.bytes)?;
            debug!(
                "已儲存 {}（{}，{} bytes）",
                path.display(),
                entry.clip.tier,
                entry.clip.size()
            );
            files.push(path);
        }

        Ok(Artifacts {
            files,
            cell_size,
            codecs: report.tiers_used(),
            omitted: report.omitted,
            animation: Some(params),
        })
    }
}

fn cancellation_aware(err: EncodingError) -> PackError {
    match err {
        EncodingError::Tool(ToolError::Cancelled(_)) => PackError::Cancelled,
        other => PackError::Encoding(other),
    }
}

/// 畫質強化後移除背景
fn finish_cell(cell: &RgbaImage, request: &ProcessRequest) -> RgbaImage {
    strip_background(&enhance(cell, request.enhancement), request.background)
}

fn resolve_pack_name(request: &ProcessRequest) -> Result<String, PackError> {
    match request.pack_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(safe_filename(name)),
        _ => Ok(default_pack_name(&request.media_path)?),
    }
}

fn load_image(path: &Path) -> Result<RgbaImage, AdaptationError> {
    let image = image::open(path).map_err(|e| AdaptationError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
