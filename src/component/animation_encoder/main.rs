use super::codec_command::{CodecTier, QualityLevel};
use super::frame_normalizer::{AnimationParams, normalize_frame_count};
use crate::component::temporal_organizer::PositionSequence;
use crate::error::{EncodingError, ToolError};
use crate::tools::cpu_monitor::CpuMonitor;
use crate::tools::progress::{ProgressCallback, ProgressEvent, Stage};
use image::RgbaImage;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// CPU 使用率超過此值時只用一個工作執行緒
const CPU_BUSY_THRESHOLD: f32 = 90.0;

/// 編碼完成的動態片段
#[derive(Debug, Clone)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub tier: CodecTier,
    pub quality: QualityLevel,
    pub frame_count: usize,
}

impl EncodedClip {
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        self.tier.extension()
    }
}

/// 單一編碼層
///
/// 實作可以是真正的 ffmpeg 子程序，也可以是測試用的替身。
pub trait Encoder: Send + Sync {
    fn tier(&self) -> CodecTier;

    fn encode(
        &self,
        frames: &[RgbaImage],
        params: &AnimationParams,
        quality: QualityLevel,
    ) -> Result<EncodedClip, EncodingError>;
}

/// 單一位置的編碼結果
#[derive(Debug)]
pub struct PositionClip {
    pub position: usize,
    pub clip: EncodedClip,
}

/// 所有位置的編碼結果；失敗的位置列在 `omitted`
#[derive(Debug, Default)]
pub struct EncodeReport {
    pub clips: Vec<PositionClip>,
    pub omitted: Vec<usize>,
    pub failures: Vec<String>,
}

impl EncodeReport {
    /// 實際使用到的編碼層（依優先順序）
    #[must_use]
    pub fn tiers_used(&self) -> Vec<CodecTier> {
        CodecTier::CASCADE
            .into_iter()
            .filter(|tier| self.clips.iter().any(|c| c.clip.tier == *tier))
            .collect()
    }
}

/// 依序嘗試多個編碼層，並強制片段大小上限
pub struct AnimationEncoder {
    encoders: Vec<Box<dyn Encoder>>,
    max_clip_bytes: usize,
    max_workers: Option<usize>,
    shutdown_signal: Arc<AtomicBool>,
}

impl AnimationEncoder {
    #[must_use]
    pub fn new(
        encoders: Vec<Box<dyn Encoder>>,
        max_clip_bytes: usize,
        max_workers: Option<usize>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            encoders,
            max_clip_bytes,
            max_workers,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn max_clip_bytes(&self) -> usize {
        self.max_clip_bytes
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }

    /// 編碼單一位置
    ///
    /// 每一層先以標準品質編碼；超過大小上限時降低品質重試一次，
    /// 仍超過或失敗則換下一層。所有層都失敗時回傳 `AllTiersFailed`。
    pub fn encode_position(
        &self,
        position: usize,
        frames: &[RgbaImage],
        params: &AnimationParams,
    ) -> Result<EncodedClip, EncodingError> {
        if frames.is_empty() {
            return Err(EncodingError::NoFrames);
        }

        let normalized = normalize_frame_count(frames, params.target_frames());
        debug!(
            "位置 {position}: {} 幀 -> {} 幀",
            frames.len(),
            normalized.len()
        );

        let mut reasons = Vec::new();

        for encoder in &self.encoders {
            let tier = encoder.tier();

            for quality in QualityLevel::LADDER {
                if self.is_cancelled() {
                    return Err(EncodingError::Tool(ToolError::Cancelled(tier.to_string())));
                }

                match encoder.encode(&normalized, params, quality) {
                    Ok(clip) if clip.size() <= self.max_clip_bytes => {
                        debug!(
                            "位置 {position}: {tier} 成功（{quality}，{} bytes）",
                            clip.size()
                        );
                        return Ok(clip);
                    }
                    Ok(clip) => {
                        let err = EncodingError::OverBudget {
                            size: clip.size(),
                            limit: self.max_clip_bytes,
                        };
                        warn!("位置 {position}: {tier}（{quality}）{err}");
                        reasons.push(format!("{tier}: {err}"));
                    }
                    Err(EncodingError::Tool(ToolError::Cancelled(program))) => {
                        return Err(EncodingError::Tool(ToolError::Cancelled(program)));
                    }
                    Err(err) => {
                        warn!("位置 {position}: {tier} 失敗，改用下一層: {err}");
                        reasons.push(format!("{tier}: {err}"));
                        break;
                    }
                }
            }
        }

        Err(EncodingError::AllTiersFailed { position, reasons })
    }

    fn worker_count(&self, jobs: usize) -> usize {
        let limit = jobs.max(1);
        match self.max_workers {
            Some(workers) => workers.clamp(1, limit),
            None => CpuMonitor::new(CPU_BUSY_THRESHOLD).suggested_workers(limit),
        }
    }

    /// 平行編碼所有位置，結果依位置排序
    ///
    /// 個別位置失敗只會被略過；全部失敗時回傳 `NoClipsProduced`。
    pub fn encode_all(
        &self,
        sequences: &[PositionSequence<RgbaImage>],
        params: &AnimationParams,
        progress: ProgressCallback<'_>,
    ) -> Result<EncodeReport, EncodingError> {
        let total = sequences.len();
        if total == 0 {
            return Err(EncodingError::NoFrames);
        }

        let workers = self.worker_count(total);
        info!(
            "開始編碼 {total} 個位置（{workers} 個工作執行緒，上限 {} bytes）",
            self.max_clip_bytes
        );

        let completed = AtomicUsize::new(0);
        let run = || -> Vec<(usize, Result<EncodedClip, EncodingError>)> {
            sequences
                .par_iter()
                .map(|sequence| {
                    let result = self.encode_position(sequence.position, &sequence.frames, params);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(&ProgressEvent::new(
                        Stage::Encoding,
                        done,
                        total,
                        format!("編碼位置 {}", sequence.position + 1),
                    ));
                    (sequence.position, result)
                })
                .collect()
        };

        let results = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("無法建立編碼執行緒池，使用全域執行緒池: {e}");
                run()
            }
        };

        let mut report = EncodeReport::default();
        for (position, result) in results {
            match result {
                Ok(clip) => report.clips.push(PositionClip { position, clip }),
                Err(err @ EncodingError::Tool(ToolError::Cancelled(_))) => return Err(err),
                Err(err) => {
                    error!("位置 {position} 已略過: {err}");
                    report.omitted.push(position);
                    report.failures.push(err.to_string());
                }
            }
        }

        if report.clips.is_empty() {
            return Err(EncodingError::NoClipsProduced);
        }

        info!(
            "編碼完成: {} 個成功，{} 個略過",
            report.clips.len(),
            report.omitted.len()
        );

        Ok(report)
    }
}
