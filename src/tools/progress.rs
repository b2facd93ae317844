use serde::Serialize;
use std::fmt;

/// 請求處理階段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Sampling,
    Adapting,
    Partitioning,
    Encoding,
    Saving,
    Archiving,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validating => "驗證",
            Self::Sampling => "取樣",
            Self::Adapting => "調整比例",
            Self::Partitioning => "切割",
            Self::Encoding => "編碼",
            Self::Saving => "儲存",
            Self::Archiving => "封存",
            Self::Done => "完成",
            Self::Failed => "失敗",
        };
        f.write_str(label)
    }
}

/// 進度事件
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub step: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressEvent {
    #[must_use]
    pub fn new(stage: Stage, step: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            step,
            total,
            message: message.into(),
        }
    }

    /// 階段切換事件（不帶步數）
    #[must_use]
    pub fn stage_change(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, 0, 0, message)
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.step as f64 / self.total as f64).min(1.0)
    }
}

/// 進度回呼；可能從多個工作執行緒呼叫
pub type ProgressCallback<'a> = &'a (dyn Fn(&ProgressEvent) + Sync);

/// 不回報進度
pub fn no_progress(_: &ProgressEvent) {}
