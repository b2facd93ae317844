use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;
use walkdir::WalkDir;

/// 快取清理結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_files: usize,
    pub removed_dirs: usize,
    pub bytes_freed: u64,
}

/// 快取目錄統計
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub request_dirs: usize,
}

/// 為單一請求配置獨立的輸出路徑：`<cache_root>/<uuid>`
///
/// 只產生路徑，目錄由處理流程建立，失敗時連同目錄一併移除。
#[must_use]
pub fn request_output_dir(cache_root: &Path) -> PathBuf {
    let dir = cache_root.join(Uuid::new_v4().to_string());
    debug!("配置請求目錄: {}", dir.display());
    dir
}

fn age_of(metadata: &fs::Metadata, now: SystemTime) -> Duration {
    metadata
        .modified()
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .unwrap_or_default()
}

/// 刪除超過 `max_age` 的快取檔案，並移除清空後的請求目錄
///
/// 清理開始時仍在 `max_age` 內的目錄視為進行中的請求，即使是空的也保留。
pub fn cleanup_cache(cache_root: &Path, max_age: Duration) -> io::Result<CleanupReport> {
    let mut report = CleanupReport::default();
    if !cache_root.exists() {
        return Ok(report);
    }

    let now = SystemTime::now();
    let fresh_dirs: HashSet<PathBuf> = WalkDir::new(cache_root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.metadata().is_ok_and(|m| age_of(&m, now) < max_age))
        .map(|e| e.into_path())
        .collect();

    for entry in WalkDir::new(cache_root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if age_of(&metadata, now) <= max_age {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                report.removed_files += 1;
                report.bytes_freed += metadata.len();
                debug!("已清理快取檔案: {}", entry.path().display());
            }
            Err(e) => warn!("無法清理快取檔案 {}: {e}", entry.path().display()),
        }
    }

    // 由深到淺移除空目錄（保留根目錄）
    for entry in WalkDir::new(cache_root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        if fresh_dirs.contains(entry.path()) {
            continue;
        }
        if fs::remove_dir(entry.path()).is_ok() {
            report.removed_dirs += 1;
        }
    }

    if report.removed_files > 0 {
        info!(
            "快取清理: 移除 {} 個檔案，釋放 {:.1} MB",
            report.removed_files,
            report.bytes_freed as f64 / 1024.0 / 1024.0
        );
    }

    Ok(report)
}

#[must_use]
pub fn cache_stats(cache_root: &Path) -> CacheStats {
    let mut stats = CacheStats::default();
    if !cache_root.exists() {
        return stats;
    }

    for entry in WalkDir::new(cache_root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.file_type().is_file() {
            stats.total_files += 1;
            stats.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        } else if entry.file_type().is_dir() && entry.depth() == 1 {
            stats.request_dirs += 1;
        }
    }

    stats
}
