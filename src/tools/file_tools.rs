use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const MAX_FILENAME_LEN: usize = 100;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// 產生安全的檔名：替換特殊字元、空白轉底線、去除首尾的點與底線
#[must_use]
pub fn safe_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    let replaced = WHITESPACE.replace_all(&replaced, "_");
    let mut safe = replaced.trim_matches(|c| c == '.' || c == '_').to_string();

    if safe.chars().count() > MAX_FILENAME_LEN {
        let path = Path::new(&safe);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let stem_len = MAX_FILENAME_LEN.saturating_sub(ext.chars().count());
        let stem: String = safe.chars().take(stem_len).collect();
        safe = format!("{stem}{ext}");
    }

    if safe.is_empty() {
        "unnamed_file".to_string()
    } else {
        safe
    }
}

/// 格式化檔案大小
#[must_use]
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size_bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
