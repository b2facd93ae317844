use crate::tools::path_validator::ensure_directory_exists;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 追蹤單一請求寫出的檔案
///
/// 未呼叫 [`OutputGuard::commit`] 就被丟棄時，刪除所有追蹤中的檔案；
/// 輸出目錄若由本 guard 建立，連同目錄一起刪除。
#[derive(Debug)]
pub struct OutputGuard {
    dir: PathBuf,
    created_dir: bool,
    files: Vec<PathBuf>,
    committed: bool,
}

impl OutputGuard {
    pub fn new(dir: &Path) -> io::Result<Self> {
        let created_dir = ensure_directory_exists(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            created_dir,
            files: Vec::new(),
            committed: false,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 回傳輸出目錄下的路徑並開始追蹤
    pub fn track(&mut self, file_name: &str) -> PathBuf {
        let path = self.dir.join(file_name);
        self.files.push(path.clone());
        path
    }

    #[must_use]
    pub fn tracked(&self) -> &[PathBuf] {
        &self.files
    }

    /// 保留所有檔案
    pub fn commit(mut self) {
        self.committed = true;
    }

    fn rollback(&self) {
        for file in self.files.iter().rev() {
            match fs::remove_file(file) {
                Ok(()) => debug!("已刪除未完成的輸出: {}", file.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("無法刪除未完成的輸出 {}: {e}", file.display()),
            }
        }

        if self.created_dir
            && let Err(e) = fs::remove_dir_all(&self.dir)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!("無法刪除輸出目錄 {}: {e}", self.dir.display());
        }
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_removes_created_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("request");
        {
            let mut guard = OutputGuard::new(&out).unwrap();
            let file = guard.track("a.png");
            fs::write(&file, b"x").unwrap();
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_rollback_keeps_existing_dir_and_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let foreign = root.path().join("keep.txt");
        fs::write(&foreign, b"keep").unwrap();
        {
            let mut guard = OutputGuard::new(root.path()).unwrap();
            fs::write(guard.track("a.png"), b"x").unwrap();
            // 追蹤但尚未寫出的檔案
            guard.track("b.png");
        }
        assert!(foreign.exists());
        assert!(!root.path().join("a.png").exists());
    }

    #[test]
    fn test_commit_keeps_files() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("request");
        let mut guard = OutputGuard::new(&out).unwrap();
        let file = guard.track("a.png");
        fs::write(&file, b"x").unwrap();
        guard.commit();
        assert!(file.exists());
    }
}
