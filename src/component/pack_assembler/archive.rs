use super::request::PackMetadata;
use crate::error::ArchiveError;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const MANIFEST_NAME: &str = "README.txt";

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 產生封存檔中的說明文字
#[must_use]
pub fn build_manifest(metadata: &PackMetadata) -> String {
    let mut manifest = String::new();
    manifest.push_str(&format!("# {} Emoji Pack\n\n", metadata.pack_name));
    manifest.push_str(&format!(
        "This pack contains {} emoji files ({}, {}).\n",
        metadata.emoji_count, metadata.format, metadata.size
    ));
    manifest.push_str(&format!(
        "Grid: {}x{}, method: {}\n",
        metadata.grid_x, metadata.grid_y, metadata.adaptation_method
    ));
    if let (Some(fps), Some(duration)) = (metadata.fps, metadata.duration_seconds) {
        manifest.push_str(&format!("Animation: {fps} fps, {duration:.1}s\n"));
    }
    manifest.push_str(&format!("Created: {}\n", metadata.created_at.to_rfc3339()));
    if let Some(note) = &metadata.note {
        manifest.push_str(&format!("Note: {note}\n"));
    }
    manifest.push_str("\n## Files\n");
    for name in &metadata.emoji_files {
        manifest.push_str(&format!("- {name}\n"));
    }
    manifest
}

/// 以 JSON 格式寫出中繼資料
pub fn write_metadata(metadata: &PackMetadata, path: &Path) -> Result<(), ArchiveError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, metadata)?;
    writer.flush()?;
    Ok(())
}

/// 建立 zip 封存檔（檔案平鋪於根目錄，另附 README.txt）
pub fn create_archive(
    archive_path: &Path,
    files: &[PathBuf],
    manifest: &str,
) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        zip.start_file(file_name_of(file), options)?;
        let mut source = File::open(file)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.start_file(MANIFEST_NAME, options)?;
    zip.write_all(manifest.as_bytes())?;

    let mut inner = zip.finish()?;
    inner.flush()?;

    info!(
        "已建立封存檔: {}（{} 個檔案）",
        archive_path.display(),
        files.len()
    );
    Ok(())
}

/// 列出封存檔內的檔名
pub fn archive_entries(archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let archive = ZipArchive::new(File::open(archive_path)?)?;
    Ok(archive.file_names().map(ToString::to_string).collect())
}
