use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// 預設表情包名稱中使用的雜湊長度
const PACK_ID_HEX_LEN: usize = 8;

pub fn calculate_file_hash(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// 以來源檔案內容產生預設表情包名稱：`pack_<8 位十六進位>`
pub fn default_pack_name(media_path: &Path) -> io::Result<String> {
    let hash = calculate_file_hash(media_path)?;
    Ok(format!("pack_{}", &hash[..PACK_ID_HEX_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_calculate_file_hash() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();

        let hash = calculate_file_hash(temp_file.path()).unwrap();
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_default_pack_name_is_stable() {
        let mut temp_file1 = NamedTempFile::new().unwrap();
        let mut temp_file2 = NamedTempFile::new().unwrap();
        temp_file1.write_all(b"identical content").unwrap();
        temp_file2.write_all(b"identical content").unwrap();

        let name1 = default_pack_name(temp_file1.path()).unwrap();
        let name2 = default_pack_name(temp_file2.path()).unwrap();

        assert_eq!(name1, name2);
        assert!(name1.starts_with("pack_"));
        assert_eq!(name1.len(), "pack_".len() + PACK_ID_HEX_LEN);
    }
}
