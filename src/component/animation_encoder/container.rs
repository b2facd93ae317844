use super::codec_command::Container;
use crate::error::EncodingError;

/// EBML 標頭（Matroska / WebM）
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// ISO BMFF 的 `ftyp` box 位於第 4 個位元組
const FTYP_OFFSET: usize = 4;
const FTYP_MAGIC: &[u8; 4] = b"ftyp";

/// 以檔頭確認輸出確實是預期的容器
pub fn verify_container(bytes: &[u8], container: Container) -> Result<(), EncodingError> {
    let valid = match container {
        Container::Webm => bytes.starts_with(&EBML_MAGIC),
        Container::Mp4 => bytes
            .get(FTYP_OFFSET..FTYP_OFFSET + FTYP_MAGIC.len())
            .is_some_and(|tag| tag == FTYP_MAGIC),
    };

    if valid {
        Ok(())
    } else {
        Err(EncodingError::InvalidContainer(format!(
            "檔頭不符合 {container:?}（{} bytes）",
            bytes.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webm_header() {
        let bytes = [0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x00];
        assert!(verify_container(&bytes, Container::Webm).is_ok());
        assert!(verify_container(&bytes, Container::Mp4).is_err());
    }

    #[test]
    fn test_mp4_header() {
        let bytes = b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00";
        assert!(verify_container(bytes, Container::Mp4).is_ok());
        assert!(verify_container(bytes, Container::Webm).is_err());
    }

    #[test]
    fn test_empty_or_truncated_file() {
        assert!(verify_container(&[], Container::Webm).is_err());
        assert!(verify_container(b"\x00\x00\x00", Container::Mp4).is_err());
    }
}
