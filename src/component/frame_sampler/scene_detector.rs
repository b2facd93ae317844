use crate::error::SamplingError;
use image::imageops;
use image::{GrayImage, RgbaImage};
use log::debug;

/// 預設場景變換門檻（灰階平均絕對差）
pub const DEFAULT_SCENE_THRESHOLD: f64 = 30.0;

/// 兩張灰階圖的平均絕對差（0-255）
pub fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> Result<f64, SamplingError> {
    if a.dimensions() != b.dimensions() {
        return Err(SamplingError::FrameMismatch(format!(
            "{}x{} 與 {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }

    let pixels = u64::from(a.width()) * u64::from(a.height());
    if pixels == 0 {
        return Ok(0.0);
    }

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();

    Ok(total as f64 / pixels as f64)
}

/// 找出與前一幀差異超過門檻的幀
///
/// 回傳 `frames` 中的位置；第 0 幀一定被選取。
pub fn detect_scene_changes(
    frames: &[&RgbaImage],
    threshold: f64,
) -> Result<Vec<usize>, SamplingError> {
    if frames.is_empty() {
        return Ok(Vec::new());
    }

    let grays: Vec<GrayImage> = frames.iter().map(|f| imageops::grayscale(*f)).collect();
    let mut key_positions = vec![0];

    for (position, pair) in grays.windows(2).enumerate() {
        let diff = mean_abs_diff(&pair[0], &pair[1])?;
        if diff > threshold {
            debug!("場景變換: 位置 {} 差異 {diff:.2}", position + 1);
            key_positions.push(position + 1);
        }
    }

    Ok(key_positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(8, 8, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_mean_abs_diff() {
        let a = imageops::grayscale(&solid(10));
        let b = imageops::grayscale(&solid(60));
        let diff = mean_abs_diff(&a, &b).unwrap();
        assert!((diff - 50.0).abs() < 1.0);
        assert!(mean_abs_diff(&a, &a).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_abs_diff_size_mismatch() {
        let a = GrayImage::new(4, 4);
        let b = GrayImage::new(5, 4);
        assert!(matches!(
            mean_abs_diff(&a, &b),
            Err(SamplingError::FrameMismatch(_))
        ));
    }

    #[test]
    fn test_detect_scene_changes() {
        let frames = [solid(0), solid(5), solid(200), solid(205), solid(20)];
        let refs: Vec<&RgbaImage> = frames.iter().collect();
        let keys = detect_scene_changes(&refs, DEFAULT_SCENE_THRESHOLD).unwrap();
        assert_eq!(keys, vec![0, 2, 4]);
    }

    #[test]
    fn test_static_video_keeps_first_frame() {
        let frames = [solid(100), solid(100), solid(100)];
        let refs: Vec<&RgbaImage> = frames.iter().collect();
        assert_eq!(detect_scene_changes(&refs, 30.0).unwrap(), vec![0]);
        assert!(detect_scene_changes(&[], 30.0).unwrap().is_empty());
    }
}
