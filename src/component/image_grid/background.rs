use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// 白色背景判定門檻（亮度高於此值）
pub const WHITE_THRESHOLD: u8 = 240;

/// 黑色背景判定門檻（亮度不高於此值）
pub const BLACK_THRESHOLD: u8 = 255 - WHITE_THRESHOLD;

/// 邊緣偵測前的高斯模糊強度（相當於 5x5 核）
const EDGE_BLUR_SIGMA: f32 = 1.1;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// 邊緣膨脹半徑（3x3 核兩次）
const EDGE_DILATE_RADIUS: u8 = 2;

/// 格子背景處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    Keep,
    RemoveWhite,
    RemoveBlack,
    /// 只保留邊緣輪廓圍起的區域
    RemoveEdge,
}

impl BackgroundMode {
    pub const ALL: [Self; 4] = [
        Self::Keep,
        Self::RemoveWhite,
        Self::RemoveBlack,
        Self::RemoveEdge,
    ];
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "保留背景"),
            Self::RemoveWhite => write!(f, "移除白色背景"),
            Self::RemoveBlack => write!(f, "移除黑色背景"),
            Self::RemoveEdge => write!(f, "依輪廓移除背景"),
        }
    }
}

/// 將背景像素改為全透明，回傳新的圖片
#[must_use]
pub fn strip_background(image: &RgbaImage, mode: BackgroundMode) -> RgbaImage {
    let is_background: fn(u8) -> bool = match mode {
        BackgroundMode::Keep => return image.clone(),
        BackgroundMode::RemoveEdge => return apply_mask(image, &edge_mask(image)),
        BackgroundMode::RemoveWhite => |luma| luma > WHITE_THRESHOLD,
        BackgroundMode::RemoveBlack => |luma| luma <= BLACK_THRESHOLD,
    };

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        if is_background(pixel.to_luma()[0]) {
            pixel[3] = 0;
        }
    }
    output
}

/// 前景遮罩：Canny 邊緣膨脹後，填滿輪廓內部
///
/// 從圖片邊界出發、不經過邊緣即可到達的像素視為背景，其餘為前景。
fn edge_mask(image: &RgbaImage) -> GrayImage {
    let gray = imageops::grayscale(image);
    let blurred = gaussian_blur_f32(&gray, EDGE_BLUR_SIGMA);
    let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
    let mut mask = dilate(&edges, Norm::LInf, EDGE_DILATE_RADIUS);

    let (width, height) = mask.dimensions();
    let mut outside = vec![false; (width as usize) * (height as usize)];
    let mut queue = VecDeque::new();
    let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;

    for x in 0..width {
        queue.push_back((x, 0));
        queue.push_back((x, height.saturating_sub(1)));
    }
    for y in 0..height {
        queue.push_back((0, y));
        queue.push_back((width.saturating_sub(1), y));
    }

    while let Some((x, y)) = queue.pop_front() {
        if x >= width || y >= height || outside[index(x, y)] || mask.get_pixel(x, y)[0] > 0 {
            continue;
        }
        outside[index(x, y)] = true;
        if x > 0 {
            queue.push_back((x - 1, y));
        }
        if y > 0 {
            queue.push_back((x, y - 1));
        }
        queue.push_back((x + 1, y));
        queue.push_back((x, y + 1));
    }

    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        *pixel = if outside[index(x, y)] { Luma([0]) } else { Luma([255]) };
    }
    mask
}

fn apply_mask(image: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    let mut output = image.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] == 0 {
            *pixel = Rgba([pixel[0], pixel[1], pixel[2], 0]);
        }
    }
    output
}
