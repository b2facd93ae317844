use crate::error::AdaptationError;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 比例差距小於此值時不做任何調整
pub const RATIO_EPSILON: f64 = 0.01;

/// 預設填充顏色（白色）
pub const DEFAULT_PAD_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// 長寬比調整方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptationMethod {
    /// 對稱補邊，不損失內容
    #[default]
    Pad,
    /// 單軸縮放，內容變形
    Stretch,
    /// 置中裁切，捨棄視窗外內容
    Crop,
}

impl AdaptationMethod {
    pub const ALL: [Self; 3] = [Self::Pad, Self::Stretch, Self::Crop];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pad => "pad",
            Self::Stretch => "stretch",
            Self::Crop => "crop",
        }
    }
}

impl fmt::Display for AdaptationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdaptationMethod {
    type Err = AdaptationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pad" => Ok(Self::Pad),
            "stretch" => Ok(Self::Stretch),
            "crop" => Ok(Self::Crop),
            other => Err(AdaptationError::UnknownMethod(other.to_string())),
        }
    }
}

#[must_use]
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    f64::from(width) / f64::from(height)
}

/// 將圖片長寬比調整為 `grid_x / grid_y`
///
/// 回傳新的圖片，不修改輸入。比例已在 [`RATIO_EPSILON`] 內時回傳原圖的複本。
pub fn adapt(
    image: &RgbaImage,
    grid_x: u32,
    grid_y: u32,
    method: AdaptationMethod,
    pad_color: Rgba<u8>,
) -> Result<RgbaImage, AdaptationError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || grid_x == 0 || grid_y == 0 {
        return Err(AdaptationError::EmptyImage);
    }

    let current_ratio = aspect_ratio(width, height);
    let target_ratio = aspect_ratio(grid_x, grid_y);

    debug!(
        "調整圖片: {width}x{height} (比例 {current_ratio:.2}) -> 網格 {grid_x}x{grid_y} (比例 {target_ratio:.2})，方式 {method}"
    );

    if (current_ratio - target_ratio).abs() < RATIO_EPSILON {
        return Ok(image.clone());
    }

    let adapted = match method {
        AdaptationMethod::Pad => apply_padding(image, target_ratio, pad_color),
        AdaptationMethod::Stretch => apply_stretching(image, target_ratio),
        AdaptationMethod::Crop => apply_center_crop(image, target_ratio),
    };

    Ok(adapted)
}

fn scaled_dimension(base: u32, factor: f64) -> u32 {
    ((f64::from(base) * factor).round() as u32).max(1)
}

fn apply_padding(image: &RgbaImage, target_ratio: f64, fill: Rgba<u8>) -> RgbaImage {
    let (width, height) = image.dimensions();
    let current_ratio = aspect_ratio(width, height);

    let (new_width, new_height) = if current_ratio < target_ratio {
        // 加寬：左右補邊
        (scaled_dimension(height, target_ratio).max(width), height)
    } else {
        // 加高：上下補邊
        (width, scaled_dimension(width, 1.0 / target_ratio).max(height))
    };

    // 奇數差距時多出的一像素落在右側 / 下方
    let offset_x = (new_width - width) / 2;
    let offset_y = (new_height - height) / 2;

    let mut canvas = RgbaImage::from_pixel(new_width, new_height, fill);
    imageops::replace(&mut canvas, image, i64::from(offset_x), i64::from(offset_y));
    canvas
}

fn apply_stretching(image: &RgbaImage, target_ratio: f64) -> RgbaImage {
    let height = image.height();
    let new_width = scaled_dimension(height, target_ratio);
    imageops::resize(image, new_width, height, FilterType::Lanczos3)
}

fn apply_center_crop(image: &RgbaImage, target_ratio: f64) -> RgbaImage {
    let (width, height) = image.dimensions();
    let current_ratio = aspect_ratio(width, height);

    if current_ratio > target_ratio {
        // 太寬：左右裁切
        let new_width = scaled_dimension(height, target_ratio).min(width);
        let start_x = (width - new_width) / 2;
        imageops::crop_imm(image, start_x, 0, new_width, height).to_image()
    } else {
        // 太高：上下裁切
        let new_height = scaled_dimension(width, 1.0 / target_ratio).min(height);
        let start_y = (height - new_height) / 2;
        imageops::crop_imm(image, 0, start_y, width, new_height).to_image()
    }
}
