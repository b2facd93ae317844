use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 格子畫質強化程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhanceLevel {
    #[default]
    Off,
    Low,
    Medium,
    High,
}

impl EnhanceLevel {
    pub const ALL: [Self; 4] = [Self::Off, Self::Low, Self::Medium, Self::High];

    /// (銳化強度, 銳化門檻, 對比百分比, 亮度增量)
    const fn parameters(self) -> Option<(f32, i32, f32, i32)> {
        match self {
            Self::Off => None,
            Self::Low => Some((1.0, 2, 0.0, 0)),
            Self::Medium => Some((1.0, 1, 10.0, 0)),
            Self::High => Some((1.5, 1, 20.0, 10)),
        }
    }
}

impl fmt::Display for EnhanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "不強化"),
            Self::Low => write!(f, "輕度（僅銳化）"),
            Self::Medium => write!(f, "中度（銳化 + 對比）"),
            Self::High => write!(f, "高度（銳化 + 對比 + 亮度）"),
        }
    }
}

/// 銳化後調整對比與亮度，透明度維持原值
#[must_use]
pub fn enhance(image: &RgbaImage, level: EnhanceLevel) -> RgbaImage {
    let Some((sigma, threshold, contrast, brightness)) = level.parameters() else {
        return image.clone();
    };

    let mut output = imageops::unsharpen(image, sigma, threshold);
    if contrast > 0.0 {
        output = imageops::contrast(&output, contrast);
    }
    if brightness != 0 {
        output = imageops::brighten(&output, brightness);
    }

    for (pixel, original) in output.pixels_mut().zip(image.pixels()) {
        pixel[3] = original[3];
    }
    output
}
