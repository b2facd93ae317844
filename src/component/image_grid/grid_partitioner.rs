use crate::error::AdaptationError;
use crate::tools::progress::{ProgressCallback, ProgressEvent, Stage};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use log::debug;

/// 網格中的單一格子
#[derive(Debug, Clone)]
pub struct Cell {
    /// 橫列優先的索引（0 ≤ index < grid_x * grid_y）
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub image: RgbaImage,
}

/// 將圖片切割為 `grid_x * grid_y` 個格子並縮放為 `cell_size` 正方形
///
/// 邊界以整數除法計算，寬高無法整除時的餘數像素會被捨棄。
/// 每完成一格呼叫一次 `progress`。
pub fn split(
    image: &RgbaImage,
    grid_x: u32,
    grid_y: u32,
    cell_size: u32,
    progress: ProgressCallback<'_>,
) -> Result<Vec<Cell>, AdaptationError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || cell_size == 0 {
        return Err(AdaptationError::EmptyImage);
    }

    let cell_width = width / grid_x.max(1);
    let cell_height = height / grid_y.max(1);
    if grid_x == 0 || grid_y == 0 || cell_width == 0 || cell_height == 0 {
        return Err(AdaptationError::ImageTooSmall {
            width,
            height,
            grid_x,
            grid_y,
        });
    }

    debug!(
        "切割 {width}x{height} 為 {grid_x}x{grid_y}，每格 {cell_width}x{cell_height} -> {cell_size}x{cell_size}"
    );

    let total = (grid_x * grid_y) as usize;
    let mut cells = Vec::with_capacity(total);

    for row in 0..grid_y {
        for col in 0..grid_x {
            let index = (row * grid_x + col) as usize;
            let raw = imageops::crop_imm(
                image,
                col * cell_width,
                row * cell_height,
                cell_width,
                cell_height,
            )
            .to_image();
            let resized = resize_cell(&raw, cell_size);

            cells.push(Cell {
                index,
                row,
                col,
                image: resized,
            });

            progress(&ProgressEvent::new(
                Stage::Partitioning,
                index + 1,
                total,
                format!("處理格子 {}/{total}", index + 1),
            ));
        }
    }

    Ok(cells)
}

fn resize_cell(raw: &RgbaImage, cell_size: u32) -> RgbaImage {
    if raw.dimensions() == (cell_size, cell_size) {
        return raw.clone();
    }
    imageops::resize(raw, cell_size, cell_size, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::progress::no_progress;
    use image::Rgba;
    use std::sync::Mutex;

    /// 每個格子塗上依位置編碼的顏色
    fn quadrant_image(grid_x: u32, grid_y: u32, cell: u32) -> RgbaImage {
        RgbaImage::from_fn(grid_x * cell, grid_y * cell, |x, y| {
            let col = x / cell;
            let row = y / cell;
            Rgba([(col * 40) as u8, (row * 40) as u8, 0, 255])
        })
    }

    #[test]
    fn test_split_count_and_size() {
        let image = quadrant_image(3, 2, 50);
        let cells = split(&image, 3, 2, 64, &no_progress).unwrap();
        assert_eq!(cells.len(), 6);
        for cell in &cells {
            assert_eq!(cell.image.dimensions(), (64, 64));
        }
    }

    #[test]
    fn test_split_row_major_order() {
        let image = quadrant_image(3, 2, 20);
        let cells = split(&image, 3, 2, 20, &no_progress).unwrap();
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index, i);
            assert_eq!(cell.row, (i / 3) as u32);
            assert_eq!(cell.col, (i % 3) as u32);
            let expected = Rgba([(cell.col * 40) as u8, (cell.row * 40) as u8, 0, 255]);
            assert_eq!(*cell.image.get_pixel(10, 10), expected);
        }
    }

    #[test]
    fn test_split_drops_remainder() {
        // 103 / 2 = 51，剩下一欄像素被捨棄
        let image = RgbaImage::from_fn(103, 50, |x, _| {
            if x == 102 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let cells = split(&image, 2, 1, 51, &no_progress).unwrap();
        assert_eq!(cells.len(), 2);
        for cell in &cells {
            assert!(cell.image.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
        }
    }

    #[test]
    fn test_split_progress_monotonic() {
        let steps = Mutex::new(Vec::new());
        let record = |event: &ProgressEvent| {
            steps.lock().unwrap().push((event.step, event.total));
        };
        let image = quadrant_image(2, 2, 10);
        split(&image, 2, 2, 16, &record).unwrap();

        let steps = steps.into_inner().unwrap();
        assert_eq!(steps, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_split_image_too_small() {
        let image = RgbaImage::new(3, 3);
        let err = split(&image, 4, 4, 16, &no_progress).unwrap_err();
        assert!(matches!(err, AdaptationError::ImageTooSmall { .. }));
    }
}
