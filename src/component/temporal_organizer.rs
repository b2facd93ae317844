//! 將逐幀網格轉置為逐位置序列
//!
//! `result[pos][t] == frames[t][pos]`，不做縮放或過濾。

use log::{debug, warn};

/// 單一網格位置在所有取樣幀中的影像
#[derive(Debug, Clone)]
pub struct PositionSequence<T> {
    pub position: usize,
    pub frames: Vec<T>,
}

impl<T> PositionSequence<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// 轉置 `[frame][position]` 為 `[position][frame]`
///
/// 輸入為空時回傳空結果。某一幀的格子數與 `positions` 不符時只取前
/// `positions` 個，缺少的位置不補。
#[must_use]
pub fn organize<T>(frame_grids: Vec<Vec<T>>, positions: usize) -> Vec<PositionSequence<T>> {
    if frame_grids.is_empty() || positions == 0 {
        return Vec::new();
    }

    let frame_count = frame_grids.len();
    let mut sequences: Vec<PositionSequence<T>> = (0..positions)
        .map(|position| PositionSequence {
            position,
            frames: Vec::with_capacity(frame_count),
        })
        .collect();

    for (t, grid) in frame_grids.into_iter().enumerate() {
        if grid.len() != positions {
            warn!("第 {t} 幀有 {} 個格子，預期 {positions} 個", grid.len());
        }
        for (sequence, cell) in sequences.iter_mut().zip(grid) {
            sequence.frames.push(cell);
        }
    }

    debug!("轉置完成: {positions} 個位置 × {frame_count} 幀");
    sequences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_matches_source() {
        let frames: Vec<Vec<(usize, usize)>> = (0..5)
            .map(|t| (0..6).map(|p| (t, p)).collect())
            .collect();
        let expected = frames.clone();

        let sequences = organize(frames, 6);
        assert_eq!(sequences.len(), 6);
        for (p, sequence) in sequences.iter().enumerate() {
            assert_eq!(sequence.position, p);
            assert_eq!(sequence.len(), 5);
            for (t, value) in sequence.frames.iter().enumerate() {
                assert_eq!(*value, expected[t][p]);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let sequences = organize(Vec::<Vec<u8>>::new(), 4);
        assert!(sequences.is_empty());
    }

    #[test]
    fn test_single_frame() {
        let sequences = organize(vec![vec!['a', 'b', 'c', 'd']], 4);
        let firsts: Vec<char> = sequences.iter().map(|s| s.frames[0]).collect();
        assert_eq!(firsts, vec!['a', 'b', 'c', 'd']);
    }
}
