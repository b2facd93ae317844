//! 均勻索引選取
//!
//! 所有函式只計算索引，不讀取影格。

use std::collections::BTreeSet;

/// 在 `total` 幀中選出 `count` 個均勻分布的索引
///
/// 公式：`index[i] = i * total / count`，結果嚴格遞增且不重複。
/// `count` 超過 `total` 時只會回傳 `total` 個索引。
#[must_use]
pub fn uniform_indices(total: usize, count: usize) -> Vec<usize> {
    if total == 0 || count == 0 {
        return Vec::new();
    }
    let count = count.min(total);
    (0..count).map(|i| i * total / count).collect()
}

/// 從長度 `len` 的清單中選出 `count` 個平均分布的位置（含首尾）
#[must_use]
pub fn evenly_spaced_positions(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count >= len {
        return (0..len).collect();
    }
    if count == 1 {
        return vec![0];
    }

    let step = (len - 1) as f64 / (count - 1) as f64;
    (0..count)
        .map(|i| ((i as f64 * step).round() as usize).min(len - 1))
        .collect()
}

/// 補足取樣數量用的額外索引
///
/// 先取 `budget` 個均勻索引，跳過已選取的；仍不足時改用兩倍密度再取，
/// 直到補滿 `needed` 個或所有幀都已用完。回傳值依索引排序。
#[must_use]
pub fn padding_indices(
    total: usize,
    budget: usize,
    taken: &BTreeSet<usize>,
    needed: usize,
) -> Vec<usize> {
    let mut chosen = BTreeSet::new();
    let mut density = budget.max(1);

    while chosen.len() < needed {
        for index in uniform_indices(total, density) {
            if chosen.len() >= needed {
                break;
            }
            if !taken.contains(&index) {
                chosen.insert(index);
            }
        }
        if density >= total {
            break;
        }
        density = density.saturating_mul(2).min(total);
    }

    chosen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_indices_basic() {
        assert_eq!(uniform_indices(100, 4), vec![0, 25, 50, 75]);
        assert_eq!(uniform_indices(10, 3), vec![0, 3, 6]);
    }

    #[test]
    fn test_uniform_indices_strictly_increasing() {
        for total in 1..200 {
            for count in 1..40 {
                let indices = uniform_indices(total, count);
                assert_eq!(indices.len(), count.min(total));
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
                assert!(indices.iter().all(|&i| i < total));
            }
        }
    }

    #[test]
    fn test_uniform_indices_empty() {
        assert!(uniform_indices(0, 5).is_empty());
        assert!(uniform_indices(5, 0).is_empty());
    }

    #[test]
    fn test_evenly_spaced_positions() {
        assert_eq!(evenly_spaced_positions(10, 3), vec![0, 5, 9]);
        assert_eq!(evenly_spaced_positions(3, 5), vec![0, 1, 2]);
        assert_eq!(evenly_spaced_positions(7, 1), vec![0]);

        let positions = evenly_spaced_positions(37, 20);
        assert_eq!(positions.len(), 20);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_padding_skips_taken() {
        let taken: BTreeSet<usize> = [0, 30].into_iter().collect();
        let extra = padding_indices(300, 10, &taken, 8);
        assert_eq!(extra, vec![60, 90, 120, 150, 180, 210, 240, 270]);
    }

    #[test]
    fn test_padding_increases_density_on_overlap() {
        // 均勻索引全部已被選取，需要更密的取樣
        let taken: BTreeSet<usize> = uniform_indices(100, 10).into_iter().collect();
        let extra = padding_indices(100, 10, &taken, 5);
        assert_eq!(extra.len(), 5);
        assert!(extra.iter().all(|i| !taken.contains(i)));
    }

    #[test]
    fn test_padding_exhausts_short_video() {
        let taken: BTreeSet<usize> = [0, 1].into_iter().collect();
        let extra = padding_indices(3, 10, &taken, 8);
        assert_eq!(extra, vec![2]);
    }
}
