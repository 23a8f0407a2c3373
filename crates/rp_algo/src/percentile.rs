//! Nearest-rank percentiles over a finishing-position histogram.
//!
//! For N samples the p-th percentile is the sample at rank `ceil(p·N/100)`
//! (at least 1) in ascending order. Integer arithmetic only, so results never
//! depend on floating-point rounding.

use serde::{Deserialize, Serialize};

/// Lower bound percentile reported per driver.
pub const P_BEST: u32 = 5;
/// Upper bound percentile reported per driver.
pub const P_WORST: u32 = 95;

/// Percentile definition echoed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileRule {
    #[default]
    NearestRank,
}

/// Nearest-rank percentile of the positions counted in `histogram`
/// (`histogram[k]` = count of position `k + 1`). `None` when empty or `pct > 100`.
pub fn nearest_rank(histogram: &[u64], pct: u32) -> Option<u32> {
    if pct > 100 {
        return None;
    }
    let n: u64 = histogram.iter().sum();
    if n == 0 {
        return None;
    }
    let rank = (u64::from(pct) * n).div_ceil(100).max(1);
    let mut seen = 0u64;
    for (k, &c) in histogram.iter().enumerate() {
        seen += c;
        if seen >= rank {
            return Some(k as u32 + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(positions: &[u32]) -> Vec<u64> {
        let max = positions.iter().copied().max().unwrap_or(0) as usize;
        let mut h = vec![0u64; max];
        for &p in positions {
            h[p as usize - 1] += 1;
        }
        h
    }

    #[test]
    fn empty_has_no_percentile() {
        assert_eq!(nearest_rank(&[0, 0, 0], 50), None);
        assert_eq!(nearest_rank(&[], 5), None);
    }

    #[test]
    fn single_value_is_every_percentile() {
        let h = hist(&[3]);
        for p in [0, 5, 50, 95, 100] {
            assert_eq!(nearest_rank(&h, p), Some(3));
        }
    }

    #[test]
    fn nearest_rank_on_twenty_samples() {
        // positions 1..=20 once each: p5 -> rank 1, p95 -> rank 19
        let h = vec![1u64; 20];
        assert_eq!(nearest_rank(&h, P_BEST), Some(1));
        assert_eq!(nearest_rank(&h, P_WORST), Some(19));
        assert_eq!(nearest_rank(&h, 100), Some(20));
    }

    #[test]
    fn skewed_distribution() {
        let h = hist(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
        assert_eq!(nearest_rank(&h, 5), Some(1));
        assert_eq!(nearest_rank(&h, 95), Some(2));
        assert_eq!(nearest_rank(&h, 90), Some(1));
    }

    #[test]
    fn out_of_range_pct() {
        assert_eq!(nearest_rank(&[1], 101), None);
    }
}
