use super::model::{DepthArray, StatisticsRecord};
use crate::error::EmptyArrayError;

// ---------------------------------------------------------------------------
// Summary statistics over a depth array
// ---------------------------------------------------------------------------

/// Reduce a depth array to its 5th/95th percentiles, mean and median.
///
/// Every pixel counts; nothing is masked. Percentiles interpolate linearly
/// between order statistics (numpy's default). The mean is accumulated over
/// the sorted values so the result does not depend on pixel order.
pub fn compute(depth: &DepthArray) -> Result<StatisticsRecord, EmptyArrayError> {
    let mut sorted: Vec<f64> = depth.iter().map(f64::from).collect();
    sorted.sort_by(f64::total_cmp);

    Ok(StatisticsRecord {
        quantile05: percentile(&sorted, 5.0).ok_or(EmptyArrayError)?,
        quantile95: percentile(&sorted, 95.0).ok_or(EmptyArrayError)?,
        mean: running_mean(&sorted),
        median: percentile(&sorted, 50.0).ok_or(EmptyArrayError)?,
    })
}

/// `q`-th percentile (0..=100) of an ascending slice, `None` when it is empty.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// Incremental form keeps N copies of v at exactly v.
fn running_mean(values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .fold(0.0, |mean, (i, &v)| mean + (v - mean) / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_of(values: Vec<f32>) -> DepthArray {
        let n = values.len() as u32;
        DepthArray::from_vec(n, 1, values).unwrap()
    }

    #[test]
    fn empty_array_is_an_error() {
        let depth = DepthArray::from_vec(0, 0, Vec::new()).unwrap();
        assert_eq!(compute(&depth), Err(EmptyArrayError));
    }

    #[test]
    fn percentile_of_nothing_is_none() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[2.0], 95.0), Some(2.0));
        assert_eq!(percentile(&[1.0, 3.0], 50.0), Some(2.0));
    }

    #[test]
    fn constant_array_gives_constant_record() {
        for v in [0.1f32, 3.7, 1e-3, 250.0] {
            let stats = compute(&depth_of(vec![v; 37])).unwrap();
            let v = f64::from(v);
            assert_eq!(stats.quantile05, v);
            assert_eq!(stats.quantile95, v);
            assert_eq!(stats.mean, v);
            assert_eq!(stats.median, v);
        }
    }

    #[test]
    fn matches_linear_interpolation() {
        // 0..=10 has 11 samples: q05 sits at position 0.5, q95 at 9.5.
        let stats = compute(&depth_of((0..=10).map(|v| v as f32).collect())).unwrap();
        assert!((stats.quantile05 - 0.5).abs() < 1e-12);
        assert!((stats.quantile95 - 9.5).abs() < 1e-12);
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.mean, 5.0);
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let stats = compute(&depth_of(vec![4.0, 1.0, 3.0, 2.0])).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn permutation_invariant_and_ordered() {
        let values: Vec<f32> = (0..200).map(|i| ((i * 37) % 101) as f32 * 0.173).collect();
        let mut reversed = values.clone();
        reversed.reverse();
        let mut rotated = values.clone();
        rotated.rotate_left(71);

        let a = compute(&depth_of(values)).unwrap();
        let b = compute(&depth_of(reversed)).unwrap();
        let c = compute(&depth_of(rotated)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(a.quantile05 <= a.median);
        assert!(a.median <= a.quantile95);
    }

    #[test]
    fn single_value() {
        let stats = compute(&depth_of(vec![7.5])).unwrap();
        assert_eq!(stats.quantile05, 7.5);
        assert_eq!(stats.quantile95, 7.5);
    }
}
