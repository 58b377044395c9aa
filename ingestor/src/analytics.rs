use crate::model::{Axes, AxisStats, DeviceAnalytics};

/// Summarizes one axis. Returns `None` for an empty slice.
pub fn summarize(values: &[f64]) -> Option<AxisStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(AxisStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        count: sorted.len(),
        sum: sorted.iter().sum(),
        median: median_of_sorted(&sorted),
    })
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        // halves first so two large values cannot overflow
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    }
}

/// Computes per-axis statistics over a device's readings. `None` means no
/// readings matched.
pub fn compute(rows: &[Axes]) -> Option<DeviceAnalytics> {
    let xs: Vec<f64> = rows.iter().map(|r| r.x).collect();
    let ys: Vec<f64> = rows.iter().map(|r| r.y).collect();
    let zs: Vec<f64> = rows.iter().map(|r| r.z).collect();

    Some(DeviceAnalytics {
        x: summarize(&xs)?,
        y: summarize(&ys)?,
        z: summarize(&zs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn axes(x: f64, y: f64, z: f64) -> Axes {
        Axes { x, y, z }
    }

    #[test]
    fn test_empty_has_no_stats() {
        assert_eq!(summarize(&[]), None);
        assert_eq!(compute(&[]), None);
    }

    #[test]
    fn test_three_readings() {
        let rows = [axes(1.0, 2.0, 3.0), axes(4.0, 5.0, 6.0), axes(7.0, 8.0, 9.0)];
        let analytics = compute(&rows).unwrap();

        assert_eq!(
            analytics.x,
            AxisStats { min: 1.0, max: 7.0, count: 3, sum: 12.0, median: 4.0 }
        );
        assert_eq!(
            analytics.y,
            AxisStats { min: 2.0, max: 8.0, count: 3, sum: 15.0, median: 5.0 }
        );
        assert_eq!(
            analytics.z,
            AxisStats { min: 3.0, max: 9.0, count: 3, sum: 18.0, median: 6.0 }
        );
    }

    #[test]
    fn test_median_even_count_averages_middle_pair() {
        let stats = summarize(&[10.0, 1.0, 4.0, 3.0]).unwrap();
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
    }

    #[test]
    fn test_median_is_order_independent() {
        let stats = summarize(&[9.0, -2.0, 5.0]).unwrap();
        assert_eq!(stats.median, 5.0);
    }

    #[test]
    fn test_single_value() {
        let stats = summarize(&[-3.25]).unwrap();
        assert_eq!(
            stats,
            AxisStats { min: -3.25, max: -3.25, count: 1, sum: -3.25, median: -3.25 }
        );
    }

    #[test]
    fn test_median_of_huge_values_stays_finite() {
        let stats = summarize(&[1e308, 1e308]).unwrap();
        assert_eq!(stats.median, 1e308);
        assert!(stats.min <= stats.median && stats.median <= stats.max);

        let stats = summarize(&[-f64::MAX, f64::MAX]).unwrap();
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn test_overflowing_sum_is_infinite() {
        let stats = summarize(&[f64::MAX, f64::MAX]).unwrap();
        assert!(stats.sum.is_infinite());
        assert_eq!(stats.median, f64::MAX);
    }

    #[test]
    fn test_median_between_min_and_max() {
        let mut rng = rand::thread_rng();
        for len in 1..50 {
            let values: Vec<f64> = (0..len).map(|_| rng.gen_range(-1e6..1e6)).collect();
            let stats = summarize(&values).unwrap();

            assert_eq!(stats.count, len);
            assert!(stats.min <= stats.median && stats.median <= stats.max);
        }
    }
}
