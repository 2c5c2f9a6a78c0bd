//! Three-sigma outlier suppression for numeric columns.

/// Number of standard deviations a value may sit from the mean
pub const SIGMA_LIMIT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
}

impl ColumnStats {
    /// Stats over the present values, `None` with fewer than two of them
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        let count = values.len();
        if count < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Inclusive band of accepted values
    pub fn bounds(&self) -> (f64, f64) {
        let spread = SIGMA_LIMIT * self.std_dev;
        (self.mean - spread, self.mean + spread)
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        let (low, high) = self.bounds();
        value < low || value > high
    }
}

/// Null every value of one column that lies outside the three-sigma band.
///
/// Rows are never removed. Returns how many values were nulled.
pub fn suppress_outliers<T>(rows: &mut [T], field: impl Fn(&mut T) -> &mut Option<f64>) -> usize {
    let stats = ColumnStats::from_values(rows.iter_mut().filter_map(|row| *field(row)));
    let Some(stats) = stats else {
        return 0;
    };
    if stats.std_dev == 0.0 {
        return 0;
    }

    let mut nulled = 0;
    for row in rows.iter_mut() {
        let value = field(row);
        if matches!(*value, Some(v) if stats.is_outlier(v)) {
            *value = None;
            nulled += 1;
        }
    }
    nulled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_std_dev() {
        let stats = ColumnStats::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_values() {
        assert!(ColumnStats::from_values([1.0]).is_none());
        assert!(ColumnStats::from_values([]).is_none());
    }

    #[test]
    fn test_outlier_nulled_not_removed() {
        let mut rows: Vec<Option<f64>> = (0..30).map(|i| Some(20.0 + (i % 5) as f64)).collect();
        rows.push(Some(97.0));
        rows.push(None);

        let nulled = suppress_outliers(&mut rows, |r| r);
        assert_eq!(nulled, 1);
        assert_eq!(rows.len(), 32);
        assert_eq!(rows[30], None);
        assert!(rows[..30].iter().all(|r| r.is_some()));
    }

    #[test]
    fn test_constant_column_untouched() {
        let mut rows = vec![Some(5.0); 10];
        assert_eq!(suppress_outliers(&mut rows, |r| r), 0);
    }
}
