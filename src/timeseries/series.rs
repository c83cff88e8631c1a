//! Offset and window operations over row-ordered series
//!
//! Offsets count rows, not wall-clock time. Out-of-range lookups yield
//! `None`, as do windows that are not completely filled.

/// Value `steps` rows ahead: `out[i] = values[i + steps]`
pub fn lead(values: &[Option<f64>], steps: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_add(steps).and_then(|j| values.get(j).copied().flatten()))
        .collect()
}

/// Value `steps` rows back: `out[i] = values[i - steps]`
pub fn lag(values: &[Option<f64>], steps: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(steps).and_then(|j| values[j]))
        .collect()
}

/// Trailing window statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStat {
    Mean,
    /// Sample standard deviation (n - 1 denominator)
    Std,
}

/// Trailing rolling statistic ending at each row.
///
/// Requires `window` present values: a window that starts before the first
/// row or contains a missing value produces `None`.
pub fn rolling(values: &[Option<f64>], window: usize, stat: RollingStat) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let present: Vec<f64> = slice.iter().flatten().copied().collect();
            if present.len() < window {
                return None;
            }
            match stat {
                RollingStat::Mean => mean(&present),
                RollingStat::Std => sample_std(&present),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    Some(m).filter(|v| !v.is_nan())
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt()).filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn test_lead_shifts_forward() {
        let v = some(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(lead(&v, 3), vec![Some(4.0), Some(5.0), None, None, None]);
        assert_eq!(lead(&v, 10), vec![None; 5]);
    }

    #[test]
    fn test_lag_shifts_backward() {
        let v = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        assert_eq!(lag(&v, 1), vec![None, Some(1.0), None, Some(3.0)]);
        assert_eq!(lag(&v, 0), v);
    }

    #[test]
    fn test_rolling_requires_full_window() {
        let v = some(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            rolling(&v, 3, RollingStat::Mean),
            vec![None, None, Some(2.0), Some(3.0)]
        );
        let std = rolling(&v, 3, RollingStat::Std);
        assert_eq!(std[..2], [None, None]);
        assert!((std[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_gap_produces_missing() {
        let v = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let out = rolling(&v, 3, RollingStat::Mean);
        assert_eq!(out, vec![None, None, None, None, None, Some(5.0)]);
    }

    #[test]
    fn test_rolling_std_of_constant_is_zero() {
        let v = some(&[7.0; 6]);
        let out = rolling(&v, 6, RollingStat::Std);
        assert_eq!(out[5], Some(0.0));
    }
}
