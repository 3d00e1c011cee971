//! Small numeric helpers shared by the indicator components.

/// Arithmetic mean. Returns 0.0 for an empty slice; callers that can see
/// an empty window go through [`defined_mean`] instead.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the defined values, skipping blanks. `None` when nothing is defined.
pub fn defined_mean(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    (!defined.is_empty()).then(|| mean(&defined))
}

/// Sum of the defined values; blanks count as nothing.
pub fn defined_sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Scales `value` by `scale / population`. Multiplying first keeps whole
/// results exact (70 per 1,000,000 is 7.0 per 100,000, not 6.999...).
pub fn per_population(value: f64, population: u64, scale: f64) -> f64 {
    value * scale / population as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0]), 10.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_defined_mean_skips_blanks() {
        assert_eq!(defined_mean(&[Some(2.0), None, Some(4.0)]), Some(3.0));
        assert_eq!(defined_mean(&[None, None]), None);
        assert_eq!(defined_mean(&[]), None);
    }

    #[test]
    fn test_defined_sum_skips_blanks() {
        assert_eq!(defined_sum(&[Some(1.0), None, Some(5.0)]), 6.0);
        assert_eq!(defined_sum(&[None]), 0.0);
    }

    #[test]
    fn test_per_population_is_exact_for_whole_rates() {
        assert_eq!(per_population(70.0, 1_000_000, 100_000.0), 7.0);
        assert_eq!(per_population(15.0, 300_000, 100_000.0), 5.0);
    }
}
