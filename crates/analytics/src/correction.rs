use core_types::CorrectionMethod;

/// Adjusts a family of p-values for multiple comparisons.
///
/// The output is in the same order as the input and every value stays in `[0, 1]`.
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Vec<f64> {
    let m = p_values.len() as f64;
    match method {
        CorrectionMethod::None => p_values.to_vec(),
        CorrectionMethod::Bonferroni => p_values.iter().map(|p| (p * m).min(1.0)).collect(),
        CorrectionMethod::Holm => {
            let mut order: Vec<usize> = (0..p_values.len()).collect();
            order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

            let mut adjusted = vec![0.0; p_values.len()];
            let mut running_max: f64 = 0.0;
            for (rank, &idx) in order.iter().enumerate() {
                let scaled = ((m - rank as f64) * p_values[idx]).min(1.0);
                // Step-down adjustments must be monotone in the sorted order.
                running_max = running_max.max(scaled);
                adjusted[idx] = running_max;
            }
            adjusted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn none_is_identity() {
        let p = vec![0.01, 0.2, 0.04];
        assert_eq!(adjust_p_values(&p, CorrectionMethod::None), p);
    }

    #[test]
    fn bonferroni_scales_and_caps() {
        let adjusted = adjust_p_values(&[0.01, 0.2, 0.4], CorrectionMethod::Bonferroni);
        assert!((adjusted[0] - 0.03).abs() < 1e-12);
        assert!((adjusted[1] - 0.6).abs() < 1e-12);
        assert_eq!(adjusted[2], 1.0);
    }

    #[test]
    fn holm_is_step_down_and_monotone() {
        // Sorted: 0.01 (x4), 0.02 (x3), 0.03 (x2), 0.5 (x1)
        let adjusted = adjust_p_values(&[0.03, 0.5, 0.01, 0.02], CorrectionMethod::Holm);
        let expected = [0.06, 0.5, 0.04, 0.06];
        for (a, e) in adjusted.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "got {adjusted:?}");
        }
    }

    #[test]
    fn empty_family_stays_empty() {
        assert!(adjust_p_values(&[], CorrectionMethod::Holm).is_empty());
    }
}
