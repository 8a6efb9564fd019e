// src/utils/nan.rs
//! NaN-skipping reductions over a single time lane.

use ndarray::ArrayView1;

pub fn all_nan(lane: ArrayView1<'_, f32>) -> bool {
    lane.iter().all(|v| v.is_nan())
}

/// Largest non-NaN value, `NaN` if there is none
pub fn nan_max(lane: ArrayView1<'_, f32>) -> f32 {
    lane.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Smallest non-NaN value, `NaN` if there is none
pub fn nan_min(lane: ArrayView1<'_, f32>) -> f32 {
    lane.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
}

/// Median of the non-NaN values; even counts average the two middle values
pub fn nan_median(lane: ArrayView1<'_, f32>) -> f32 {
    let mut finite: Vec<f32> = lane.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return f32::NAN;
    }
    finite.sort_by(f32::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// First derivative of `values` against `coords`.
///
/// Interior samples use the second-order central difference for uneven
/// spacing, the two ends use one-sided differences. A `NaN` operand makes the
/// result `NaN`; fewer than two samples give all `NaN`.
pub fn gradient(values: ArrayView1<'_, f32>, coords: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![f64::NAN; n];
    }

    let f = |i: usize| values[i] as f64;
    let mut out = Vec::with_capacity(n);
    out.push((f(1) - f(0)) / (coords[1] - coords[0]));
    for i in 1..n - 1 {
        let hs = coords[i] - coords[i - 1];
        let hd = coords[i + 1] - coords[i];
        let a = -hd / (hs * (hs + hd));
        let b = (hd - hs) / (hs * hd);
        let c = hs / (hd * (hs + hd));
        out.push(a * f(i - 1) + b * f(i) + c * f(i + 1));
    }
    out.push((f(n - 1) - f(n - 2)) / (coords[n - 1] - coords[n - 2]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn reductions_skip_nan() {
        let lane = arr1(&[f32::NAN, 0.4, 0.1, f32::NAN, 0.3]);
        assert_eq!(nan_max(lane.view()), 0.4);
        assert_eq!(nan_min(lane.view()), 0.1);
        assert_eq!(nan_median(lane.view()), 0.3);
        assert!(!all_nan(lane.view()));
    }

    #[test]
    fn all_nan_lane_reduces_to_nan() {
        let lane = arr1(&[f32::NAN, f32::NAN]);
        assert!(all_nan(lane.view()));
        assert!(nan_max(lane.view()).is_nan());
        assert!(nan_min(lane.view()).is_nan());
        assert!(nan_median(lane.view()).is_nan());
    }

    #[test]
    fn median_of_even_count_averages() {
        let lane = arr1(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(nan_median(lane.view()), 2.5);
    }

    #[test]
    fn gradient_on_uneven_spacing_is_exact_for_quadratics() {
        let coords = [0.0, 1.0, 3.0, 4.0];
        let values = arr1(&[0.0f32, 1.0, 9.0, 16.0]);
        let g = gradient(values.view(), &coords);
        assert_relative_eq!(g[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(g[2], 6.0, epsilon = 1e-9);
        assert_relative_eq!(g[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(g[3], 7.0, epsilon = 1e-9);
    }

    #[test]
    fn gradient_propagates_nan() {
        let values = arr1(&[1.0f32, 2.0, f32::NAN, 4.0]);
        let g = gradient(values.view(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(!g[0].is_nan());
        assert!(g[1].is_nan());
        assert!(g[2].is_nan());
        assert!(g[3].is_nan());
    }

    #[test]
    fn gradient_of_single_sample_is_nan() {
        let g = gradient(arr1(&[1.0f32]).view(), &[0.0]);
        assert_eq!(g.len(), 1);
        assert!(g[0].is_nan());
    }
}
