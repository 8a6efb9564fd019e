// src/processing/extremum.rs
use ndarray::{Array, ArrayView, ArrayView1, Axis, Dimension, RemoveAxis, Zip};

use crate::utils::all_nan;

/// Which extremum to locate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Index of the minimum or maximum along `axis`, skipping `NaN`.
///
/// Lanes that are entirely `NaN` are masked to `None` rather than index 0.
/// `NaN` entries never take part in the reduction; ties resolve to the first
/// index.
pub fn nan_arg_extremum<D>(
    data: ArrayView<'_, f32, D>,
    axis: Axis,
    mode: Extremum,
) -> Array<Option<usize>, D::Smaller>
where
    D: Dimension + RemoveAxis,
{
    let mask = data.map_axis(axis, all_nan);
    let index = data.map_axis(axis, |lane| arg_extremum(lane, mode));
    Zip::from(&index)
        .and(&mask)
        .map_collect(|&i, &invalid| if invalid { None } else { i })
}

fn arg_extremum(lane: ArrayView1<'_, f32>, mode: Extremum) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in lane.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let better = match (best, mode) {
            (None, _) => true,
            (Some((_, b)), Extremum::Max) => v > b,
            (Some((_, b)), Extremum::Min) => v < b,
        };
        if better {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn missing_sample_never_wins_in_large_lanes() {
        let data = arr2(&[[f32::NAN, 1.0e8], [2.0e8, 3.0e8]]);
        let max = nan_arg_extremum(data.view(), Axis(1), Extremum::Max);
        assert_eq!(max.to_vec(), vec![Some(1), Some(1)]);

        let data = arr2(&[[f32::NAN, -1.0e8], [-2.0e8, -3.0e8]]);
        let min = nan_arg_extremum(data.view(), Axis(1), Extremum::Min);
        assert_eq!(min.to_vec(), vec![Some(1), Some(1)]);
    }
}
