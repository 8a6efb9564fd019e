// src/utils/cast.rs
use ndarray::Array2;

/// Missing value of int16 output bands
pub const NODATA_INT16: i16 = -10000;

pub fn to_int16(data: &Array2<Option<i16>>) -> Array2<i16> {
    data.mapv(|value| value.unwrap_or(NODATA_INT16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn missing_days_use_sentinel() {
        let days = arr2(&[[Some(12), None], [Some(365), Some(0)]]);
        assert_eq!(to_int16(&days), arr2(&[[12, NODATA_INT16], [365, 0]]));
    }
}
