use num_traits::Float;

use crate::Kbn;

/// Returns the compensated sum of a slice
///
/// # Arguments
///
/// * `values` - The values to add up
///
/// # Returns
///
/// * `T` - The sum, zero for an empty slice
#[inline]
pub fn sum_of<T: Float + Default>(values: &[T]) -> T {
    let mut sum = Kbn::default();
    for &v in values {
        sum += v;
    }
    sum.total()
}

/// Returns the arithmetic mean of a slice
///
/// # Arguments
///
/// * `values` - The values to average
///
/// # Returns
///
/// * `Option<T>` - The mean, or `None` if the slice is empty
#[inline]
pub fn mean_of<T: Float + Default>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    T::from(values.len()).map(|n| sum_of(values) / n)
}

/// Rounds to a number of decimal places, ties towards positive infinity
///
/// # Arguments
///
/// * `value` - The value to round
/// * `decimals` - Number of decimal places to keep
///
/// # Returns
///
/// * `Option<T>` - The rounded value, or `None` if the scale is not representable
#[inline]
pub fn round_half_up<T: Float>(value: T, decimals: i32) -> Option<T> {
    let scale = T::from(10.0)?.powi(decimals);
    let half = T::from(0.5)?;
    Some((value * scale + half).floor() / scale)
}
