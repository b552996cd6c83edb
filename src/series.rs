use num_traits::Float;
use ordered_float::{OrderedFloat, PrimitiveFloat};

use alloc::vec::Vec;

use core::fmt;

use crate::helper::mean_of;

/// Names of the columns a [`TimeSeries`] can expose.
///
/// Every series carries a position column ([`Column::Time`]) and exactly one
/// value column whose label identifies where the values came from: raw prices
/// or the output of one of the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Column {
    /// Position column: dense index or timestamp
    Time,
    /// Raw quoted prices
    Price,
    /// Fitted values of a polynomial approximation
    Approximation,
    /// Moving-average filtered values
    MaFiltration,
    /// Autoregressive forecast values
    Prediction,
}

impl Column {
    /// Returns the column name as shown to the rendering layer
    pub const fn name(self) -> &'static str {
        match self {
            Column::Time => "Time",
            Column::Price => "Price",
            Column::Approximation => "Approximation",
            Column::MaFiltration => "MaFiltration",
            Column::Prediction => "Prediction",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered two-column series of `(position, value)` samples.
///
/// Positions are expected to increase monotonically; values are the quantity
/// being modelled (usually a price). A series handed to a model is never
/// mutated by it: models always produce fresh series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        from = "RawSeries<T>",
        bound(deserialize = "T: Float + serde::Deserialize<'de>")
    )
)]
pub struct TimeSeries<T> {
    /// Label of the value column
    label: Column,
    /// Position column
    positions: Vec<T>,
    /// Value column
    values: Vec<T>,
}

/// Wire form of a [`TimeSeries`], accepted only through [`TimeSeries::new`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSeries<T> {
    label: Column,
    positions: Vec<T>,
    values: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T: Float> From<RawSeries<T>> for TimeSeries<T> {
    fn from(raw: RawSeries<T>) -> Self {
        Self::new(raw.label, raw.positions, raw.values)
    }
}

impl<T: Float> TimeSeries<T> {
    /// Creates a series from separate position and value columns.
    ///
    /// If the columns differ in length the longer one is truncated.
    ///
    /// # Arguments
    ///
    /// * `label` - Label of the value column
    /// * `positions` - Position column
    /// * `values` - Value column
    ///
    /// # Returns
    ///
    /// * `Self` - The series
    pub fn new(label: Column, mut positions: Vec<T>, mut values: Vec<T>) -> Self {
        let len = positions.len().min(values.len());
        positions.truncate(len);
        values.truncate(len);
        Self {
            label,
            positions,
            values,
        }
    }

    /// Creates a price series from `(position, price)` pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{Column, TimeSeries};
    ///
    /// let series = TimeSeries::prices([(1.0, 10.0), (2.0, 20.0)]);
    /// assert_eq!(series.label(), Column::Price);
    /// assert_eq!(series.values(), &[10.0, 20.0]);
    /// ```
    pub fn prices(pairs: impl IntoIterator<Item = (T, T)>) -> Self {
        Self::from_pairs(Column::Price, pairs)
    }

    /// Creates a series with the given value label from `(position, value)` pairs
    pub fn from_pairs(label: Column, pairs: impl IntoIterator<Item = (T, T)>) -> Self {
        let (positions, values) = pairs.into_iter().unzip();
        Self {
            label,
            positions,
            values,
        }
    }

    /// Creates a price series from pairs whose price may be absent, dropping
    /// the rows without a price.
    pub fn from_optional(pairs: impl IntoIterator<Item = (T, Option<T>)>) -> Self {
        Self::prices(
            pairs
                .into_iter()
                .filter_map(|(position, value)| value.map(|v| (position, v))),
        )
    }

    /// Builds a model-ready price series from raw quotes.
    ///
    /// Quotes are ordered by timestamp and deduplicated (first quote wins), the
    /// last `limit` of them are kept, quotes without a price are dropped and
    /// the survivors are renumbered densely from 1.
    ///
    /// # Arguments
    ///
    /// * `quotes` - `(timestamp in milliseconds, price)` pairs
    /// * `limit` - Maximum number of trailing quotes to keep
    ///
    /// # Returns
    ///
    /// * `Self` - Price series with positions `1..=N`
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::TimeSeries;
    ///
    /// let quotes = [(3_000, Some(12.0)), (1_000, Some(10.0)), (2_000, None), (1_000, Some(99.0))];
    /// let series = TimeSeries::<f64>::from_quotes(&quotes, 100);
    /// assert_eq!(series.positions(), &[1.0, 2.0]);
    /// assert_eq!(series.values(), &[10.0, 12.0]);
    /// ```
    pub fn from_quotes(quotes: &[(u64, Option<T>)], limit: usize) -> Self {
        let mut quotes = quotes.to_vec();
        quotes.sort_by_key(|&(timestamp, _)| timestamp);
        quotes.dedup_by_key(|&mut (timestamp, _)| timestamp);

        let skip = quotes.len().saturating_sub(limit);
        let values: Vec<T> = quotes
            .into_iter()
            .skip(skip)
            .filter_map(|(_, price)| price)
            .collect();

        Self::dense(Column::Price, values)
    }

    /// Returns a copy of the series with positions renumbered `1..=N`
    pub fn reindexed(&self) -> Self {
        Self::dense(self.label, self.values.clone())
    }

    fn dense(label: Column, values: Vec<T>) -> Self {
        let positions = (1..=values.len())
            .map(|i| T::from(i).unwrap_or_else(T::nan))
            .collect();
        Self {
            label,
            positions,
            values,
        }
    }

    /// Returns the label of the value column
    pub const fn label(&self) -> Column {
        self.label
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the series holds no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the position column
    pub fn positions(&self) -> &[T] {
        &self.positions
    }

    /// Returns the value column
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the requested column, or `None` if the series does not carry it
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{Column, TimeSeries};
    ///
    /// let series = TimeSeries::prices([(1.0, 10.0)]);
    /// assert_eq!(series.column(Column::Time), Some(&[1.0][..]));
    /// assert_eq!(series.column(Column::Price), Some(&[10.0][..]));
    /// assert_eq!(series.column(Column::Prediction), None);
    /// ```
    pub fn column(&self, column: Column) -> Option<&[T]> {
        match column {
            Column::Time => Some(&self.positions),
            c if c == self.label => Some(&self.values),
            _ => None,
        }
    }

    /// Returns an iterator over `(position, value)` rows in order
    pub fn iter(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.positions.iter().copied().zip(self.values.iter().copied())
    }

    /// Returns the spacing between the last two positions, or one if the
    /// series has fewer than two rows
    pub fn step(&self) -> T {
        match self.positions.as_slice() {
            [.., prev, last] => *last - *prev,
            _ => T::one(),
        }
    }

    /// Returns the arithmetic mean of a column, or `None` if it is absent or empty
    pub fn mean(&self, column: Column) -> Option<T>
    where
        T: Default,
    {
        self.column(column).and_then(mean_of)
    }

    /// Returns the largest value of a column, or `None` if it is absent or empty
    ///
    /// NaN orders above every other value, so a column holding NaN reports NaN.
    pub fn max(&self, column: Column) -> Option<T>
    where
        T: PrimitiveFloat,
    {
        self.column(column)?
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map(|v| v.0)
    }

    /// Returns the smallest value of a column, or `None` if it is absent or empty
    ///
    /// NaN orders above every other value, so it is only reported for an
    /// all-NaN column.
    pub fn min(&self, column: Column) -> Option<T>
    where
        T: PrimitiveFloat,
    {
        self.column(column)?
            .iter()
            .copied()
            .map(OrderedFloat)
            .min()
            .map(|v| v.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_truncates_to_shorter_column() {
        let series = TimeSeries::new(Column::Price, vec![1.0, 2.0, 3.0], vec![5.0, 6.0]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.positions(), &[1.0, 2.0]);
    }

    #[test]
    fn test_from_optional_drops_absent_values() {
        let series = TimeSeries::from_optional([(1.0, Some(1.5)), (2.0, None), (3.0, Some(2.5))]);
        assert_eq!(series.positions(), &[1.0, 3.0]);
        assert_eq!(series.values(), &[1.5, 2.5]);
    }

    #[test]
    fn test_from_quotes_keeps_trailing_limit() {
        let quotes: Vec<(u64, Option<f64>)> =
            (0..10).map(|i| (i * 1_000, Some(i as f64))).collect();
        let series = TimeSeries::from_quotes(&quotes, 4);
        assert_eq!(series.values(), &[6.0, 7.0, 8.0, 9.0]);
        assert_eq!(series.positions(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_reindexed_renumbers_positions() {
        let series = TimeSeries::prices([(1_000.0, 3.0), (5_000.0, 4.0)]).reindexed();
        assert_eq!(series.positions(), &[1.0, 2.0]);
        assert_eq!(series.values(), &[3.0, 4.0]);
    }

    #[test]
    fn test_step_uses_last_two_positions() {
        let series = TimeSeries::prices([(0.0, 1.0), (1.0, 1.0), (4.0, 1.0)]);
        assert_eq!(series.step(), 3.0);
        assert_eq!(TimeSeries::prices([(7.0, 1.0)]).step(), 1.0);
        assert_eq!(TimeSeries::<f64>::prices([]).step(), 1.0);
    }

    #[test]
    fn test_statistics_over_columns() {
        let series = TimeSeries::prices([(1.0, 4.0), (2.0, -2.0), (3.0, 7.0)]);
        assert_eq!(series.mean(Column::Price), Some(3.0));
        assert_eq!(series.max(Column::Price), Some(7.0));
        assert_eq!(series.min(Column::Price), Some(-2.0));
        assert_eq!(series.max(Column::Time), Some(3.0));
        assert_eq!(series.mean(Column::Approximation), None);

        let empty = TimeSeries::<f64>::prices([]);
        assert_eq!(empty.mean(Column::Price), None);
        assert_eq!(empty.min(Column::Price), None);
    }

    #[test]
    fn test_nan_orders_above_every_value() {
        let series = TimeSeries::prices([(1.0, 1.0), (2.0, f64::NAN), (3.0, 3.0)]);
        assert!(series.max(Column::Price).unwrap().is_nan());
        assert_eq!(series.min(Column::Price), Some(1.0));
        assert!(series.mean(Column::Price).unwrap().is_nan());

        let all_nan = TimeSeries::prices([(1.0, f64::NAN)]);
        assert!(all_nan.min(Column::Price).unwrap().is_nan());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_truncates_to_shorter_column() {
        let json = r#"{"label":"Price","positions":[1.0],"values":[1.0,2.0,3.0]}"#;
        let series: TimeSeries<f64> = serde_json::from_str(json).unwrap();
        assert_eq!(series.positions(), &[1.0]);
        assert_eq!(series.values(), &[1.0]);

        let json = r#"{"label":"Approximation","positions":[1.0,2.0,3.0],"values":[5.0,6.0]}"#;
        let series: TimeSeries<f64> = serde_json::from_str(json).unwrap();
        assert_eq!(series.label(), Column::Approximation);
        assert_eq!(series.positions(), &[1.0, 2.0]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_then_deserialize_keeps_columns() {
        let series = TimeSeries::prices([(1.0, 10.0), (2.0, 20.0)]);
        let json = serde_json::to_string(&series).unwrap();
        let back: TimeSeries<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }
}
