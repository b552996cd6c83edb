use num_traits::Float;
use ordered_float::PrimitiveFloat;

use crate::{Column, ModelResult, Result, TimeSeries};

/// Common surface of every analytical transform over a price series.
///
/// A model owns its input series and its last result. Loading new input or
/// changing a parameter invalidates the previous result, so whatever
/// [`Model::result`] returns always corresponds to the input and parameters in
/// effect when [`Model::compute`] last succeeded. All mutation goes through
/// `&mut self`, so overlapping computations on one instance cannot race.
pub trait Model<T: Float + Default> {
    /// Returns the display name of the model
    fn name(&self) -> &'static str;

    /// Returns the loaded input series, if any
    fn input(&self) -> Option<&TimeSeries<T>>;

    /// Replaces the input series and recomputes the model
    ///
    /// The input is kept even if the computation fails, so a later parameter
    /// change can recompute against it.
    ///
    /// # Arguments
    ///
    /// * `series` - The new input series
    ///
    /// # Returns
    ///
    /// * `Result<&mut Self>` - The model, or the error raised by [`Model::compute`]
    fn load(&mut self, series: TimeSeries<T>) -> Result<&mut Self>
    where
        Self: Sized;

    /// Computes the model over the loaded input and stores the result
    ///
    /// Calling it twice without changing input or parameters yields the same
    /// result. On failure the stored result is cleared.
    ///
    /// # Errors
    ///
    /// * `UpstreamDataUnavailable` - No input loaded, or the input is empty
    /// * `InsufficientData` - The input is shorter than the parameters require
    fn compute(&mut self) -> Result<&mut Self>
    where
        Self: Sized;

    /// Returns the last computed result together with its auxiliary payload
    fn output(&self) -> Option<&ModelResult<T>>;

    /// Returns the last computed output series, or `None` if there is none
    fn result(&self) -> Option<&TimeSeries<T>> {
        self.output().map(ModelResult::series)
    }

    /// Returns the mean of a column of the input series, zero if the input is
    /// missing, empty or lacks the column
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{Column, Model, MovingAverageFilter, TimeSeries};
    ///
    /// let mut ma = MovingAverageFilter::new(2).unwrap();
    /// assert_eq!(ma.mean(Column::Price), 0.0);
    ///
    /// ma.load(TimeSeries::prices([(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)])).unwrap();
    /// assert_eq!(ma.mean(Column::Price), 20.0);
    /// assert_eq!(ma.max(Column::Price), 30.0);
    /// assert_eq!(ma.min(Column::Time), 1.0);
    /// assert_eq!(ma.mean(Column::Prediction), 0.0);
    /// ```
    fn mean(&self, column: Column) -> T {
        self.input()
            .and_then(|series| series.mean(column))
            .unwrap_or_else(T::zero)
    }

    /// Returns the largest value of a column of the input series, zero if the
    /// input is missing, empty or lacks the column
    fn max(&self, column: Column) -> T
    where
        T: PrimitiveFloat,
    {
        self.input()
            .and_then(|series| series.max(column))
            .unwrap_or_else(T::zero)
    }

    /// Returns the smallest value of a column of the input series, zero if the
    /// input is missing, empty or lacks the column
    fn min(&self, column: Column) -> T
    where
        T: PrimitiveFloat,
    {
        self.input()
            .and_then(|series| series.min(column))
            .unwrap_or_else(T::zero)
    }
}
