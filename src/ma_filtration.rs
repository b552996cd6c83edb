use log::{debug, warn};
use num_traits::Float;

use alloc::vec::Vec;

use crate::{
    Auxiliary, Column, Kbn, Model, ModelError, ModelResult, Result, TimeSeries, Window,
    error::positive,
};

/// Moving-average filtration of a price series.
///
/// Smooths the target column with the arithmetic mean of a fixed-size sliding
/// window. An input of `n` rows yields `n - window + 1` averages, each indexed
/// by the position of the *last* sample of its window, so the smoothed series
/// overlays the raw one on shared positions.
///
/// The running window sum uses Kahan-Babuska-Neumaier compensated summation,
/// so long series do not accumulate drift from repeated add/remove updates.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<T> {
    /// Window size
    window: usize,
    /// Column of the input to smooth
    column: Column,
    /// Loaded input series
    input: Option<TimeSeries<T>>,
    /// Last computed result
    output: Option<ModelResult<T>>,
}

impl<T: Float + Default> MovingAverageFilter<T> {
    /// Window size used when none is configured
    pub const DEFAULT_WINDOW: usize = 3;

    const NAME: &'static str = "MA Filtration";

    /// Creates a new filter with the given window size over the price column
    ///
    /// # Arguments
    ///
    /// * `window` - Number of samples averaged per output row, at least 1
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The model, or `InvalidParameter` for a zero window
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{Model, MovingAverageFilter, TimeSeries};
    ///
    /// let mut ma = MovingAverageFilter::new(2).unwrap();
    /// ma.load(TimeSeries::prices([(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)])).unwrap();
    ///
    /// let result = ma.result().unwrap();
    /// assert_eq!(result.positions(), &[2.0, 3.0]);
    /// assert_eq!(result.values(), &[15.0, 25.0]);
    /// ```
    pub fn new(window: usize) -> Result<Self> {
        Ok(Self {
            window: positive("window", window)?,
            column: Column::Price,
            input: None,
            output: None,
        })
    }

    /// Returns the window size
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Returns the column being smoothed
    pub const fn column(&self) -> Column {
        self.column
    }

    /// Sets the window size and recomputes against the loaded input, if any
    ///
    /// A rejected window size leaves the previous one and its result untouched.
    /// An accepted window larger than the loaded input is kept, but the
    /// recomputation fails with `InsufficientData` and leaves no result.
    ///
    /// # Arguments
    ///
    /// * `window` - Number of samples averaged per output row, at least 1
    ///
    /// # Returns
    ///
    /// * `Result<&mut Self>` - The model, or the validation/computation error
    pub fn set_window(&mut self, window: usize) -> Result<&mut Self> {
        self.window = positive("window", window)?;
        self.refresh()
    }

    /// Selects the column to smooth and recomputes against the loaded input, if any
    pub fn set_column(&mut self, column: Column) -> Result<&mut Self> {
        self.column = column;
        self.refresh()
    }

    fn refresh(&mut self) -> Result<&mut Self> {
        self.output = None;
        if self.input.is_some() {
            self.compute()
        } else {
            Ok(self)
        }
    }
}

impl<T: Float + Default> Model<T> for MovingAverageFilter<T> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn input(&self) -> Option<&TimeSeries<T>> {
        self.input.as_ref()
    }

    fn load(&mut self, series: TimeSeries<T>) -> Result<&mut Self> {
        self.input = Some(series);
        self.compute()
    }

    fn compute(&mut self) -> Result<&mut Self> {
        self.output = None;
        let input = self
            .input
            .as_ref()
            .filter(|series| !series.is_empty())
            .ok_or(ModelError::UpstreamDataUnavailable)?;
        let values = input
            .column(self.column)
            .ok_or(ModelError::UpstreamDataUnavailable)?;

        if values.len() < self.window {
            warn!(
                "{}: window {} exceeds {} rows",
                Self::NAME,
                self.window,
                values.len()
            );
            return Err(ModelError::InsufficientData {
                required: self.window,
                got: values.len(),
            });
        }

        let positions = input
            .positions()
            .get(self.window - 1..)
            .filter(|tail| tail.len() == values.len() + 1 - self.window)
            .ok_or(ModelError::InsufficientData {
                required: self.window,
                got: input.positions().len(),
            })?
            .to_vec();
        let averages = moving_average(values, self.window)
            .ok_or(ModelError::Numerical { model: Self::NAME })?;
        debug!(
            "{}: window {} over {} rows -> {} rows",
            Self::NAME,
            self.window,
            values.len(),
            averages.len()
        );

        let series = TimeSeries::new(Column::MaFiltration, positions, averages);
        self.output = Some(ModelResult::new(series, Auxiliary::Empty));
        Ok(self)
    }

    fn output(&self) -> Option<&ModelResult<T>> {
        self.output.as_ref()
    }
}

/// Trailing arithmetic mean over every full window of `values`
fn moving_average<T: Float + Default>(values: &[T], window: usize) -> Option<Vec<T>> {
    let n = T::from(window)?;
    let mut buf = Window::new(window);
    let mut sum = Kbn::default();
    let mut averages = Vec::with_capacity(values.len() + 1 - window);

    for &value in values {
        if let Some(popped) = buf.next(value) {
            sum -= popped;
        }
        sum += value;
        if buf.is_full() {
            averages.push(sum.total() / n);
        }
    }
    Some(averages)
}
