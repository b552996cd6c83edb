use log::debug;
use num_traits::Float;

use alloc::vec::Vec;

use crate::{
    Auxiliary, Column, Model, ModelError, ModelResult, Result, TimeSeries, error::positive,
    helper::mean_of, lstsq,
};

/// Polynomial least-squares approximation of a price series.
///
/// The 0-based row index is used as the independent variable and the price as
/// the dependent one. Every row carries unit weight. The fitted curve is
/// evaluated back at each row, keeping the input's position column, and the
/// fit quality is reported as the mean squared error between input and fitted
/// values.
///
/// The index is mapped onto `[-1, 1]` before the powers are formed; the
/// reported coefficients are converted back to the unscaled index.
///
/// A degree at or above the row count is not rejected: the least-squares
/// solver drops the dependent powers, so the curve interpolates the data.
#[derive(Debug, Clone)]
pub struct PolynomialApproximation<T> {
    /// Polynomial degree
    degree: usize,
    /// Loaded input series
    input: Option<TimeSeries<T>>,
    /// Last computed result
    output: Option<ModelResult<T>>,
}

impl<T: Float + Default> PolynomialApproximation<T> {
    /// Degree used when none is configured
    pub const DEFAULT_DEGREE: usize = 1;

    const NAME: &'static str = "Approximation";

    /// Creates a new approximation of the given degree without input
    ///
    /// # Arguments
    ///
    /// * `degree` - Polynomial degree, at least 1
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The model, or `InvalidParameter` for a zero degree
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{Model, PolynomialApproximation, TimeSeries};
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut approx = PolynomialApproximation::<f64>::new(1).unwrap();
    /// approx
    ///     .load(TimeSeries::prices([(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0)]))
    ///     .unwrap();
    ///
    /// let coefficients = approx.coefficients().unwrap();
    /// assert_approx_eq!(coefficients[0], 1.0, 1e-9);
    /// assert_approx_eq!(coefficients[1], 1.0, 1e-9);
    /// assert_approx_eq!(approx.mse(), 0.0, 1e-9);
    /// ```
    pub fn new(degree: usize) -> Result<Self> {
        Ok(Self {
            degree: positive("degree", degree)?,
            input: None,
            output: None,
        })
    }

    /// Returns the polynomial degree
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Sets the polynomial degree and recomputes against the loaded input, if any
    ///
    /// A rejected degree leaves the previous degree and result untouched.
    ///
    /// # Arguments
    ///
    /// * `degree` - Polynomial degree, at least 1
    ///
    /// # Returns
    ///
    /// * `Result<&mut Self>` - The model, or the validation/computation error
    pub fn set_degree(&mut self, degree: usize) -> Result<&mut Self> {
        self.degree = positive("degree", degree)?;
        self.output = None;
        if self.input.is_some() {
            self.compute()
        } else {
            Ok(self)
        }
    }

    /// Returns the `degree + 1` fitted coefficients, constant term first
    pub fn coefficients(&self) -> Option<&[T]> {
        self.output.as_ref().and_then(ModelResult::coefficients)
    }

    /// Returns the mean squared error of the last fit, zero if there is none
    pub fn mse(&self) -> T {
        self.output
            .as_ref()
            .and_then(ModelResult::mse)
            .unwrap_or_else(T::zero)
    }

    /// Evaluates the fitted polynomial at a 0-based row index
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The fitted value, or `None` before a successful fit
    pub fn evaluate(&self, x: T) -> Option<T> {
        self.coefficients().map(|c| horner(c, x))
    }
}

impl<T: Float + Default> Model<T> for PolynomialApproximation<T> {
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

        let output = fit(input, self.degree).ok_or(ModelError::Numerical { model: Self::NAME })?;
        debug!(
            "{}: degree {} over {} rows, mse {}",
            Self::NAME,
            self.degree,
            input.len(),
            output.mse().and_then(|mse| mse.to_f64()).unwrap_or(f64::NAN)
        );

        self.output = Some(output);
        Ok(self)
    }

    fn output(&self) -> Option<&ModelResult<T>> {
        self.output.as_ref()
    }
}

fn fit<T: Float + Default>(input: &TimeSeries<T>, degree: usize) -> Option<ModelResult<T>> {
    let values = input.values();
    let rows = values.len();
    let cols = degree + 1;

    // row indices mapped onto [-1, 1] keep the powers matrix well conditioned
    let centre = T::from(rows - 1)? / T::from(2)?;
    let half_width = if centre > T::zero() { centre } else { T::one() };
    let us = (0..rows)
        .map(|i| T::from(i).map(|x| (x - centre) / half_width))
        .collect::<Option<Vec<T>>>()?;
    let design: Vec<T> = us
        .iter()
        .flat_map(|&u| core::iter::successors(Some(T::one()), move |&p| Some(p * u)).take(cols))
        .collect();

    let scaled = lstsq(&design, rows, cols, values)?;
    let fitted: Vec<T> = us.iter().map(|&u| horner(&scaled, u)).collect();
    let mse = mean_squared_error(values, &fitted)?;
    let coefficients = unscale(&scaled, centre, half_width);

    let series = TimeSeries::new(Column::Approximation, input.positions().to_vec(), fitted);
    Some(ModelResult::new(
        series,
        Auxiliary::Polynomial { coefficients, mse },
    ))
}

/// Rewrites coefficients of `p(u)`, `u = (x - centre) / half_width`, as
/// coefficients in `x`, lowest order first
fn unscale<T: Float>(scaled: &[T], centre: T, half_width: T) -> Vec<T> {
    let slope = T::one() / half_width;
    let offset = -centre / half_width;
    let mut out = vec![T::zero(); scaled.len()];
    for &b in scaled.iter().rev() {
        // out = out * (slope * x + offset) + b
        for i in (0..out.len()).rev() {
            let lower = if i > 0 { out[i - 1] } else { T::zero() };
            out[i] = out[i] * offset + lower * slope;
        }
        out[0] = out[0] + b;
    }
    out
}

/// Evaluates a polynomial given lowest-order-first coefficients
#[inline]
fn horner<T: Float>(coefficients: &[T], x: T) -> T {
    coefficients
        .iter()
        .rev()
        .fold(T::zero(), |acc, &c| acc * x + c)
}

fn mean_squared_error<T: Float + Default>(original: &[T], fitted: &[T]) -> Option<T> {
    let squared: Vec<T> = original
        .iter()
        .zip(fitted)
        .map(|(&o, &f)| (o - f) * (o - f))
        .collect();
    mean_of(&squared)
}
