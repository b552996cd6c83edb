use log::{debug, warn};
use num_traits::Float;

use alloc::vec::Vec;

use crate::{
    Auxiliary, Column, Model, ModelError, ModelResult, Result, TimeSeries, error::positive,
    helper::mean_of, lstsq,
};

/// Autoregressive forecast of a price series.
///
/// Fits an AR(p) model `x[t] = c + a1 * x[t-1] + ... + ap * x[t-p]` to the
/// input values by ordinary least squares, then rolls the fitted recursion
/// forward `horizon` steps, feeding each forecast back in as the newest lag.
///
/// Forecast positions continue the input's position column at the spacing of
/// its last two positions, or at unit spacing for a single-row input.
///
/// Lags are centred before solving and the intercept is recovered from the
/// means, so a constant series yields zero lag weights and an intercept equal
/// to the constant instead of an arbitrary split between the two.
#[derive(Debug, Clone)]
pub struct AutoregressivePredictor<T> {
    /// Number of lags
    order: usize,
    /// Number of forecast points
    horizon: usize,
    /// Loaded input series
    input: Option<TimeSeries<T>>,
    /// Last computed result
    output: Option<ModelResult<T>>,
}

impl<T: Float + Default> AutoregressivePredictor<T> {
    /// Order used when none is configured
    pub const DEFAULT_ORDER: usize = 5;
    /// Horizon used when none is configured
    pub const DEFAULT_HORIZON: usize = 10;

    const NAME: &'static str = "AR Prediction";

    /// Creates a new predictor without input
    ///
    /// # Arguments
    ///
    /// * `order` - Number of lags, at least 1
    /// * `horizon` - Number of points to forecast, at least 1
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The model, or `InvalidParameter` for a zero order or horizon
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{AutoregressivePredictor, Model, TimeSeries};
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut ar = AutoregressivePredictor::new(2, 3).unwrap();
    /// ar.load(TimeSeries::prices((1..=5).map(|i| (i as f64, 100.0)))).unwrap();
    ///
    /// let forecast = ar.result().unwrap();
    /// assert_eq!(forecast.positions(), &[6.0, 7.0, 8.0]);
    /// for &value in forecast.values() {
    ///     assert_approx_eq!(value, 100.0, 1e-9);
    /// }
    /// ```
    pub fn new(order: usize, horizon: usize) -> Result<Self> {
        Ok(Self {
            order: positive("order", order)?,
            horizon: positive("horizon", horizon)?,
            input: None,
            output: None,
        })
    }

    /// Returns the number of lags
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Returns the number of forecast points
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Sets the number of lags and recomputes against the loaded input, if any
    ///
    /// A rejected order leaves the previous one and its result untouched.
    pub fn set_order(&mut self, order: usize) -> Result<&mut Self> {
        self.order = positive("order", order)?;
        self.refresh()
    }

    /// Sets the number of forecast points and recomputes against the loaded input, if any
    ///
    /// A rejected horizon leaves the previous one and its result untouched.
    pub fn set_horizon(&mut self, horizon: usize) -> Result<&mut Self> {
        self.horizon = positive("horizon", horizon)?;
        self.refresh()
    }

    /// Returns the `order + 1` fitted coefficients: intercept, then lag-1 to lag-p
    pub fn coefficients(&self) -> Option<&[T]> {
        self.output.as_ref().and_then(ModelResult::coefficients)
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

impl<T: Float + Default> Model<T> for AutoregressivePredictor<T> {
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

        if input.len() <= self.order {
            warn!(
                "{}: order {} needs more than {} rows",
                Self::NAME,
                self.order,
                input.len()
            );
            return Err(ModelError::InsufficientData {
                required: self.order + 1,
                got: input.len(),
            });
        }

        let numerical = ModelError::Numerical { model: Self::NAME };
        let coefficients = fit(input.values(), self.order).ok_or(numerical)?;
        let values = forecast(input.values(), &coefficients, self.horizon);
        let positions = continue_positions(input, self.horizon).ok_or(numerical)?;
        debug!(
            "{}: order {} over {} rows, {} points forecast",
            Self::NAME,
            self.order,
            input.len(),
            values.len()
        );

        let series = TimeSeries::new(Column::Prediction, positions, values);
        self.output = Some(ModelResult::new(
            series,
            Auxiliary::Autoregressive { coefficients },
        ));
        Ok(self)
    }

    fn output(&self) -> Option<&ModelResult<T>> {
        self.output.as_ref()
    }
}

/// Least-squares AR(p) fit, returning `[c, a1, ..., ap]`
fn fit<T: Float + Default>(values: &[T], order: usize) -> Option<Vec<T>> {
    let rows = values.len().checked_sub(order)?;
    let target = &values[order..];
    // lag j, 1-based, is the window ending j samples before the target
    let lags: Vec<&[T]> = (1..=order)
        .map(|j| &values[order - j..order - j + rows])
        .collect();

    let target_mean = mean_of(target)?;
    let lag_means = lags
        .iter()
        .map(|lag| mean_of(lag))
        .collect::<Option<Vec<T>>>()?;

    let scale = values.iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    let tol = scale * T::epsilon() * T::from(values.len())?;
    let degenerate: Vec<bool> = lags
        .iter()
        .zip(&lag_means)
        .map(|(lag, &mean)| lag.iter().all(|&v| (v - mean).abs() <= tol))
        .collect();

    let design: Vec<T> = (0..rows)
        .flat_map(|i| {
            lags.iter()
                .zip(&lag_means)
                .zip(&degenerate)
                .map(move |((lag, &mean), &flat)| if flat { T::zero() } else { lag[i] - mean })
        })
        .collect();
    let centred: Vec<T> = target.iter().map(|&v| v - target_mean).collect();

    let weights = lstsq(&design, rows, order, &centred)?;
    let intercept = weights
        .iter()
        .zip(&lag_means)
        .fold(target_mean, |acc, (&w, &m)| acc - w * m);

    let mut coefficients = Vec::with_capacity(order + 1);
    coefficients.push(intercept);
    coefficients.extend(weights);
    Some(coefficients)
}

/// Rolls the fitted recursion forward `horizon` steps from the end of `values`
fn forecast<T: Float>(values: &[T], coefficients: &[T], horizon: usize) -> Vec<T> {
    let order = coefficients.len() - 1;
    let mut history: Vec<T> = values[values.len() - order..].to_vec();
    let mut predicted = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let next = coefficients[1..]
            .iter()
            .zip(history.iter().rev())
            .fold(coefficients[0], |acc, (&a, &x)| acc + a * x);
        history.push(next);
        predicted.push(next);
    }
    predicted
}

fn continue_positions<T: Float>(input: &TimeSeries<T>, horizon: usize) -> Option<Vec<T>> {
    let last = *input.positions().last()?;
    let step = input.step();
    (1..=horizon)
        .map(|i| T::from(i).map(|i| last + i * step))
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn series(values: &[f64]) -> TimeSeries<f64> {
        TimeSeries::prices(values.iter().enumerate().map(|(i, &v)| ((i + 1) as f64, v)))
    }

    #[test]
    fn test_constant_series_forecasts_constant() {
        let mut ar = AutoregressivePredictor::new(2, 3).unwrap();
        ar.load(series(&[100.0; 5])).unwrap();

        let coefficients = ar.coefficients().unwrap();
        assert_eq!(coefficients.len(), 3);
        assert_approx_eq!(coefficients[0], 100.0, 1e-9);
        assert_approx_eq!(coefficients[1], 0.0, 1e-9);
        assert_approx_eq!(coefficients[2], 0.0, 1e-9);

        let result = ar.result().unwrap();
        assert_eq!(result.label(), Column::Prediction);
        assert_eq!(result.positions(), &[6.0, 7.0, 8.0]);
        for &value in result.values() {
            assert_approx_eq!(value, 100.0, 1e-9);
        }
    }

    #[test]
    fn test_recovers_first_order_recursion() {
        let mut values = vec![20.0];
        for _ in 0..11 {
            let last = *values.last().unwrap();
            values.push(2.0 + 0.5 * last);
        }
        let mut ar = AutoregressivePredictor::new(1, 2).unwrap();
        ar.load(series(&values)).unwrap();

        let coefficients = ar.coefficients().unwrap();
        assert_approx_eq!(coefficients[0], 2.0, 1e-6);
        assert_approx_eq!(coefficients[1], 0.5, 1e-6);

        let last = *values.last().unwrap();
        let first = 2.0 + 0.5 * last;
        let forecast = ar.result().unwrap().values();
        assert_approx_eq!(forecast[0], first, 1e-6);
        assert_approx_eq!(forecast[1], 2.0 + 0.5 * first, 1e-6);
    }

    #[test]
    fn test_recovers_second_order_recursion() {
        // x[t] = 1 + 0.6 x[t-1] - 0.2 x[t-2], started off equilibrium
        let mut values = vec![5.0, -3.0];
        for _ in 0..20 {
            let n = values.len();
            values.push(1.0 + 0.6 * values[n - 1] - 0.2 * values[n - 2]);
        }
        let mut ar = AutoregressivePredictor::new(2, 1).unwrap();
        ar.load(series(&values)).unwrap();

        let coefficients = ar.coefficients().unwrap();
        assert_approx_eq!(coefficients[0], 1.0, 1e-6);
        assert_approx_eq!(coefficients[1], 0.6, 1e-6);
        assert_approx_eq!(coefficients[2], -0.2, 1e-6);
    }

    #[test]
    fn test_output_shape_follows_parameters() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0];
        for order in 1..5 {
            for horizon in [1, 4, 10] {
                let mut ar = AutoregressivePredictor::new(order, horizon).unwrap();
                ar.load(series(&values)).unwrap();
                assert_eq!(ar.coefficients().unwrap().len(), order + 1);
                assert_eq!(ar.result().unwrap().len(), horizon);
                assert!(ar.result().unwrap().values().iter().all(|v| v.is_finite()));
            }
        }
    }

    #[test]
    fn test_positions_continue_at_last_spacing() {
        let input = TimeSeries::prices([(0.0, 1.0), (10.0, 2.0), (15.0, 4.0), (20.0, 3.0)]);
        let mut ar = AutoregressivePredictor::new(1, 3).unwrap();
        ar.load(input).unwrap();
        assert_eq!(ar.result().unwrap().positions(), &[25.0, 30.0, 35.0]);
    }

    #[test]
    fn test_order_needs_more_rows() {
        let mut ar = AutoregressivePredictor::new(3, 2).unwrap();
        assert_eq!(
            ar.load(series(&[1.0, 2.0, 3.0])).unwrap_err(),
            ModelError::InsufficientData {
                required: 4,
                got: 3
            }
        );
        assert!(ar.result().is_none());

        ar.set_order(2).unwrap();
        assert_eq!(ar.result().unwrap().len(), 2);
    }

    #[test]
    fn test_setters_reject_zero_and_keep_state() {
        let mut ar = AutoregressivePredictor::new(1, 3).unwrap();
        ar.load(series(&[1.0, 2.0, 4.0, 3.0])).unwrap();
        let before = ar.output().cloned();

        assert_eq!(
            ar.set_order(0).unwrap_err(),
            ModelError::InvalidParameter {
                name: "order",
                value: 0
            }
        );
        assert_eq!(
            ar.set_horizon(0).unwrap_err(),
            ModelError::InvalidParameter {
                name: "horizon",
                value: 0
            }
        );
        assert_eq!(ar.order(), 1);
        assert_eq!(ar.horizon(), 3);
        assert_eq!(ar.output().cloned(), before);

        ar.set_horizon(5).unwrap();
        assert_eq!(ar.result().unwrap().len(), 5);
    }

    #[test]
    fn test_empty_input_is_upstream_unavailable() {
        let mut ar = AutoregressivePredictor::<f64>::new(1, 1).unwrap();
        assert_eq!(
            ar.compute().unwrap_err(),
            ModelError::UpstreamDataUnavailable
        );
        assert_eq!(
            ar.load(TimeSeries::prices([])).unwrap_err(),
            ModelError::UpstreamDataUnavailable
        );
    }

    #[test]
    fn test_compute_is_idempotent() {
        let mut ar = AutoregressivePredictor::new(2, 4).unwrap();
        ar.load(series(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0]))
            .unwrap();
        let first = ar.output().cloned();
        ar.compute().unwrap();
        assert_eq!(ar.output().cloned(), first);
        ar.compute().unwrap();
        assert_eq!(ar.output().cloned(), first);
    }
}
