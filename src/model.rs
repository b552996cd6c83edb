use num_traits::Float;

use alloc::vec::Vec;

use crate::{
    AutoregressivePredictor, Model, MovingAverageFilter, PolynomialApproximation, Result,
    TimeSeries,
};

/// Model-specific values produced alongside an output series
#[derive(Debug, Clone, PartialEq)]
pub enum Auxiliary<T> {
    /// Polynomial approximation payload
    Polynomial {
        /// `degree + 1` coefficients, constant term first
        coefficients: Vec<T>,
        /// Mean squared error between input and fitted values
        mse: T,
    },
    /// Moving-average filtration carries no extra values
    Empty,
    /// Autoregressive prediction payload
    Autoregressive {
        /// `order + 1` coefficients: intercept, then lag-1 to lag-p weights
        coefficients: Vec<T>,
    },
}

/// The output of a successful computation: a derived series plus its auxiliary payload.
///
/// A result is owned by the model that produced it and is replaced wholesale
/// on every recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult<T> {
    series: TimeSeries<T>,
    auxiliary: Auxiliary<T>,
}

impl<T: Copy> ModelResult<T> {
    pub(crate) fn new(series: TimeSeries<T>, auxiliary: Auxiliary<T>) -> Self {
        Self { series, auxiliary }
    }

    /// Returns the output series
    pub fn series(&self) -> &TimeSeries<T> {
        &self.series
    }

    /// Returns the auxiliary payload
    pub fn auxiliary(&self) -> &Auxiliary<T> {
        &self.auxiliary
    }

    /// Returns the fitted coefficients, if the model produces any
    pub fn coefficients(&self) -> Option<&[T]> {
        match &self.auxiliary {
            Auxiliary::Polynomial { coefficients, .. }
            | Auxiliary::Autoregressive { coefficients } => Some(coefficients),
            Auxiliary::Empty => None,
        }
    }

    /// Returns the mean squared error of a polynomial fit
    pub fn mse(&self) -> Option<T> {
        match self.auxiliary {
            Auxiliary::Polynomial { mse, .. } => Some(mse),
            _ => None,
        }
    }

    /// Consumes the result and returns the output series
    pub fn into_series(self) -> TimeSeries<T> {
        self.series
    }
}

/// The closed set of model kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelKind {
    /// Polynomial least-squares approximation
    Approximation,
    /// Moving-average filtration
    MaFiltration,
    /// Autoregressive prediction
    ArPrediction,
}

/// Parameters selecting and configuring one model
///
/// # Examples
///
/// ```
/// use ta_models::{ModelConfig, ModelKind};
///
/// let config = ModelConfig::default_for(ModelKind::ArPrediction);
/// assert_eq!(config, ModelConfig::ArPrediction { order: 5, horizon: 10 });
/// assert!(ModelConfig::MaFiltration { window: 0 }.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ModelConfig {
    /// Polynomial approximation of the given degree
    Approximation {
        /// Polynomial degree, at least 1
        degree: usize,
    },
    /// Moving-average filtration over the given window
    MaFiltration {
        /// Window size, at least 1
        window: usize,
    },
    /// Autoregressive prediction
    ArPrediction {
        /// Number of lags, at least 1
        order: usize,
        /// Number of forecast points, at least 1
        horizon: usize,
    },
}

impl ModelConfig {
    /// Returns the default configuration of a model kind
    pub const fn default_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Approximation => ModelConfig::Approximation {
                degree: PolynomialApproximation::<f64>::DEFAULT_DEGREE,
            },
            ModelKind::MaFiltration => ModelConfig::MaFiltration {
                window: MovingAverageFilter::<f64>::DEFAULT_WINDOW,
            },
            ModelKind::ArPrediction => ModelConfig::ArPrediction {
                order: AutoregressivePredictor::<f64>::DEFAULT_ORDER,
                horizon: AutoregressivePredictor::<f64>::DEFAULT_HORIZON,
            },
        }
    }

    /// Returns the kind of model this configuration builds
    pub const fn kind(&self) -> ModelKind {
        match self {
            ModelConfig::Approximation { .. } => ModelKind::Approximation,
            ModelConfig::MaFiltration { .. } => ModelKind::MaFiltration,
            ModelConfig::ArPrediction { .. } => ModelKind::ArPrediction,
        }
    }

    /// Checks every parameter against its allowed range
    ///
    /// # Errors
    ///
    /// * `InvalidParameter` - The first parameter found below 1
    pub fn validate(&self) -> Result<()> {
        self.build::<f64>().map(|_| ())
    }

    /// Builds a model of type `T` from this configuration
    pub fn build<T: Float + Default>(&self) -> Result<AnyModel<T>> {
        AnyModel::from_config(*self)
    }
}

/// One of the supported models, selected at runtime.
///
/// Dispatches the [`Model`] surface to the wrapped transform so callers can
/// hold a heterogeneous set of models without trait objects.
#[derive(Debug, Clone)]
pub enum AnyModel<T> {
    /// Polynomial approximation
    Approximation(PolynomialApproximation<T>),
    /// Moving-average filtration
    MaFiltration(MovingAverageFilter<T>),
    /// Autoregressive prediction
    ArPrediction(AutoregressivePredictor<T>),
}

impl<T: Float + Default> AnyModel<T> {
    /// Creates a model from a configuration
    ///
    /// # Errors
    ///
    /// * `InvalidParameter` - A parameter of the configuration is below 1
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_models::{AnyModel, Model, ModelConfig, TimeSeries};
    ///
    /// let mut model = AnyModel::from_config(ModelConfig::MaFiltration { window: 2 }).unwrap();
    /// model.load(TimeSeries::prices([(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)])).unwrap();
    ///
    /// let result = model.result().unwrap();
    /// assert_eq!(result.positions(), &[2.0, 3.0]);
    /// assert_eq!(result.values(), &[15.0, 25.0]);
    /// ```
    pub fn from_config(config: ModelConfig) -> Result<Self> {
        Ok(match config {
            ModelConfig::Approximation { degree } => {
                AnyModel::Approximation(PolynomialApproximation::new(degree)?)
            }
            ModelConfig::MaFiltration { window } => {
                AnyModel::MaFiltration(MovingAverageFilter::new(window)?)
            }
            ModelConfig::ArPrediction { order, horizon } => {
                AnyModel::ArPrediction(AutoregressivePredictor::new(order, horizon)?)
            }
        })
    }

    /// Returns the kind of the wrapped model
    pub const fn kind(&self) -> ModelKind {
        match self {
            AnyModel::Approximation(_) => ModelKind::Approximation,
            AnyModel::MaFiltration(_) => ModelKind::MaFiltration,
            AnyModel::ArPrediction(_) => ModelKind::ArPrediction,
        }
    }

    /// Returns the parameters currently in effect
    pub fn config(&self) -> ModelConfig {
        match self {
            AnyModel::Approximation(m) => ModelConfig::Approximation {
                degree: m.degree(),
            },
            AnyModel::MaFiltration(m) => ModelConfig::MaFiltration { window: m.window() },
            AnyModel::ArPrediction(m) => ModelConfig::ArPrediction {
                order: m.order(),
                horizon: m.horizon(),
            },
        }
    }

    /// Returns the fitted coefficients of the last result, if any
    pub fn coefficients(&self) -> Option<&[T]> {
        self.output().and_then(ModelResult::coefficients)
    }

    /// Returns the mean squared error of the last polynomial fit, if any
    pub fn mse(&self) -> Option<T> {
        self.output().and_then(ModelResult::mse)
    }
}

impl<T: Float + Default> Model<T> for AnyModel<T> {
    fn name(&self) -> &'static str {
        match self {
            AnyModel::Approximation(m) => m.name(),
            AnyModel::MaFiltration(m) => m.name(),
            AnyModel::ArPrediction(m) => m.name(),
        }
    }

    fn input(&self) -> Option<&TimeSeries<T>> {
        match self {
            AnyModel::Approximation(m) => m.input(),
            AnyModel::MaFiltration(m) => m.input(),
            AnyModel::ArPrediction(m) => m.input(),
        }
    }

    fn load(&mut self, series: TimeSeries<T>) -> Result<&mut Self> {
        match self {
            AnyModel::Approximation(m) => {
                m.load(series)?;
            }
            AnyModel::MaFiltration(m) => {
                m.load(series)?;
            }
            AnyModel::ArPrediction(m) => {
                m.load(series)?;
            }
        }
        Ok(self)
    }

    fn compute(&mut self) -> Result<&mut Self> {
        match self {
            AnyModel::Approximation(m) => {
                m.compute()?;
            }
            AnyModel::MaFiltration(m) => {
                m.compute()?;
            }
            AnyModel::ArPrediction(m) => {
                m.compute()?;
            }
        }
        Ok(self)
    }

    fn output(&self) -> Option<&ModelResult<T>> {
        match self {
            AnyModel::Approximation(m) => m.output(),
            AnyModel::MaFiltration(m) => m.output(),
            AnyModel::ArPrediction(m) => m.output(),
        }
    }
}

impl<T> From<PolynomialApproximation<T>> for AnyModel<T> {
    fn from(model: PolynomialApproximation<T>) -> Self {
        AnyModel::Approximation(model)
    }
}

impl<T> From<MovingAverageFilter<T>> for AnyModel<T> {
    fn from(model: MovingAverageFilter<T>) -> Self {
        AnyModel::MaFiltration(model)
    }
}

impl<T> From<AutoregressivePredictor<T>> for AnyModel<T> {
    fn from(model: AutoregressivePredictor<T>) -> Self {
        AnyModel::ArPrediction(model)
    }
}
