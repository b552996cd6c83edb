#![doc = include_str!("../README.md")]
#![no_std]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::just_underscores_and_digits, clippy::len_without_is_empty)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

#[macro_use]
extern crate alloc;

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;
pub(crate) use utils::{Window, helper, lstsq};

mod error;
pub use error::{ModelError, Result};

mod series;
pub use series::{Column, TimeSeries};

mod traits;
pub use traits::Model;

mod model;
pub use model::{AnyModel, Auxiliary, ModelConfig, ModelKind, ModelResult};

mod approximation;
pub use approximation::PolynomialApproximation;

mod ma_filtration;
pub use ma_filtration::MovingAverageFilter;

mod ar_prediction;
pub use ar_prediction::AutoregressivePredictor;

mod history;
pub use history::{
    HistoryEntry, HistoryStore, RetentionConfig, SymbolMap, all_pct_changes, pct_change_from_mean,
};
