//! Indicator pipeline and normalization.

mod frame;
pub mod indicators;
mod normalize;

pub use frame::IndicatorFrame;
pub use normalize::{MinMaxScaler, ScalerMap};
