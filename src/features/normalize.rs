//! Min-max normalization with training-time scale capture.
//!
//! Training fits per-column (min, max) and stores them in a
//! [`ScalerMap`]; testing applies the stored scale without refitting, so
//! out-of-sample rows see exactly the training-time scaling.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::frame::IndicatorFrame;

/// Per-column min-max scale parameters for one indicator frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Capture per-column minima and maxima, ignoring NaN rows.
    pub fn fit(frame: &IndicatorFrame) -> Self {
        let mut mins = Vec::with_capacity(frame.n_cols());
        let mut maxs = Vec::with_capacity(frame.n_cols());

        for c in 0..frame.n_cols() {
            let mut min = f64::NAN;
            let mut max = f64::NAN;
            for &v in frame.column(c).iter().filter(|v| !v.is_nan()) {
                if min.is_nan() || v < min {
                    min = v;
                }
                if max.is_nan() || v > max {
                    max = v;
                }
            }
            mins.push(min);
            maxs.push(max);
        }

        Self { mins, maxs }
    }

    /// Scale each column to [0,1] by the stored parameters. A zero-width
    /// column maps to NaN rather than dividing by zero.
    pub fn apply(&self, frame: &IndicatorFrame) -> IndicatorFrame {
        assert_eq!(
            self.mins.len(),
            frame.n_cols(),
            "scaler fitted on a different column set"
        );

        let values = (0..frame.n_cols())
            .map(|c| {
                let min = self.mins[c];
                let width = self.maxs[c] - min;
                frame.column(c).iter().map(|v| (v - min) / width).collect()
            })
            .collect();

        IndicatorFrame::new(
            frame.dates().to_vec(),
            frame.column_names().to_vec(),
            values,
        )
    }

    /// Fit on `frame` and immediately scale it.
    pub fn fit_apply(frame: &IndicatorFrame) -> (Self, IndicatorFrame) {
        let scaler = Self::fit(frame);
        let scaled = scaler.apply(frame);
        (scaler, scaled)
    }

    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    pub fn maxs(&self) -> &[f64] {
        &self.maxs
    }
}

/// Scale parameters keyed by indicator name, captured at training time.
pub type ScalerMap = HashMap<String, MinMaxScaler>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame(values: Vec<f64>) -> IndicatorFrame {
        let start: NaiveDate = "2008-01-01".parse().unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        IndicatorFrame::from_column(dates, "x", values)
    }

    #[test]
    fn test_fit_apply_scales_to_unit_interval() {
        let (scaler, scaled) = MinMaxScaler::fit_apply(&frame(vec![10.0, 20.0, 30.0]));
        assert_eq!(scaler.mins(), &[10.0]);
        assert_eq!(scaler.maxs(), &[30.0]);
        assert_eq!(scaled.column(0), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_apply_reuses_training_scale() {
        let scaler = MinMaxScaler::fit(&frame(vec![0.0, 10.0]));
        let scaled = scaler.apply(&frame(vec![5.0, 20.0]));
        // out-of-sample values can exceed [0,1]; the scale must not refit
        assert_eq!(scaled.column(0), &[0.5, 2.0]);
    }

    #[test]
    fn test_fit_ignores_nan() {
        let scaler = MinMaxScaler::fit(&frame(vec![f64::NAN, 2.0, 4.0]));
        assert_eq!(scaler.mins(), &[2.0]);
        assert_eq!(scaler.maxs(), &[4.0]);
    }

    #[test]
    fn test_zero_width_column_is_nan() {
        let (_, scaled) = MinMaxScaler::fit_apply(&frame(vec![3.0, 3.0, 3.0]));
        assert!(scaled.column(0).iter().all(|v| v.is_nan()));
    }
}
