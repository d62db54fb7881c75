//! Date-indexed indicator frames.

use chrono::NaiveDate;

use crate::data::fill_forward_backward;

/// One or more named indicator columns sharing a date index.
///
/// Frames are column-major. A frame may be shorter than the price series
/// it was computed from (rolling warm-up rows dropped); joins re-align on
/// dates and mark missing rows NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        assert_eq!(columns.len(), values.len(), "one value vector per column");
        for col in &values {
            assert_eq!(col.len(), dates.len(), "column length must match dates");
        }
        Self {
            dates,
            columns,
            values,
        }
    }

    /// Single-column frame.
    pub fn from_column(dates: Vec<NaiveDate>, name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(dates, vec![name.into()], vec![values])
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[col][row]
    }

    /// The row as a feature vector across columns.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|col| col[row]).collect()
    }

    /// All rows as feature vectors (n_rows x n_cols).
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_rows()).map(|r| self.row(r)).collect()
    }

    /// Left-join another frame onto this frame's date index. Dates absent
    /// from `other` become NaN in its columns.
    pub fn join(&self, other: &IndicatorFrame) -> IndicatorFrame {
        let mut columns = self.columns.clone();
        let mut values = self.values.clone();

        for (name, col) in other.columns.iter().zip(other.values.iter()) {
            let joined: Vec<f64> = self
                .dates
                .iter()
                .map(|d| match other.dates.binary_search(d) {
                    Ok(i) => col[i],
                    Err(_) => f64::NAN,
                })
                .collect();
            columns.push(name.clone());
            values.push(joined);
        }

        IndicatorFrame::new(self.dates.clone(), columns, values)
    }

    /// Forward-fill then backward-fill NaN entries per column.
    pub fn fill(&mut self) {
        for col in &mut self.values {
            fill_forward_backward(col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start: NaiveDate = "2008-01-01".parse().unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_join_aligns_on_dates() {
        let left = IndicatorFrame::from_column(dates(4), "a", vec![1.0, 2.0, 3.0, 4.0]);
        // right frame is missing the first two dates (warm-up dropped)
        let right = IndicatorFrame::from_column(dates(4)[2..].to_vec(), "b", vec![30.0, 40.0]);

        let joined = left.join(&right);
        assert_eq!(joined.n_cols(), 2);
        assert!(joined.value(0, 1).is_nan());
        assert!(joined.value(1, 1).is_nan());
        assert_eq!(joined.value(2, 1), 30.0);
        assert_eq!(joined.value(3, 1), 40.0);
    }

    #[test]
    fn test_fill() {
        let mut frame =
            IndicatorFrame::from_column(dates(4), "a", vec![f64::NAN, 2.0, f64::NAN, 4.0]);
        frame.fill();
        assert_eq!(frame.column(0), &[2.0, 2.0, 2.0, 4.0]);
    }

    #[test]
    fn test_rows() {
        let frame = IndicatorFrame::new(
            dates(2),
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![10.0, 20.0]],
        );
        assert_eq!(frame.to_rows(), vec![vec![1.0, 10.0], vec![2.0, 20.0]]);
    }
}
