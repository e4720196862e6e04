//! Summary statistics over comment sentiment.

/// Count, mean, sample standard deviation, min and max of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample (n - 1) standard deviation; NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarize `values`. Returns `None` for an empty series.
pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;

    let std = if count < 2 {
        f64::NAN
    } else {
        let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (squares / (n - 1.0)).sqrt()
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Summary {
        count,
        mean,
        std,
        min,
        max,
    })
}
