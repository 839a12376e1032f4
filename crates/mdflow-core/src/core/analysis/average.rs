/// Running mean of `series[t0..]`: element `k` is the mean of `series[t0..=t0 + k]`.
///
/// The last element is the equilibrium value. Returns an empty vector when
/// `t0 >= series.len()`.
pub fn time_average(t0: usize, series: &[f64]) -> Vec<f64> {
    let Some(window) = series.get(t0..) else {
        return Vec::new();
    };
    let mut sum = 0.0;
    window
        .iter()
        .enumerate()
        .map(|(k, x)| {
            sum += x;
            sum / (k + 1) as f64
        })
        .collect()
}

/// Mean of `series[t0..]`, or `None` if the window is empty.
pub fn window_mean(t0: usize, series: &[f64]) -> Option<f64> {
    let window = series.get(t0..).filter(|w| !w.is_empty())?;
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Population variance `<x^2> - <x>^2` of `series[t0..]`.
pub fn window_variance(t0: usize, series: &[f64]) -> Option<f64> {
    let mean = window_mean(t0, series)?;
    let window = &series[t0..];
    let mean_sq = window.iter().map(|x| x * x).sum::<f64>() / window.len() as f64;
    Some(mean_sq - mean * mean)
}
