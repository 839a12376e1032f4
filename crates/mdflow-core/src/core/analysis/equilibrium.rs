use super::AnalysisError;
use tracing::debug;

/// Fraction of the series below which a detected start is pushed forward.
pub const MIN_DISCARD_FRACTION: f64 = 0.05;
/// Fraction of the series above which the detected start is flagged as suspicious.
pub const LATE_EQUILIBRIUM_FRACTION: f64 = 0.9;

/// A statistical primitive proposing the first index of the steady-state region.
pub trait SteadyStateDetector: Send + Sync {
    fn detect(&self, series: &[f64]) -> usize;
}

/// Integrated-autocorrelation estimate of the statistical inefficiency `g` of a series.
///
/// Returns `None` for a series without variance. `fast` grows the lag increment by one
/// each step; `min_time` is the smallest lag at which a non-positive autocorrelation
/// stops the sum.
pub fn statistical_inefficiency(series: &[f64], fast: bool, min_time: usize) -> Option<f64> {
    let n = series.len();
    if n == 0 {
        return None;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = series.iter().map(|x| x - mean).collect();
    let variance = centered.iter().map(|x| x * x).sum::<f64>() / n as f64;
    if variance == 0.0 {
        return None;
    }

    let mut g = 1.0;
    let mut t = 1;
    let mut increment = 1;
    while t + 1 < n {
        let c = centered[..n - t]
            .iter()
            .zip(&centered[t..])
            .map(|(a, b)| 2.0 * a * b)
            .sum::<f64>()
            / (2.0 * (n - t) as f64 * variance);
        if c <= 0.0 && t > min_time {
            break;
        }
        g += 2.0 * c * (1.0 - t as f64 / n as f64) * increment as f64;
        t += increment;
        if fast {
            increment += 1;
        }
    }

    Some(g.max(1.0))
}

/// Picks the start that maximizes the effective number of uncorrelated samples
/// `(T - t + 1) / g(t)` of the tail `x[t..]`.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalInefficiencyDetector {
    pub fast: bool,
    pub min_time: usize,
}

impl Default for StatisticalInefficiencyDetector {
    fn default() -> Self {
        Self {
            fast: true,
            min_time: 3,
        }
    }
}

impl SteadyStateDetector for StatisticalInefficiencyDetector {
    fn detect(&self, series: &[f64]) -> usize {
        let total = series.len();
        if total <= 2 {
            return 0;
        }
        if series.iter().all(|x| *x == series[0]) {
            return 0;
        }

        let mut best_index = 0;
        let mut best_effective = f64::NEG_INFINITY;
        for t in 0..total - 1 {
            let remaining = (total - t + 1) as f64;
            let g = statistical_inefficiency(&series[t..], self.fast, self.min_time)
                .unwrap_or(remaining);
            let effective = remaining / g;
            if effective > best_effective {
                best_effective = effective;
                best_index = t;
            }
        }
        best_index
    }
}

/// The start of the equilibrium window shared by every observable of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equilibration {
    pub index: usize,
    /// Equilibrium was only reached in the last tenth of the run.
    pub warning: bool,
}

/// Applies the discard and late-equilibrium policy on top of a [`SteadyStateDetector`].
#[derive(Debug, Clone, Default)]
pub struct EquilibrationDetector<D = StatisticalInefficiencyDetector> {
    detector: D,
}

impl<D: SteadyStateDetector> EquilibrationDetector<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn detect(&self, series: &[f64]) -> Result<Equilibration, AnalysisError> {
        let len = series.len();
        if len == 0 {
            return Err(AnalysisError::EmptySeries);
        }

        let proposed = self.detector.detect(series);
        let min_index = (MIN_DISCARD_FRACTION * len as f64).ceil() as usize;
        let index = proposed.max(min_index).min(len - 1);
        let warning = index as f64 / len as f64 > LATE_EQUILIBRIUM_FRACTION;

        debug!(proposed, index, len, warning, "Equilibration detected");
        Ok(Equilibration { index, warning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl SteadyStateDetector for Fixed {
        fn detect(&self, _series: &[f64]) -> usize {
            self.0
        }
    }

    #[test]
    fn constant_series_starts_at_the_discard_floor() {
        let detector = EquilibrationDetector::<StatisticalInefficiencyDetector>::default();
        let result = detector.detect(&[5.0; 40]).unwrap();
        assert_eq!(result, Equilibration { index: 2, warning: false });
    }

    #[test]
    fn early_proposal_is_clamped_up() {
        let detector = EquilibrationDetector::new(Fixed(0));
        let result = detector.detect(&vec![1.0; 101]).unwrap();
        assert_eq!(result.index, 6);
        assert!(result.index as f64 >= 0.05 * 101.0);
    }

    #[test]
    fn late_proposal_raises_the_warning() {
        let detector = EquilibrationDetector::new(Fixed(19));
        assert_eq!(
            detector.detect(&[0.0; 20]).unwrap(),
            Equilibration { index: 19, warning: true }
        );
        let detector = EquilibrationDetector::new(Fixed(18));
        assert!(!detector.detect(&[0.0; 20]).unwrap().warning);
    }

    #[test]
    fn policy_holds_for_every_proposal() {
        for len in [1usize, 7, 20, 33, 100] {
            for proposed in 0..len {
                let result = EquilibrationDetector::new(Fixed(proposed))
                    .detect(&vec![0.0; len])
                    .unwrap();
                assert!(result.index as f64 >= 0.05 * len as f64 || result.index == len - 1);
                assert!(result.index < len);
                assert_eq!(result.warning, result.index as f64 / len as f64 > 0.9);
            }
        }
    }

    #[test]
    fn empty_series_is_rejected() {
        let detector = EquilibrationDetector::<StatisticalInefficiencyDetector>::default();
        assert_eq!(detector.detect(&[]), Err(AnalysisError::EmptySeries));
    }

    #[test]
    fn statistical_inefficiency_requires_variance() {
        assert!(statistical_inefficiency(&[2.0, 2.0, 2.0, 2.0], true, 3).is_none());
        let g = statistical_inefficiency(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0], true, 3).unwrap();
        assert!(g >= 1.0);
    }

    #[test]
    fn transient_is_skipped() {
        let mut series: Vec<f64> = (0..20).map(|i| 10.0 - 0.5 * i as f64).collect();
        series.extend((0..80).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }));
        let index = StatisticalInefficiencyDetector::default().detect(&series);
        assert!((10..=20).contains(&index), "detected {index}");
    }
}
