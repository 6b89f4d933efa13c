use std::f64::consts::PI;

/// Floor used for `-log10` when no positive significance value exists.
pub const MIN_SIGNIFICANCE: f64 = 1e-300;

/// Number of evaluation points for density curves.
pub const KDE_GRID_POINTS: usize = 256;

/// `(min, max)` of the finite values, or `None` if there are none.
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Smallest strictly positive value.
pub fn min_positive(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
}

/// `-log10(p)` with zero p-values clamped to `floor`.
pub fn neg_log10(p: f64, floor: f64) -> f64 {
    -(p.max(floor)).log10()
}

/// Transform significance values to `-log10` scale.
///
/// Zeros are mapped to the smallest positive value present so they land on
/// the top edge of the plot instead of at infinity.
pub fn neg_log10_all(pvalues: &[f64]) -> Vec<f64> {
    let floor = min_positive(pvalues).unwrap_or(MIN_SIGNIFICANCE);
    pvalues.iter().map(|&p| neg_log10(p, floor)).collect()
}

pub fn arithmetic_mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(x: &[f64]) -> f64 {
    let mean = arithmetic_mean(x);
    let ss = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    (ss / (x.len() as f64 - 1.0)).sqrt()
}

/// Scott's rule bandwidth for a Gaussian kernel.
pub fn scott_bandwidth(x: &[f64]) -> f64 {
    sample_std(x) * (x.len() as f64).powf(-0.2)
}

/// Gaussian kernel density estimate evaluated on an even grid.
///
/// The grid spans the data extended by `cut` bandwidths on each side.
/// Returns `None` for fewer than two values or zero spread.
pub fn gaussian_kde(x: &[f64], cut: f64, cumulative: bool) -> Option<Vec<(f64, f64)>> {
    if x.len() < 2 {
        return None;
    }
    let bw = scott_bandwidth(x);
    if !bw.is_finite() || bw <= 0.0 {
        return None;
    }
    let (lo, hi) = finite_range(x)?;
    let start = lo - cut * bw;
    let end = hi + cut * bw;
    let step = (end - start) / (KDE_GRID_POINTS - 1) as f64;
    let norm = 1.0 / (x.len() as f64 * bw * (2.0 * PI).sqrt());

    let mut curve: Vec<(f64, f64)> = (0..KDE_GRID_POINTS)
        .map(|i| {
            let g = start + step * i as f64;
            let d = x
                .iter()
                .map(|xi| (-0.5 * ((g - xi) / bw).powi(2)).exp())
                .sum::<f64>();
            (g, d * norm)
        })
        .collect();

    if cumulative {
        let mut acc = 0.0;
        let mut prev = curve[0];
        for point in curve.iter_mut().skip(1) {
            acc += 0.5 * (point.1 + prev.1) * step;
            prev = *point;
            point.1 = acc;
        }
        curve[0].1 = 0.0;
    }
    Some(curve)
}
