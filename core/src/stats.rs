//! Descriptive statistics and the hypothesis tests used by validation.
//!
//! Everything here is deterministic: no function draws random numbers.
//! The K-S reference sample is built from normal quantiles, not sampled.

use std::collections::BTreeMap;

const EPS: f64 = 1e-14;
const FPMIN: f64 = 1e-300;
const MAX_ITER: usize = 500;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Pearson correlation. `None` when lengths differ, fewer than two pairs
/// exist, or either side has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - ma, y - mb);
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    Some(cov / (va.sqrt() * vb.sqrt()))
}

/// Pearson correlation after centring both series on their group means,
/// so only co-variation inside each group counts. `groups[i]` labels pair i.
pub fn pearson_within_groups(groups: &[usize], a: &[f64], b: &[f64]) -> Option<f64> {
    if groups.len() != a.len() || a.len() != b.len() {
        return None;
    }
    let mut sums: BTreeMap<usize, (f64, f64, usize)> = BTreeMap::new();
    for ((g, x), y) in groups.iter().zip(a).zip(b) {
        let entry = sums.entry(*g).or_insert((0.0, 0.0, 0));
        entry.0 += x;
        entry.1 += y;
        entry.2 += 1;
    }
    let mut ca = Vec::with_capacity(a.len());
    let mut cb = Vec::with_capacity(b.len());
    for ((g, x), y) in groups.iter().zip(a).zip(b) {
        let (sa, sb, n) = sums[g];
        ca.push(x - sa / n as f64);
        cb.push(y - sb / n as f64);
    }
    pearson(&ca, &cb)
}

// ── Chi-square goodness of fit ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// Pearson's chi-square test of observed counts against expected
/// probabilities (normalised here). Cells with zero expected probability
/// are skipped; any observation in such a cell gives p = 0.
pub fn chi_square_gof(observed: &[u64], expected_probs: &[f64]) -> Option<ChiSquareResult> {
    if observed.len() != expected_probs.len() {
        return None;
    }
    let total: u64 = observed.iter().sum();
    let prob_total: f64 = expected_probs.iter().sum();
    if total == 0 || prob_total <= 0.0 {
        return None;
    }
    let n = total as f64;
    let mut statistic = 0.0;
    let mut cells = 0usize;
    for (obs, p) in observed.iter().zip(expected_probs) {
        let expected = n * p / prob_total;
        if expected <= 0.0 {
            if *obs > 0 {
                return Some(ChiSquareResult {
                    statistic: f64::INFINITY,
                    dof: cells.saturating_sub(1),
                    p_value: 0.0,
                });
            }
            continue;
        }
        cells += 1;
        statistic += (*obs as f64 - expected).powi(2) / expected;
    }
    let dof = cells.checked_sub(1)?;
    if dof == 0 {
        return None;
    }
    Some(ChiSquareResult {
        statistic,
        dof,
        p_value: chi_square_sf(statistic, dof as f64),
    })
}

/// Upper tail of the chi-square distribution.
pub fn chi_square_sf(x: f64, dof: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    regularized_gamma_q(dof / 2.0, x / 2.0)
}

/// Q(a, x) = Γ(a, x) / Γ(a): series below a + 1, continued fraction above.
pub fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        (1.0 - gamma_p_series(a, x)).clamp(0.0, 1.0)
    } else {
        gamma_q_continued_fraction(a, x).clamp(0.0, 1.0)
    }
}

fn gamma_prefactor(a: f64, x: f64) -> f64 {
    (-x + a * x.ln() - libm::lgamma(a)).exp()
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * gamma_prefactor(a, x)
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    gamma_prefactor(a, x) * h
}

// ── Kolmogorov–Smirnov ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sample K-S test with the asymptotic p-value.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<KsResult> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let (n, m) = (a.len(), b.len());
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < n && j < m {
        let x = a[i].min(b[j]);
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }

    let n_eff = (n * m) as f64 / (n + m) as f64;
    let en = n_eff.sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    Some(KsResult {
        statistic: d,
        p_value: kolmogorov_sf(lambda),
    })
}

/// Q_KS(λ) = 2 Σ (−1)^(j−1) exp(−2 j² λ²).
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous: f64 = 0.0;
    for j in 1..=100 {
        let jf = j as f64;
        let term = fac * (a2 * jf * jf).exp();
        sum += term;
        if term.abs() <= 0.001 * previous || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // Series failed to converge; only happens for tiny λ.
    1.0
}

// ── Normal distribution ────────────────────────────────────────────

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Acklam's rational approximation of the standard normal quantile
/// (relative error below 1.2e-9).
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// n evenly spaced normal quantiles at (i + ½)/n.
pub fn normal_quantile_sample(n: usize, mean: f64, std_dev: f64) -> Vec<f64> {
    (0..n)
        .map(|i| mean + std_dev * inverse_normal_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}
