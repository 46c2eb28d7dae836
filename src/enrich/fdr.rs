//! False-discovery-rate correction (Storey q-values).

use clap::ValueEnum;

use crate::error::{PipelineError, PipelineResult};

/// Pairs with a q-value at or below this are accepted.
pub const Q_VALUE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FdrMethod {
    /// Storey q-values with a smoothed estimate of the null proportion.
    #[default]
    Storey,
    /// Benjamini-Hochberg, i.e. the null proportion fixed at 1.
    BenjaminiHochberg,
}

pub fn is_accepted(q_value: f64) -> bool {
    q_value <= Q_VALUE_THRESHOLD
}

/// q-values for `p_values`, returned in input order.
pub fn q_values(p_values: &[f64], method: FdrMethod) -> PipelineResult<Vec<f64>> {
    if let Some(bad) = p_values
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(PipelineError::invariant(format!(
            "p-value {bad} outside [0, 1]"
        )));
    }
    let m = p_values.len();
    if m == 0 {
        return Ok(Vec::new());
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
    let sorted: Vec<f64> = order.iter().map(|&i| p_values[i]).collect();

    let pi0 = match method {
        FdrMethod::Storey => estimate_pi0(&sorted),
        FdrMethod::BenjaminiHochberg => 1.0,
    };

    let mut sorted_q = vec![0.0; m];
    sorted_q[m - 1] = pi0 * sorted[m - 1];
    for i in (0..m - 1).rev() {
        let q = pi0 * m as f64 * sorted[i] / (i + 1) as f64;
        sorted_q[i] = q.min(sorted_q[i + 1]);
    }

    let mut out = vec![0.0; m];
    for (rank, &idx) in order.iter().enumerate() {
        out[idx] = sorted_q[rank];
    }
    Ok(out)
}

/// Estimate the proportion of true nulls.
///
/// `pi0(k) = #{p > k} / (m (1 - k))` is evaluated on `k = 0.00..=0.95`,
/// smoothed by a least-squares cubic and read off at `k = 1`. Estimates
/// outside `[0, 1]` fall back to 1.
pub fn estimate_pi0(sorted: &[f64]) -> f64 {
    let m = sorted.len() as f64;
    if sorted.is_empty() {
        return 1.0;
    }
    let kappa: Vec<f64> = (0..96).map(|i| i as f64 / 100.0).collect();
    let pik: Vec<f64> = kappa
        .iter()
        .map(|&k| {
            let above = sorted.len() - sorted.partition_point(|&p| p <= k);
            above as f64 / (m * (1.0 - k))
        })
        .collect();
    cubic_fit(&kappa, &pik)
        .map(|coef| clamp_pi0(coef.iter().sum()))
        .unwrap_or(1.0)
}

/// Estimates outside `[0, 1]` (or NaN) become 1.
fn clamp_pi0(estimate: f64) -> f64 {
    if (0.0..=1.0).contains(&estimate) {
        estimate
    } else {
        1.0
    }
}

/// Least-squares coefficients `c0 + c1 x + c2 x^2 + c3 x^3`.
fn cubic_fit(xs: &[f64], ys: &[f64]) -> Option<[f64; 4]> {
    let mut a = [[0.0f64; 5]; 4];
    for (&x, &y) in xs.iter().zip(ys) {
        let powers = [1.0, x, x * x, x * x * x];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] += powers[r] * powers[c];
            }
            a[r][4] += powers[r] * y;
        }
    }

    // Gauss-Jordan with partial pivoting on the augmented normal equations.
    for col in 0..4 {
        let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        for row in 0..4 {
            if row != col {
                let factor = a[row][col] / a[col][col];
                for k in col..5 {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }
    }
    let coef = [
        a[0][4] / a[0][0],
        a[1][4] / a[1][1],
        a[2][4] / a[2][2],
        a[3][4] / a[3][3],
    ];
    coef.iter().all(|c| c.is_finite()).then_some(coef)
}
