//! Per-drug Monte Carlo null distribution and lower-tail thresholds.
//!
//! Each drug draws one multinomial sample of its report volume over the
//! empirical event probabilities, reduces that draw to a mean and population
//! standard deviation, then draws Gaussian samples from those parameters and
//! keeps a lower percentile as the drug's cutoff.

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use statrs::distribution::Normal;

use crate::{
    error::{PipelineError, PipelineResult},
    exec::Executor,
};

use super::crosstab::CrossTable;

/// Sampling parameters, threaded explicitly into every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub seed: u64,
    /// Gaussian samples drawn per drug.
    pub samples: usize,
    /// Lower-tail percentile in `[0, 100]`.
    pub percentile: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            samples: 1000,
            percentile: 5.0,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.samples == 0 {
            return Err(PipelineError::Config("samples must be positive".into()));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(PipelineError::Config(format!(
                "percentile {} outside [0, 100]",
                self.percentile
            )));
        }
        Ok(())
    }
}

/// Null-distribution summary for one drug.
#[derive(Debug, Clone, PartialEq)]
pub struct NullThreshold {
    pub drug: String,
    pub mu: f64,
    pub sigma: f64,
    pub threshold: f64,
}

/// RNG stream for the drug at `position` in the canonical drug order.
///
/// Depends only on the seed and the position, never on which worker runs it.
pub fn drug_stream(seed: u64, position: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(position as u64);
    rng
}

/// Thresholds for every drug of `table`, in canonical drug order.
pub fn sample_thresholds(
    table: &CrossTable,
    cfg: &SamplerConfig,
    exec: &Executor,
) -> PipelineResult<Vec<NullThreshold>> {
    cfg.validate()?;
    let categories = WeightedIndex::new(table.event_probabilities())
        .map_err(|e| PipelineError::invariant(format!("event probabilities: {e}")))?;
    let n_events = table.n_events();
    let drugs: Vec<usize> = (0..table.n_drugs()).collect();

    exec.try_map(&drugs, |&drug| {
        let mut rng = drug_stream(cfg.seed, drug);
        let draw = multinomial(&mut rng, table.drug_total(drug), &categories, n_events);
        let (mu, sigma) = mean_std(&draw);
        let threshold = gaussian_percentile(&mut rng, mu, sigma, cfg.samples, cfg.percentile)?;
        Ok(NullThreshold {
            drug: table.drug_name(drug).to_string(),
            mu,
            sigma,
            threshold,
        })
    })
}

/// One multinomial draw of `trials` over `categories`.
pub fn multinomial<R: rand::Rng + ?Sized>(
    rng: &mut R,
    trials: u64,
    categories: &WeightedIndex<f64>,
    n_categories: usize,
) -> Vec<u64> {
    let mut counts = vec![0u64; n_categories];
    for _ in 0..trials {
        counts[categories.sample(rng)] += 1;
    }
    counts
}

/// Mean and population standard deviation of a count vector.
pub fn mean_std(values: &[u64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let centered = v as f64 - mean;
            centered * centered
        })
        .sum::<f64>()
        / n;
    (mean, var.sqrt())
}

fn gaussian_percentile<R: rand::Rng + ?Sized>(
    rng: &mut R,
    mu: f64,
    sigma: f64,
    samples: usize,
    q: f64,
) -> PipelineResult<f64> {
    if !mu.is_finite() || !sigma.is_finite() {
        return Err(PipelineError::invariant(format!(
            "non-finite null parameters (mu {mu}, sigma {sigma})"
        )));
    }
    // degenerate Gaussian
    if sigma == 0.0 {
        return Ok(mu);
    }
    let normal = Normal::new(mu, sigma)
        .map_err(|e| PipelineError::invariant(format!("normal({mu}, {sigma}): {e}")))?;
    let mut draws: Vec<f64> = (0..samples).map(|_| normal.sample(rng)).collect();
    Ok(percentile(&mut draws, q))
}

/// Percentile with linear interpolation between closest ranks. Sorts in place.
pub fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let rank = q / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}
