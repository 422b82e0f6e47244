#[cfg(test)]
#[path = "../tests/unit/sampler_test.rs"]
mod sampler_test;

use crate::transformer::softmax;
use crate::utils::Rng;

/// Stores a probability and its associated index (token id).
#[derive(Clone, Debug)]
pub(crate) struct ProbIndex {
    pub prob: f32,
    pub index: usize,
}

/// Top-k/temperature sampler for language model logits.
///
/// Applies temperature scaling and a numerically-stable softmax, restricts
/// the distribution to its `top_k` highest-probability ids, renormalizes, and
/// draws from the restricted distribution with a seeded xorshift RNG.
#[derive(Debug)]
pub(crate) struct Sampler {
    temperature: f32,
    top_k: usize,
    rng: Rng,
}

impl Sampler {
    /// The caller validates `temperature > 0` and `top_k >= 1` before
    /// constructing a sampler.
    pub fn new(temperature: f32, top_k: usize, rng_seed: u64) -> Self {
        debug_assert!(temperature > 0.0, "temperature must be positive");
        debug_assert!(top_k >= 1, "top_k must be at least 1");

        Self {
            temperature,
            top_k,
            rng: Rng::new(rng_seed),
        }
    }

    /// Samples a token index from raw logits. Scales by temperature and
    /// modifies `logits` in place into a probability distribution.
    pub fn sample(&mut self, logits: &mut [f32]) -> usize {
        for logit in logits.iter_mut() {
            *logit /= self.temperature;
        }
        softmax(logits);

        // A top_k beyond the vocabulary is treated as the vocabulary size.
        let k = self.top_k.min(logits.len());

        let mut candidates: Vec<ProbIndex> = logits
            .iter()
            .enumerate()
            .map(|(index, &prob)| ProbIndex { prob, index })
            .collect();
        candidates.sort_unstable_by(|a, b| b.prob.total_cmp(&a.prob));
        candidates.truncate(k);

        let total: f32 = candidates.iter().map(|c| c.prob).sum();
        if !(total > 0.0) {
            // Degenerate numeric case (zero or NaN total weight): fall back
            // to a uniform pick among the top-k candidates instead of failing.
            let pick = self.rng.random_u32() as usize % candidates.len();
            return candidates[pick].index;
        }

        // Weighted draw over the renormalized restricted distribution.
        let r = self.rng.random_f32() * total;
        let mut cdf = 0.0;
        for candidate in &candidates {
            cdf += candidate.prob;
            if r < cdf {
                return candidate.index;
            }
        }
        candidates[candidates.len() - 1].index
    }
}
