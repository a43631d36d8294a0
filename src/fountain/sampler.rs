//! Weighted sampling with Vose's alias method
//!
//! Table construction order is fixed: encoder and decoder must derive the
//! same degree from the same generator state.

use super::xoshiro::Xoshiro256;

#[derive(Debug, Clone)]
pub struct WeightedSampler {
    probs: Vec<f64>,
    aliases: Vec<usize>,
}

impl WeightedSampler {
    /// Build a sampler over indices `0..weights.len()`
    ///
    /// Weights must be non-negative with a positive sum.
    pub fn new(weights: &[f64]) -> Self {
        let n = weights.len();
        let sum: f64 = weights.iter().sum();
        debug_assert!(n > 0 && sum > 0.0, "sampler needs a positive weight");

        let mut scaled: Vec<f64> = weights.iter().map(|w| w * n as f64 / sum).collect();
        let mut small = Vec::with_capacity(n);
        let mut large = Vec::with_capacity(n);
        for i in (0..n).rev() {
            if scaled[i] < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        let mut probs = vec![0.0; n];
        let mut aliases = vec![0; n];

        while !small.is_empty() && !large.is_empty() {
            let (Some(a), Some(g)) = (small.pop(), large.pop()) else {
                break;
            };
            probs[a] = scaled[a];
            aliases[a] = g;
            scaled[g] += scaled[a] - 1.0;
            if scaled[g] < 1.0 {
                small.push(g);
            } else {
                large.push(g);
            }
        }

        // Leftovers are 1.0 up to rounding
        for i in large.into_iter().chain(small) {
            probs[i] = 1.0;
        }

        Self { probs, aliases }
    }

    /// Draw one index
    pub fn next(&self, rng: &mut Xoshiro256) -> usize {
        let r1 = rng.next_double();
        let r2 = rng.next_double();
        let n = self.probs.len();
        let i = ((n as f64 * r1) as usize).min(n - 1);
        if r2 < self.probs[i] {
            i
        } else {
            self.aliases[i]
        }
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
}
