use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Uniform index in `0..len`; always 0 for empty or single-item ranges.
    pub fn gen_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.rng.gen_range(0..len)
        }
    }

    /// Uniform value in `[0, 1)`.
    pub fn gen_unit_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Samples an index proportionally to `weights`. Non-positive totals fall
    /// back to the last index.
    pub fn gen_weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().copied().filter(|w| *w > 0.0).sum();
        if weights.is_empty() {
            return 0;
        }
        if total <= 0.0 {
            return weights.len() - 1;
        }
        let mut pick = self.gen_unit_f64() * total;
        for (idx, weight) in weights.iter().copied().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            if pick < weight {
                return idx;
            }
            pick -= weight;
        }
        weights
            .iter()
            .rposition(|w| *w > 0.0)
            .unwrap_or(weights.len() - 1)
    }
}
