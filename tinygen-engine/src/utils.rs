//! Seeded random number generation shared by weight initialization and
//! sampling. Keeping the generator explicit makes engine construction fully
//! reproducible from a single seed.

/// Xorshift-based random number generator.
#[derive(Debug, Clone)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // Xorshift never leaves the zero state.
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }

    pub fn random_u32(&mut self) -> u32 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        ((self.state.wrapping_mul(0x2545F4914F6CDD1D)) >> 32) as u32
    }

    /// Returns a random float in [0, 1).
    pub fn random_f32(&mut self) -> f32 {
        (self.random_u32() >> 8) as f32 / 16777216.0
    }

    /// Zero-mean Gaussian draw via the Box-Muller transform.
    pub fn gaussian(&mut self, stddev: f32) -> f32 {
        let mut u1 = self.random_f32();
        while u1 <= f32::EPSILON {
            u1 = self.random_f32();
        }
        let u2 = self.random_f32();
        let radius = (-2.0 * u1.ln()).sqrt();
        stddev * radius * (std::f32::consts::TAU * u2).cos()
    }
}

/// Glorot/Xavier scale used for all projection matrices and embedding tables.
pub(crate) fn xavier_stddev(fan_in: usize, fan_out: usize) -> f32 {
    (2.0 / (fan_in + fan_out) as f32).sqrt()
}
