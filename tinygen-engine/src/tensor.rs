use rayon::prelude::*;

use crate::utils::Rng;

/// Rectangular parameter matrix stored as a flat row-major buffer.
#[derive(Debug, Clone)]
pub(crate) struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Allocates a `rows x cols` matrix filled with zero-mean Gaussian noise.
    pub fn random(rows: usize, cols: usize, stddev: f32, rng: &mut Rng) -> Self {
        let data = (0..rows * cols).map(|_| rng.gaussian(stddev)).collect();
        Self { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row(&self, i: usize) -> &[f32] {
        debug_assert!(i < self.rows, "row index out of bounds: {} >= {}", i, self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

/// Dense linear layer: `y = W·x + b` with `W` stored one row per output.
#[derive(Debug)]
pub(crate) struct Linear {
    weight: Matrix,
    bias: Vec<f32>,
}

impl Linear {
    /// Gaussian-initialized weights, zero bias.
    pub fn new(in_features: usize, out_features: usize, stddev: f32, rng: &mut Rng) -> Self {
        Self {
            weight: Matrix::random(out_features, in_features, stddev, rng),
            bias: vec![0.0; out_features],
        }
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; self.weight.rows()];
        output
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, out_val)| {
                *out_val = dot(self.weight.row(i), input) + self.bias[i];
            });
        output
    }
}

#[inline]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}
