#[cfg(test)]
#[path = "../tests/unit/transformer_test.rs"]
mod transformer_test;

use rayon::prelude::*;

use crate::configuration::EngineConfig;
use crate::tensor::{Linear, Matrix, dot};
use crate::utils::{Rng, xavier_stddev};

/// Epsilon value for numerical stability in normalization
const EPSILON: f32 = 1e-6;

/// Transformer stack operating on plain nested float arrays.
///
/// **Architecture Overview:**
/// - **Type**: Encoder-style stack reused for autoregressive generation
/// - **Attention**: Multi-head scaled dot-product attention, no causal mask
///   (every position attends to every position, including during generation)
/// - **Position Encoding**: Learned absolute position embeddings added to
///   token embeddings
/// - **Normalization**: Post-norm LayerNorm with two learned parameter sets
///   per layer
/// - **Activation**: ReLU in the feed-forward blocks
///
/// Parameters are allocated once at construction from a seeded generator and
/// never updated; there is no training loop. The full forward pass is
/// recomputed on every generation step rather than caching keys/values, which
/// is a performance characteristic of the design, not a correctness bug.
pub(crate) struct Transformer {
    embedding: Embedding,
    layers: Vec<TransformerLayer>,
    output_projection: Linear,
}

impl Transformer {
    pub fn new(config: &EngineConfig, rng: &mut Rng) -> Self {
        let embedding = Embedding::new(config, rng);
        let layers = (0..config.num_layers)
            .map(|_| TransformerLayer::new(config, rng))
            .collect();
        let output_projection = Linear::new(
            config.embedding_dim,
            config.vocab_size,
            config
                .init_std
                .unwrap_or_else(|| xavier_stddev(config.embedding_dim, config.vocab_size)),
            rng,
        );

        Self {
            embedding,
            layers,
            output_projection,
        }
    }

    /// Embeds `token_ids` and passes the sequence through every layer in
    /// order. Returns one hidden vector per input position.
    pub fn forward(&self, token_ids: &[usize]) -> Vec<Vec<f32>> {
        let mut hidden = self.embedding.forward(token_ids);
        for layer in &self.layers {
            hidden = layer.forward(&hidden);
        }
        hidden
    }

    /// Projects one hidden vector to a vocabulary-sized score vector. During
    /// generation only the last position's hidden state is projected.
    pub fn logits(&self, hidden: &[f32]) -> Vec<f32> {
        self.output_projection.forward(hidden)
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("num_layers", &self.layers.len())
            .field("embedding", &self.embedding)
            .finish_non_exhaustive()
    }
}

/// Token + position embedding table.
pub(crate) struct Embedding {
    token_table: Matrix,
    position_table: Matrix,
    vocab_size: usize,
    dim: usize,
}

impl Embedding {
    fn new(config: &EngineConfig, rng: &mut Rng) -> Self {
        let token_std = config
            .init_std
            .unwrap_or_else(|| xavier_stddev(config.vocab_size, config.embedding_dim));
        let position_std = config
            .init_std
            .unwrap_or_else(|| xavier_stddev(config.max_seq_len, config.embedding_dim));

        Self {
            token_table: Matrix::random(config.vocab_size, config.embedding_dim, token_std, rng),
            position_table: Matrix::random(
                config.max_seq_len,
                config.embedding_dim,
                position_std,
                rng,
            ),
            vocab_size: config.vocab_size,
            dim: config.embedding_dim,
        }
    }

    /// One vector per position: `token_embedding[t] + position_embedding[i]`.
    /// Out-of-range token ids are clamped, not rejected. The caller keeps the
    /// sequence within the position table's bound.
    pub fn forward(&self, token_ids: &[usize]) -> Vec<Vec<f32>> {
        token_ids
            .iter()
            .enumerate()
            .map(|(position, &token)| {
                let token = token.min(self.vocab_size - 1);
                let token_emb = self.token_table.row(token);
                let pos_emb = self.position_table.row(position);
                (0..self.dim).map(|d| token_emb[d] + pos_emb[d]).collect()
            })
            .collect()
    }
}

impl std::fmt::Debug for Embedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedding")
            .field("vocab_size", &self.vocab_size)
            .field("dim", &self.dim)
            .finish()
    }
}

/// Multi-head scaled dot-product self-attention.
///
/// Heads are independent and read-only with respect to shared parameters, so
/// they are computed in parallel.
pub(crate) struct MultiHeadAttention {
    wq: Linear,
    wk: Linear,
    wv: Linear,
    wo: Linear,
    num_heads: usize,
    head_dim: usize,
}

impl MultiHeadAttention {
    fn new(config: &EngineConfig, rng: &mut Rng) -> Self {
        let dim = config.embedding_dim;
        let std = config.init_std.unwrap_or_else(|| xavier_stddev(dim, dim));

        Self {
            wq: Linear::new(dim, dim, std, rng),
            wk: Linear::new(dim, dim, std, rng),
            wv: Linear::new(dim, dim, std, rng),
            wo: Linear::new(dim, dim, std, rng),
            num_heads: config.num_heads,
            head_dim: config.head_dim(),
        }
    }

    /// Attends over the full sequence; output has the same length and
    /// per-vector width as the input.
    pub fn forward(
        &self,
        query_seq: &[Vec<f32>],
        key_seq: &[Vec<f32>],
        value_seq: &[Vec<f32>],
    ) -> Vec<Vec<f32>> {
        let q: Vec<Vec<f32>> = query_seq.iter().map(|x| self.wq.forward(x)).collect();
        let k: Vec<Vec<f32>> = key_seq.iter().map(|x| self.wk.forward(x)).collect();
        let v: Vec<Vec<f32>> = value_seq.iter().map(|x| self.wv.forward(x)).collect();

        let head_outputs: Vec<Vec<Vec<f32>>> = (0..self.num_heads)
            .into_par_iter()
            .map(|head_idx| self.attend_head(head_idx, &q, &k, &v))
            .collect();

        // Concatenate heads back to embedding width, then project.
        (0..query_seq.len())
            .map(|position| {
                let mut combined = Vec::with_capacity(self.num_heads * self.head_dim);
                for head in &head_outputs {
                    combined.extend_from_slice(&head[position]);
                }
                self.wo.forward(&combined)
            })
            .collect()
    }

    fn attend_head(
        &self,
        head_idx: usize,
        q: &[Vec<f32>],
        k: &[Vec<f32>],
        v: &[Vec<f32>],
    ) -> Vec<Vec<f32>> {
        let range = head_idx * self.head_dim..(head_idx + 1) * self.head_dim;
        let attention_scale = (self.head_dim as f32).sqrt().recip();
        let seq_len = q.len();

        (0..seq_len)
            .map(|i| {
                let q_slice = &q[i][range.clone()];

                let mut scores: Vec<f32> = (0..seq_len)
                    .map(|j| dot(q_slice, &k[j][range.clone()]) * attention_scale)
                    .collect();
                softmax(&mut scores);

                let mut attended = vec![0.0; self.head_dim];
                for (j, &weight) in scores.iter().enumerate() {
                    let v_slice = &v[j][range.clone()];
                    for (out, &value) in attended.iter_mut().zip(v_slice) {
                        *out += weight * value;
                    }
                }
                attended
            })
            .collect()
    }
}

impl std::fmt::Debug for MultiHeadAttention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiHeadAttention")
            .field("num_heads", &self.num_heads)
            .field("head_dim", &self.head_dim)
            .finish()
    }
}

/// Two-layer dense block with ReLU, applied independently per position.
pub(crate) struct FeedForward {
    w1: Linear,
    w2: Linear,
}

impl FeedForward {
    fn new(config: &EngineConfig, rng: &mut Rng) -> Self {
        let dim = config.embedding_dim;
        let hidden = config.hidden_dim;

        Self {
            w1: Linear::new(
                dim,
                hidden,
                config.init_std.unwrap_or_else(|| xavier_stddev(dim, hidden)),
                rng,
            ),
            w2: Linear::new(
                hidden,
                dim,
                config.init_std.unwrap_or_else(|| xavier_stddev(hidden, dim)),
                rng,
            ),
        }
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut hidden = self.w1.forward(input);
        for val in hidden.iter_mut() {
            *val = val.max(0.0);
        }
        self.w2.forward(&hidden)
    }
}

/// Per-position normalization to zero mean and unit variance followed by a
/// learned affine rescale. Uses population variance.
pub(crate) struct LayerNorm {
    scale: Vec<f32>,
    shift: Vec<f32>,
}

impl LayerNorm {
    fn new(dim: usize) -> Self {
        Self {
            scale: vec![1.0; dim],
            shift: vec![0.0; dim],
        }
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let n = input.len() as f32;
        let mean = input.iter().sum::<f32>() / n;
        let variance = input.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n;
        let inv_std = (variance + EPSILON).sqrt().recip();

        input
            .iter()
            .zip(self.scale.iter().zip(self.shift.iter()))
            .map(|(&x, (&scale, &shift))| scale * ((x - mean) * inv_std) + shift)
            .collect()
    }
}

/// Canonical post-norm residual block:
///
/// ```text
/// x = layer_norm1(attention(x) + x)
/// x = layer_norm2(feed_forward(x) + x)
/// ```
///
/// The two norm parameter sets are distinct and owned by the layer.
pub(crate) struct TransformerLayer {
    attention: MultiHeadAttention,
    norm1: LayerNorm,
    feed_forward: FeedForward,
    norm2: LayerNorm,
}

impl TransformerLayer {
    fn new(config: &EngineConfig, rng: &mut Rng) -> Self {
        Self {
            attention: MultiHeadAttention::new(config, rng),
            norm1: LayerNorm::new(config.embedding_dim),
            feed_forward: FeedForward::new(config, rng),
            norm2: LayerNorm::new(config.embedding_dim),
        }
    }

    pub fn forward(&self, sequence: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let attn_out = self.attention.forward(sequence, sequence, sequence);

        sequence
            .iter()
            .zip(attn_out)
            .map(|(input, attended)| {
                let residual1: Vec<f32> =
                    attended.iter().zip(input).map(|(&a, &x)| a + x).collect();
                let normed1 = self.norm1.forward(&residual1);

                let ffn_out = self.feed_forward.forward(&normed1);
                let residual2: Vec<f32> =
                    ffn_out.iter().zip(&normed1).map(|(&f, &x)| f + x).collect();
                self.norm2.forward(&residual2)
            })
            .collect()
    }
}

// Applies softmax normalization to a slice in-place.
pub(crate) fn softmax(x: &mut [f32]) {
    let max_val = x.iter().fold(f32::NEG_INFINITY, |acc, &val| acc.max(val));
    let sum = x
        .iter_mut()
        .map(|val| {
            *val = (*val - max_val).exp();
            *val
        })
        .sum::<f32>();
    let inv_sum = sum.recip();
    x.iter_mut().for_each(|val| *val *= inv_sum);
}
