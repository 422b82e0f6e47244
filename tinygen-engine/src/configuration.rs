#[cfg(test)]
#[path = "../tests/unit/configuration_test.rs"]
mod configuration_test;

use anyhow::Result;

use crate::tokenizer::SPECIAL_TOKEN_COUNT;

/// Configuration for the transformer engine.
///
/// All shapes are fixed at construction time; every parameter tensor in the
/// engine derives its dimensions from this struct.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub num_heads: usize,
    pub num_layers: usize,
    pub hidden_dim: usize,
    pub max_seq_len: usize,
    /// Standard deviation for weight initialization. When `None`, each tensor
    /// uses the Glorot scale `sqrt(2 / (fan_in + fan_out))`.
    pub init_std: Option<f32>,
    pub seed: u64,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn head_dim(&self) -> usize {
        self.embedding_dim / self.num_heads
    }

    /// Validates the configuration. Violations are fatal and surface here,
    /// never later at call time.
    pub(crate) fn validate(&self) -> Result<()> {
        let dimensions = [
            ("vocab_size", self.vocab_size),
            ("embedding_dim", self.embedding_dim),
            ("num_heads", self.num_heads),
            ("num_layers", self.num_layers),
            ("hidden_dim", self.hidden_dim),
            ("max_seq_len", self.max_seq_len),
        ];

        for (name, value) in dimensions {
            if value == 0 {
                anyhow::bail!("Invalid {}: must be positive, got {}", name, value);
            }
        }

        if self.embedding_dim % self.num_heads != 0 {
            anyhow::bail!(
                "embedding_dim ({}) must be divisible by num_heads ({})",
                self.embedding_dim,
                self.num_heads
            );
        }

        if self.vocab_size < SPECIAL_TOKEN_COUNT {
            anyhow::bail!(
                "vocab_size ({}) too small to hold the {} special tokens",
                self.vocab_size,
                SPECIAL_TOKEN_COUNT
            );
        }

        if let Some(std) = self.init_std {
            if !(std > 0.0 && std.is_finite()) {
                anyhow::bail!("init_std must be a positive finite number, got {std}");
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    vocab_size: Option<usize>,
    embedding_dim: Option<usize>,
    num_heads: Option<usize>,
    num_layers: Option<usize>,
    hidden_dim: Option<usize>,
    max_seq_len: Option<usize>,
    init_std: Option<f32>,
    seed: Option<u64>,
}

impl EngineConfigBuilder {
    pub fn vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = Some(vocab_size);
        self
    }
    pub fn embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = Some(embedding_dim);
        self
    }
    pub fn num_heads(mut self, num_heads: usize) -> Self {
        self.num_heads = Some(num_heads);
        self
    }
    pub fn num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = Some(num_layers);
        self
    }
    pub fn hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = Some(hidden_dim);
        self
    }
    pub fn max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = Some(max_seq_len);
        self
    }
    pub fn init_std(mut self, init_std: Option<f32>) -> Self {
        self.init_std = init_std;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        let config = EngineConfig {
            vocab_size: self.vocab_size.unwrap_or(4096),
            embedding_dim: self.embedding_dim.unwrap_or(64),
            num_heads: self.num_heads.unwrap_or(4),
            num_layers: self.num_layers.unwrap_or(2),
            hidden_dim: self.hidden_dim.unwrap_or(256),
            max_seq_len: self.max_seq_len.unwrap_or(256),
            init_std: self.init_std,
            seed: self.seed.unwrap_or(42),
        };
        config.validate()?;
        Ok(config)
    }
}
