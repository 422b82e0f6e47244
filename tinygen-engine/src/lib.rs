//! From-scratch transformer inference engine over plain nested float arrays.
//!
//! The engine composes a fixed-table tokenizer, learned token/position
//! embeddings, multi-head self-attention, feed-forward blocks, and an
//! autoregressive top-k sampling loop. There is no training: parameters are
//! seeded random noise, fixed for the engine's lifetime, which makes every
//! run fully reproducible from the configured seed.
//!
//! An [`Engine`] is safe to share by reference across threads once built:
//! parameters are read-only after construction, the encode cache is guarded
//! by a mutex, and all generation state is call-local.

mod configuration;
mod generation;
mod sampler;
mod tensor;
mod tokenizer;
mod transformer;
mod utils;

use anyhow::Result;
use log::debug;

pub use crate::configuration::{EngineConfig, EngineConfigBuilder};
pub use crate::generation::GenerateOptions;
pub use crate::tokenizer::Tokenizer;

use crate::transformer::Transformer;
use crate::utils::Rng;

/// A fully constructed inference engine: vocabulary plus seeded parameters.
pub struct Engine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    transformer: Transformer,
}

impl Engine {
    /// Builds the vocabulary and allocates all parameter tensors from the
    /// configured seed. Fails with a configuration error on invalid shapes
    /// (e.g. `embedding_dim` not divisible by `num_heads`); inference calls
    /// themselves never fail on malformed input text.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        debug!("{config:#?}");

        let tokenizer = Tokenizer::build(config.vocab_size)?;
        debug!("{tokenizer:?}");

        let mut rng = Rng::new(config.seed);
        let transformer = Transformer::new(&config, &mut rng);
        debug!("{transformer:?}");

        Ok(Self {
            config,
            tokenizer,
            transformer,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Generates a text continuation for `prompt`. The sampler is re-seeded
    /// from the engine seed on every call, so identical calls against the
    /// same engine produce identical output.
    pub fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        generation::generate(
            &self.transformer,
            &self.tokenizer,
            options,
            self.config.max_seq_len,
            self.config.seed,
            prompt,
        )
    }

    /// Raw tokenization surface for callers that need token ids directly
    /// (logging, token counting). Result is exactly `max_length` long.
    pub fn encode(&self, text: &str, max_length: usize) -> Vec<usize> {
        self.tokenizer.encode(text, max_length)
    }

    /// Decodes ids back to text; never fails, unmapped ids render as `?`.
    pub fn decode(&self, token_ids: &[usize]) -> String {
        self.tokenizer.decode(token_ids)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer)
            .finish_non_exhaustive()
    }
}
