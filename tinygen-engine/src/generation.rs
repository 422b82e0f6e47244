#[cfg(test)]
#[path = "../tests/unit/generation_test.rs"]
mod generation_test;

use anyhow::Result;
use log::debug;
use std::time::Instant;

use crate::sampler::Sampler;
use crate::tokenizer::Tokenizer;
use crate::transformer::Transformer;

/// Sampling parameters for one `generate` call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_new_tokens: usize,
    /// Must be > 0; values near 0 approximate greedy argmax.
    pub temperature: f32,
    /// Must be >= 1; values beyond the vocabulary are clamped to it.
    pub top_k: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.9,
            top_k: 50,
        }
    }
}

/// Why a generation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    Eos,
    MaxTokens,
}

/// Autoregressive sampling driver.
///
/// Seeds the sequence from the encoded prompt, then repeatedly: slides the
/// window to `max_seq_len` (dropping oldest tokens), runs the full forward
/// pass, projects the last position to logits, samples one id, and appends
/// it. Stops on the end token or after `max_new_tokens` iterations, whichever
/// comes first, and decodes only the newly generated suffix.
///
/// The sequence state is call-local; nothing persists across calls.
pub(crate) fn generate(
    transformer: &Transformer,
    tokenizer: &Tokenizer,
    options: &GenerateOptions,
    max_seq_len: usize,
    seed: u64,
    prompt: &str,
) -> Result<String> {
    let (generated, _) = generate_ids(transformer, tokenizer, options, max_seq_len, seed, prompt)?;
    Ok(tokenizer.decode(&generated))
}

/// Token-level generation: returns the newly generated ids (prompt excluded)
/// and the reason the loop stopped. The end token itself is not part of the
/// generated suffix.
pub(crate) fn generate_ids(
    transformer: &Transformer,
    tokenizer: &Tokenizer,
    options: &GenerateOptions,
    max_seq_len: usize,
    seed: u64,
    prompt: &str,
) -> Result<(Vec<usize>, StopReason)> {
    validate_options(options)?;

    let mut sampler = Sampler::new(options.temperature, options.top_k, seed);

    let mut sequence = tokenizer.encode(prompt, max_seq_len);
    while sequence.last() == Some(&tokenizer.pad_id()) {
        sequence.pop();
    }
    if sequence.is_empty() {
        sequence.push(tokenizer.start_id());
    }

    let start_time = Instant::now();
    let mut generated = Vec::new();
    let mut stop_reason = StopReason::MaxTokens;

    for _ in 0..options.max_new_tokens {
        if sequence.len() > max_seq_len {
            let excess = sequence.len() - max_seq_len;
            sequence.drain(0..excess);
        }

        let hidden = transformer.forward(&sequence);
        let Some(last_hidden) = hidden.last() else {
            break;
        };
        let mut logits = transformer.logits(last_hidden);

        let next_token = sampler.sample(&mut logits);
        if next_token == tokenizer.end_id() {
            stop_reason = StopReason::Eos;
            break;
        }

        sequence.push(next_token);
        generated.push(next_token);
    }

    let elapsed = start_time.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        debug!(
            "generated {} tokens in {:.2}s ({:.2} tokens/sec), stop: {:?}",
            generated.len(),
            elapsed,
            generated.len() as f64 / elapsed,
            stop_reason
        );
    }

    Ok((generated, stop_reason))
}

/// Caller-contract checks. Unlike tokenizer edge cases these indicate a bug
/// in the caller, so they are rejected rather than silently coerced.
fn validate_options(options: &GenerateOptions) -> Result<()> {
    if !(options.temperature > 0.0) || !options.temperature.is_finite() {
        anyhow::bail!(
            "temperature must be a positive finite number, got {}",
            options.temperature
        );
    }
    if options.top_k < 1 {
        anyhow::bail!("top_k must be at least 1, got {}", options.top_k);
    }
    Ok(())
}
