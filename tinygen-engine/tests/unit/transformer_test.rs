use super::*;
use crate::configuration::EngineConfig;
use crate::utils::Rng;

fn small_config() -> EngineConfig {
    EngineConfig::builder()
        .vocab_size(64)
        .embedding_dim(8)
        .num_heads(2)
        .num_layers(1)
        .hidden_dim(16)
        .max_seq_len(16)
        .seed(7)
        .build()
        .unwrap()
}

#[test]
fn test_softmax_rows_are_valid_distributions() {
    let cases: Vec<Vec<f32>> = vec![
        vec![0.0, 1.0, -1.0, 3.5],
        vec![-1000.0, 0.0, 1000.0],
        vec![5.0],
        vec![0.25; 17],
    ];

    for mut row in cases {
        softmax(&mut row);
        assert!(row.iter().all(|&p| p >= 0.0));
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "softmax sum was {sum}");
    }
}

#[test]
fn test_attention_preserves_shape() {
    let config = small_config();
    let mut rng = Rng::new(config.seed);
    let attention = MultiHeadAttention::new(&config, &mut rng);

    for seq_len in 1..=config.max_seq_len {
        let sequence: Vec<Vec<f32>> = (0..seq_len)
            .map(|i| (0..config.embedding_dim).map(|d| (i + d) as f32 * 0.1).collect())
            .collect();

        let output = attention.forward(&sequence, &sequence, &sequence);
        assert_eq!(output.len(), seq_len);
        assert!(output.iter().all(|v| v.len() == config.embedding_dim));
    }
}

#[test]
fn test_layer_preserves_shape() {
    let config = small_config();
    let mut rng = Rng::new(config.seed);
    let layer = TransformerLayer::new(&config, &mut rng);

    for seq_len in [1, 2, config.max_seq_len] {
        let sequence: Vec<Vec<f32>> = (0..seq_len)
            .map(|i| (0..config.embedding_dim).map(|d| (i * d) as f32 * 0.01).collect())
            .collect();

        let output = layer.forward(&sequence);
        assert_eq!(output.len(), seq_len);
        assert!(output.iter().all(|v| v.len() == config.embedding_dim));
    }
}

#[test]
fn test_layer_norm_zero_mean_unit_variance() {
    let norm = LayerNorm::new(4);
    let output = norm.forward(&[1.0, 2.0, 3.0, 4.0]);

    let mean: f32 = output.iter().sum::<f32>() / 4.0;
    let variance: f32 = output.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / 4.0;
    assert!(mean.abs() < 1e-5);
    assert!((variance - 1.0).abs() < 1e-3);
}

#[test]
fn test_embedding_clamps_out_of_range_ids() {
    let config = small_config();
    let mut rng = Rng::new(config.seed);
    let embedding = Embedding::new(&config, &mut rng);

    let vectors = embedding.forward(&[usize::MAX, 0]);
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].len(), config.embedding_dim);
    assert!(vectors[0].iter().all(|v| v.is_finite()));
}

#[test]
fn test_logits_cover_vocabulary() {
    let config = small_config();
    let mut rng = Rng::new(config.seed);
    let transformer = Transformer::new(&config, &mut rng);

    let hidden = transformer.forward(&[8, 9, 10]);
    assert_eq!(hidden.len(), 3);

    let logits = transformer.logits(hidden.last().unwrap());
    assert_eq!(logits.len(), config.vocab_size);
    assert!(logits.iter().all(|l| l.is_finite()));
}

#[test]
fn test_construction_is_reproducible_from_seed() {
    let config = small_config();
    let a = Transformer::new(&config, &mut Rng::new(config.seed));
    let b = Transformer::new(&config, &mut Rng::new(config.seed));

    let ids = [3usize, 8, 12, 20];
    assert_eq!(a.forward(&ids), b.forward(&ids));
}
