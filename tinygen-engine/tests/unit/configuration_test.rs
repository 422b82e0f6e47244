use crate::configuration::EngineConfig;

#[test]
fn test_builder_defaults_are_valid() {
    let config = EngineConfig::builder().build().unwrap();
    assert!(config.vocab_size > 0);
    assert_eq!(config.embedding_dim % config.num_heads, 0);
    assert_eq!(config.seed, 42);
}

#[test]
fn test_head_dim() {
    let config = EngineConfig::builder()
        .embedding_dim(8)
        .num_heads(2)
        .build()
        .unwrap();
    assert_eq!(config.head_dim(), 4);
}

#[test]
fn test_rejects_indivisible_heads() {
    let result = EngineConfig::builder()
        .embedding_dim(10)
        .num_heads(3)
        .build();
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("must be divisible by num_heads")
    );
}

#[test]
fn test_rejects_zero_dimension() {
    let result = EngineConfig::builder().num_layers(0).build();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("num_layers"));
}

#[test]
fn test_rejects_vocab_smaller_than_special_tokens() {
    let result = EngineConfig::builder().vocab_size(4).build();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("special tokens"));
}

#[test]
fn test_rejects_invalid_init_std() {
    for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let result = EngineConfig::builder().init_std(Some(bad)).build();
        assert!(result.is_err(), "init_std {bad} should be rejected");
    }
}
