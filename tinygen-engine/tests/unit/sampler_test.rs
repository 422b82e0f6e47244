use super::Sampler;

#[test]
fn test_top_k_one_is_greedy() {
    for seed in 0..20 {
        let mut sampler = Sampler::new(1.0, 1, seed);
        let mut logits = vec![0.1, 5.0, 0.3, -2.0];
        assert_eq!(sampler.sample(&mut logits), 1);
    }
}

#[test]
fn test_low_temperature_converges_to_argmax() {
    for seed in 0..20 {
        let mut sampler = Sampler::new(1e-3, 4, seed);
        let mut logits = vec![0.1, 0.2, 3.0, 0.4];
        assert_eq!(sampler.sample(&mut logits), 2);
    }
}

#[test]
fn test_top_k_larger_than_vocabulary_is_clamped() {
    let mut sampler = Sampler::new(1.0, 10_000, 42);
    let mut logits = vec![0.0; 16];
    let picked = sampler.sample(&mut logits);
    assert!(picked < 16);
}

#[test]
fn test_sampled_index_stays_within_top_k() {
    // With k = 2 only the two highest-probability ids are eligible.
    for seed in 0..50 {
        let mut sampler = Sampler::new(1.0, 2, seed);
        let mut logits = vec![-1.0, 4.0, 0.0, 4.5, -3.0];
        let picked = sampler.sample(&mut logits);
        assert!(picked == 1 || picked == 3, "unexpected index {picked}");
    }
}

#[test]
fn test_same_seed_same_draws() {
    let mut a = Sampler::new(0.8, 5, 1234);
    let mut b = Sampler::new(0.8, 5, 1234);
    let logits = vec![0.3, -0.2, 1.7, 0.9, -1.1, 0.0];

    for _ in 0..10 {
        assert_eq!(a.sample(&mut logits.clone()), b.sample(&mut logits.clone()));
    }
}

#[test]
fn test_degenerate_logits_do_not_panic() {
    let mut sampler = Sampler::new(1.0, 4, 9);
    let mut logits = vec![f32::NEG_INFINITY; 8];
    let picked = sampler.sample(&mut logits);
    assert!(picked < 8);
}
