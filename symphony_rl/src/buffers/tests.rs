//! Test suite for the experience store.
//!
//! Test categories:
//! 1. Reward shaping on insertion
//! 2. Batch size schedule
//! 3. Fading-memory sampling weights
//! 4. Ring-buffer wrap-around
//! 5. End-to-end sampling into tensors
//! 6. Snapshot and restore

use burn::backend::NdArray;

use super::*;
use crate::core::Transition;
use crate::error::SymphonyError;

type TestBackend = NdArray<f32>;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn store(capacity: usize) -> ExperienceStore {
    ExperienceStore::new(1, 1, capacity, 3.0, 0.03, Some(7)).unwrap()
}

/// Scalar transition whose every field encodes `i`.
///
/// `next_state = i + 0.5`, so every transition has activity 0.5.
fn indexed(i: usize) -> Transition {
    let v = i as f32;
    Transition::new(vec![v], vec![v], v + 1.0, vec![v + 0.5], i % 2 == 1)
}

fn fill(store: &mut ExperienceStore, n: usize) {
    for i in 0..n {
        store.add(&indexed(i)).unwrap();
    }
}

fn to_vec(t: burn::tensor::Tensor<TestBackend, 2>) -> Vec<f32> {
    t.into_data().to_vec::<f32>().unwrap()
}

// =============================================================================
// 1. REWARD SHAPING
// =============================================================================

#[test]
fn test_stall_adjustment_formula() {
    let delta = 0.5;
    let expected = 0.03 * (0.5 - (1.0f64 / (0.5 + 1e-6)).ln());
    assert!((stall_adjustment(0.03, delta) - expected).abs() < 1e-12);
}

#[test]
fn test_stall_adjustment_punishes_standing_still() {
    // delta -> 0: ln(1 / 1e-6) = 13.8, a strong penalty
    let still = stall_adjustment(0.03, 0.0);
    assert!((still - (-0.03 * (1e6f64).ln())).abs() < 1e-9);
    assert!(still < stall_adjustment(0.03, 0.1));
}

#[test]
fn test_stall_adjustment_log_floor_for_large_moves() {
    // 1 / (delta + 1e-6) < 1e-3 once delta > ~1000: the log term floors at ln(1e-3).
    let delta = 5000.0;
    let expected = 0.03 * (delta - (1e-3f64).ln());
    assert!((stall_adjustment(0.03, delta) - expected).abs() < 1e-9);
}

#[test]
fn test_add_stores_shaped_reward() {
    let mut s = store(10);
    s.add(&indexed(3)).unwrap();

    let stored = s.get(0).unwrap();
    let expected = 4.0 + stall_adjustment(0.03, 0.5);
    assert!((stored.reward as f64 - expected).abs() < 1e-5);
    assert_eq!(stored.state, vec![3.0]);
    assert!(stored.terminal);
}

#[test]
fn test_add_rejects_malformed_transitions() {
    let mut s = ExperienceStore::new(2, 1, 10, 3.0, 0.03, Some(0)).unwrap();

    let wrong = Transition::new(vec![0.0], vec![0.0], 0.0, vec![0.0], false);
    assert!(matches!(
        s.add(&wrong),
        Err(SymphonyError::DimensionMismatch { what: "state", .. })
    ));

    let nan = Transition::new(vec![0.0, f32::NAN], vec![0.0], 0.0, vec![0.0, 0.0], false);
    assert!(matches!(s.add(&nan), Err(SymphonyError::NonFiniteInput { .. })));
    assert_eq!(s.total_added(), 0);
}

#[test]
fn test_zero_capacity_is_rejected() {
    assert!(ExperienceStore::new(1, 1, 0, 3.0, 0.03, None).is_err());
}

// =============================================================================
// 2. BATCH SIZE
// =============================================================================

#[test]
fn test_batch_size_schedule() {
    assert_eq!(batch_size_for(0), 128);
    assert_eq!(batch_size_for(64_000), 128);
    assert_eq!(batch_size_for(100_000), 200);
    assert_eq!(batch_size_for(1_000_000), 2000);
    assert_eq!(batch_size_for(1_024_000), 2048);
    assert_eq!(batch_size_for(2_000_000), 2048);
    assert_eq!(batch_size_for(usize::MAX), 2048);
}

#[test]
fn test_batch_size_follows_total_added() {
    let mut s = store(10);
    fill(&mut s, 10);
    assert_eq!(s.batch_size(), 128);
}

// =============================================================================
// 3. SAMPLING WEIGHTS
// =============================================================================

#[test]
fn test_weights_prefer_recent() {
    let mut s = store(2_000);
    fill(&mut s, 1_000);

    let w = s.sampling_weights();
    assert_eq!(w.len(), 1_000);
    assert!(w[999] > w[500]);
    assert!(w[500] > w[0]);
    assert!(w.iter().all(|&x| x >= 0.0));

    let sum: f64 = w.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_weights_are_monotone_in_insertion_order() {
    let mut s = store(500);
    fill(&mut s, 300);
    let w = s.sampling_weights();
    for pair in w.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
}

#[test]
fn test_weights_match_tanh_formula() {
    let mut s = store(100);
    fill(&mut s, 4);
    let raw: Vec<f64> = (0..4)
        .map(|i| {
            let x = i as f64 / 4.0;
            (3.0 * x * x).tanh()
        })
        .collect();
    let total: f64 = raw.iter().sum();

    for (w, r) in s.sampling_weights().iter().zip(&raw) {
        assert!((w - r / total).abs() < 1e-12);
    }
}

#[test]
fn test_single_transition_samples_uniformly() {
    let mut s = store(10);
    fill(&mut s, 1);
    assert_eq!(s.sampling_weights(), vec![1.0]);
    assert_eq!(s.sample_slots(5).unwrap(), vec![0; 5]);
}

#[test]
fn test_sampling_empty_store_fails() {
    let mut s = store(10);
    assert!(matches!(s.sample_slots(1), Err(SymphonyError::EmptyBuffer)));
    assert!(matches!(
        s.sample::<TestBackend>(&Default::default()),
        Err(SymphonyError::EmptyBuffer)
    ));
}

#[test]
fn test_sampled_slots_skew_recent() {
    let mut s = store(1_000);
    fill(&mut s, 1_000);

    let slots = s.sample_slots(20_000).unwrap();
    let recent = slots.iter().filter(|&&i| i >= 500).count();
    // About 79% of the mass lives in the newer half.
    assert!(recent > 15_000, "recent draws: {recent}");
}

// =============================================================================
// 4. RING BUFFER
// =============================================================================

#[test]
fn test_wraps_at_capacity() {
    let mut s = store(5);
    fill(&mut s, 7);

    assert_eq!(s.len(), 5);
    assert_eq!(s.total_added(), 7);
    // Slots 0 and 1 were overwritten by insertions 5 and 6.
    assert_eq!(s.get(0).unwrap().state, vec![5.0]);
    assert_eq!(s.get(1).unwrap().state, vec![6.0]);
    assert_eq!(s.get(2).unwrap().state, vec![2.0]);
    assert!(s.get(5).is_none());
}

#[test]
fn test_weights_after_wrap_follow_insertion_order() {
    let mut s = store(5);
    fill(&mut s, 7);

    // Slot 1 holds the newest transition, slot 2 the oldest.
    let w = s.sampling_weights();
    let newest = w[1];
    assert!(w.iter().all(|&x| x <= newest));
    assert!(w[2] < w[3] && w[3] < w[4] && w[4] < w[0] && w[0] < w[1]);
}

// =============================================================================
// 5. END-TO-END SAMPLING
// =============================================================================

#[test]
fn test_sample_shapes_and_values() {
    let device = Default::default();
    let mut s = store(10);
    fill(&mut s, 10);

    let batch = s.sample::<TestBackend>(&device).unwrap();
    assert_eq!(batch.batch_size(), 128);
    assert_eq!(batch.states.dims(), [128, 1]);
    assert_eq!(batch.actions.dims(), [128, 1]);
    assert_eq!(batch.rewards.dims(), [128, 1]);
    assert_eq!(batch.next_states.dims(), [128, 1]);
    assert_eq!(batch.dones.dims(), [128, 1]);

    let adjustment = stall_adjustment(0.03, 0.5);
    let states = to_vec(batch.states);
    let actions = to_vec(batch.actions);
    let rewards = to_vec(batch.rewards);
    let next_states = to_vec(batch.next_states);
    let dones = to_vec(batch.dones);

    for row in 0..128 {
        let index = states[row];
        // Insertion 0 has weight tanh(0) = 0 and is never drawn.
        assert!(index >= 1.0 && index <= 9.0);
        assert_eq!(actions[row], index);
        assert_eq!(next_states[row], index + 0.5);
        assert_eq!(dones[row], if index as usize % 2 == 1 { 1.0 } else { 0.0 });
        let expected = (index as f64 + 1.0) + adjustment;
        assert!((rewards[row] as f64 - expected).abs() < 1e-5);
    }
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let mut a = store(50);
    let mut b = store(50);
    fill(&mut a, 50);
    fill(&mut b, 50);
    assert_eq!(a.sample_slots(64).unwrap(), b.sample_slots(64).unwrap());
}

// =============================================================================
// 6. SNAPSHOT
// =============================================================================

#[test]
fn test_snapshot_restore() {
    let mut s = store(5);
    fill(&mut s, 7);
    let snapshot = s.snapshot();

    let mut restored = store(5);
    restored.restore(snapshot.clone()).unwrap();
    assert_eq!(restored.total_added(), 7);
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.sampling_weights(), s.sampling_weights());
}

#[test]
fn test_restore_rejects_incompatible_snapshot() {
    let mut s = store(5);
    fill(&mut s, 3);
    let snapshot = s.snapshot();

    let mut other = store(6);
    assert!(other.restore(snapshot.clone()).is_err());

    let mut other = ExperienceStore::new(2, 1, 5, 3.0, 0.03, None).unwrap();
    assert!(other.restore(snapshot.clone()).is_err());

    let mut truncated = snapshot;
    truncated.rewards.pop();
    assert!(store(5).restore(truncated).is_err());
}
