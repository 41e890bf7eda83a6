//! Deterministic random number generation.
//!
//! The only randomness the rules engine needs is library shuffling.
//! A seeded ChaCha stream keeps games replayable: the same seed and the
//! same action sequence reproduce the same game.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded deterministic RNG owned by one game.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Generate a random usize in the given range.
    pub fn gen_range(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }
}

impl Serialize for GameRng {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Word state + stream position are enough to restore the stream.
        let state = (self.seed, self.inner.get_word_pos());
        state.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (seed, word_pos): (u64, u128) = Deserialize::deserialize(deserializer)?;
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_word_pos(word_pos);
        Ok(Self { inner, seed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_shuffle() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);

        let mut deck_a: Vec<u32> = (0..60).collect();
        let mut deck_b: Vec<u32> = (0..60).collect();
        a.shuffle(&mut deck_a);
        b.shuffle(&mut deck_b);

        assert_eq!(deck_a, deck_b);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = GameRng::new(1);
        let mut b = GameRng::new(2);

        let mut deck_a: Vec<u32> = (0..60).collect();
        let mut deck_b: Vec<u32> = (0..60).collect();
        a.shuffle(&mut deck_a);
        b.shuffle(&mut deck_b);

        assert_ne!(deck_a, deck_b);
    }

    #[test]
    fn test_serde_roundtrip_resumes_stream() {
        let mut rng = GameRng::new(7);
        let _ = rng.gen_range(0..100);

        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();

        assert_eq!(rng.gen_range(0..1000), restored.gen_range(0..1000));
    }
}
