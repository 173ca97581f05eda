use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng as _, SeedableRng};

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u64,
    inner: StdRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..max)
    }

    pub fn jitter(&mut self, amplitude: f32) -> f32 {
        self.uniform(-amplitude, amplitude)
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        rand::seq::index::sample(&mut self.inner, len, amount).into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_produces_same_stream() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..64 {
            assert_eq!(a.uniform(-1.0, 1.0).to_bits(), b.uniform(-1.0, 1.0).to_bits());
        }
    }

    #[test]
    fn uniform_stays_inside_range_and_handles_empty_range() {
        let mut rng = Rng::new(7);
        for _ in 0..1_000 {
            let value = rng.uniform(0.35, 0.8);
            assert!((0.35..0.8).contains(&value));
        }
        assert_eq!(rng.uniform(3.0, 3.0), 3.0);
    }

    #[test]
    fn sample_indices_are_distinct_and_capped() {
        let mut rng = Rng::new(11);
        let picked = rng.sample_indices(20, 10);
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(picked.len(), 10);
        assert_eq!(unique.len(), 10);
        assert!(picked.iter().all(|idx| *idx < 20));
        assert_eq!(rng.sample_indices(3, 9).len(), 3);
    }

    #[test]
    fn shuffle_keeps_every_element() {
        let mut rng = Rng::new(3);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }
}
