//! Epoch batch-index generation.

use rand::seq::SliceRandom;
use rand::RngCore;

/// Serves successive index slices over a fixed sample pool, reshuffling and
/// restarting automatically once the pool is exhausted.
///
/// Callers that pre-compute their loop count from [`num_iterations`] never
/// observe the auto-reset; callers that over-draw simply start a fresh pass.
/// The shuffle source is injected so tests can supply a deterministic RNG;
/// a sequential generator carries no RNG at all.
///
/// [`num_iterations`]: BatchIndexGenerator::num_iterations
///
/// # Example
///
/// ```rust
/// use synergraph_core::BatchIndexGenerator;
///
/// let mut batches = BatchIndexGenerator::sequential(4, 10);
/// assert_eq!(batches.num_iterations(), 3);
/// assert_eq!(batches.next_batch(), vec![0, 1, 2, 3]);
/// assert_eq!(batches.next_batch(), vec![4, 5, 6, 7]);
/// assert_eq!(batches.next_batch(), vec![8, 9]);
/// // Pool exhausted: the next call restarts from the beginning.
/// assert_eq!(batches.next_batch(), vec![0, 1, 2, 3]);
/// ```
pub struct BatchIndexGenerator {
    indices: Vec<usize>,
    batch_size: usize,
    iter_counter: usize,
    rng: Option<Box<dyn RngCore>>,
}

impl BatchIndexGenerator {
    /// Shuffled generator over the pool `0..num_data`, shuffled now and on
    /// every reset with the given source.
    pub fn shuffled(batch_size: usize, num_data: usize, rng: Box<dyn RngCore>) -> Self {
        Self::from_indices((0..num_data).collect(), batch_size, Some(rng))
    }

    /// Sequential generator over the pool `0..num_data`.
    pub fn sequential(batch_size: usize, num_data: usize) -> Self {
        Self::from_indices((0..num_data).collect(), batch_size, None)
    }

    /// Generator over an explicit index set; shuffles iff an RNG is given.
    pub fn from_indices(
        indices: Vec<usize>,
        batch_size: usize,
        rng: Option<Box<dyn RngCore>>,
    ) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        let mut generator = Self {
            indices,
            batch_size,
            iter_counter: 0,
            rng,
        };
        if let Some(rng) = generator.rng.as_mut() {
            generator.indices.shuffle(rng);
        }
        generator
    }

    /// Number of slices in one full pass (ceiling division; zero for an
    /// empty pool).
    pub fn num_iterations(&self) -> usize {
        (self.indices.len() + self.batch_size - 1) / self.batch_size
    }

    /// Slices left before the current pass is exhausted.
    pub fn num_iterations_left(&self) -> usize {
        self.num_iterations().saturating_sub(self.iter_counter)
    }

    /// Size of the underlying pool.
    pub fn pool_size(&self) -> usize {
        self.indices.len()
    }

    /// Next index slice (length ≤ batch size; empty for an empty pool).
    /// Exhaustion resets the cursor, reshuffling when an RNG is present.
    pub fn next_batch(&mut self) -> Vec<usize> {
        if self.num_iterations_left() == 0 {
            self.reset();
        }
        let start = self.iter_counter * self.batch_size;
        let end = (start + self.batch_size).min(self.indices.len());
        self.iter_counter += 1;
        self.indices[start..end].to_vec()
    }

    /// Restart the pass, reshuffling when an RNG is present.
    pub fn reset(&mut self) {
        if let Some(rng) = self.rng.as_mut() {
            self.indices.shuffle(rng);
        }
        self.iter_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn sequential_slices_then_reset() {
        let mut batches = BatchIndexGenerator::sequential(4, 10);
        assert_eq!(batches.num_iterations(), 3);
        assert_eq!(batches.next_batch().len(), 4);
        assert_eq!(batches.num_iterations_left(), 2);
        assert_eq!(batches.next_batch().len(), 4);
        assert_eq!(batches.next_batch(), vec![8, 9]);
        // Fourth call wraps around to the first slice unchanged.
        assert_eq!(batches.next_batch(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn shuffled_covers_pool_every_pass() {
        let rng = XorShiftRng::seed_from_u64(7);
        let mut batches = BatchIndexGenerator::shuffled(3, 8, Box::new(rng));
        for _ in 0..2 {
            let mut seen: Vec<usize> = (0..batches.num_iterations())
                .flat_map(|_| batches.next_batch())
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn explicit_indices_are_respected() {
        let mut batches = BatchIndexGenerator::from_indices(vec![5, 9, 2], 2, None);
        assert_eq!(batches.next_batch(), vec![5, 9]);
        assert_eq!(batches.next_batch(), vec![2]);
    }

    #[test]
    fn empty_pool_yields_zero_iterations_and_empty_slices() {
        let mut batches = BatchIndexGenerator::sequential(4, 0);
        assert_eq!(batches.num_iterations(), 0);
        assert!(batches.next_batch().is_empty());
        assert!(batches.next_batch().is_empty());
    }
}
