use rand::Rng;

/// Resolves a fractional batch size and draws per-epoch index batches.
///
/// Each draw is uniform and without replacement, independently of
/// previous epochs: there is no epoch-level sweep guaranteeing the
/// full dataset gets covered. When the resolved size reaches the
/// dataset size, no sampling happens at all and the trainer uses the
/// full dataset every epoch.
#[derive(Debug, Clone, Copy)]
pub struct BatchSampler {
    fraction: f64,
}

impl BatchSampler {
    /// `fraction` is the batch size as a fraction of the sample count
    /// (`1.0` = full batch).
    pub fn new(fraction: f64) -> Self {
        BatchSampler { fraction }
    }

    /// The effective batch size for a dataset of `n` rows:
    /// `floor(fraction * n)`.
    pub fn resolve(&self, n: usize) -> usize {
        (n as f64 * self.fraction).floor() as usize
    }

    /// Draws one epoch's batch indices. `None` means "use the full
    /// dataset" (resolved size is at least `n`).
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Option<Vec<usize>> {
        let size = self.resolve(n);
        if size >= n {
            return None;
        }
        Some(rand::seq::index::sample(rng, n, size).into_vec())
    }
}
