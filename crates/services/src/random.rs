use rand::SeedableRng;
use rand::rngs::StdRng;

/// Where a session draws its randomness from.
///
/// `Seeded` makes every shuffle and sample reproducible, which is what tests
/// and "replay this quiz" links rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RandomSource {
    #[default]
    Entropy,
    Seeded(u64),
}

impl RandomSource {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(seed)
    }

    /// Build the generator owned by a session.
    #[must_use]
    pub fn rng(self) -> StdRng {
        match self {
            RandomSource::Entropy => StdRng::from_rng(&mut rand::rng()),
            RandomSource::Seeded(seed) => StdRng::seed_from_u64(seed),
        }
    }
}
