//! Seeded fault injection for collector messages.

use std::fmt;

use posture_proto::Attribute;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Drops and duplicates attributes on their way to the verifier.
///
/// # Determinism
///
/// The RNG is seeded explicitly, so the same seed and the same message
/// sequence always produce the same faults. A failing run can be replayed by
/// reusing its seed.
#[derive(Clone)]
pub struct FaultInjector {
    seed: u64,
    rng: ChaCha20Rng,
    drop_rate: f64,
    duplicate_rate: f64,
}

impl FaultInjector {
    /// Injector that changes nothing until rates are configured
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, rng: ChaCha20Rng::seed_from_u64(seed), drop_rate: 0.0, duplicate_rate: 0.0 }
    }

    /// Probability that an attribute is lost
    pub fn drop_rate(mut self, rate: f64) -> Self {
        self.drop_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Probability that an attribute is delivered twice
    pub fn duplicate_rate(mut self, rate: f64) -> Self {
        self.duplicate_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Seed this injector was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Apply faults to one message
    pub fn apply(&mut self, attributes: Vec<Attribute>) -> Vec<Attribute> {
        let mut delivered = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if self.rng.gen_bool(self.drop_rate) {
                tracing::trace!(seed = self.seed, ty = %attr.ty, "attribute dropped");
                continue;
            }
            if self.rng.gen_bool(self.duplicate_rate) {
                delivered.push(attr.clone());
            }
            delivered.push(attr);
        }
        delivered
    }
}

impl fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultInjector")
            .field("seed", &self.seed)
            .field("drop_rate", &self.drop_rate)
            .field("duplicate_rate", &self.duplicate_rate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Vec<Attribute> {
        (0..32).map(|i| Attribute::numeric_version(i, 0)).collect()
    }

    #[test]
    fn zero_rates_deliver_unchanged() {
        let mut faults = FaultInjector::with_seed(7);
        assert_eq!(faults.apply(message()), message());
    }

    #[test]
    fn certain_drop_delivers_nothing() {
        let mut faults = FaultInjector::with_seed(7).drop_rate(1.0);
        assert!(faults.apply(message()).is_empty());
    }

    #[test]
    fn same_seed_same_faults() {
        let mut a = FaultInjector::with_seed(42).drop_rate(0.3).duplicate_rate(0.2);
        let mut b = FaultInjector::with_seed(42).drop_rate(0.3).duplicate_rate(0.2);
        for _ in 0..5 {
            assert_eq!(a.apply(message()), b.apply(message()));
        }
    }
}
