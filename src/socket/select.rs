//! Address selection.
//!
//! Spreads dials over every address a host resolves to. The randomness comes
//! from one process-wide generator, seeded from OS entropy the first time it
//! is touched and never reseeded; every draw goes through its mutex.

use crate::dns::AddressSet;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::net::IpAddr;
use std::sync::{Arc, LazyLock, Mutex};

/// Shared, synchronized random source.
#[derive(Clone, Debug)]
pub struct SharedRng {
    inner: Arc<Mutex<StdRng>>,
}

impl SharedRng {
    /// The process-wide generator.
    pub fn global() -> Self {
        static GLOBAL: LazyLock<SharedRng> = LazyLock::new(|| {
            tracing::trace!("seeding address selection rng");
            SharedRng {
                inner: Arc::new(Mutex::new(StdRng::from_os_rng())),
            }
        });
        GLOBAL.clone()
    }

    /// A private, reproducible generator for tests and benchmarks.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Uniform index in `0..n`. `n` must be non-zero.
    pub fn index(&self, n: usize) -> usize {
        // A panic while holding the lock cannot leave a StdRng half-updated.
        let mut rng = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(0..n)
    }

    pub fn ptr_eq(&self, other: &SharedRng) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self::global()
    }
}

/// Picks addresses out of an [`AddressSet`].
#[derive(Clone, Debug, Default)]
pub struct AddressSelector {
    rng: SharedRng,
}

impl AddressSelector {
    /// Selector over the process-wide generator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rng(rng: SharedRng) -> Self {
        Self { rng }
    }

    /// Uniform pick. One-element sets never touch the generator.
    pub fn select(&self, set: &AddressSet) -> IpAddr {
        if set.len() == 1 {
            return set.first();
        }
        set.as_slice()[self.rng.index(set.len())]
    }

    /// Pick for the second attempt of a dial.
    ///
    /// Redraws once if the first draw repeats `first`. The result may still
    /// equal `first`; this only makes a repeat less likely.
    pub fn select_secondary(&self, set: &AddressSet, first: IpAddr) -> IpAddr {
        let pick = self.select(set);
        if pick == first && set.len() > 1 {
            return self.select(set);
        }
        pick
    }
}
