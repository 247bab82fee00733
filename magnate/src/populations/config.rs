use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population-level operations.
///
/// # Note
/// Quantities expressing probabilities or portions should be in
/// the range [0.0, 1.0]; values outside it may produce odd
/// behaviours.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes in the population. Bracket tournaments
    /// pair contestants four at a time, so a power of four keeps
    /// every round full.
    pub size: NonZeroUsize,
    /// Speciation distance below which a genome joins an existing
    /// species instead of founding a new one.
    pub distance_threshold: f32,
    /// Portion of each species kept when culling, rounded up.
    pub survival_threshold: f32,
    /// Chance that breeding crosses two members instead of cloning
    /// one.
    pub sexual_reproduction_chance: f32,
    /// Generations without fitness improvement before a species is
    /// removed.
    pub stagnation_threshold: NonZeroUsize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" configuration: all rates and
    /// thresholds 0, and counts 1.
    ///
    /// # Note
    /// Not suitable for actual evolution; it is meant as a base
    /// to fill in unused values during configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use magnate::populations::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     size: NonZeroUsize::new(64).unwrap(),
    ///     distance_threshold: 1.0,
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            size: unsafe { NonZeroUsize::new_unchecked(1) },
            distance_threshold: 0.0,
            survival_threshold: 0.0,
            sexual_reproduction_chance: 0.0,
            stagnation_threshold: unsafe { NonZeroUsize::new_unchecked(1) },
        }
    }

    /// Returns the reference configuration for the given population
    /// size: distance threshold 1.0, top 20% survival, 75% sexual
    /// reproduction, 15-generation stagnation limit.
    pub const fn standard(size: NonZeroUsize) -> PopulationConfig {
        PopulationConfig {
            size,
            distance_threshold: 1.0,
            survival_threshold: 0.2,
            sexual_reproduction_chance: 0.75,
            stagnation_threshold: unsafe { NonZeroUsize::new_unchecked(15) },
        }
    }
}
