use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// A gene describes one weighted connection of a genome's graph.
///
/// Genes become network connections when the genome is expressed
/// as a [`Network`]. A disabled gene stays in the genome — it keeps
/// its innovation number for alignment purposes — but contributes
/// nothing during activation.
///
/// [`Network`]: crate::networks::Network
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    innovation: Innovation,
    source: usize,
    destination: usize,
    weight: f32,
    enabled: bool,
}

impl Gene {
    /// Returns a new gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use magnate::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0, true);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// assert_eq!(gene.source(), 3);
    /// assert_eq!(gene.destination(), 9);
    /// assert_eq!(gene.weight(), 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(
        innovation: Innovation,
        source: usize,
        destination: usize,
        weight: f32,
        enabled: bool,
    ) -> Gene {
        Gene {
            innovation,
            source,
            destination,
            weight,
            enabled,
        }
    }

    /// Returns a fresh random weight, uniform over
    /// ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub(super) fn random_weight(config: &GeneticConfig, rng: &mut impl Rng) -> f32 {
        rng.gen_range(-config.weight_bound..=config.weight_bound)
    }

    /// Replaces the gene's weight with a fresh uniform random
    /// value in ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn randomize_weight(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Shifts the gene's weight by a uniform random offset in
    /// ±[`weight_shift_step`]` / 2`.
    ///
    /// [`weight_shift_step`]: crate::genomics::GeneticConfig::weight_shift_step
    pub fn shift_weight(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        let half_step = config.weight_shift_step * 0.5;
        self.weight += rng.gen_range(-half_step..=half_step);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the index of the gene's source node.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Returns the index of the gene's destination node.
    pub fn destination(&self) -> usize {
        self.destination
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Returns whether the gene is expressed during activation.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the gene.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene's (source, destination) node pair.
    pub(crate) fn endpoints(&self) -> (usize, usize) {
        (self.source, self.destination)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}[{}->{}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.destination,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            weight_bound: 2.0,
            weight_shift_step: 0.1,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn randomized_weight_stays_in_bound() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);
        let mut gene = Gene::new(0, 0, 1, 0.0, true);
        for _ in 0..100 {
            gene.randomize_weight(&config, &mut rng);
            assert!(gene.weight().abs() <= config.weight_bound);
        }
    }

    #[test]
    fn shifted_weight_moves_at_most_half_a_step() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut gene = Gene::new(0, 0, 1, 1.0, true);
            gene.shift_weight(&config, &mut rng);
            assert!((gene.weight() - 1.0).abs() <= config.weight_shift_step * 0.5);
        }
    }
}
